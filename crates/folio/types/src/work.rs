use crate::ids::{Height, Principal, WorkId};
use serde::{Deserialize, Serialize};

/// A registered creative work.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkRecord {
    pub work_id: WorkId,
    pub name: String,
    pub creator: Principal,
    pub size: u64,
    pub synopsis: String,
    pub categories: Vec<String>,
    pub registered_at: Height,
}

/// Caller-supplied fields for a new registration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkDraft {
    pub name: String,
    pub size: u64,
    pub synopsis: String,
    pub categories: Vec<String>,
}

impl WorkDraft {
    pub fn new(
        name: impl Into<String>,
        size: u64,
        synopsis: impl Into<String>,
        categories: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            size,
            synopsis: synopsis.into(),
            categories,
        }
    }
}

/// Metadata patch applied by `update_work`. Absent fields keep their value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synopsis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
}

impl WorkUpdate {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_synopsis(mut self, synopsis: impl Into<String>) -> Self {
        self.synopsis = Some(synopsis.into());
        self
    }

    pub fn with_categories(mut self, categories: Vec<String>) -> Self {
        self.categories = Some(categories);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.size.is_none()
            && self.synopsis.is_none()
            && self.categories.is_none()
    }
}
