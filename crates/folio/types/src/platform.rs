use serde::{Deserialize, Serialize};

/// Global platform switch.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformState {
    pub suspended: bool,
    pub explanation: String,
}

impl PlatformState {
    pub fn operational() -> Self {
        Self::default()
    }

    pub fn suspended(explanation: impl Into<String>) -> Self {
        Self {
            suspended: true,
            explanation: explanation.into(),
        }
    }

    pub fn is_operational(&self) -> bool {
        !self.suspended
    }
}
