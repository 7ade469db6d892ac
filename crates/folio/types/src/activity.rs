use crate::ids::Height;
use serde::{Deserialize, Serialize};

/// Per-principal rate-limiting counter.
///
/// `Default` is the state of a principal that has never acted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub last_action_height: Height,
    pub count: u32,
}
