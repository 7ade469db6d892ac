use crate::ids::{Height, Principal, WorkId};
use serde::{Deserialize, Serialize};

/// Key of a pending operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PendingKey {
    pub sequence: u64,
    pub work_id: WorkId,
}

/// A requested two-phase operation awaiting completion.
///
/// Only the request half exists: nothing consumes, verifies or expires these
/// records yet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingOperation {
    pub operation: String,
    pub requester: Principal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<Principal>,
    pub requested_at: Height,
    pub verification_code: String,
    pub expires_at: Height,
}
