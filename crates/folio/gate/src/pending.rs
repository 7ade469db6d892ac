//! Pending two-phase operations.
//!
//! Only the request half exists. A request reserves the next operation
//! sequence number and stores a verification code and expiry height; no
//! completion, expiry sweep or code check is wired up yet.

use folio_storage::{RegistryStorage, Staged, WriteOp};
use folio_types::{
    Height, PendingKey, PendingOperation, Principal, RegistryResult, WorkId,
};
use std::sync::Arc;

/// Operation name recorded for verified transfers.
pub const TRANSFER_OPERATION: &str = "transfer";

/// Deterministic verification code for a pending operation.
///
/// BLAKE3 over the key, requester and request height, hex encoded.
///
/// Placeholder only. Every input is public (the key and height are
/// journaled), so anyone can recompute the code and it authenticates
/// nothing. A completion step must not accept it as proof of intent.
pub fn verification_code(key: PendingKey, requester: &Principal, height: Height) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&key.sequence.to_le_bytes());
    hasher.update(&key.work_id.value().to_le_bytes());
    hasher.update(requester.as_str().as_bytes());
    hasher.update(&height.to_le_bytes());
    hasher.finalize().to_hex().to_string()
}

/// Allocates sequence numbers and stages pending operation records.
pub struct PendingOperations {
    storage: Arc<dyn RegistryStorage>,
    expiry: Height,
}

impl PendingOperations {
    pub fn new(storage: Arc<dyn RegistryStorage>, expiry: Height) -> Self {
        Self { storage, expiry }
    }

    pub fn get(&self, key: PendingKey) -> RegistryResult<Option<PendingOperation>> {
        Ok(self.storage.get_pending(key)?)
    }

    /// Stage a transfer request under `last_sequence + 1`.
    ///
    /// Callers check platform state and ownership first.
    pub fn request_transfer(
        &self,
        requester: &Principal,
        work_id: WorkId,
        destination: Option<Principal>,
        height: Height,
    ) -> RegistryResult<Staged<(PendingKey, PendingOperation)>> {
        let sequence = self.storage.last_sequence()? + 1;
        let key = PendingKey { sequence, work_id };
        let operation = PendingOperation {
            operation: TRANSFER_OPERATION.to_string(),
            requester: requester.clone(),
            destination,
            requested_at: height,
            verification_code: verification_code(key, requester, height),
            expires_at: height.saturating_add(self.expiry),
        };

        let ops = vec![
            WriteOp::SetLastSequence(sequence),
            WriteOp::PutPending {
                key,
                operation: operation.clone(),
            },
        ];
        Ok(Staged::new((key, operation), ops))
    }
}
