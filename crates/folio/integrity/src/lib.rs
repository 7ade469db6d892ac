//! Folio Integrity - the integrity ledger.
//!
//! A creator commits a 32-byte fingerprint of a work's content under a named
//! algorithm. Anyone may later check a candidate fingerprint against the
//! commitment; the comparison runs in constant time.

#![deny(unsafe_code)]

use folio_records::RecordStore;
use folio_storage::{RegistryStorage, Staged, WriteOp};
use folio_types::{
    Fingerprint, HashAlgorithm, Height, IntegrityRecord, Principal, RegistryError,
    RegistryResult, WorkId,
};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::debug;

/// Digest `content` with `algorithm`.
pub fn compute_fingerprint(algorithm: HashAlgorithm, content: &[u8]) -> Fingerprint {
    match algorithm {
        HashAlgorithm::Sha256 => {
            let mut hasher = Sha256::new();
            hasher.update(content);
            Fingerprint(hasher.finalize().into())
        }
        HashAlgorithm::Blake3 => Fingerprint(*blake3::hash(content).as_bytes()),
    }
}

/// Constant-time fingerprint equality.
pub fn fingerprints_match(committed: &Fingerprint, candidate: &Fingerprint) -> bool {
    bool::from(committed.as_bytes().ct_eq(candidate.as_bytes()))
}

/// Committed fingerprints, one per work.
pub struct IntegrityLedger {
    storage: Arc<dyn RegistryStorage>,
    records: RecordStore,
}

impl IntegrityLedger {
    pub fn new(storage: Arc<dyn RegistryStorage>) -> Self {
        Self {
            records: RecordStore::new(Arc::clone(&storage)),
            storage,
        }
    }

    /// Stage a fingerprint commitment for `work_id`, replacing any previous one.
    ///
    /// Existence and ownership are checked before the algorithm identifier.
    pub fn register_fingerprint(
        &self,
        caller: &Principal,
        work_id: WorkId,
        fingerprint: Fingerprint,
        algorithm: &str,
        height: Height,
    ) -> RegistryResult<Staged<IntegrityRecord>> {
        self.records.require_creator(work_id, caller)?;
        let algorithm: HashAlgorithm = algorithm.parse()?;

        let record = IntegrityRecord {
            fingerprint,
            algorithm,
            registered_at: height,
            registered_by: caller.clone(),
        };
        debug!(work_id = %work_id, algorithm = %algorithm, "Staged integrity record");

        let op = WriteOp::PutIntegrity {
            work_id,
            record: record.clone(),
        };
        Ok(Staged::new(record, vec![op]))
    }

    /// Compare `candidate` with the committed fingerprint. Reads only.
    pub fn verify(&self, work_id: WorkId, candidate: &Fingerprint) -> RegistryResult<bool> {
        let record = self
            .record_of(work_id)?
            .ok_or(RegistryError::NoIntegrityRecord(work_id))?;
        Ok(fingerprints_match(&record.fingerprint, candidate))
    }

    pub fn record_of(&self, work_id: WorkId) -> RegistryResult<Option<IntegrityRecord>> {
        Ok(self.storage.get_integrity(work_id)?)
    }
}
