use crate::model::{JournalRecord, WriteBatch};
use crate::StorageResult;
use folio_types::{
    AccessGrant, ActivityRecord, IntegrityRecord, PendingKey, PendingOperation, PlatformState,
    Principal, WorkId, WorkRecord,
};

/// Generic query window for paged reads.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryWindow {
    pub limit: usize,
    pub offset: usize,
}

/// Read access to work records and the work counter.
pub trait WorkStore: Send + Sync {
    fn get_work(&self, work_id: WorkId) -> StorageResult<Option<WorkRecord>>;

    /// Highest identifier ever allocated (0 before the first registration).
    fn last_work_id(&self) -> StorageResult<u64>;
}

/// Read access to committed fingerprints.
pub trait IntegrityStore: Send + Sync {
    fn get_integrity(&self, work_id: WorkId) -> StorageResult<Option<IntegrityRecord>>;
}

/// Read access to tiered grants and binary viewer flags.
pub trait AccessStore: Send + Sync {
    fn get_grant(&self, work_id: WorkId, principal: &Principal)
        -> StorageResult<Option<AccessGrant>>;

    fn get_viewer_flag(&self, work_id: WorkId, principal: &Principal)
        -> StorageResult<Option<bool>>;
}

/// Read access to per-principal rate-limiting counters.
pub trait ActivityStore: Send + Sync {
    fn get_activity(&self, principal: &Principal) -> StorageResult<Option<ActivityRecord>>;
}

/// Read access to the global platform switch.
pub trait PlatformStore: Send + Sync {
    fn get_platform(&self) -> StorageResult<PlatformState>;
}

/// Read access to pending operations and the operation sequence tracker.
pub trait PendingStore: Send + Sync {
    fn get_pending(&self, key: PendingKey) -> StorageResult<Option<PendingOperation>>;

    fn last_sequence(&self) -> StorageResult<u64>;
}

/// Read access to the hash-linked journal.
pub trait JournalStore: Send + Sync {
    /// Entries newest-first.
    fn list_journal(&self, window: QueryWindow) -> StorageResult<Vec<JournalRecord>>;

    /// Entries oldest-first, as needed for chain verification.
    fn journal_chain(&self) -> StorageResult<Vec<JournalRecord>>;

    fn latest_journal_hash(&self) -> StorageResult<Option<String>>;
}

/// The only write path: commit a whole batch atomically.
pub trait BatchWriter: Send + Sync {
    /// Apply every op in `batch` and chain its journal entry, or nothing at all.
    fn apply(&self, batch: WriteBatch) -> StorageResult<Option<JournalRecord>>;
}

/// Unified storage bundle used by the policy gate.
pub trait RegistryStorage:
    WorkStore
    + IntegrityStore
    + AccessStore
    + ActivityStore
    + PlatformStore
    + PendingStore
    + JournalStore
    + BatchWriter
    + Send
    + Sync
{
}

impl<T> RegistryStorage for T where
    T: WorkStore
        + IntegrityStore
        + AccessStore
        + ActivityStore
        + PlatformStore
        + PendingStore
        + JournalStore
        + BatchWriter
        + Send
        + Sync
{
}
