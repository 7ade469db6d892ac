use chrono::{DateTime, Utc};
use folio_types::{
    AccessGrant, ActivityRecord, HashAlgorithm, Height, IntegrityRecord, PendingKey,
    PendingOperation, PermissionTier, PlatformState, Principal, WorkId, WorkRecord,
};
use serde::{Deserialize, Serialize};

/// A single keyed write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WriteOp {
    PutWork(WorkRecord),
    /// Removes the work together with its integrity record, grants and viewer flags.
    RemoveWork(WorkId),
    SetLastWorkId(u64),
    PutIntegrity {
        work_id: WorkId,
        record: IntegrityRecord,
    },
    PutGrant {
        work_id: WorkId,
        principal: Principal,
        grant: AccessGrant,
    },
    PutViewerFlag {
        work_id: WorkId,
        principal: Principal,
        allowed: bool,
    },
    PutActivity {
        principal: Principal,
        record: ActivityRecord,
    },
    SetPlatform(PlatformState),
    PutPending {
        key: PendingKey,
        operation: PendingOperation,
    },
    SetLastSequence(u64),
}

/// Writes committed together or not at all.
///
/// A batch carries at most one journal entry describing the action it
/// implements; the entry is chained in the same commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    pub ops: Vec<WriteOp>,
    pub journal: Option<JournalAppend>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, op: WriteOp) -> Self {
        self.ops.push(op);
        self
    }

    pub fn journaled(mut self, entry: JournalAppend) -> Self {
        self.journal = Some(entry);
        self
    }
}

/// A value computed by a policy component together with the writes that
/// make it durable. Nothing is written until the gate commits the ops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Staged<T> {
    pub value: T,
    pub ops: Vec<WriteOp>,
}

impl<T> Staged<T> {
    pub fn new(value: T, ops: Vec<WriteOp>) -> Self {
        Self { value, ops }
    }

    /// Move the ops into `batch` and hand back the value.
    pub fn stage_into(self, batch: &mut WriteBatch) -> T {
        batch.ops.extend(self.ops);
        self.value
    }
}

/// What a committed mutation did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum JournalAction {
    WorkRegistered {
        work_id: WorkId,
        rate_limited: bool,
    },
    WorkUpdated {
        work_id: WorkId,
    },
    OwnershipTransferred {
        work_id: WorkId,
        from: Principal,
        to: Principal,
    },
    WorkUnregistered {
        work_id: WorkId,
    },
    AccessTierAssigned {
        work_id: WorkId,
        participant: Principal,
        tier: PermissionTier,
    },
    IntegrityRegistered {
        work_id: WorkId,
        algorithm: HashAlgorithm,
        fingerprint: String,
    },
    PlatformSuspended {
        explanation: String,
    },
    PlatformResumed,
    VerifiedTransferInitiated {
        sequence: u64,
        work_id: WorkId,
        #[serde(skip_serializing_if = "Option::is_none")]
        destination: Option<Principal>,
    },
}

/// Journal append payload. Sequencing and hashes are assigned by storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalAppend {
    pub height: Height,
    pub actor: Principal,
    pub action: JournalAction,
}

impl JournalAppend {
    pub fn new(height: Height, actor: Principal, action: JournalAction) -> Self {
        Self {
            height,
            actor,
            action,
        }
    }
}

/// Stored, hash-linked journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalRecord {
    pub event_id: String,
    pub sequence: u64,
    pub height: Height,
    pub recorded_at: DateTime<Utc>,
    pub actor: Principal,
    pub action: JournalAction,
    pub previous_hash: Option<String>,
    pub hash: String,
}

/// Complete serializable image of a registry store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub works: Vec<WorkRecord>,
    pub integrity: Vec<(WorkId, IntegrityRecord)>,
    pub grants: Vec<(WorkId, Principal, AccessGrant)>,
    pub viewer_flags: Vec<(WorkId, Principal, bool)>,
    pub activity: Vec<(Principal, ActivityRecord)>,
    pub platform: PlatformState,
    pub pending: Vec<(PendingKey, PendingOperation)>,
    pub last_work_id: u64,
    pub last_sequence: u64,
    pub journal: Vec<JournalRecord>,
}
