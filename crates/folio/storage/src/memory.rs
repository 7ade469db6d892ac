//! In-memory reference implementation of the Folio storage traits.
//!
//! All state lives behind one lock, so a batch is applied under a single
//! write guard and readers never observe half of it. Deterministic and
//! test-friendly; durable deployments put a transactional store behind the
//! same traits.

use crate::journal::compute_journal_hash;
use crate::model::{JournalAppend, JournalRecord, RegistrySnapshot, WriteBatch, WriteOp};
use crate::traits::{
    AccessStore, ActivityStore, BatchWriter, IntegrityStore, JournalStore, PendingStore,
    PlatformStore, QueryWindow, WorkStore,
};
use crate::{StorageError, StorageResult};
use chrono::Utc;
use folio_types::{
    AccessGrant, ActivityRecord, IntegrityRecord, PendingKey, PendingOperation, PlatformState,
    Principal, WorkId, WorkRecord,
};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

#[derive(Debug, Default)]
struct RegistryState {
    works: HashMap<WorkId, WorkRecord>,
    integrity: HashMap<WorkId, IntegrityRecord>,
    grants: HashMap<(WorkId, Principal), AccessGrant>,
    viewer_flags: HashMap<(WorkId, Principal), bool>,
    activity: HashMap<Principal, ActivityRecord>,
    platform: PlatformState,
    pending: HashMap<PendingKey, PendingOperation>,
    last_work_id: u64,
    last_sequence: u64,
    journal: Vec<JournalRecord>,
}

impl RegistryState {
    /// Reject the batch before touching anything if it would break an invariant.
    fn precheck(&self, ops: &[WriteOp]) -> StorageResult<()> {
        let mut last_work_id = self.last_work_id;
        let mut last_sequence = self.last_sequence;
        for op in ops {
            match op {
                WriteOp::SetLastWorkId(next) => {
                    if *next <= last_work_id {
                        return Err(StorageError::InvariantViolation(format!(
                            "work counter may only advance: {} -> {}",
                            last_work_id, next
                        )));
                    }
                    last_work_id = *next;
                }
                WriteOp::SetLastSequence(next) => {
                    if *next <= last_sequence {
                        return Err(StorageError::InvariantViolation(format!(
                            "operation sequence may only advance: {} -> {}",
                            last_sequence, next
                        )));
                    }
                    last_sequence = *next;
                }
                WriteOp::PutWork(record) => {
                    if record.work_id.value() == 0 || record.work_id.value() > last_work_id {
                        return Err(StorageError::InvariantViolation(format!(
                            "{} was never allocated",
                            record.work_id
                        )));
                    }
                }
                WriteOp::RemoveWork(work_id) => {
                    if !self.works.contains_key(work_id) {
                        return Err(StorageError::NotFound(work_id.to_string()));
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn chain(&self, entry: JournalAppend) -> StorageResult<JournalRecord> {
        let previous_hash = self.journal.last().map(|r| r.hash.clone());
        let sequence = self.journal.len() as u64 + 1;
        let recorded_at = Utc::now();
        let hash = compute_journal_hash(&entry, previous_hash.as_deref(), sequence, recorded_at)?;
        Ok(JournalRecord {
            event_id: format!("journal-{}", Uuid::new_v4()),
            sequence,
            height: entry.height,
            recorded_at,
            actor: entry.actor,
            action: entry.action,
            previous_hash,
            hash,
        })
    }

    fn apply_op(&mut self, op: WriteOp) {
        match op {
            WriteOp::PutWork(record) => {
                self.works.insert(record.work_id, record);
            }
            WriteOp::RemoveWork(work_id) => {
                self.works.remove(&work_id);
                self.integrity.remove(&work_id);
                self.grants.retain(|(id, _), _| *id != work_id);
                self.viewer_flags.retain(|(id, _), _| *id != work_id);
            }
            WriteOp::SetLastWorkId(value) => self.last_work_id = value,
            WriteOp::PutIntegrity { work_id, record } => {
                self.integrity.insert(work_id, record);
            }
            WriteOp::PutGrant {
                work_id,
                principal,
                grant,
            } => {
                self.grants.insert((work_id, principal), grant);
            }
            WriteOp::PutViewerFlag {
                work_id,
                principal,
                allowed,
            } => {
                self.viewer_flags.insert((work_id, principal), allowed);
            }
            WriteOp::PutActivity { principal, record } => {
                self.activity.insert(principal, record);
            }
            WriteOp::SetPlatform(state) => self.platform = state,
            WriteOp::PutPending { key, operation } => {
                self.pending.insert(key, operation);
            }
            WriteOp::SetLastSequence(value) => self.last_sequence = value,
        }
    }
}

/// In-memory registry storage adapter.
#[derive(Debug, Default)]
pub struct InMemoryRegistryStorage {
    state: RwLock<RegistryState>,
}

impl InMemoryRegistryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from a snapshot taken with [`snapshot`](Self::snapshot).
    pub fn from_snapshot(snapshot: RegistrySnapshot) -> Self {
        let state = RegistryState {
            works: snapshot
                .works
                .into_iter()
                .map(|record| (record.work_id, record))
                .collect(),
            integrity: snapshot.integrity.into_iter().collect(),
            grants: snapshot
                .grants
                .into_iter()
                .map(|(work_id, principal, grant)| ((work_id, principal), grant))
                .collect(),
            viewer_flags: snapshot
                .viewer_flags
                .into_iter()
                .map(|(work_id, principal, allowed)| ((work_id, principal), allowed))
                .collect(),
            activity: snapshot.activity.into_iter().collect(),
            platform: snapshot.platform,
            pending: snapshot.pending.into_iter().collect(),
            last_work_id: snapshot.last_work_id,
            last_sequence: snapshot.last_sequence,
            journal: snapshot.journal,
        };
        Self {
            state: RwLock::new(state),
        }
    }

    /// Copy the entire state out, with every collection in key order.
    pub fn snapshot(&self) -> StorageResult<RegistrySnapshot> {
        let state = self.read()?;

        let mut works: Vec<_> = state.works.values().cloned().collect();
        works.sort_by_key(|record| record.work_id);
        let mut integrity: Vec<_> = state
            .integrity
            .iter()
            .map(|(id, record)| (*id, record.clone()))
            .collect();
        integrity.sort_by_key(|(id, _)| *id);
        let mut grants: Vec<_> = state
            .grants
            .iter()
            .map(|((id, principal), grant)| (*id, principal.clone(), grant.clone()))
            .collect();
        grants.sort_by(|a, b| (a.0, &a.1).cmp(&(b.0, &b.1)));
        let mut viewer_flags: Vec<_> = state
            .viewer_flags
            .iter()
            .map(|((id, principal), allowed)| (*id, principal.clone(), *allowed))
            .collect();
        viewer_flags.sort_by(|a, b| (a.0, &a.1).cmp(&(b.0, &b.1)));
        let mut activity: Vec<_> = state
            .activity
            .iter()
            .map(|(principal, record)| (principal.clone(), *record))
            .collect();
        activity.sort_by(|a, b| a.0.cmp(&b.0));
        let mut pending: Vec<_> = state
            .pending
            .iter()
            .map(|(key, op)| (*key, op.clone()))
            .collect();
        pending.sort_by_key(|(key, _)| *key);

        Ok(RegistrySnapshot {
            works,
            integrity,
            grants,
            viewer_flags,
            activity,
            platform: state.platform.clone(),
            pending,
            last_work_id: state.last_work_id,
            last_sequence: state.last_sequence,
            journal: state.journal.clone(),
        })
    }

    fn read(&self) -> StorageResult<RwLockReadGuard<'_, RegistryState>> {
        self.state
            .read()
            .map_err(|_| StorageError::Backend("registry lock poisoned".to_string()))
    }

    fn write(&self) -> StorageResult<RwLockWriteGuard<'_, RegistryState>> {
        self.state
            .write()
            .map_err(|_| StorageError::Backend("registry lock poisoned".to_string()))
    }
}

impl WorkStore for InMemoryRegistryStorage {
    fn get_work(&self, work_id: WorkId) -> StorageResult<Option<WorkRecord>> {
        Ok(self.read()?.works.get(&work_id).cloned())
    }

    fn last_work_id(&self) -> StorageResult<u64> {
        Ok(self.read()?.last_work_id)
    }
}

impl IntegrityStore for InMemoryRegistryStorage {
    fn get_integrity(&self, work_id: WorkId) -> StorageResult<Option<IntegrityRecord>> {
        Ok(self.read()?.integrity.get(&work_id).cloned())
    }
}

impl AccessStore for InMemoryRegistryStorage {
    fn get_grant(
        &self,
        work_id: WorkId,
        principal: &Principal,
    ) -> StorageResult<Option<AccessGrant>> {
        Ok(self
            .read()?
            .grants
            .get(&(work_id, principal.clone()))
            .cloned())
    }

    fn get_viewer_flag(&self, work_id: WorkId, principal: &Principal) -> StorageResult<Option<bool>> {
        Ok(self
            .read()?
            .viewer_flags
            .get(&(work_id, principal.clone()))
            .copied())
    }
}

impl ActivityStore for InMemoryRegistryStorage {
    fn get_activity(&self, principal: &Principal) -> StorageResult<Option<ActivityRecord>> {
        Ok(self.read()?.activity.get(principal).copied())
    }
}

impl PlatformStore for InMemoryRegistryStorage {
    fn get_platform(&self) -> StorageResult<PlatformState> {
        Ok(self.read()?.platform.clone())
    }
}

impl PendingStore for InMemoryRegistryStorage {
    fn get_pending(&self, key: PendingKey) -> StorageResult<Option<PendingOperation>> {
        Ok(self.read()?.pending.get(&key).cloned())
    }

    fn last_sequence(&self) -> StorageResult<u64> {
        Ok(self.read()?.last_sequence)
    }
}

impl JournalStore for InMemoryRegistryStorage {
    fn list_journal(&self, window: QueryWindow) -> StorageResult<Vec<JournalRecord>> {
        let mut values = self.read()?.journal.clone();
        values.reverse();
        Ok(apply_window(values, window))
    }

    fn journal_chain(&self) -> StorageResult<Vec<JournalRecord>> {
        Ok(self.read()?.journal.clone())
    }

    fn latest_journal_hash(&self) -> StorageResult<Option<String>> {
        Ok(self.read()?.journal.last().map(|r| r.hash.clone()))
    }
}

impl BatchWriter for InMemoryRegistryStorage {
    fn apply(&self, batch: WriteBatch) -> StorageResult<Option<JournalRecord>> {
        let mut state = self.write()?;
        state.precheck(&batch.ops)?;

        let journal = match batch.journal {
            Some(entry) => Some(state.chain(entry)?),
            None => None,
        };

        for op in batch.ops {
            state.apply_op(op);
        }
        if let Some(record) = &journal {
            state.journal.push(record.clone());
        }
        Ok(journal)
    }
}

fn apply_window<T>(items: Vec<T>, window: QueryWindow) -> Vec<T> {
    let iter = items.into_iter().skip(window.offset);
    if window.limit == 0 {
        iter.collect()
    } else {
        iter.take(window.limit).collect()
    }
}
