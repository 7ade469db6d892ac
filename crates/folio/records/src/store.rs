use crate::validation::{
    validate_categories, validate_draft, validate_name, validate_size, validate_synopsis,
};
use folio_storage::{RegistryStorage, Staged, WriteOp};
use folio_types::{
    Height, Principal, RegistryError, RegistryResult, WorkDraft, WorkId, WorkRecord, WorkUpdate,
};
use std::sync::Arc;
use tracing::debug;

/// Creator-scoped view over stored work records.
pub struct RecordStore {
    storage: Arc<dyn RegistryStorage>,
}

impl RecordStore {
    pub fn new(storage: Arc<dyn RegistryStorage>) -> Self {
        Self { storage }
    }

    pub fn get(&self, work_id: WorkId) -> RegistryResult<Option<WorkRecord>> {
        Ok(self.storage.get_work(work_id)?)
    }

    /// Number of identifiers allocated so far; deletions do not lower it.
    pub fn work_count(&self) -> RegistryResult<u64> {
        Ok(self.storage.last_work_id()?)
    }

    pub fn require(&self, work_id: WorkId) -> RegistryResult<WorkRecord> {
        self.get(work_id)?.ok_or(RegistryError::NotFound(work_id))
    }

    /// Load a work and confirm `caller` is its current creator.
    pub fn require_creator(&self, work_id: WorkId, caller: &Principal) -> RegistryResult<WorkRecord> {
        let record = self.require(work_id)?;
        if &record.creator != caller {
            return Err(RegistryError::Ownership {
                work_id,
                caller: caller.clone(),
            });
        }
        Ok(record)
    }

    /// Stage a new registration owned by `creator`.
    ///
    /// Allocates counter + 1; the counter only moves when the batch commits.
    pub fn register(
        &self,
        creator: &Principal,
        draft: WorkDraft,
        height: Height,
    ) -> RegistryResult<Staged<WorkRecord>> {
        validate_draft(&draft)?;

        let work_id = WorkId(self.storage.last_work_id()?).next();
        let record = WorkRecord {
            work_id,
            name: draft.name,
            creator: creator.clone(),
            size: draft.size,
            synopsis: draft.synopsis,
            categories: draft.categories,
            registered_at: height,
        };
        debug!(work_id = %work_id, creator = %creator, "Staged work registration");

        let ops = vec![
            WriteOp::SetLastWorkId(work_id.value()),
            WriteOp::PutWork(record.clone()),
            WriteOp::PutViewerFlag {
                work_id,
                principal: creator.clone(),
                allowed: true,
            },
        ];
        Ok(Staged::new(record, ops))
    }

    /// Stage a metadata patch. Ownership is checked before any field.
    pub fn update(
        &self,
        caller: &Principal,
        work_id: WorkId,
        patch: WorkUpdate,
    ) -> RegistryResult<Staged<WorkRecord>> {
        let mut record = self.require_creator(work_id, caller)?;
        if patch.is_empty() {
            return Err(RegistryError::validation("update", "no fields to update"));
        }

        if let Some(name) = patch.name {
            validate_name(&name)?;
            record.name = name;
        }
        if let Some(size) = patch.size {
            validate_size(size)?;
            record.size = size;
        }
        if let Some(synopsis) = patch.synopsis {
            validate_synopsis(&synopsis)?;
            record.synopsis = synopsis;
        }
        if let Some(categories) = patch.categories {
            validate_categories(&categories)?;
            record.categories = categories;
        }

        Ok(Staged::new(record.clone(), vec![WriteOp::PutWork(record)]))
    }

    /// Stage a creator change.
    ///
    /// The viewer flag follows the creator: the previous creator's flag is
    /// cleared and the new creator's is set.
    pub fn transfer(
        &self,
        caller: &Principal,
        work_id: WorkId,
        new_creator: &Principal,
    ) -> RegistryResult<Staged<WorkRecord>> {
        let mut record = self.require_creator(work_id, caller)?;
        record.creator = new_creator.clone();

        let ops = vec![
            WriteOp::PutWork(record.clone()),
            WriteOp::PutViewerFlag {
                work_id,
                principal: caller.clone(),
                allowed: false,
            },
            WriteOp::PutViewerFlag {
                work_id,
                principal: new_creator.clone(),
                allowed: true,
            },
        ];
        Ok(Staged::new(record, ops))
    }

    /// Stage removal of a work and everything keyed by it.
    pub fn delete(&self, caller: &Principal, work_id: WorkId) -> RegistryResult<Staged<WorkRecord>> {
        let record = self.require_creator(work_id, caller)?;
        Ok(Staged::new(record, vec![WriteOp::RemoveWork(work_id)]))
    }
}
