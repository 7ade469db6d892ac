//! Folio Access - the access control matrix.
//!
//! Two independent mechanisms are kept side by side:
//! - tiered grants per (work, principal): none < view < edit < full
//! - a binary viewer flag per (work, principal), seeded for the creator
//!
//! The creator is not a tier. `check` short-circuits on the creator identity
//! before ever looking at the grant table.

#![deny(unsafe_code)]

use folio_records::RecordStore;
use folio_storage::{RegistryStorage, Staged, WriteOp};
use folio_types::{
    AccessGrant, Height, PermissionTier, Principal, RegistryResult, WorkId, WorkRecord,
};
use std::sync::Arc;
use tracing::debug;

/// Per-work permission table.
pub struct AccessControlMatrix {
    storage: Arc<dyn RegistryStorage>,
    records: RecordStore,
}

impl AccessControlMatrix {
    pub fn new(storage: Arc<dyn RegistryStorage>) -> Self {
        Self {
            records: RecordStore::new(Arc::clone(&storage)),
            storage,
        }
    }

    /// Stage an upsert of `participant`'s tier on `work_id`.
    ///
    /// Only the current creator may grant. `tier` is the raw ordinal so that
    /// out-of-range requests surface as `InvalidTier`.
    pub fn grant(
        &self,
        caller: &Principal,
        work_id: WorkId,
        participant: &Principal,
        tier: u8,
        height: Height,
    ) -> RegistryResult<Staged<AccessGrant>> {
        self.records.require_creator(work_id, caller)?;
        let tier = PermissionTier::try_from(tier)?;

        let grant = AccessGrant {
            tier,
            granted_by: caller.clone(),
            granted_at: height,
        };
        debug!(work_id = %work_id, participant = %participant, tier = %tier, "Staged access grant");

        let op = WriteOp::PutGrant {
            work_id,
            principal: participant.clone(),
            grant: grant.clone(),
        };
        Ok(Staged::new(grant, vec![op]))
    }

    /// Whether `participant` holds at least `required` on `work_id`.
    ///
    /// Creator: always. Others: a stored grant with `tier >= required`.
    /// Unknown work: never. Reads only.
    pub fn check(
        &self,
        work_id: WorkId,
        participant: &Principal,
        required: PermissionTier,
    ) -> RegistryResult<bool> {
        let Some(record) = self.records.get(work_id)? else {
            return Ok(false);
        };
        if record.creator == *participant {
            return Ok(true);
        }
        self.tier_at_least(&record, participant, required)
    }

    /// Unified read gate: creator > tiered grant (view or better) > viewer flag > deny.
    pub fn can_view(&self, work_id: WorkId, principal: &Principal) -> RegistryResult<bool> {
        let Some(record) = self.records.get(work_id)? else {
            return Ok(false);
        };
        if record.creator == *principal {
            return Ok(true);
        }
        if self.tier_at_least(&record, principal, PermissionTier::View)? {
            return Ok(true);
        }
        Ok(self
            .storage
            .get_viewer_flag(work_id, principal)?
            .unwrap_or(false))
    }

    pub fn grant_of(
        &self,
        work_id: WorkId,
        principal: &Principal,
    ) -> RegistryResult<Option<AccessGrant>> {
        Ok(self.storage.get_grant(work_id, principal)?)
    }

    pub fn viewer_flag(&self, work_id: WorkId, principal: &Principal) -> RegistryResult<bool> {
        Ok(self
            .storage
            .get_viewer_flag(work_id, principal)?
            .unwrap_or(false))
    }

    fn tier_at_least(
        &self,
        record: &WorkRecord,
        principal: &Principal,
        required: PermissionTier,
    ) -> RegistryResult<bool> {
        Ok(self
            .storage
            .get_grant(record.work_id, principal)?
            .is_some_and(|grant| grant.tier >= required))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_storage::{BatchWriter, InMemoryRegistryStorage, WriteBatch};
    use folio_types::{RegistryError, WorkDraft};

    struct Fixture {
        storage: Arc<InMemoryRegistryStorage>,
        matrix: AccessControlMatrix,
        work_id: WorkId,
        alice: Principal,
        bob: Principal,
    }

    fn commit<T>(storage: &InMemoryRegistryStorage, staged: Staged<T>) -> T {
        let mut batch = WriteBatch::new();
        let value = staged.stage_into(&mut batch);
        storage.apply(batch).unwrap();
        value
    }

    fn fixture() -> Fixture {
        let storage = Arc::new(InMemoryRegistryStorage::new());
        let records = RecordStore::new(storage.clone());
        let alice = Principal::new("alice");
        let draft = WorkDraft::new("Sunset", 2048, "A painting", vec!["art".to_string()]);
        let work = commit(&storage, records.register(&alice, draft, 100).unwrap());
        Fixture {
            matrix: AccessControlMatrix::new(storage.clone()),
            storage,
            work_id: work.work_id,
            alice,
            bob: Principal::new("bob"),
        }
    }

    #[test]
    fn creator_passes_every_tier_without_a_grant() {
        let f = fixture();
        assert!(f.matrix.check(f.work_id, &f.alice, PermissionTier::Full).unwrap());
        assert!(f.matrix.grant_of(f.work_id, &f.alice).unwrap().is_none());
    }

    #[test]
    fn absent_grant_means_none() {
        let f = fixture();
        // No stored grant: even the lowest tier is not held.
        assert!(!f.matrix.check(f.work_id, &f.bob, PermissionTier::None).unwrap());
        assert!(!f.matrix.check(f.work_id, &f.bob, PermissionTier::View).unwrap());
    }

    #[test]
    fn grant_satisfies_lower_and_equal_tiers() {
        let f = fixture();
        commit(
            &f.storage,
            f.matrix.grant(&f.alice, f.work_id, &f.bob, 2, 101).unwrap(),
        );

        assert!(f.matrix.check(f.work_id, &f.bob, PermissionTier::View).unwrap());
        assert!(f.matrix.check(f.work_id, &f.bob, PermissionTier::Edit).unwrap());
        assert!(!f.matrix.check(f.work_id, &f.bob, PermissionTier::Full).unwrap());

        let grant = f.matrix.grant_of(f.work_id, &f.bob).unwrap().unwrap();
        assert_eq!(grant.granted_by, f.alice);
        assert_eq!(grant.granted_at, 101);
    }

    #[test]
    fn regrant_overwrites() {
        let f = fixture();
        commit(&f.storage, f.matrix.grant(&f.alice, f.work_id, &f.bob, 3, 101).unwrap());
        commit(&f.storage, f.matrix.grant(&f.alice, f.work_id, &f.bob, 1, 102).unwrap());
        assert!(!f.matrix.check(f.work_id, &f.bob, PermissionTier::Edit).unwrap());
    }

    #[test]
    fn only_creator_may_grant() {
        let f = fixture();
        let err = f
            .matrix
            .grant(&f.bob, f.work_id, &f.bob, 3, 101)
            .unwrap_err();
        assert!(matches!(err, RegistryError::Ownership { .. }));
    }

    #[test]
    fn tier_above_full_is_invalid() {
        let f = fixture();
        let err = f
            .matrix
            .grant(&f.alice, f.work_id, &f.bob, 4, 101)
            .unwrap_err();
        assert_eq!(err, RegistryError::InvalidTier(4));
    }

    #[test]
    fn unknown_work_checks_false() {
        let f = fixture();
        assert!(!f.matrix.check(WorkId(99), &f.alice, PermissionTier::None).unwrap());
        assert!(matches!(
            f.matrix.grant(&f.alice, WorkId(99), &f.bob, 1, 101),
            Err(RegistryError::NotFound(_))
        ));
    }

    #[test]
    fn can_view_precedence() {
        let f = fixture();
        let carol = Principal::new("carol");
        let dave = Principal::new("dave");

        // Creator flag is seeded at registration.
        assert!(f.matrix.viewer_flag(f.work_id, &f.alice).unwrap());
        assert!(f.matrix.can_view(f.work_id, &f.alice).unwrap());

        commit(&f.storage, f.matrix.grant(&f.alice, f.work_id, &f.bob, 1, 101).unwrap());
        assert!(f.matrix.can_view(f.work_id, &f.bob).unwrap());

        f.storage
            .apply(WriteBatch::new().with(WriteOp::PutViewerFlag {
                work_id: f.work_id,
                principal: carol.clone(),
                allowed: true,
            }))
            .unwrap();
        assert!(f.matrix.can_view(f.work_id, &carol).unwrap());

        assert!(!f.matrix.can_view(f.work_id, &dave).unwrap());
    }
}
