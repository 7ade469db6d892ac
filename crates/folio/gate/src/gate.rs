use std::sync::Arc;

use folio_access::AccessControlMatrix;
use folio_integrity::IntegrityLedger;
use folio_limiter::ActivityMonitor;
use folio_records::RecordStore;
use folio_storage::{
    verify_chain, ChainVerification, HeightClock, JournalAction, JournalAppend, JournalRecord,
    QueryWindow, RegistryStorage, WriteBatch,
};
use folio_types::{
    AccessGrant, ActivityRecord, Fingerprint, Height, IntegrityRecord, PendingKey,
    PendingOperation, PermissionTier, PlatformState, Principal, RegistryError, RegistryResult,
    WorkDraft, WorkId, WorkRecord, WorkUpdate,
};
use tracing::{debug, info, warn};

use crate::config::RegistryConfig;
use crate::pending::PendingOperations;
use crate::platform::PlatformSwitch;

/// The Policy Gate.
///
/// Every mutating request passes through here. Checks run in a fixed order
/// and stop at the first failure:
///
/// 1. platform operational
/// 2. rate limit (protected registration only)
/// 3. existence and ownership
/// 4. field validation
///
/// Only then is a single `WriteBatch` committed, holding the mutation, any
/// counter advance and its journal entry. A failed request writes nothing.
pub struct PolicyGate {
    storage: Arc<dyn RegistryStorage>,
    clock: Arc<dyn HeightClock>,
    config: RegistryConfig,
    platform: PlatformSwitch,
    records: RecordStore,
    access: AccessControlMatrix,
    activity: ActivityMonitor,
    integrity: IntegrityLedger,
    pending: PendingOperations,
}

impl PolicyGate {
    pub fn new(
        storage: Arc<dyn RegistryStorage>,
        clock: Arc<dyn HeightClock>,
        config: RegistryConfig,
    ) -> Self {
        Self {
            platform: PlatformSwitch::new(Arc::clone(&storage), config.supervisor.clone()),
            records: RecordStore::new(Arc::clone(&storage)),
            access: AccessControlMatrix::new(Arc::clone(&storage)),
            activity: ActivityMonitor::new(Arc::clone(&storage), config.rate_limit),
            integrity: IntegrityLedger::new(Arc::clone(&storage)),
            pending: PendingOperations::new(Arc::clone(&storage), config.pending.expiry),
            storage,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn current_height(&self) -> Height {
        self.clock.current_height()
    }

    // ── Mutations ──────────────────────────────────────────────────────

    /// Register a work owned by `caller`. Not rate limited.
    pub fn register_work(&mut self, caller: &Principal, draft: WorkDraft) -> RegistryResult<WorkId> {
        let result = self.register(caller, draft, false);
        self.observe("register_work", caller, result)
    }

    /// Register a work after the caller's activity window admits it.
    pub fn protected_register_work(
        &mut self,
        caller: &Principal,
        draft: WorkDraft,
    ) -> RegistryResult<WorkId> {
        let result = self.register(caller, draft, true);
        self.observe("protected_register_work", caller, result)
    }

    pub fn transfer_ownership(
        &mut self,
        caller: &Principal,
        work_id: WorkId,
        new_creator: &Principal,
    ) -> RegistryResult<WorkRecord> {
        let result = self.transfer(caller, work_id, new_creator);
        self.observe("transfer_ownership", caller, result)
    }

    /// Remove a work together with its integrity record and access entries.
    pub fn unregister_work(&mut self, caller: &Principal, work_id: WorkId) -> RegistryResult<()> {
        let result = self.unregister(caller, work_id);
        self.observe("unregister_work", caller, result)
    }

    pub fn update_work(
        &mut self,
        caller: &Principal,
        work_id: WorkId,
        patch: WorkUpdate,
    ) -> RegistryResult<WorkRecord> {
        let result = self.update(caller, work_id, patch);
        self.observe("update_work", caller, result)
    }

    /// Supervisor only. Allowed while already suspended; the explanation is replaced.
    pub fn suspend_platform(
        &mut self,
        caller: &Principal,
        explanation: &str,
    ) -> RegistryResult<PlatformState> {
        let result = self.suspend(caller, explanation);
        self.observe("suspend_platform", caller, result)
    }

    /// Supervisor only. Clears the suspension explanation.
    pub fn resume_platform(&mut self, caller: &Principal) -> RegistryResult<PlatformState> {
        let result = self.resume(caller);
        self.observe("resume_platform", caller, result)
    }

    /// Record a transfer request awaiting verification. Returns its sequence number.
    pub fn initiate_verified_transfer(
        &mut self,
        caller: &Principal,
        work_id: WorkId,
        destination: Option<Principal>,
    ) -> RegistryResult<u64> {
        let result = self.request_transfer(caller, work_id, destination);
        self.observe("initiate_verified_transfer", caller, result)
    }

    /// Upsert `participant`'s tier on `work_id`. `tier` is the raw ordinal 0..=3.
    pub fn assign_access_tier(
        &mut self,
        caller: &Principal,
        work_id: WorkId,
        participant: &Principal,
        tier: u8,
    ) -> RegistryResult<AccessGrant> {
        let result = self.assign(caller, work_id, participant, tier);
        self.observe("assign_access_tier", caller, result)
    }

    pub fn register_integrity_hash(
        &mut self,
        caller: &Principal,
        work_id: WorkId,
        fingerprint: Fingerprint,
        algorithm: &str,
    ) -> RegistryResult<IntegrityRecord> {
        let result = self.commit_fingerprint(caller, work_id, fingerprint, algorithm);
        self.observe("register_integrity_hash", caller, result)
    }

    // ── Reads ──────────────────────────────────────────────────────────

    /// Succeeds iff `candidate` equals the committed fingerprint.
    pub fn verify_work_integrity(
        &self,
        work_id: WorkId,
        candidate: &Fingerprint,
    ) -> RegistryResult<()> {
        if self.integrity.verify(work_id, candidate)? {
            debug!(work_id = %work_id, "Integrity verified");
            Ok(())
        } else {
            warn!(work_id = %work_id, "Integrity mismatch");
            Err(RegistryError::IntegrityMismatch(work_id))
        }
    }

    pub fn get_work(&self, work_id: WorkId) -> RegistryResult<WorkRecord> {
        self.records.require(work_id)
    }

    /// Whether `participant` holds at least tier `required` (0..=3) on `work_id`.
    pub fn check_access(
        &self,
        work_id: WorkId,
        participant: &Principal,
        required: u8,
    ) -> RegistryResult<bool> {
        let required = PermissionTier::try_from(required)?;
        self.access.check(work_id, participant, required)
    }

    pub fn can_view(&self, work_id: WorkId, principal: &Principal) -> RegistryResult<bool> {
        self.access.can_view(work_id, principal)
    }

    pub fn get_integrity_record(&self, work_id: WorkId) -> RegistryResult<Option<IntegrityRecord>> {
        self.integrity.record_of(work_id)
    }

    pub fn get_access_grant(
        &self,
        work_id: WorkId,
        principal: &Principal,
    ) -> RegistryResult<Option<AccessGrant>> {
        self.access.grant_of(work_id, principal)
    }

    pub fn get_pending_operation(
        &self,
        sequence: u64,
        work_id: WorkId,
    ) -> RegistryResult<Option<PendingOperation>> {
        self.pending.get(PendingKey { sequence, work_id })
    }

    pub fn platform_status(&self) -> RegistryResult<PlatformState> {
        self.platform.status()
    }

    /// Identifiers allocated so far.
    pub fn work_count(&self) -> RegistryResult<u64> {
        self.records.work_count()
    }

    pub fn activity_of(&self, principal: &Principal) -> RegistryResult<ActivityRecord> {
        self.activity.activity_of(principal)
    }

    /// Journal entries, newest first.
    pub fn journal(&self, window: QueryWindow) -> RegistryResult<Vec<JournalRecord>> {
        Ok(self.storage.list_journal(window)?)
    }

    pub fn verify_journal(&self) -> RegistryResult<ChainVerification> {
        let chain = self.storage.journal_chain()?;
        Ok(verify_chain(&chain)?)
    }

    // ── Internals ──────────────────────────────────────────────────────

    fn register(
        &self,
        caller: &Principal,
        draft: WorkDraft,
        rate_limited: bool,
    ) -> RegistryResult<WorkId> {
        let height = self.current_height();
        self.platform.ensure_operational()?;

        let mut batch = WriteBatch::new();
        if rate_limited {
            let activity = self.activity.admit(caller, height)?.stage_into(&mut batch);
            debug!(principal = %caller, count = activity.count, "Rate limit admitted");
        }
        let record = self
            .records
            .register(caller, draft, height)?
            .stage_into(&mut batch);

        let action = JournalAction::WorkRegistered {
            work_id: record.work_id,
            rate_limited,
        };
        self.commit(batch, height, caller, action)?;
        info!(
            work_id = %record.work_id,
            creator = %caller,
            name = %record.name,
            rate_limited,
            "Work registered"
        );
        Ok(record.work_id)
    }

    fn transfer(
        &self,
        caller: &Principal,
        work_id: WorkId,
        new_creator: &Principal,
    ) -> RegistryResult<WorkRecord> {
        let height = self.current_height();
        self.platform.ensure_operational()?;

        let mut batch = WriteBatch::new();
        let record = self
            .records
            .transfer(caller, work_id, new_creator)?
            .stage_into(&mut batch);

        let action = JournalAction::OwnershipTransferred {
            work_id,
            from: caller.clone(),
            to: new_creator.clone(),
        };
        self.commit(batch, height, caller, action)?;
        info!(work_id = %work_id, from = %caller, to = %new_creator, "Ownership transferred");
        Ok(record)
    }

    fn unregister(&self, caller: &Principal, work_id: WorkId) -> RegistryResult<()> {
        let height = self.current_height();
        self.platform.ensure_operational()?;

        let mut batch = WriteBatch::new();
        self.records.delete(caller, work_id)?.stage_into(&mut batch);

        self.commit(batch, height, caller, JournalAction::WorkUnregistered { work_id })?;
        info!(work_id = %work_id, creator = %caller, "Work unregistered");
        Ok(())
    }

    fn update(
        &self,
        caller: &Principal,
        work_id: WorkId,
        patch: WorkUpdate,
    ) -> RegistryResult<WorkRecord> {
        let height = self.current_height();
        self.platform.ensure_operational()?;

        let mut batch = WriteBatch::new();
        let record = self
            .records
            .update(caller, work_id, patch)?
            .stage_into(&mut batch);

        self.commit(batch, height, caller, JournalAction::WorkUpdated { work_id })?;
        info!(work_id = %work_id, creator = %caller, "Work updated");
        Ok(record)
    }

    fn suspend(&self, caller: &Principal, explanation: &str) -> RegistryResult<PlatformState> {
        let height = self.current_height();
        let mut batch = WriteBatch::new();
        let state = self
            .platform
            .suspend(caller, explanation)?
            .stage_into(&mut batch);

        let action = JournalAction::PlatformSuspended {
            explanation: explanation.to_string(),
        };
        self.commit(batch, height, caller, action)?;
        warn!(supervisor = %caller, explanation = %explanation, "Platform suspended");
        Ok(state)
    }

    fn resume(&self, caller: &Principal) -> RegistryResult<PlatformState> {
        let height = self.current_height();
        let mut batch = WriteBatch::new();
        let state = self.platform.resume(caller)?.stage_into(&mut batch);

        self.commit(batch, height, caller, JournalAction::PlatformResumed)?;
        info!(supervisor = %caller, "Platform resumed");
        Ok(state)
    }

    fn request_transfer(
        &self,
        caller: &Principal,
        work_id: WorkId,
        destination: Option<Principal>,
    ) -> RegistryResult<u64> {
        let height = self.current_height();
        self.platform.ensure_operational()?;
        self.records.require_creator(work_id, caller)?;

        let mut batch = WriteBatch::new();
        let (key, operation) = self
            .pending
            .request_transfer(caller, work_id, destination, height)?
            .stage_into(&mut batch);

        let action = JournalAction::VerifiedTransferInitiated {
            sequence: key.sequence,
            work_id,
            destination: operation.destination.clone(),
        };
        self.commit(batch, height, caller, action)?;
        info!(
            sequence = key.sequence,
            work_id = %work_id,
            expires_at = operation.expires_at,
            "Verified transfer initiated"
        );
        Ok(key.sequence)
    }

    fn assign(
        &self,
        caller: &Principal,
        work_id: WorkId,
        participant: &Principal,
        tier: u8,
    ) -> RegistryResult<AccessGrant> {
        let height = self.current_height();
        self.platform.ensure_operational()?;

        let mut batch = WriteBatch::new();
        let grant = self
            .access
            .grant(caller, work_id, participant, tier, height)?
            .stage_into(&mut batch);

        let action = JournalAction::AccessTierAssigned {
            work_id,
            participant: participant.clone(),
            tier: grant.tier,
        };
        self.commit(batch, height, caller, action)?;
        info!(work_id = %work_id, participant = %participant, tier = %grant.tier, "Access tier assigned");
        Ok(grant)
    }

    fn commit_fingerprint(
        &self,
        caller: &Principal,
        work_id: WorkId,
        fingerprint: Fingerprint,
        algorithm: &str,
    ) -> RegistryResult<IntegrityRecord> {
        let height = self.current_height();
        self.platform.ensure_operational()?;

        let mut batch = WriteBatch::new();
        let record = self
            .integrity
            .register_fingerprint(caller, work_id, fingerprint, algorithm, height)?
            .stage_into(&mut batch);

        let action = JournalAction::IntegrityRegistered {
            work_id,
            algorithm: record.algorithm,
            fingerprint: record.fingerprint.to_hex(),
        };
        self.commit(batch, height, caller, action)?;
        info!(work_id = %work_id, algorithm = %record.algorithm, "Integrity hash registered");
        Ok(record)
    }

    fn commit(
        &self,
        batch: WriteBatch,
        height: Height,
        actor: &Principal,
        action: JournalAction,
    ) -> RegistryResult<()> {
        let batch = batch.journaled(JournalAppend::new(height, actor.clone(), action));
        if let Some(entry) = self.storage.apply(batch)? {
            debug!(sequence = entry.sequence, hash = %entry.hash, "Batch committed");
        }
        Ok(())
    }

    fn observe<T>(
        &self,
        operation: &'static str,
        caller: &Principal,
        result: RegistryResult<T>,
    ) -> RegistryResult<T> {
        if let Err(err) = &result {
            warn!(
                operation,
                caller = %caller,
                kind = ?err.kind(),
                error = %err,
                "Request denied"
            );
        }
        result
    }
}
