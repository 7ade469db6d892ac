//! End-to-end flows through the policy gate.

use std::sync::Arc;

use folio_gate::{PolicyGate, RegistryConfig};
use folio_integrity::compute_fingerprint;
use folio_storage::{
    BatchWriter, InMemoryRegistryStorage, JournalAction, ManualClock, QueryWindow, WriteBatch,
    WriteOp,
};
use folio_types::{
    ErrorKind, Fingerprint, HashAlgorithm, PermissionTier, Principal, RegistryError, WorkDraft,
    WorkId, WorkUpdate,
};
use proptest::prelude::*;

struct Harness {
    storage: Arc<InMemoryRegistryStorage>,
    clock: Arc<ManualClock>,
    gate: PolicyGate,
    root: Principal,
    alice: Principal,
    bob: Principal,
}

fn harness() -> Harness {
    let storage = Arc::new(InMemoryRegistryStorage::new());
    let clock = Arc::new(ManualClock::new(500));
    let gate = PolicyGate::new(
        storage.clone(),
        clock.clone(),
        RegistryConfig::with_supervisor("root"),
    );
    Harness {
        storage,
        clock,
        gate,
        root: Principal::new("root"),
        alice: Principal::new("alice"),
        bob: Principal::new("bob"),
    }
}

fn sunset() -> WorkDraft {
    WorkDraft::new("Sunset", 2048, "A painting", vec!["art".to_string()])
}

fn kind<T: std::fmt::Debug>(result: Result<T, RegistryError>) -> ErrorKind {
    result.unwrap_err().kind()
}

#[test]
fn register_transfer_and_lose_ownership() {
    let mut h = harness();

    let id = h.gate.register_work(&h.alice, sunset()).unwrap();
    assert_eq!(id, WorkId(1));

    let record = h.gate.get_work(id).unwrap();
    assert_eq!(record.name, "Sunset");
    assert_eq!(record.size, 2048);
    assert_eq!(record.creator, h.alice);
    assert_eq!(record.registered_at, 500);

    h.gate.transfer_ownership(&h.alice, id, &h.bob).unwrap();
    assert_eq!(h.gate.get_work(id).unwrap().creator, h.bob);

    let carol = Principal::new("carol");
    assert_eq!(
        kind(h.gate.transfer_ownership(&h.alice, id, &carol)),
        ErrorKind::Ownership
    );
}

#[test]
fn creator_only_mutations() {
    let mut h = harness();
    let id = h.gate.register_work(&h.alice, sunset()).unwrap();
    let fp = Fingerprint([7; 32]);
    let mallory = Principal::new("mallory");

    let patch = WorkUpdate::default().with_name("Dusk");
    assert_eq!(
        kind(h.gate.update_work(&mallory, id, patch.clone())),
        ErrorKind::Ownership
    );
    assert_eq!(
        kind(h.gate.assign_access_tier(&mallory, id, &mallory, 3)),
        ErrorKind::Ownership
    );
    assert_eq!(
        kind(h.gate.register_integrity_hash(&mallory, id, fp, "sha256")),
        ErrorKind::Ownership
    );
    assert_eq!(
        kind(h.gate.initiate_verified_transfer(&mallory, id, None)),
        ErrorKind::Ownership
    );
    assert_eq!(
        kind(h.gate.unregister_work(&mallory, id)),
        ErrorKind::Ownership
    );

    assert_eq!(h.gate.update_work(&h.alice, id, patch).unwrap().name, "Dusk");
    h.gate.assign_access_tier(&h.alice, id, &h.bob, 2).unwrap();
    h.gate.register_integrity_hash(&h.alice, id, fp, "sha256").unwrap();
    h.gate.initiate_verified_transfer(&h.alice, id, None).unwrap();
    h.gate.unregister_work(&h.alice, id).unwrap();
    assert_eq!(kind(h.gate.get_work(id)), ErrorKind::NotFound);
}

#[test]
fn unknown_work_is_not_found() {
    let mut h = harness();
    let missing = WorkId(9);
    assert_eq!(kind(h.gate.get_work(missing)), ErrorKind::NotFound);
    assert_eq!(
        kind(h.gate.transfer_ownership(&h.alice, missing, &h.bob)),
        ErrorKind::NotFound
    );
    assert_eq!(
        kind(h.gate.register_integrity_hash(&h.alice, missing, Fingerprint([0; 32]), "sha256")),
        ErrorKind::NotFound
    );
    assert!(!h.gate.check_access(missing, &h.alice, 0).unwrap());
}

#[test]
fn integrity_roundtrip_and_mismatch() {
    let mut h = harness();
    let id = h.gate.register_work(&h.alice, sunset()).unwrap();
    let digest = compute_fingerprint(HashAlgorithm::Sha256, b"sunset.png bytes");

    assert_eq!(
        kind(h.gate.verify_work_integrity(id, &digest)),
        ErrorKind::NoIntegrityRecord
    );

    h.gate
        .register_integrity_hash(&h.alice, id, digest, "sha256")
        .unwrap();
    h.gate.verify_work_integrity(id, &digest).unwrap();

    let tampered = compute_fingerprint(HashAlgorithm::Sha256, b"sunset.png bytes!");
    assert_eq!(
        h.gate.verify_work_integrity(id, &tampered),
        Err(RegistryError::IntegrityMismatch(id))
    );

    assert_eq!(
        kind(h.gate.register_integrity_hash(&h.alice, id, digest, "md5")),
        ErrorKind::UnsupportedAlgorithm
    );
    let record = h.gate.get_integrity_record(id).unwrap().unwrap();
    assert_eq!(record.algorithm, HashAlgorithm::Sha256);
}

#[test]
fn protected_registration_window() {
    let mut h = harness();

    for _ in 0..10 {
        h.gate.protected_register_work(&h.alice, sunset()).unwrap();
    }
    assert_eq!(
        kind(h.gate.protected_register_work(&h.alice, sunset())),
        ErrorKind::RateLimitExceeded
    );
    assert_eq!(h.gate.work_count().unwrap(), 10);

    // Other principals have their own window.
    h.gate.protected_register_work(&h.bob, sunset()).unwrap();

    h.clock.advance(100);
    h.gate.protected_register_work(&h.alice, sunset()).unwrap();
    assert_eq!(h.gate.activity_of(&h.alice).unwrap().count, 1);
    assert_eq!(h.gate.activity_of(&h.alice).unwrap().last_action_height, 600);
}

#[test]
fn suspension_blocks_every_mutation() {
    let mut h = harness();
    let id = h.gate.register_work(&h.alice, sunset()).unwrap();

    assert_eq!(
        kind(h.gate.suspend_platform(&h.alice, "nope")),
        ErrorKind::SupervisorRestricted
    );
    h.gate.suspend_platform(&h.root, "maintenance").unwrap();

    let fp = Fingerprint([1; 32]);
    let suspended = ErrorKind::PlatformSuspended;
    assert_eq!(kind(h.gate.register_work(&h.alice, sunset())), suspended);
    assert_eq!(kind(h.gate.register_work(&h.root, sunset())), suspended);
    assert_eq!(kind(h.gate.protected_register_work(&h.alice, sunset())), suspended);
    assert_eq!(kind(h.gate.transfer_ownership(&h.alice, id, &h.bob)), suspended);
    assert_eq!(
        kind(h.gate.update_work(&h.alice, id, WorkUpdate::default().with_size(1))),
        suspended
    );
    assert_eq!(kind(h.gate.unregister_work(&h.alice, id)), suspended);
    assert_eq!(kind(h.gate.assign_access_tier(&h.alice, id, &h.bob, 1)), suspended);
    assert_eq!(
        kind(h.gate.register_integrity_hash(&h.alice, id, fp, "sha256")),
        suspended
    );
    assert_eq!(
        kind(h.gate.initiate_verified_transfer(&h.alice, id, None)),
        suspended
    );

    // Reads stay available.
    assert_eq!(h.gate.get_work(id).unwrap().creator, h.alice);
    assert!(h.gate.check_access(id, &h.alice, 3).unwrap());

    assert_eq!(
        kind(h.gate.resume_platform(&h.alice)),
        ErrorKind::SupervisorRestricted
    );
    let state = h.gate.resume_platform(&h.root).unwrap();
    assert!(!state.suspended);
    assert_eq!(h.gate.platform_status().unwrap().explanation, "");
    h.gate.register_work(&h.alice, sunset()).unwrap();
}

#[test]
fn suspension_error_carries_explanation() {
    let mut h = harness();
    h.gate.suspend_platform(&h.root, "legal hold").unwrap();
    assert_eq!(
        h.gate.register_work(&h.alice, sunset()),
        Err(RegistryError::PlatformSuspended {
            explanation: "legal hold".to_string()
        })
    );
}

#[test]
fn field_boundaries() {
    let mut h = harness();
    let mut ok = sunset();
    ok.name = "n".repeat(64);
    ok.categories = (0..10).map(|i| format!("c{i}")).collect();
    h.gate.register_work(&h.alice, ok).unwrap();

    let mut long_name = sunset();
    long_name.name = "n".repeat(65);
    assert_eq!(kind(h.gate.register_work(&h.alice, long_name)), ErrorKind::Validation);

    let mut eleven = sunset();
    eleven.categories = (0..11).map(|i| format!("c{i}")).collect();
    assert_eq!(kind(h.gate.register_work(&h.alice, eleven)), ErrorKind::Validation);

    let mut none = sunset();
    none.categories.clear();
    assert_eq!(kind(h.gate.register_work(&h.alice, none)), ErrorKind::Validation);

    let mut huge = sunset();
    huge.size = 1_000_000_000;
    assert_eq!(kind(h.gate.register_work(&h.alice, huge)), ErrorKind::Validation);

    assert_eq!(h.gate.work_count().unwrap(), 1);
}

#[test]
fn access_tiers_and_view_precedence() {
    let mut h = harness();
    let id = h.gate.register_work(&h.alice, sunset()).unwrap();

    assert_eq!(
        kind(h.gate.assign_access_tier(&h.alice, id, &h.bob, 4)),
        ErrorKind::InvalidTier
    );
    let grant = h.gate.assign_access_tier(&h.alice, id, &h.bob, 2).unwrap();
    assert_eq!(grant.tier, PermissionTier::Edit);
    assert_eq!(grant.granted_at, 500);

    assert!(h.gate.check_access(id, &h.bob, 1).unwrap());
    assert!(h.gate.check_access(id, &h.bob, 2).unwrap());
    assert!(!h.gate.check_access(id, &h.bob, 3).unwrap());
    assert!(h.gate.can_view(id, &h.bob).unwrap());
    assert!(h.gate.can_view(id, &h.alice).unwrap());
    assert!(!h.gate.can_view(id, &Principal::new("carol")).unwrap());
    assert_eq!(
        h.gate.get_access_grant(id, &h.bob).unwrap().map(|g| g.tier),
        Some(PermissionTier::Edit)
    );

    // A transferred work is fully controlled by its new creator.
    h.gate.transfer_ownership(&h.alice, id, &h.bob).unwrap();
    assert!(h.gate.check_access(id, &h.bob, 3).unwrap());
    assert!(!h.gate.check_access(id, &h.alice, 1).unwrap());

    // The former creator keeps no read access through the viewer flag.
    assert!(!h.gate.can_view(id, &h.alice).unwrap());
    assert!(h.gate.can_view(id, &h.bob).unwrap());
    h.gate.assign_access_tier(&h.bob, id, &h.alice, 1).unwrap();
    assert!(h.gate.can_view(id, &h.alice).unwrap());
}

#[test]
fn unregister_cascades_and_ids_are_not_reused() {
    let mut h = harness();
    let id = h.gate.register_work(&h.alice, sunset()).unwrap();
    h.gate.assign_access_tier(&h.alice, id, &h.bob, 1).unwrap();
    h.gate
        .register_integrity_hash(&h.alice, id, Fingerprint([3; 32]), "blake3")
        .unwrap();

    h.gate.unregister_work(&h.alice, id).unwrap();
    assert!(h.gate.get_integrity_record(id).unwrap().is_none());
    assert!(h.gate.get_access_grant(id, &h.bob).unwrap().is_none());
    assert!(!h.gate.can_view(id, &h.alice).unwrap());

    let next = h.gate.register_work(&h.alice, sunset()).unwrap();
    assert_eq!(next, WorkId(2));
}

#[test]
fn verified_transfer_request_is_recorded() {
    let mut h = harness();
    let id = h.gate.register_work(&h.alice, sunset()).unwrap();

    let first = h
        .gate
        .initiate_verified_transfer(&h.alice, id, Some(h.bob.clone()))
        .unwrap();
    h.clock.advance(10);
    let second = h.gate.initiate_verified_transfer(&h.alice, id, None).unwrap();
    assert_eq!((first, second), (1, 2));

    let pending = h.gate.get_pending_operation(first, id).unwrap().unwrap();
    assert_eq!(pending.operation, "transfer");
    assert_eq!(pending.requester, h.alice);
    assert_eq!(pending.destination, Some(h.bob.clone()));
    assert_eq!(pending.requested_at, 500);
    assert_eq!(pending.expires_at, 500 + 1440);
    assert_eq!(pending.verification_code.len(), 64);

    // Nothing consumes the request; ownership is unchanged.
    assert_eq!(h.gate.get_work(id).unwrap().creator, h.alice);
    assert!(h.gate.get_pending_operation(3, id).unwrap().is_none());
}

#[test]
fn reads_never_mutate() {
    let mut h = harness();
    let id = h.gate.register_work(&h.alice, sunset()).unwrap();
    let digest = Fingerprint([5; 32]);
    h.gate
        .register_integrity_hash(&h.alice, id, digest, "sha256")
        .unwrap();
    let before = h.storage.snapshot().unwrap();

    h.gate.get_work(id).unwrap();
    h.gate.verify_work_integrity(id, &digest).unwrap();
    let _ = h.gate.verify_work_integrity(id, &Fingerprint([6; 32]));
    h.gate.check_access(id, &h.bob, 1).unwrap();
    h.gate.can_view(id, &h.bob).unwrap();
    h.gate.journal(QueryWindow { limit: 5, offset: 0 }).unwrap();
    h.gate.verify_journal().unwrap();
    h.gate.activity_of(&h.bob).unwrap();

    assert_eq!(h.storage.snapshot().unwrap(), before);
}

#[test]
fn failed_mutations_leave_no_trace() {
    let mut h = harness();
    let id = h.gate.register_work(&h.alice, sunset()).unwrap();
    let before = h.storage.snapshot().unwrap();

    let _ = h.gate.update_work(&h.alice, id, WorkUpdate::default().with_name(""));
    let _ = h.gate.transfer_ownership(&h.bob, id, &h.bob);
    let _ = h.gate.register_integrity_hash(&h.alice, id, Fingerprint([1; 32]), "crc32");
    let _ = h.gate.resume_platform(&h.bob);
    let mut bad = sunset();
    bad.synopsis = "s".repeat(129);
    let _ = h.gate.protected_register_work(&h.alice, bad);

    assert_eq!(h.storage.snapshot().unwrap(), before);
}

#[test]
fn journal_records_history_and_detects_tampering() {
    let mut h = harness();
    let id = h.gate.register_work(&h.alice, sunset()).unwrap();
    h.clock.advance(3);
    h.gate.transfer_ownership(&h.alice, id, &h.bob).unwrap();
    h.gate.suspend_platform(&h.root, "audit").unwrap();
    h.gate.resume_platform(&h.root).unwrap();

    let entries = h.gate.journal(QueryWindow { limit: 10, offset: 0 }).unwrap();
    assert_eq!(entries.len(), 4);
    assert!(matches!(entries[0].action, JournalAction::PlatformResumed));
    assert!(matches!(
        entries[3].action,
        JournalAction::WorkRegistered { rate_limited: false, .. }
    ));
    let verification = h.gate.verify_journal().unwrap();
    assert!(verification.valid);
    assert_eq!(verification.verified_entries, 4);

    // Rewrite history in a restored copy and check the chain breaks.
    let mut snapshot = h.storage.snapshot().unwrap();
    snapshot.journal[1].actor = Principal::new("mallory");
    let forged = Arc::new(InMemoryRegistryStorage::from_snapshot(snapshot));
    let audit = PolicyGate::new(forged, h.clock.clone(), RegistryConfig::with_supervisor("root"));
    let verification = audit.verify_journal().unwrap();
    assert!(!verification.valid);
    assert_eq!(verification.first_invalid_index, Some(1));
}

#[test]
fn snapshot_restore_resumes_counters() {
    let mut h = harness();
    h.gate.register_work(&h.alice, sunset()).unwrap();
    h.gate.register_work(&h.alice, sunset()).unwrap();

    let restored = Arc::new(InMemoryRegistryStorage::from_snapshot(
        h.storage.snapshot().unwrap(),
    ));
    let mut gate = PolicyGate::new(restored, h.clock.clone(), RegistryConfig::default());
    assert_eq!(gate.register_work(&h.bob, sunset()).unwrap(), WorkId(3));
    assert!(gate.verify_journal().unwrap().valid);
}

#[test]
fn storage_rejects_counter_regression() {
    let h = harness();
    let err = h
        .storage
        .apply(WriteBatch::new().with(WriteOp::SetLastWorkId(0)))
        .unwrap_err();
    assert_eq!(RegistryError::from(err).kind(), ErrorKind::Storage);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn ids_strictly_increase_and_count_matches(sizes in prop::collection::vec(0u64..2_000, 1..30)) {
        let mut h = harness();
        let mut last = 0u64;
        let mut successes = 0u64;
        for size in sizes {
            let draft = WorkDraft::new("Piece", size, "Generated", vec!["gen".to_string()]);
            match h.gate.register_work(&h.alice, draft) {
                Ok(id) => {
                    prop_assert!(id.value() > last);
                    last = id.value();
                    successes += 1;
                }
                Err(err) => prop_assert_eq!(err.kind(), ErrorKind::Validation),
            }
        }
        prop_assert_eq!(h.gate.work_count().unwrap(), successes);
        prop_assert!(h.gate.verify_journal().unwrap().valid);
    }
}
