//! End-to-end registry behavior over the in-memory store, a scripted FHE
//! gateway, and a hand-driven clock.
//!
//! The default fixture window is [1000, 2000]; tests start the clock at 500
//! (before the window) and advance it as the scenario requires.

mod common;

use streamkey_registry::domain::{EventKind, KeyState, Phase};
use streamkey_registry::infra::RegistryError;

use common::*;

// ============================================================================
// Creation
// ============================================================================

#[tokio::test]
async fn test_create_then_get_returns_fresh_record() {
    let harness = TestRegistry::at(500);

    let created = assert_ok!(
        harness
            .registry
            .create(creator_account(), CreateParamsBuilder::new("conf-1").build())
            .await
    );
    assert_eq!(created.phase, Phase::Active);
    assert_eq!(created.key_state, KeyState::Sealed);

    let fetched = assert_ok!(harness.registry.get(&"conf-1".into()).await);
    assert_eq!(fetched.creator, creator_account());
    assert_eq!(fetched.start_time, 1_000);
    assert_eq!(fetched.end_time, 2_000);
    assert!(fetched.is_active());
    assert!(!fetched.is_revealed());
    assert_eq!(fetched.revealed_value(), 0);
}

#[tokio::test]
async fn test_create_duplicate_id_keeps_first_record() {
    let harness = TestRegistry::at(500);

    assert_ok!(
        harness
            .registry
            .create(
                creator_account(),
                CreateParamsBuilder::new("conf-1")
                    .sealed_key(sealed_key(0x01))
                    .build()
            )
            .await
    );

    let err = assert_err!(
        harness
            .registry
            .create(
                other_account(),
                CreateParamsBuilder::new("conf-1")
                    .sealed_key(sealed_key(0x02))
                    .window(1_500, 3_000)
                    .build()
            )
            .await
    );
    assert!(matches!(err, RegistryError::AlreadyExists(_)));

    // The stored record is the first one, untouched by the rejected call.
    let fetched = assert_ok!(harness.registry.get(&"conf-1".into()).await);
    assert_eq!(fetched.sealed_key, sealed_key(0x01));
    assert_eq!(fetched.creator, creator_account());
    assert_eq!(fetched.end_time, 2_000);
}

#[tokio::test]
async fn test_create_inverted_window_stores_nothing() {
    let harness = TestRegistry::at(500);

    let err = assert_err!(
        harness
            .registry
            .create(
                creator_account(),
                CreateParamsBuilder::new("conf-1").window(100, 50).build()
            )
            .await
    );
    assert!(matches!(err, RegistryError::InvalidWindow { .. }));

    assert!(assert_ok!(harness.registry.list_ids().await).is_empty());
    assert!(matches!(
        assert_err!(harness.registry.get(&"conf-1".into()).await),
        RegistryError::NotFound(_)
    ));
}

#[tokio::test]
async fn test_create_window_already_elapsed() {
    let harness = TestRegistry::at(5_000);

    let err = assert_err!(
        harness
            .registry
            .create(creator_account(), CreateParamsBuilder::new("conf-1").build())
            .await
    );
    assert!(matches!(err, RegistryError::InvalidWindow { .. }));
}

#[tokio::test]
async fn test_create_rejected_input_proof_stores_nothing() {
    let harness = TestRegistry::at(500);
    harness.gateway.reject_inputs();

    let err = assert_err!(
        harness
            .registry
            .create(creator_account(), CreateParamsBuilder::new("conf-1").build())
            .await
    );
    assert!(matches!(err, RegistryError::InvalidEncryptionProof(_)));
    assert!(assert_ok!(harness.registry.list_ids().await).is_empty());
}

// ============================================================================
// Decryption claims
// ============================================================================

#[tokio::test]
async fn test_submit_decryption_unknown_id() {
    let harness = TestRegistry::at(1_500);

    let err = assert_err!(
        harness
            .registry
            .submit_decryption(&"ghost".into(), &clear_word(7), b"claim-proof")
            .await
    );
    assert!(matches!(err, RegistryError::NotFound(_)));
}

#[tokio::test]
async fn test_submit_decryption_reveals_exactly_once() {
    let harness = TestRegistry::at(500);
    assert_ok!(
        harness
            .registry
            .create(creator_account(), CreateParamsBuilder::new("conf-1").build())
            .await
    );

    harness.clock.set(1_500);
    let value = assert_ok!(
        harness
            .registry
            .submit_decryption(&"conf-1".into(), &clear_word(0xC0FFEE), b"claim-proof")
            .await
    );
    assert_eq!(value, 0xC0FFEE);

    let fetched = assert_ok!(harness.registry.get(&"conf-1".into()).await);
    assert!(fetched.is_revealed());
    assert_eq!(fetched.revealed_value(), 0xC0FFEE);

    // A second claim, even a valid-looking one, must not change the value.
    let err = assert_err!(
        harness
            .registry
            .submit_decryption(&"conf-1".into(), &clear_word(0xBAD), b"claim-proof")
            .await
    );
    assert!(matches!(err, RegistryError::AlreadyRevealed(_)));

    let fetched = assert_ok!(harness.registry.get(&"conf-1".into()).await);
    assert_eq!(fetched.revealed_value(), 0xC0FFEE);
}

#[tokio::test]
async fn test_submit_decryption_before_window_opens() {
    let harness = TestRegistry::at(500);
    assert_ok!(
        harness
            .registry
            .create(creator_account(), CreateParamsBuilder::new("conf-1").build())
            .await
    );

    // Clock still at 500, window opens at 1000.
    let err = assert_err!(
        harness
            .registry
            .submit_decryption(&"conf-1".into(), &clear_word(7), b"claim-proof")
            .await
    );
    assert!(matches!(err, RegistryError::WindowClosed { .. }));
}

#[tokio::test]
async fn test_submit_decryption_after_window_closes() {
    let harness = TestRegistry::at(500);
    assert_ok!(
        harness
            .registry
            .create(creator_account(), CreateParamsBuilder::new("conf-1").build())
            .await
    );

    harness.clock.set(2_001);
    let err = assert_err!(
        harness
            .registry
            .submit_decryption(&"conf-1".into(), &clear_word(7), b"claim-proof")
            .await
    );
    assert!(matches!(err, RegistryError::WindowClosed { .. }));
}

#[tokio::test]
async fn test_submit_decryption_rejected_proof_keeps_key_sealed() {
    let harness = TestRegistry::at(500);
    assert_ok!(
        harness
            .registry
            .create(creator_account(), CreateParamsBuilder::new("conf-1").build())
            .await
    );

    harness.clock.set(1_500);
    harness.gateway.reject_claims();

    let err = assert_err!(
        harness
            .registry
            .submit_decryption(&"conf-1".into(), &clear_word(7), b"claim-proof")
            .await
    );
    assert!(matches!(err, RegistryError::InvalidDecryptionProof(_)));

    let fetched = assert_ok!(harness.registry.get(&"conf-1".into()).await);
    assert!(!fetched.is_revealed());
    assert_eq!(fetched.revealed_value(), 0);
}

// ============================================================================
// Ending
// ============================================================================

#[tokio::test]
async fn test_end_by_non_creator_is_forbidden() {
    let harness = TestRegistry::at(500);
    assert_ok!(
        harness
            .registry
            .create(creator_account(), CreateParamsBuilder::new("conf-1").build())
            .await
    );

    harness.clock.set(3_000);
    let err = assert_err!(
        harness
            .registry
            .end(other_account(), &"conf-1".into())
            .await
    );
    assert!(matches!(err, RegistryError::Forbidden { .. }));

    let fetched = assert_ok!(harness.registry.get(&"conf-1".into()).await);
    assert!(fetched.is_active());
}

#[tokio::test]
async fn test_end_before_expiry_is_still_active() {
    let harness = TestRegistry::at(500);
    assert_ok!(
        harness
            .registry
            .create(creator_account(), CreateParamsBuilder::new("conf-1").build())
            .await
    );

    // end_time itself is still inside the active period.
    harness.clock.set(2_000);
    let err = assert_err!(
        harness
            .registry
            .end(creator_account(), &"conf-1".into())
            .await
    );
    assert!(matches!(err, RegistryError::StillActive { .. }));
}

#[tokio::test]
async fn test_end_after_expiry_transitions_once() {
    let harness = TestRegistry::at(500);
    assert_ok!(
        harness
            .registry
            .create(creator_account(), CreateParamsBuilder::new("conf-1").build())
            .await
    );

    harness.clock.set(2_001);
    assert_ok!(
        harness
            .registry
            .end(creator_account(), &"conf-1".into())
            .await
    );

    let fetched = assert_ok!(harness.registry.get(&"conf-1".into()).await);
    assert!(!fetched.is_active());

    let err = assert_err!(
        harness
            .registry
            .end(creator_account(), &"conf-1".into())
            .await
    );
    assert!(matches!(err, RegistryError::AlreadyEnded(_)));
}

#[tokio::test]
async fn test_end_unknown_id() {
    let harness = TestRegistry::at(500);
    let err = assert_err!(
        harness
            .registry
            .end(creator_account(), &"ghost".into())
            .await
    );
    assert!(matches!(err, RegistryError::NotFound(_)));
}

// ============================================================================
// Enumeration and event log
// ============================================================================

#[tokio::test]
async fn test_list_ids_keeps_creation_order_across_mutations() {
    let harness = TestRegistry::at(500);

    for (i, id) in ["gamma", "alpha", "beta"].iter().enumerate() {
        assert_ok!(
            harness
                .registry
                .create(
                    creator_account(),
                    CreateParamsBuilder::new(id)
                        .sealed_key(sealed_key(i as u8 + 1))
                        .build()
                )
                .await
        );
    }

    harness.clock.set(1_500);
    assert_ok!(
        harness
            .registry
            .submit_decryption(&"alpha".into(), &clear_word(1), b"claim-proof")
            .await
    );

    harness.clock.set(2_001);
    assert_ok!(harness.registry.end(creator_account(), &"gamma".into()).await);

    let ids: Vec<String> = assert_ok!(harness.registry.list_ids().await)
        .into_iter()
        .map(|i| i.0)
        .collect();
    assert_eq!(ids, vec!["gamma", "alpha", "beta"]);
}

#[tokio::test]
async fn test_event_log_records_full_lifecycle_in_order() {
    let harness = TestRegistry::at(500);
    assert_ok!(
        harness
            .registry
            .create(creator_account(), CreateParamsBuilder::new("conf-1").build())
            .await
    );

    harness.clock.set(1_500);
    assert_ok!(
        harness
            .registry
            .submit_decryption(&"conf-1".into(), &clear_word(9), b"claim-proof")
            .await
    );

    harness.clock.set(2_001);
    assert_ok!(harness.registry.end(creator_account(), &"conf-1".into()).await);

    let events = assert_ok!(harness.registry.events(&"conf-1".into()).await);
    let kinds: Vec<EventKind> = events.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            EventKind::ConferenceCreated,
            EventKind::StreamKeyRevealed,
            EventKind::ConferenceEnded,
        ]
    );

    // Receipt hashes are distinct across the lifecycle.
    assert_ne!(events[0].receipt_hash, events[1].receipt_hash);
    assert_ne!(events[1].receipt_hash, events[2].receipt_hash);
}

#[tokio::test]
async fn test_events_for_unknown_id() {
    let harness = TestRegistry::at(500);
    let err = assert_err!(harness.registry.events(&"ghost".into()).await);
    assert!(matches!(err, RegistryError::NotFound(_)));
}
