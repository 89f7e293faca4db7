//! PostgreSQL store integration tests.
//!
//! These tests require DATABASE_URL to be set and run with
//! `cargo test -- --ignored`.

mod common;

use sqlx::postgres::PgPoolOptions;

use streamkey_registry::domain::{
    CiphertextHandle, Conference, ConferenceId, EventKind, RegistryEvent,
};
use streamkey_registry::infra::{ConferenceStore, PgConferenceStore, RegistryError};

use common::*;

async fn connect_store() -> Option<PgConferenceStore> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .ok()?;
    streamkey_registry::migrations::run_postgres(&pool)
        .await
        .ok()?;
    Some(PgConferenceStore::new(pool))
}

fn record(id: &ConferenceId) -> Conference {
    Conference::new(
        id.clone(),
        CiphertextHandle::from_bytes([0x42; 32]),
        creator_account(),
        1_000,
        2_000,
    )
}

#[tokio::test]
#[ignore]
async fn test_pg_insert_and_get_round_trip() {
    let Some(store) = connect_store().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };

    let id = random_conference_id("pg-roundtrip");
    store.insert(&record(&id)).await.unwrap();

    let fetched = store.get(&id).await.unwrap().unwrap();
    assert_eq!(fetched.id, id);
    assert_eq!(fetched.creator, creator_account());
    assert_eq!(fetched.sealed_key, CiphertextHandle::from_bytes([0x42; 32]));
    assert!(fetched.is_active());
    assert!(!fetched.is_revealed());
}

#[tokio::test]
#[ignore]
async fn test_pg_duplicate_insert_conflicts() {
    let Some(store) = connect_store().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };

    let id = random_conference_id("pg-dup");
    store.insert(&record(&id)).await.unwrap();

    let err = store.insert(&record(&id)).await.unwrap_err();
    assert!(matches!(err, RegistryError::AlreadyExists(_)));
}

#[tokio::test]
#[ignore]
async fn test_pg_reveal_and_end_are_one_time() {
    let Some(store) = connect_store().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };

    let id = random_conference_id("pg-transitions");
    store.insert(&record(&id)).await.unwrap();

    store.set_revealed(&id, 0xC0FFEE).await.unwrap();
    let err = store.set_revealed(&id, 0xBAD).await.unwrap_err();
    assert!(matches!(err, RegistryError::AlreadyRevealed(_)));

    store.set_ended(&id).await.unwrap();
    let err = store.set_ended(&id).await.unwrap_err();
    assert!(matches!(err, RegistryError::AlreadyEnded(_)));

    let fetched = store.get(&id).await.unwrap().unwrap();
    assert_eq!(fetched.revealed_value(), 0xC0FFEE);
    assert!(!fetched.is_active());
}

#[tokio::test]
#[ignore]
async fn test_pg_event_log_round_trip() {
    let Some(store) = connect_store().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };

    let id = random_conference_id("pg-events");
    store.insert(&record(&id)).await.unwrap();

    let created = RegistryEvent::new(
        id.clone(),
        EventKind::ConferenceCreated,
        Some(creator_account()),
        serde_json::json!({ "start_time": 1_000, "end_time": 2_000 }),
    );
    let revealed = RegistryEvent::new(
        id.clone(),
        EventKind::StreamKeyRevealed,
        None,
        serde_json::json!({ "value": 7 }),
    );
    store.append_event(&created).await.unwrap();
    store.append_event(&revealed).await.unwrap();

    let events = store.events_for(&id).await.unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].kind, EventKind::ConferenceCreated);
    assert_eq!(events[1].kind, EventKind::StreamKeyRevealed);
    assert_eq!(events[0].receipt_hash, created.receipt_hash);
    assert_eq!(events[0].actor, Some(creator_account()));
}
