//! PostgreSQL conference store
//!
//! The one-time transitions are enforced in the UPDATE predicates themselves
//! (`... WHERE clear_value IS NULL`, `... WHERE phase = 'active'`), so two
//! racing claims cannot both land even across registry instances sharing a
//! database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::domain::{
    AccountId, CiphertextHandle, Conference, ConferenceId, EventKind, KeyState, Phase,
    RegistryEvent,
};

use super::{ConferenceStore, RegistryError, Result};

const PHASE_ACTIVE: &str = "active";
const PHASE_ENDED: &str = "ended";

/// PostgreSQL-backed conference store
pub struct PgConferenceStore {
    pool: PgPool,
}

impl PgConferenceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct ConferenceRow {
    id: String,
    sealed_key: Vec<u8>,
    creator: Uuid,
    start_time: i64,
    end_time: i64,
    phase: String,
    clear_value: Option<i64>,
    created_at: DateTime<Utc>,
}

impl ConferenceRow {
    fn into_conference(self) -> Result<Conference> {
        let sealed_key: [u8; 32] = self.sealed_key.try_into().map_err(|_| {
            RegistryError::Internal(format!("stored sealed key for {} is not 32 bytes", self.id))
        })?;

        let phase = match self.phase.as_str() {
            PHASE_ACTIVE => Phase::Active,
            PHASE_ENDED => Phase::Ended,
            other => {
                return Err(RegistryError::Internal(format!(
                    "unknown phase {other:?} for conference {}",
                    self.id
                )))
            }
        };

        let key_state = match self.clear_value {
            None => KeyState::Sealed,
            Some(v) => KeyState::Revealed { value: v as u64 },
        };

        Ok(Conference {
            id: ConferenceId::new(self.id),
            sealed_key: CiphertextHandle::from_bytes(sealed_key),
            creator: AccountId::from_uuid(self.creator),
            start_time: self.start_time,
            end_time: self.end_time,
            phase,
            key_state,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct EventRow {
    event_id: Uuid,
    conference_id: String,
    kind: String,
    actor: Option<Uuid>,
    details: serde_json::Value,
    receipt_hash: Vec<u8>,
    occurred_at: DateTime<Utc>,
}

impl EventRow {
    fn into_event(self) -> Result<RegistryEvent> {
        let kind = EventKind::parse(&self.kind).ok_or_else(|| {
            RegistryError::Internal(format!("unknown event kind {:?}", self.kind))
        })?;
        let receipt_hash: [u8; 32] = self.receipt_hash.try_into().map_err(|_| {
            RegistryError::Internal(format!(
                "stored receipt hash for event {} is not 32 bytes",
                self.event_id
            ))
        })?;
        Ok(RegistryEvent {
            event_id: self.event_id,
            conference_id: ConferenceId::new(self.conference_id),
            kind,
            actor: self.actor.map(AccountId::from_uuid),
            details: self.details,
            receipt_hash,
            occurred_at: self.occurred_at,
        })
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait]
impl ConferenceStore for PgConferenceStore {
    async fn insert(&self, conference: &Conference) -> Result<()> {
        let clear_value = match conference.key_state {
            KeyState::Sealed => None,
            KeyState::Revealed { value } => Some(value as i64),
        };
        let phase = match conference.phase {
            Phase::Active => PHASE_ACTIVE,
            Phase::Ended => PHASE_ENDED,
        };

        let result = sqlx::query(
            r#"
            INSERT INTO conferences (
                id, sealed_key, creator, start_time, end_time,
                phase, clear_value, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(conference.id.as_str())
        .bind(conference.sealed_key.as_bytes().as_slice())
        .bind(conference.creator.0)
        .bind(conference.start_time)
        .bind(conference.end_time)
        .bind(phase)
        .bind(clear_value)
        .bind(conference.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => {
                Err(RegistryError::AlreadyExists(conference.id.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get(&self, id: &ConferenceId) -> Result<Option<Conference>> {
        let row: Option<ConferenceRow> = sqlx::query_as(
            r#"
            SELECT id, sealed_key, creator, start_time, end_time,
                   phase, clear_value, created_at
            FROM conferences
            WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(ConferenceRow::into_conference).transpose()
    }

    async fn list_ids(&self) -> Result<Vec<ConferenceId>> {
        let ids: Vec<(String,)> =
            sqlx::query_as("SELECT id FROM conferences ORDER BY position ASC")
                .fetch_all(&self.pool)
                .await?;

        Ok(ids.into_iter().map(|(id,)| ConferenceId::new(id)).collect())
    }

    async fn set_revealed(&self, id: &ConferenceId, value: u64) -> Result<()> {
        let result = sqlx::query(
            "UPDATE conferences SET clear_value = $2 WHERE id = $1 AND clear_value IS NULL",
        )
        .bind(id.as_str())
        .bind(value as i64)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        // Distinguish a missing record from a lost race on the transition.
        match self.get(id).await? {
            Some(_) => Err(RegistryError::AlreadyRevealed(id.clone())),
            None => Err(RegistryError::NotFound(id.clone())),
        }
    }

    async fn set_ended(&self, id: &ConferenceId) -> Result<()> {
        let result =
            sqlx::query("UPDATE conferences SET phase = $2 WHERE id = $1 AND phase = $3")
                .bind(id.as_str())
                .bind(PHASE_ENDED)
                .bind(PHASE_ACTIVE)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        match self.get(id).await? {
            Some(_) => Err(RegistryError::AlreadyEnded(id.clone())),
            None => Err(RegistryError::NotFound(id.clone())),
        }
    }

    async fn append_event(&self, event: &RegistryEvent) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO conference_events (
                event_id, conference_id, kind, actor,
                details, receipt_hash, occurred_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(event.event_id)
        .bind(event.conference_id.as_str())
        .bind(event.kind.as_str())
        .bind(event.actor.map(|a| a.0))
        .bind(&event.details)
        .bind(event.receipt_hash.as_slice())
        .bind(event.occurred_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn events_for(&self, id: &ConferenceId) -> Result<Vec<RegistryEvent>> {
        let rows: Vec<EventRow> = sqlx::query_as(
            r#"
            SELECT event_id, conference_id, kind, actor,
                   details, receipt_hash, occurred_at
            FROM conference_events
            WHERE conference_id = $1
            ORDER BY seq ASC
            "#,
        )
        .bind(id.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(EventRow::into_event).collect()
    }
}
