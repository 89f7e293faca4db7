//! Conference records and their state machines

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AccountId, CiphertextHandle, ConferenceId};

/// Activity phase of a conference. One-way: Active -> Ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Active,
    Ended,
}

/// State of the sealed stream key. One-way: Sealed -> Revealed.
///
/// The revealed value is carried inside the variant so a revealed record can
/// never be missing its cleartext and a sealed record can never have one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum KeyState {
    Sealed,
    Revealed { value: u64 },
}

/// One conference record: the sealed stream key, the gating window, and the
/// two one-way state machines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conference {
    /// Caller-assigned identifier, unique across the store
    pub id: ConferenceId,

    /// Provider-internal handle to the encrypted stream key
    pub sealed_key: CiphertextHandle,

    /// Account that created the record
    pub creator: AccountId,

    /// Window start (unix seconds)
    pub start_time: i64,

    /// Window end (unix seconds), exclusive gate for `end`
    pub end_time: i64,

    /// Activity phase
    pub phase: Phase,

    /// Stream key state
    pub key_state: KeyState,

    /// When the record was persisted
    pub created_at: DateTime<Utc>,
}

impl Conference {
    pub fn new(
        id: ConferenceId,
        sealed_key: CiphertextHandle,
        creator: AccountId,
        start_time: i64,
        end_time: i64,
    ) -> Self {
        Self {
            id,
            sealed_key,
            creator,
            start_time,
            end_time,
            phase: Phase::Active,
            key_state: KeyState::Sealed,
            created_at: Utc::now(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.phase == Phase::Active
    }

    pub fn is_revealed(&self) -> bool {
        matches!(self.key_state, KeyState::Revealed { .. })
    }

    /// The revealed stream key, or zero while still sealed.
    pub fn revealed_value(&self) -> u64 {
        match self.key_state {
            KeyState::Sealed => 0,
            KeyState::Revealed { value } => value,
        }
    }

    /// Whether `now` falls inside the decryption window (inclusive ends).
    pub fn window_contains(&self, now: i64) -> bool {
        now >= self.start_time && now <= self.end_time
    }

    /// Whether the window has fully elapsed.
    pub fn window_expired(&self, now: i64) -> bool {
        now > self.end_time
    }
}
