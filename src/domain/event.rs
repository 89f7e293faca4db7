//! Append-only registry event log entries
//!
//! Every accepted mutation appends exactly one event. Events are never
//! updated or deleted; the per-conference log is the audit trail for the
//! record's lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::crypto::receipt_hash;

use super::{hash256_hex, AccountId, ConferenceId, Hash256};

/// Kind of registry event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "conference.created")]
    ConferenceCreated,
    #[serde(rename = "stream_key.revealed")]
    StreamKeyRevealed,
    #[serde(rename = "conference.ended")]
    ConferenceEnded,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::ConferenceCreated => "conference.created",
            EventKind::StreamKeyRevealed => "stream_key.revealed",
            EventKind::ConferenceEnded => "conference.ended",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "conference.created" => Some(EventKind::ConferenceCreated),
            "stream_key.revealed" => Some(EventKind::StreamKeyRevealed),
            "conference.ended" => Some(EventKind::ConferenceEnded),
            _ => None,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One entry in the append-only event log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryEvent {
    /// Unique event identifier
    pub event_id: Uuid,

    /// Conference this event belongs to
    pub conference_id: ConferenceId,

    /// What happened
    pub kind: EventKind,

    /// Account that triggered the mutation, when one was authenticated
    pub actor: Option<AccountId>,

    /// Kind-specific details (window bounds, revealed value, ...)
    pub details: serde_json::Value,

    /// Domain-separated digest binding conference id, kind, and details
    #[serde(with = "hash256_hex")]
    pub receipt_hash: Hash256,

    /// When the mutation was accepted
    pub occurred_at: DateTime<Utc>,
}

impl RegistryEvent {
    pub fn new(
        conference_id: ConferenceId,
        kind: EventKind,
        actor: Option<AccountId>,
        details: serde_json::Value,
    ) -> Self {
        let receipt = receipt_hash(conference_id.as_str(), kind.as_str(), &details);
        Self {
            event_id: Uuid::new_v4(),
            conference_id,
            kind,
            actor,
            details,
            receipt_hash: receipt,
            occurred_at: Utc::now(),
        }
    }
}
