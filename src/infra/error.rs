//! Error types for the StreamKey Registry

use thiserror::Error;

use crate::domain::{AccountId, ConferenceId};

/// Errors that can occur in registry operations
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Conference id is already taken
    #[error("conference already exists: {0}")]
    AlreadyExists(ConferenceId),

    /// No record for the requested id
    #[error("conference not found: {0}")]
    NotFound(ConferenceId),

    /// Creation window is inverted or already elapsed
    #[error("invalid time window: start {start_time} must precede end {end_time}, and the end must lie in the future")]
    InvalidWindow { start_time: i64, end_time: i64 },

    /// Decryption claim arrived outside the conference window
    #[error("decryption window closed for {id}: now {now} outside [{start_time}, {end_time}]")]
    WindowClosed {
        id: ConferenceId,
        now: i64,
        start_time: i64,
        end_time: i64,
    },

    /// The one-time reveal has already happened
    #[error("stream key already revealed for conference {0}")]
    AlreadyRevealed(ConferenceId),

    /// Provider rejected the encrypted input at creation
    #[error("encryption proof rejected: {0}")]
    InvalidEncryptionProof(String),

    /// Provider rejected the decryption claim
    #[error("decryption proof rejected: {0}")]
    InvalidDecryptionProof(String),

    /// Caller is not the record's creator
    #[error("caller {caller} is not the creator of conference {id}")]
    Forbidden {
        id: ConferenceId,
        caller: AccountId,
    },

    /// Conference cannot be ended before its window elapses
    #[error("conference {id} is still active until {end_time}")]
    StillActive { id: ConferenceId, end_time: i64 },

    /// The one-time end transition has already happened
    #[error("conference {0} has already ended")]
    AlreadyEnded(ConferenceId),

    /// Transport/protocol failure talking to the FHE provider
    #[error("fhe gateway error: {0}")]
    Gateway(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;
