//! StreamKey Registry Library
//!
//! Registry service for video-conference stream keys. Each conference record
//! stores one externally-encrypted integer (the stream key) as an opaque
//! ciphertext handle managed by an external FHE provider. The registry keeps
//! the books: create/read/enumerate records keyed by a string id, gate every
//! mutation on a time window and caller identity, and accept a one-time
//! decryption claim whose proof the provider verifies.
//!
//! ## Modules
//!
//! - [`domain`] - Core domain types (conference records, events, handles)
//! - [`infra`] - Infrastructure traits and implementations (PostgreSQL, in-memory)
//! - [`registry`] - The registry service with its inline access guards
//! - [`fhe`] - External FHE provider gateway (HTTP client, permissive dev mode)
//! - [`auth`] - Authentication (API keys)
//! - [`crypto`] - Hashing utilities (receipt hashes, clear-value decoding)
//! - [`metrics`] - Observability counters
//! - [`telemetry`] - Log/trace subscriber setup
//! - [`api`] - REST API routes

pub mod api;
pub mod auth;
pub mod crypto;
pub mod domain;
pub mod fhe;
pub mod infra;
pub mod metrics;
pub mod migrations;
pub mod registry;
pub mod server;
pub mod telemetry;

// Re-export commonly used types
pub use domain::{
    AccountId, CiphertextHandle, Conference, ConferenceId, EventKind, Hash256, KeyState, Phase,
    RegistryEvent,
};

pub use infra::{Clock, ConferenceStore, FheGateway, RegistryError, Result};

pub use registry::{CreateConference, Registry};
