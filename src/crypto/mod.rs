//! Hashing utilities for the StreamKey Registry
//!
//! Provides:
//! - Canonical JSON hashing (deterministic, cross-language compatible)
//! - Domain-separated receipt and claim digests
//! - Clear-value word encoding/decoding for decryption claims

mod hash;

pub use hash::*;
