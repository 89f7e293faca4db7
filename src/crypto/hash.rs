//! Domain-separated hashing and claim-word encoding
//!
//! All digests are SHA-256 over a domain prefix followed by length-prefixed
//! fields, so no two hash roles can collide and field boundaries are
//! unambiguous. JSON inputs are canonicalized per RFC 8785 (JCS) before
//! hashing, keeping digests reproducible across implementations.

use sha2::{Digest, Sha256};

use crate::domain::Hash256;

/// Domain prefix for registry event receipt digests
pub const DOMAIN_RECEIPT: &[u8] = b"SKR_RECEIPT_V1";

/// Domain prefix for decryption-claim digests
pub const DOMAIN_CLAIM: &[u8] = b"SKR_CLAIM_V1";

/// Width of a clear-value word in a decryption claim
pub const CLEAR_VALUE_WORD: usize = 32;

/// Encode a u64 as 8 bytes big-endian
#[inline]
pub fn u64_be(n: u64) -> [u8; 8] {
    n.to_be_bytes()
}

/// Encode a string as length-prefixed UTF-8 bytes
/// Format: U32_BE(len) || UTF8_bytes
pub fn encode_string(s: &str) -> Vec<u8> {
    let utf8_bytes = s.as_bytes();
    let mut result = Vec::with_capacity(4 + utf8_bytes.len());
    result.extend_from_slice(&(utf8_bytes.len() as u32).to_be_bytes());
    result.extend_from_slice(utf8_bytes);
    result
}

/// Convert a JSON value to its canonical string representation per RFC 8785.
pub fn canonicalize_json(value: &serde_json::Value) -> String {
    // Canonicalization of a serde_json::Value only fails on non-finite
    // numbers, which serde_json::Value cannot represent; fall back to the
    // plain rendering rather than panic.
    serde_json_canonicalizer::to_string(value).unwrap_or_else(|_| value.to_string())
}

/// SHA-256 over the canonical JSON representation of a value.
pub fn canonical_json_hash(value: &serde_json::Value) -> Hash256 {
    let canonical = canonicalize_json(value);
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hasher.finalize().into()
}

/// Receipt digest for one registry event.
///
/// receipt = SHA256(DOMAIN_RECEIPT || STR(conference_id) || STR(kind) || JCS(details))
pub fn receipt_hash(conference_id: &str, kind: &str, details: &serde_json::Value) -> Hash256 {
    let mut hasher = Sha256::new();
    hasher.update(DOMAIN_RECEIPT);
    hasher.update(encode_string(conference_id));
    hasher.update(encode_string(kind));
    hasher.update(canonicalize_json(details).as_bytes());
    hasher.finalize().into()
}

/// Digest of a decryption claim, used to correlate gateway calls in logs.
///
/// claim = SHA256(DOMAIN_CLAIM || handles || U64_BE(|clear|) || clear || U64_BE(|proof|) || proof)
pub fn claim_digest(handles: &[[u8; 32]], clear_values: &[u8], proof: &[u8]) -> Hash256 {
    let mut hasher = Sha256::new();
    hasher.update(DOMAIN_CLAIM);
    for handle in handles {
        hasher.update(handle);
    }
    hasher.update(u64_be(clear_values.len() as u64));
    hasher.update(clear_values);
    hasher.update(u64_be(proof.len() as u64));
    hasher.update(proof);
    hasher.finalize().into()
}

/// Encode a stream-key value as one 32-byte big-endian word.
pub fn encode_clear_value(value: u64) -> [u8; CLEAR_VALUE_WORD] {
    let mut word = [0u8; CLEAR_VALUE_WORD];
    word[CLEAR_VALUE_WORD - 8..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Decode a stream-key value from a claim's clear-value bytes.
///
/// The claim must carry exactly one 32-byte big-endian word whose upper
/// 24 bytes are zero; anything else is a malformed claim.
pub fn decode_clear_value(bytes: &[u8]) -> Option<u64> {
    if bytes.len() != CLEAR_VALUE_WORD {
        return None;
    }
    if bytes[..CLEAR_VALUE_WORD - 8].iter().any(|b| *b != 0) {
        return None;
    }
    let mut word = [0u8; 8];
    word.copy_from_slice(&bytes[CLEAR_VALUE_WORD - 8..]);
    Some(u64::from_be_bytes(word))
}
