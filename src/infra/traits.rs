//! Trait definitions for the StreamKey Registry core seams

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::domain::{CiphertextHandle, Conference, ConferenceId, RegistryEvent};

use super::Result;

/// Persistent conference store: a mapping from conference id to record plus
/// an append-only ordered id list for enumeration.
///
/// Invariant: a failed mutation leaves the store unchanged.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ConferenceStore: Send + Sync {
    /// Insert a new record; fails with `AlreadyExists` if the id is taken.
    ///
    /// Appends the id to the enumeration list as part of the same write.
    async fn insert(&self, conference: &Conference) -> Result<()>;

    /// Fetch a record by id
    async fn get(&self, id: &ConferenceId) -> Result<Option<Conference>>;

    /// All ids ever created, in creation order, including ended records
    async fn list_ids(&self) -> Result<Vec<ConferenceId>>;

    /// Transition the key state Sealed -> Revealed with the given value.
    ///
    /// Fails with `NotFound` for unknown ids and `AlreadyRevealed` if the
    /// transition already happened (the guard is re-checked at the write so
    /// concurrent claims cannot both land).
    async fn set_revealed(&self, id: &ConferenceId, value: u64) -> Result<()>;

    /// Transition the phase Active -> Ended.
    ///
    /// Fails with `NotFound` for unknown ids and `AlreadyEnded` if the
    /// transition already happened.
    async fn set_ended(&self, id: &ConferenceId) -> Result<()>;

    /// Append an event to the conference's event log
    async fn append_event(&self, event: &RegistryEvent) -> Result<()>;

    /// The conference's event log, in append order
    async fn events_for(&self, id: &ConferenceId) -> Result<Vec<RegistryEvent>>;
}

/// Gateway to the external FHE provider.
///
/// The registry performs no cryptography itself: it forwards handles and
/// proofs and trusts the provider's verdict. Transport failures surface as
/// `Gateway`, never as proof rejection.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait FheGateway: Send + Sync {
    /// Validate and ingest an externally-encrypted handle with its proof.
    ///
    /// Returns the provider-internal handle on success; fails with
    /// `InvalidEncryptionProof` if the provider rejects the pair.
    async fn ingest_external(
        &self,
        handle: &CiphertextHandle,
        proof: &[u8],
    ) -> Result<CiphertextHandle>;

    /// Mark an ingested handle as eligible for public decryption
    async fn mark_publicly_decryptable(&self, handle: &CiphertextHandle) -> Result<()>;

    /// Verify a decryption claim: that `clear_values` is the cleartext of
    /// `handles` under the provider's keys, per `proof`.
    ///
    /// Fails with `InvalidDecryptionProof` if the check fails.
    async fn verify_decryption_claim(
        &self,
        handles: &[CiphertextHandle],
        clear_values: &[u8],
        proof: &[u8],
    ) -> Result<()>;
}

/// Clock seam so window checks are deterministic under test
#[cfg_attr(test, automock)]
pub trait Clock: Send + Sync {
    /// Current unix time in seconds
    fn unix_now(&self) -> i64;
}
