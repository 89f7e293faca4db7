//! The registry service
//!
//! Holds the store, the FHE gateway, and the clock behind their seams, and
//! enforces every access guard inline: existence, time window, creator-only,
//! and the two one-time transitions. Each operation is a single state
//! transition; a failed guard leaves the store untouched.

use std::sync::Arc;

use serde_json::json;
use tracing::info;

use crate::crypto::decode_clear_value;
use crate::domain::{
    AccountId, CiphertextHandle, Conference, ConferenceId, EventKind, RegistryEvent,
};
use crate::infra::{Clock, ConferenceStore, FheGateway, RegistryError, Result};

/// Parameters for creating a conference record
#[derive(Debug, Clone)]
pub struct CreateConference {
    pub id: ConferenceId,
    pub sealed_key: CiphertextHandle,
    pub proof: Vec<u8>,
    pub start_time: i64,
    pub end_time: i64,
}

/// Registry over conference records
pub struct Registry {
    store: Arc<dyn ConferenceStore>,
    gateway: Arc<dyn FheGateway>,
    clock: Arc<dyn Clock>,
}

impl Registry {
    pub fn new(
        store: Arc<dyn ConferenceStore>,
        gateway: Arc<dyn FheGateway>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            gateway,
            clock,
        }
    }

    /// Create a conference record around an externally-encrypted stream key.
    ///
    /// The provider ingests `(sealed_key, proof)` — rejecting forged inputs —
    /// and the returned internal handle is marked publicly decryptable and
    /// persisted. The caller becomes the record's creator.
    pub async fn create(&self, caller: AccountId, params: CreateConference) -> Result<Conference> {
        let now = self.clock.unix_now();

        if params.start_time >= params.end_time || params.end_time <= now {
            return Err(RegistryError::InvalidWindow {
                start_time: params.start_time,
                end_time: params.end_time,
            });
        }

        if self.store.get(&params.id).await?.is_some() {
            return Err(RegistryError::AlreadyExists(params.id));
        }

        let internal = self
            .gateway
            .ingest_external(&params.sealed_key, &params.proof)
            .await?;
        self.gateway.mark_publicly_decryptable(&internal).await?;

        let conference = Conference::new(
            params.id.clone(),
            internal,
            caller,
            params.start_time,
            params.end_time,
        );
        self.store.insert(&conference).await?;

        let event = RegistryEvent::new(
            params.id.clone(),
            EventKind::ConferenceCreated,
            Some(caller),
            json!({
                "sealed_key": conference.sealed_key,
                "start_time": params.start_time,
                "end_time": params.end_time,
            }),
        );
        self.store.append_event(&event).await?;

        info!(
            conference_id = %params.id,
            creator = %caller,
            start_time = params.start_time,
            end_time = params.end_time,
            "conference created"
        );

        Ok(conference)
    }

    /// Accept a decryption claim for a conference's stream key.
    ///
    /// The claim carries the cleartext as one 32-byte big-endian word plus
    /// the provider's proof. The provider's check is what guarantees the
    /// cleartext corresponds to the sealed handle recorded at creation; this
    /// method only forwards the claim and gates on window and state.
    pub async fn submit_decryption(
        &self,
        id: &ConferenceId,
        clear_value_encoded: &[u8],
        proof: &[u8],
    ) -> Result<u64> {
        let conference = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| RegistryError::NotFound(id.clone()))?;

        if conference.is_revealed() {
            return Err(RegistryError::AlreadyRevealed(id.clone()));
        }

        let now = self.clock.unix_now();
        if !conference.window_contains(now) {
            return Err(RegistryError::WindowClosed {
                id: id.clone(),
                now,
                start_time: conference.start_time,
                end_time: conference.end_time,
            });
        }

        self.gateway
            .verify_decryption_claim(&[conference.sealed_key], clear_value_encoded, proof)
            .await?;

        let value = decode_clear_value(clear_value_encoded).ok_or_else(|| {
            RegistryError::InvalidDecryptionProof(
                "clear value is not a single 32-byte big-endian word".to_string(),
            )
        })?;

        self.store.set_revealed(id, value).await?;

        let event = RegistryEvent::new(
            id.clone(),
            EventKind::StreamKeyRevealed,
            None,
            json!({ "value": value }),
        );
        self.store.append_event(&event).await?;

        info!(conference_id = %id, "stream key revealed");

        Ok(value)
    }

    /// Fetch a conference record
    pub async fn get(&self, id: &ConferenceId) -> Result<Conference> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| RegistryError::NotFound(id.clone()))
    }

    /// All conference ids in creation order, including ended records
    pub async fn list_ids(&self) -> Result<Vec<ConferenceId>> {
        self.store.list_ids().await
    }

    /// End a conference. Creator-only, and only after the window has elapsed.
    pub async fn end(&self, caller: AccountId, id: &ConferenceId) -> Result<()> {
        let conference = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| RegistryError::NotFound(id.clone()))?;

        if conference.creator != caller {
            return Err(RegistryError::Forbidden {
                id: id.clone(),
                caller,
            });
        }

        if !conference.is_active() {
            return Err(RegistryError::AlreadyEnded(id.clone()));
        }

        let now = self.clock.unix_now();
        if !conference.window_expired(now) {
            return Err(RegistryError::StillActive {
                id: id.clone(),
                end_time: conference.end_time,
            });
        }

        self.store.set_ended(id).await?;

        let event = RegistryEvent::new(
            id.clone(),
            EventKind::ConferenceEnded,
            Some(caller),
            json!({ "ended_at": now }),
        );
        self.store.append_event(&event).await?;

        info!(conference_id = %id, caller = %caller, "conference ended");

        Ok(())
    }

    /// The conference's event log, in append order
    pub async fn events(&self, id: &ConferenceId) -> Result<Vec<RegistryEvent>> {
        if self.store.get(id).await?.is_none() {
            return Err(RegistryError::NotFound(id.clone()));
        }
        self.store.events_for(id).await
    }
}
