//! In-memory conference store
//!
//! Backs tests and local development; plays the role the PostgreSQL store
//! plays in production. Mutations take the write lock for their full
//! check-then-write span, so the one-time transition guards hold under
//! concurrent callers.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::{Conference, ConferenceId, KeyState, Phase, RegistryEvent};

use super::{ConferenceStore, RegistryError, Result};

#[derive(Default)]
struct Inner {
    records: HashMap<ConferenceId, Conference>,
    order: Vec<ConferenceId>,
    events: Vec<RegistryEvent>,
}

/// Conference store held entirely in process memory
#[derive(Default)]
pub struct InMemoryConferenceStore {
    inner: RwLock<Inner>,
}

impl InMemoryConferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConferenceStore for InMemoryConferenceStore {
    async fn insert(&self, conference: &Conference) -> Result<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| RegistryError::Internal("store lock poisoned".to_string()))?;
        if inner.records.contains_key(&conference.id) {
            return Err(RegistryError::AlreadyExists(conference.id.clone()));
        }
        inner.order.push(conference.id.clone());
        inner
            .records
            .insert(conference.id.clone(), conference.clone());
        Ok(())
    }

    async fn get(&self, id: &ConferenceId) -> Result<Option<Conference>> {
        let inner = self
            .inner
            .read()
            .map_err(|_| RegistryError::Internal("store lock poisoned".to_string()))?;
        Ok(inner.records.get(id).cloned())
    }

    async fn list_ids(&self) -> Result<Vec<ConferenceId>> {
        let inner = self
            .inner
            .read()
            .map_err(|_| RegistryError::Internal("store lock poisoned".to_string()))?;
        Ok(inner.order.clone())
    }

    async fn set_revealed(&self, id: &ConferenceId, value: u64) -> Result<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| RegistryError::Internal("store lock poisoned".to_string()))?;
        let record = inner
            .records
            .get_mut(id)
            .ok_or_else(|| RegistryError::NotFound(id.clone()))?;
        if record.is_revealed() {
            return Err(RegistryError::AlreadyRevealed(id.clone()));
        }
        record.key_state = KeyState::Revealed { value };
        Ok(())
    }

    async fn set_ended(&self, id: &ConferenceId) -> Result<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| RegistryError::Internal("store lock poisoned".to_string()))?;
        let record = inner
            .records
            .get_mut(id)
            .ok_or_else(|| RegistryError::NotFound(id.clone()))?;
        if record.phase == Phase::Ended {
            return Err(RegistryError::AlreadyEnded(id.clone()));
        }
        record.phase = Phase::Ended;
        Ok(())
    }

    async fn append_event(&self, event: &RegistryEvent) -> Result<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| RegistryError::Internal("store lock poisoned".to_string()))?;
        inner.events.push(event.clone());
        Ok(())
    }

    async fn events_for(&self, id: &ConferenceId) -> Result<Vec<RegistryEvent>> {
        let inner = self
            .inner
            .read()
            .map_err(|_| RegistryError::Internal("store lock poisoned".to_string()))?;
        Ok(inner
            .events
            .iter()
            .filter(|e| &e.conference_id == id)
            .cloned()
            .collect())
    }
}
