//! Common test utilities and fixtures for integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use streamkey_registry::crypto::encode_clear_value;
use streamkey_registry::domain::{AccountId, CiphertextHandle, ConferenceId};
use streamkey_registry::infra::{
    FheGateway, InMemoryConferenceStore, ManualClock, RegistryError,
};
use streamkey_registry::registry::{CreateConference, Registry};

/// Test creator account
pub fn creator_account() -> AccountId {
    AccountId::from_uuid(Uuid::parse_str("11111111-1111-1111-1111-111111111111").unwrap())
}

/// A second account, never the creator
pub fn other_account() -> AccountId {
    AccountId::from_uuid(Uuid::parse_str("22222222-2222-2222-2222-222222222222").unwrap())
}

/// Deterministic ciphertext handle
pub fn sealed_key(seed: u8) -> CiphertextHandle {
    CiphertextHandle::from_bytes([seed; 32])
}

/// A clear-value word the scripted gateway accepts
pub fn clear_word(value: u64) -> Vec<u8> {
    encode_clear_value(value).to_vec()
}

/// Generate a random conference id with a prefix
pub fn random_conference_id(prefix: &str) -> ConferenceId {
    ConferenceId::new(format!("{}-{}", prefix, &Uuid::new_v4().to_string()[..8]))
}

/// FHE gateway scripted to accept or reject, for driving the registry
/// end-to-end without a provider.
pub struct ScriptedFheGateway {
    accept_inputs: AtomicBool,
    accept_claims: AtomicBool,
}

impl ScriptedFheGateway {
    pub fn accepting() -> Self {
        Self {
            accept_inputs: AtomicBool::new(true),
            accept_claims: AtomicBool::new(true),
        }
    }

    pub fn reject_inputs(&self) {
        self.accept_inputs.store(false, Ordering::SeqCst);
    }

    pub fn reject_claims(&self) {
        self.accept_claims.store(false, Ordering::SeqCst);
    }

    pub fn accept_all(&self) {
        self.accept_inputs.store(true, Ordering::SeqCst);
        self.accept_claims.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl FheGateway for ScriptedFheGateway {
    async fn ingest_external(
        &self,
        handle: &CiphertextHandle,
        _proof: &[u8],
    ) -> Result<CiphertextHandle, RegistryError> {
        if self.accept_inputs.load(Ordering::SeqCst) {
            Ok(*handle)
        } else {
            Err(RegistryError::InvalidEncryptionProof(
                "scripted rejection".to_string(),
            ))
        }
    }

    async fn mark_publicly_decryptable(
        &self,
        _handle: &CiphertextHandle,
    ) -> Result<(), RegistryError> {
        Ok(())
    }

    async fn verify_decryption_claim(
        &self,
        _handles: &[CiphertextHandle],
        _clear_values: &[u8],
        _proof: &[u8],
    ) -> Result<(), RegistryError> {
        if self.accept_claims.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(RegistryError::InvalidDecryptionProof(
                "scripted rejection".to_string(),
            ))
        }
    }
}

/// A registry over in-memory storage, a scripted gateway, and a manual clock
pub struct TestRegistry {
    pub registry: Registry,
    pub gateway: Arc<ScriptedFheGateway>,
    pub clock: Arc<ManualClock>,
}

impl TestRegistry {
    pub fn at(now: i64) -> Self {
        let gateway = Arc::new(ScriptedFheGateway::accepting());
        let clock = Arc::new(ManualClock::new(now));
        let registry = Registry::new(
            Arc::new(InMemoryConferenceStore::new()),
            gateway.clone(),
            clock.clone(),
        );
        Self {
            registry,
            gateway,
            clock,
        }
    }
}

/// Builder for create-conference parameters
pub struct CreateParamsBuilder {
    id: ConferenceId,
    sealed_key: CiphertextHandle,
    proof: Vec<u8>,
    start_time: i64,
    end_time: i64,
}

impl CreateParamsBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            id: ConferenceId::new(id),
            sealed_key: sealed_key(0x42),
            proof: b"input-proof".to_vec(),
            start_time: 1_000,
            end_time: 2_000,
        }
    }

    pub fn sealed_key(mut self, handle: CiphertextHandle) -> Self {
        self.sealed_key = handle;
        self
    }

    pub fn window(mut self, start: i64, end: i64) -> Self {
        self.start_time = start;
        self.end_time = end;
        self
    }

    pub fn proof(mut self, proof: &[u8]) -> Self {
        self.proof = proof.to_vec();
        self
    }

    pub fn build(self) -> CreateConference {
        CreateConference {
            id: self.id,
            sealed_key: self.sealed_key,
            proof: self.proof,
            start_time: self.start_time,
            end_time: self.end_time,
        }
    }
}

/// Assert that a result is Ok and return the value
#[macro_export]
macro_rules! assert_ok {
    ($result:expr) => {
        match $result {
            Ok(v) => v,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
}

/// Assert that a result is Err
#[macro_export]
macro_rules! assert_err {
    ($result:expr) => {
        match $result {
            Ok(v) => panic!("Expected Err, got Ok: {:?}", v),
            Err(e) => e,
        }
    };
}
