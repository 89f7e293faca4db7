//! External FHE provider gateway
//!
//! The provider validates externally-encrypted inputs, manages decryption
//! eligibility, and verifies decryption claims. The registry only forwards
//! handles and proofs over this seam and trusts the verdicts; it never
//! performs cryptographic computation itself.

use async_trait::async_trait;
use base64::Engine;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::crypto::claim_digest;
use crate::domain::CiphertextHandle;
use crate::infra::{FheGateway, RegistryError, Result};

/// FHE gateway configuration
#[derive(Debug, Clone)]
pub struct FheConfig {
    /// Base URL of the provider's relayer endpoint
    pub base_url: String,
    /// Optional bearer token for the relayer
    pub api_token: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl FheConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` when `FHE_GATEWAY_URL` is unset; the server then falls
    /// back to the permissive gateway for local development.
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("FHE_GATEWAY_URL").ok()?;
        let api_token = std::env::var("FHE_GATEWAY_TOKEN").ok();
        let timeout_secs = std::env::var("FHE_GATEWAY_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        Some(Self {
            base_url,
            api_token,
            timeout_secs,
        })
    }
}

#[derive(Debug, Serialize)]
struct IngestRequest {
    handle: CiphertextHandle,
    proof_b64: String,
}

#[derive(Debug, Deserialize)]
struct IngestResponse {
    accepted: bool,
    internal_handle: Option<CiphertextHandle>,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug, Serialize)]
struct MarkDecryptableRequest {
    handle: CiphertextHandle,
}

#[derive(Debug, Serialize)]
struct VerifyClaimRequest {
    handles: Vec<CiphertextHandle>,
    clear_values_b64: String,
    proof_b64: String,
}

#[derive(Debug, Deserialize)]
struct VerifyClaimResponse {
    valid: bool,
    #[serde(default)]
    reason: Option<String>,
}

/// HTTP client for the provider's relayer
pub struct HttpFheGateway {
    config: FheConfig,
    client: reqwest::Client,
}

impl HttpFheGateway {
    pub fn new(config: FheConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RegistryError::Gateway(e.to_string()))?;
        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn post_json<Req: Serialize, Resp: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &Req,
    ) -> Result<Resp> {
        let mut request = self.client.post(self.url(path)).json(body);
        if let Some(token) = &self.config.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RegistryError::Gateway(format!("{path}: {e}")))?;

        let status = response.status();
        if status != StatusCode::OK {
            let detail = response.text().await.unwrap_or_default();
            return Err(RegistryError::Gateway(format!(
                "{path}: provider returned {status}: {detail}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| RegistryError::Gateway(format!("{path}: malformed response: {e}")))
    }
}

#[async_trait]
impl FheGateway for HttpFheGateway {
    async fn ingest_external(
        &self,
        handle: &CiphertextHandle,
        proof: &[u8],
    ) -> Result<CiphertextHandle> {
        let request = IngestRequest {
            handle: *handle,
            proof_b64: base64::engine::general_purpose::STANDARD.encode(proof),
        };
        let response: IngestResponse = self.post_json("v1/inputs/ingest", &request).await?;

        if !response.accepted {
            return Err(RegistryError::InvalidEncryptionProof(
                response
                    .reason
                    .unwrap_or_else(|| "provider rejected the input proof".to_string()),
            ));
        }

        response.internal_handle.ok_or_else(|| {
            RegistryError::Gateway("v1/inputs/ingest: accepted without internal handle".to_string())
        })
    }

    async fn mark_publicly_decryptable(&self, handle: &CiphertextHandle) -> Result<()> {
        let request = MarkDecryptableRequest { handle: *handle };
        let _: serde_json::Value = self.post_json("v1/inputs/public-decryptable", &request).await?;
        Ok(())
    }

    async fn verify_decryption_claim(
        &self,
        handles: &[CiphertextHandle],
        clear_values: &[u8],
        proof: &[u8],
    ) -> Result<()> {
        let raw_handles: Vec<[u8; 32]> = handles.iter().map(|h| h.0).collect();
        let digest = claim_digest(&raw_handles, clear_values, proof);
        debug!(claim = %hex::encode(digest), "verifying decryption claim");

        let request = VerifyClaimRequest {
            handles: handles.to_vec(),
            clear_values_b64: base64::engine::general_purpose::STANDARD.encode(clear_values),
            proof_b64: base64::engine::general_purpose::STANDARD.encode(proof),
        };
        let response: VerifyClaimResponse = self.post_json("v1/claims/verify", &request).await?;

        if !response.valid {
            return Err(RegistryError::InvalidDecryptionProof(
                response
                    .reason
                    .unwrap_or_else(|| "provider rejected the claim".to_string()),
            ));
        }

        Ok(())
    }
}

/// Gateway that accepts every proof. Local development only.
pub struct PermissiveFheGateway;

impl PermissiveFheGateway {
    pub fn new() -> Self {
        warn!("FHE gateway not configured; accepting all proofs (set FHE_GATEWAY_URL in production)");
        Self
    }
}

impl Default for PermissiveFheGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FheGateway for PermissiveFheGateway {
    async fn ingest_external(
        &self,
        handle: &CiphertextHandle,
        _proof: &[u8],
    ) -> Result<CiphertextHandle> {
        Ok(*handle)
    }

    async fn mark_publicly_decryptable(&self, _handle: &CiphertextHandle) -> Result<()> {
        Ok(())
    }

    async fn verify_decryption_claim(
        &self,
        _handles: &[CiphertextHandle],
        _clear_values: &[u8],
        _proof: &[u8],
    ) -> Result<()> {
        Ok(())
    }
}
