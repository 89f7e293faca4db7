//! REST API endpoints for the StreamKey Registry.

use axum::extract::Extension;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::Engine;
use serde::Deserialize;

use crate::api::ApiError;
use crate::auth::{AuthContext, AuthContextExt};
use crate::domain::{CiphertextHandle, Conference, ConferenceId};
use crate::registry::CreateConference;
use crate::server::AppState;

/// Build the `/api` router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/conferences", post(create_conference))
        .route("/v1/conferences", get(list_conferences))
        .route("/v1/conferences/:id", get(get_conference))
        .route("/v1/conferences/:id/decryption", post(submit_decryption))
        .route("/v1/conferences/:id/end", post(end_conference))
        .route("/v1/conferences/:id/events", get(list_conference_events))
        .route("/v1/accounts/keys", post(issue_api_key))
}

fn ensure_read(auth: &AuthContext) -> Result<(), ApiError> {
    if !auth.can_read() {
        return Err(ApiError::new(
            StatusCode::FORBIDDEN,
            crate::api::ErrorCode::Forbidden,
            "Read permission required",
        ));
    }
    Ok(())
}

fn ensure_write(auth: &AuthContext) -> Result<(), ApiError> {
    if !auth.can_write() {
        return Err(ApiError::new(
            StatusCode::FORBIDDEN,
            crate::api::ErrorCode::Forbidden,
            "Write permission required",
        ));
    }
    Ok(())
}

fn decode_base64_any(s: &str) -> Result<Vec<u8>, ApiError> {
    let trimmed = s.trim();
    base64::engine::general_purpose::STANDARD
        .decode(trimmed)
        .or_else(|_| base64::engine::general_purpose::STANDARD_NO_PAD.decode(trimmed))
        .or_else(|_| base64::engine::general_purpose::URL_SAFE.decode(trimmed))
        .or_else(|_| base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(trimmed))
        .map_err(|e| ApiError::bad_request(format!("Invalid base64: {e}")))
}

fn parse_handle(s: &str) -> Result<CiphertextHandle, ApiError> {
    CiphertextHandle::from_hex(s)
        .map_err(|e| ApiError::bad_request(format!("Invalid ciphertext handle: {e}")))
}

fn parse_conference_id(s: &str) -> Result<ConferenceId, ApiError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(ApiError::bad_request("Conference id must not be empty"));
    }
    if trimmed.len() > 128 {
        return Err(ApiError::bad_request(
            "Conference id must be <= 128 characters",
        ));
    }
    Ok(ConferenceId::new(trimmed))
}

fn conference_json(conference: &Conference) -> serde_json::Value {
    serde_json::json!({
        "id": conference.id,
        "sealed_key": conference.sealed_key,
        "creator": conference.creator,
        "start_time": conference.start_time,
        "end_time": conference.end_time,
        "is_active": conference.is_active(),
        "is_decrypted": conference.is_revealed(),
        "decrypted_value": conference.revealed_value(),
        "created_at": conference.created_at,
    })
}

// ============================================================================
// Conferences
// ============================================================================

#[derive(Debug, Deserialize)]
struct CreateConferenceRequest {
    id: String,
    /// Hex-encoded 32-byte ciphertext handle from the provider SDK
    sealed_key: String,
    /// Base64-encoded input proof
    proof_b64: String,
    start_time: i64,
    end_time: i64,
}

async fn create_conference(
    State(state): State<AppState>,
    Extension(AuthContextExt(auth)): Extension<AuthContextExt>,
    Json(request): Json<CreateConferenceRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    ensure_write(&auth)?;

    let id = parse_conference_id(&request.id)?;
    let sealed_key = parse_handle(&request.sealed_key)?;
    let proof = decode_base64_any(&request.proof_b64)?;
    if proof.is_empty() {
        return Err(ApiError::bad_request("proof_b64 must not be empty"));
    }

    let conference = state
        .registry
        .create(
            auth.account_id,
            CreateConference {
                id,
                sealed_key,
                proof,
                start_time: request.start_time,
                end_time: request.end_time,
            },
        )
        .await?;

    state.metrics.inc_counter(crate::metrics::names::CONFERENCES_CREATED).await;

    Ok((StatusCode::CREATED, Json(conference_json(&conference))))
}

async fn list_conferences(
    State(state): State<AppState>,
    Extension(AuthContextExt(auth)): Extension<AuthContextExt>,
) -> Result<Json<serde_json::Value>, ApiError> {
    ensure_read(&auth)?;

    let ids = state.registry.list_ids().await?;
    let count = ids.len();

    Ok(Json(serde_json::json!({
        "conference_ids": ids,
        "count": count,
    })))
}

async fn get_conference(
    State(state): State<AppState>,
    Extension(AuthContextExt(auth)): Extension<AuthContextExt>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    ensure_read(&auth)?;

    let id = parse_conference_id(&id)?;
    let conference = state.registry.get(&id).await?;

    Ok(Json(conference_json(&conference)))
}

// ============================================================================
// Decryption claims
// ============================================================================

#[derive(Debug, Deserialize)]
struct SubmitDecryptionRequest {
    /// Hex-encoded 32-byte big-endian clear-value word
    clear_value: String,
    /// Base64-encoded decryption proof
    proof_b64: String,
}

async fn submit_decryption(
    State(state): State<AppState>,
    Extension(AuthContextExt(auth)): Extension<AuthContextExt>,
    Path(id): Path<String>,
    Json(request): Json<SubmitDecryptionRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    ensure_write(&auth)?;

    let id = parse_conference_id(&id)?;

    let clear_hex = request
        .clear_value
        .strip_prefix("0x")
        .unwrap_or(&request.clear_value);
    let clear_value = hex::decode(clear_hex)
        .map_err(|e| ApiError::bad_request(format!("Invalid clear value hex: {e}")))?;

    let proof = decode_base64_any(&request.proof_b64)?;
    if proof.is_empty() {
        return Err(ApiError::bad_request("proof_b64 must not be empty"));
    }

    let value = match state
        .registry
        .submit_decryption(&id, &clear_value, &proof)
        .await
    {
        Ok(value) => value,
        Err(e) => {
            match &e {
                crate::infra::RegistryError::InvalidDecryptionProof(_) => {
                    state
                        .metrics
                        .inc_counter(crate::metrics::names::CLAIMS_REJECTED)
                        .await
                }
                crate::infra::RegistryError::Gateway(_) => {
                    state
                        .metrics
                        .inc_counter(crate::metrics::names::GATEWAY_FAILURES)
                        .await
                }
                _ => {}
            }
            return Err(e.into());
        }
    };

    state.metrics.inc_counter(crate::metrics::names::KEYS_REVEALED).await;

    Ok(Json(serde_json::json!({
        "id": id,
        "decrypted_value": value,
        "is_decrypted": true,
    })))
}

// ============================================================================
// Ending
// ============================================================================

async fn end_conference(
    State(state): State<AppState>,
    Extension(AuthContextExt(auth)): Extension<AuthContextExt>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    ensure_write(&auth)?;

    let id = parse_conference_id(&id)?;
    state.registry.end(auth.account_id, &id).await?;

    state.metrics.inc_counter(crate::metrics::names::CONFERENCES_ENDED).await;

    Ok(Json(serde_json::json!({
        "id": id,
        "is_active": false,
    })))
}

// ============================================================================
// Event log
// ============================================================================

async fn list_conference_events(
    State(state): State<AppState>,
    Extension(AuthContextExt(auth)): Extension<AuthContextExt>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    ensure_read(&auth)?;

    let id = parse_conference_id(&id)?;
    let events = state.registry.events(&id).await?;
    let count = events.len();

    Ok(Json(serde_json::json!({
        "id": id,
        "events": events,
        "count": count,
    })))
}

// ============================================================================
// API keys
// ============================================================================

#[derive(Debug, Deserialize)]
struct IssueApiKeyRequest {
    account_id: uuid::Uuid,
    /// "read", "read_write", or "admin"
    #[serde(default = "default_role")]
    role: String,
}

fn default_role() -> String {
    "read_write".to_string()
}

async fn issue_api_key(
    State(state): State<AppState>,
    Extension(AuthContextExt(auth)): Extension<AuthContextExt>,
    Json(request): Json<IssueApiKeyRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    use crate::auth::{ApiKeyRecord, ApiKeyValidator, Permissions};
    use crate::domain::AccountId;

    if !auth.is_admin() {
        return Err(ApiError::new(
            StatusCode::FORBIDDEN,
            crate::api::ErrorCode::Forbidden,
            "Admin permission required",
        ));
    }

    let permissions = match request.role.as_str() {
        "read" => Permissions::read_only(),
        "read_write" => Permissions::read_write(),
        "admin" => Permissions::admin(),
        other => {
            return Err(ApiError::bad_request(format!("Unknown role: {other:?}")));
        }
    };

    let account_id = AccountId::from_uuid(request.account_id);
    let (plaintext_key, key_hash) = ApiKeyValidator::generate_key(&account_id);
    state.api_key_validator.register_key(ApiKeyRecord {
        key_hash,
        account_id,
        permissions,
        active: true,
    });

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "account_id": account_id,
            "role": request.role,
            "api_key": plaintext_key,
        })),
    ))
}
