//! API Key authentication
//!
//! Keys are formatted as: `sk_<account_prefix>_<random>`

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::RwLock;

use crate::domain::AccountId;

use super::{AuthContext, AuthError, Permissions};

/// API key prefix
pub const API_KEY_PREFIX: &str = "sk_";

/// API key metadata
#[derive(Debug, Clone)]
pub struct ApiKeyRecord {
    /// Hash of the API key (never store plaintext)
    pub key_hash: String,

    /// Account this key authenticates as
    pub account_id: AccountId,

    /// Permissions granted by this key
    pub permissions: Permissions,

    /// Whether the key is active
    pub active: bool,
}

/// API key validator
pub struct ApiKeyValidator {
    /// In-memory key store (for development)
    /// In production, this would query the database
    keys: RwLock<HashMap<String, ApiKeyRecord>>,
}

impl ApiKeyValidator {
    pub fn new() -> Self {
        Self {
            keys: RwLock::new(HashMap::new()),
        }
    }

    /// Generate a new API key
    ///
    /// Returns (plaintext_key, key_hash)
    pub fn generate_key(account_id: &AccountId) -> (String, String) {
        use base64::Engine;
        use rand::Rng;
        let mut rng = rand::thread_rng();

        let random_bytes: [u8; 24] = rng.gen();
        let random_part =
            base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(random_bytes);

        let account_prefix = &account_id.0.to_string()[..8];
        let plaintext_key = format!("{API_KEY_PREFIX}{account_prefix}{random_part}");

        let key_hash = Self::hash_key(&plaintext_key);

        (plaintext_key, key_hash)
    }

    /// Hash an API key for storage
    pub fn hash_key(key: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Register a new API key
    pub fn register_key(&self, record: ApiKeyRecord) {
        let mut keys = self.keys.write().unwrap();
        keys.insert(record.key_hash.clone(), record);
    }

    /// Validate an API key and return the auth context
    pub fn validate(&self, key: &str) -> Result<AuthContext, AuthError> {
        if !key.starts_with(API_KEY_PREFIX) {
            return Err(AuthError::InvalidApiKey);
        }

        let key_hash = Self::hash_key(key);

        let keys = self.keys.read().unwrap();
        let record = keys.get(&key_hash).ok_or(AuthError::InvalidApiKey)?;

        if !record.active {
            return Err(AuthError::InvalidApiKey);
        }

        Ok(AuthContext {
            account_id: record.account_id,
            permissions: record.permissions.clone(),
        })
    }

    /// Revoke an API key
    pub fn revoke(&self, key_hash: &str) {
        let mut keys = self.keys.write().unwrap();
        if let Some(record) = keys.get_mut(key_hash) {
            record.active = false;
        }
    }
}

impl Default for ApiKeyValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_key() {
        let account_id = AccountId::new();
        let (key, hash) = ApiKeyValidator::generate_key(&account_id);

        assert!(key.starts_with(API_KEY_PREFIX));
        assert_eq!(hash.len(), 64); // SHA-256 hex
    }

    #[test]
    fn test_validate_key() {
        let validator = ApiKeyValidator::new();
        let account_id = AccountId::new();

        let (key, hash) = ApiKeyValidator::generate_key(&account_id);

        validator.register_key(ApiKeyRecord {
            key_hash: hash,
            account_id,
            permissions: Permissions::read_write(),
            active: true,
        });

        let context = validator.validate(&key).unwrap();
        assert_eq!(context.account_id, account_id);
        assert!(context.can_read());
        assert!(context.can_write());
        assert!(!context.is_admin());
    }

    #[test]
    fn test_invalid_key() {
        let validator = ApiKeyValidator::new();

        let result = validator.validate("invalid_key");
        assert!(result.is_err());
    }

    #[test]
    fn test_revoked_key() {
        let validator = ApiKeyValidator::new();
        let account_id = AccountId::new();

        let (key, hash) = ApiKeyValidator::generate_key(&account_id);

        validator.register_key(ApiKeyRecord {
            key_hash: hash.clone(),
            account_id,
            permissions: Permissions::read_write(),
            active: true,
        });

        assert!(validator.validate(&key).is_ok());

        validator.revoke(&hash);

        assert!(validator.validate(&key).is_err());
    }
}
