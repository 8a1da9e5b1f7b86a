use base64::{Engine, engine::general_purpose::STANDARD};
use secrecy::{ExposeSecret, SecretString};

use crate::{
    auth::{UserIdentity, decode_expiry},
    clock::SharedClock,
};

use super::SharedStorage;

/// Persists the session token and user identity.
///
/// Values are base64 encoded so they are not stored as plain text; this is
/// obfuscation only. Storage failures are logged and read as "no credential".
#[derive(Clone)]
pub struct CredentialStore {
    storage: SharedStorage,
    clock: SharedClock,
    token_key: String,
    user_key: String,
}

impl CredentialStore {
    pub fn new(storage: SharedStorage, clock: SharedClock, namespace: &str) -> Self {
        Self {
            storage,
            clock,
            token_key: format!("{namespace}-token"),
            user_key: format!("{namespace}-user"),
        }
    }

    pub fn token_key(&self) -> &str {
        &self.token_key
    }

    pub fn user_key(&self) -> &str {
        &self.user_key
    }

    pub fn set_token(&self, token: &SecretString) {
        if let Err(error) = self
            .storage
            .set(&self.token_key, &encode(token.expose_secret()))
        {
            tracing::warn!(err.msg = %error, "Failed to store token");
        }
    }

    pub fn get_token(&self) -> Option<SecretString> {
        match self.storage.get(&self.token_key) {
            Ok(raw) => raw.map(|raw| SecretString::from(decode(raw))),
            Err(error) => {
                tracing::warn!(err.msg = %error, "Failed to retrieve token");
                None
            }
        }
    }

    pub fn set_user(&self, user: &UserIdentity) {
        let result = serde_json::to_string(user)
            .map_err(super::StorageError::from)
            .and_then(|raw| self.storage.set(&self.user_key, &encode(&raw)));

        if let Err(error) = result {
            tracing::warn!(err.msg = %error, "Failed to store user data");
        }
    }

    pub fn get_user(&self) -> Option<UserIdentity> {
        let raw = match self.storage.get(&self.user_key) {
            Ok(raw) => raw?,
            Err(error) => {
                tracing::warn!(err.msg = %error, "Failed to retrieve user data");
                return None;
            }
        };

        serde_json::from_str(&decode(raw))
            .inspect_err(|error| tracing::warn!(err.msg = %error, "Failed to retrieve user data"))
            .ok()
    }

    pub fn clear(&self) {
        for key in [&self.token_key, &self.user_key] {
            if let Err(error) = self.storage.remove(key) {
                tracing::warn!(key = %key, err.msg = %error, "Failed to clear storage");
            }
        }
    }

    /// True when there is no token, it cannot be decoded, or its `exp` has passed.
    pub fn is_token_expired(&self) -> bool {
        match self.get_token() {
            Some(token) => self.is_expired(&token),
            None => true,
        }
    }

    /// The stored token to attach to outgoing requests.
    ///
    /// Opaque tokens are always sent and the backend decides. Only a JWT whose
    /// `exp` has passed is held back.
    pub fn bearer_token(&self) -> Option<SecretString> {
        self.get_token()
            .filter(|token| match decode_expiry(token.expose_secret()) {
                Ok(expiry) => expiry >= self.clock.now(),
                Err(_) => true,
            })
    }

    fn is_expired(&self, token: &SecretString) -> bool {
        match decode_expiry(token.expose_secret()) {
            Ok(expiry) => expiry < self.clock.now(),
            Err(error) => {
                tracing::debug!(err.msg = %error, "Unreadable token treated as expired");
                true
            }
        }
    }
}

fn encode(value: &str) -> String {
    STANDARD.encode(value.as_bytes())
}

fn decode(raw: String) -> String {
    STANDARD
        .decode(raw.as_bytes())
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or(raw)
}
