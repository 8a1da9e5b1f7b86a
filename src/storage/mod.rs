pub mod credentials;
pub mod error;
pub mod kv;

pub use credentials::CredentialStore;
pub use error::StorageError;
pub use kv::{FileStorage, KeyValueStore, MemoryStorage, SharedStorage};

use serde::{Serialize, de::DeserializeOwned};

/// Reads a JSON snapshot, treating anything unreadable as absent.
pub fn load_snapshot<T: DeserializeOwned>(storage: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = match storage.get(key) {
        Ok(raw) => raw?,
        Err(error) => {
            tracing::warn!(key, err.msg = %error, "Failed to read snapshot");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(error) => {
            tracing::warn!(key, err.msg = %error, "Discarding unreadable snapshot");
            None
        }
    }
}

pub fn save_snapshot<T: Serialize>(storage: &dyn KeyValueStore, key: &str, value: &T) {
    let result = serde_json::to_string(value)
        .map_err(StorageError::from)
        .and_then(|raw| storage.set(key, &raw));

    if let Err(error) = result {
        tracing::warn!(key, err.msg = %error, err.details = ?error, "Failed to persist snapshot");
    }
}
