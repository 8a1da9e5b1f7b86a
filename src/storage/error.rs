#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage io error")]
    Io(#[from] std::io::Error),
    #[error("Storage serialization error")]
    Serialization(#[from] serde_json::Error),
}
