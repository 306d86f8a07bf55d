//! Error types for the bountyindex pipeline.

use thiserror::Error;

/// Errors that can occur during syncing or persistence.
#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl IndexerError {
    /// Returns `true` if the error came from the remote log source
    /// (transient; polling retries on the next tick).
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Rpc(_))
    }
}

impl From<std::io::Error> for IndexerError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for IndexerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
