//! The remote log-source seam.

use async_trait::async_trait;

use bountyindex_core::{ChainEvent, EventKind, IndexerError};

/// Trait for the chain-data collaborator.
///
/// Implementations wrap a JSON-RPC provider (or a test double) and hand back
/// logs already decoded into [`ChainEvent`]s — ABI decoding never crosses
/// this boundary. Callers guarantee `to_block - from_block` respects the
/// provider's range cap; the engine tiles ranges before calling.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Current chain head block number.
    async fn get_block_number(&self) -> Result<u64, IndexerError>;

    /// Decoded logs of the given kinds emitted by the given contracts within
    /// `[from_block, to_block]`, ascending by block and log index.
    async fn get_logs(
        &self,
        addresses: &[String],
        kinds: &[EventKind],
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<ChainEvent>, IndexerError>;
}
