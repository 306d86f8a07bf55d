//! Indexer configuration — the deployment a snapshot is built against.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::types::normalize_address;

/// Configuration for one indexed deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexerConfig {
    /// Network identifier recorded into the snapshot.
    pub chain_id: u64,
    /// Factory contract emitting bounty-creation events.
    pub factory_address: String,
    /// Identity registry emitting agent registration/update events.
    pub identity_registry_address: String,
    /// Reputation registry emitting feedback events.
    pub reputation_registry_address: String,
    /// Block the factory was deployed at — the checkpoint seed for a fresh
    /// snapshot, so the first sync never scans pre-deployment history.
    pub deploy_block: u64,
    /// Largest block range the log source accepts per query.
    pub max_block_range: u64,
    /// Polling interval in live mode (milliseconds).
    pub poll_interval_ms: u64,
    /// Where the snapshot document is persisted.
    pub snapshot_path: PathBuf,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            chain_id: 8453,
            factory_address: String::new(),
            identity_registry_address: String::new(),
            reputation_registry_address: String::new(),
            deploy_block: 0,
            max_block_range: 10_000,
            poll_interval_ms: 30_000,
            snapshot_path: PathBuf::from("bounty-index.json"),
        }
    }
}

/// Fluent builder for [`IndexerConfig`].
///
/// Contract addresses are normalized to lowercase here, so everything
/// downstream can compare them byte-for-byte.
///
/// # Example
///
/// ```rust
/// use bountyindex_core::IndexerConfigBuilder;
///
/// let config = IndexerConfigBuilder::new()
///     .chain_id(8453)
///     .factory("0xFAC70000000000000000000000000000000000aa")
///     .identity_registry("0x1De0000000000000000000000000000000000bb")
///     .reputation_registry("0xRe9000000000000000000000000000000000000cc")
///     .deploy_block(19_000_000)
///     .max_block_range(10_000)
///     .build();
/// assert_eq!(config.deploy_block, 19_000_000);
/// ```
#[derive(Default)]
pub struct IndexerConfigBuilder {
    config: IndexerConfig,
}

impl IndexerConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: IndexerConfig::default(),
        }
    }

    pub fn chain_id(mut self, id: u64) -> Self {
        self.config.chain_id = id;
        self
    }

    pub fn factory(mut self, addr: impl AsRef<str>) -> Self {
        self.config.factory_address = normalize_address(addr.as_ref());
        self
    }

    pub fn identity_registry(mut self, addr: impl AsRef<str>) -> Self {
        self.config.identity_registry_address = normalize_address(addr.as_ref());
        self
    }

    pub fn reputation_registry(mut self, addr: impl AsRef<str>) -> Self {
        self.config.reputation_registry_address = normalize_address(addr.as_ref());
        self
    }

    pub fn deploy_block(mut self, block: u64) -> Self {
        self.config.deploy_block = block;
        self
    }

    /// Largest block range per log query. Must be at least one block; zero
    /// is clamped to 1 so a misconfiguration degrades to slow, single-block
    /// windows instead of panicking mid-sync.
    pub fn max_block_range(mut self, range: u64) -> Self {
        self.config.max_block_range = range.max(1);
        self
    }

    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_ms = ms;
        self
    }

    pub fn snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.snapshot_path = path.into();
        self
    }

    pub fn build(self) -> IndexerConfig {
        self.config
    }
}
