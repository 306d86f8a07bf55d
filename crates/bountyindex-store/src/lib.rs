//! Snapshot persistence — load, normalize, and atomically rewrite the
//! bounty-marketplace snapshot as one pretty-printed JSON document.
//!
//! The file's top-level shape mirrors [`BountyIndex`] exactly, with stable
//! indentation so successive snapshots stay human-diffable.
//!
//! `load` never fails by contract: a missing file, a corrupt file, or a file
//! written against a different factory deployment (a "network switch") all
//! degrade to a fresh default snapshot. A cheap resync beats a startup
//! failure — event application is idempotent, so re-deriving state is safe.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;
use tracing::{debug, warn};

use bountyindex_core::types::{AgentRecord, BountyIndex, BountyRecord};
use bountyindex_core::{IndexerConfig, IndexerError};

/// Older persisted shapes may miss top-level fields; everything is optional
/// here and backfilled with defaults after parsing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSnapshot {
    last_block: Option<u64>,
    factory_address: Option<String>,
    identity_registry_address: Option<String>,
    reputation_registry_address: Option<String>,
    chain_id: Option<u64>,
    bounties: Option<BTreeMap<String, BountyRecord>>,
    agents: Option<BTreeMap<String, AgentRecord>>,
}

/// Loads and persists the snapshot at a fixed path.
pub struct SnapshotStore {
    path: PathBuf,
    config: IndexerConfig,
}

impl SnapshotStore {
    /// A store for the deployment described by `config`, persisting at
    /// `config.snapshot_path`.
    pub fn new(config: IndexerConfig) -> Self {
        Self {
            path: config.snapshot_path.clone(),
            config,
        }
    }

    /// The path the snapshot document lives at.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Load the snapshot, falling back to a fresh default on any problem.
    pub fn load(&self) -> BountyIndex {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                if let Err(err) = fs::create_dir_all(dir) {
                    warn!(dir = %dir.display(), %err, "could not create snapshot directory");
                }
            }
        }

        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(_) => {
                debug!(path = %self.path.display(), "no snapshot on disk, starting fresh");
                return BountyIndex::fresh(&self.config);
            }
        };

        let raw: RawSnapshot = match serde_json::from_str(&contents) {
            Ok(r) => r,
            Err(err) => {
                warn!(path = %self.path.display(), %err, "corrupt snapshot discarded, starting fresh");
                return BountyIndex::fresh(&self.config);
            }
        };

        let fresh = BountyIndex::fresh(&self.config);
        let persisted_factory = raw.factory_address.as_deref().unwrap_or_default();
        if !persisted_factory.eq_ignore_ascii_case(&fresh.factory_address) {
            warn!(
                persisted = %persisted_factory,
                configured = %fresh.factory_address,
                "snapshot was built against a different factory, resetting"
            );
            return fresh;
        }

        BountyIndex {
            last_block: raw.last_block.unwrap_or(fresh.last_block),
            factory_address: fresh.factory_address,
            identity_registry_address: raw
                .identity_registry_address
                .unwrap_or(fresh.identity_registry_address),
            reputation_registry_address: raw
                .reputation_registry_address
                .unwrap_or(fresh.reputation_registry_address),
            chain_id: raw.chain_id.unwrap_or(fresh.chain_id),
            bounties: raw.bounties.unwrap_or_default(),
            agents: raw.agents.unwrap_or_default(),
        }
    }

    /// Persist the full snapshot: serialize, write to a sibling temp file,
    /// rename over the target. The directory is created first so a first run
    /// on a clean machine works.
    pub fn save(&self, index: &BountyIndex) -> Result<(), IndexerError> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }

        let json = serde_json::to_string_pretty(index)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), block = index.last_block, "snapshot persisted");
        Ok(())
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use bountyindex_core::apply_event;
    use bountyindex_core::event::{ChainEvent, EventPayload};
    use bountyindex_core::IndexerConfigBuilder;
    use tempfile::TempDir;

    const FACTORY: &str = "0xfac0000000000000000000000000000000000001";

    fn config_at(dir: &TempDir) -> IndexerConfig {
        IndexerConfigBuilder::new()
            .chain_id(8453)
            .factory(FACTORY)
            .identity_registry("0x1de0000000000000000000000000000000000002")
            .reputation_registry("0x4e90000000000000000000000000000000000003")
            .deploy_block(19_000_000)
            .snapshot_path(dir.path().join("cache").join("bounty-index.json"))
            .build()
    }

    fn populated(config: &IndexerConfig) -> BountyIndex {
        let mut index = BountyIndex::fresh(config);
        index.last_block = 19_500_000;
        apply_event(
            &mut index,
            &ChainEvent {
                address: "0xB0007".into(),
                block_number: 19_400_000,
                tx_hash: Some("0xdead".into()),
                payload: EventPayload::BountyCreated {
                    poster: "0xposter".into(),
                    token: "0xtoken".into(),
                    amount: "1000000000000000000".parse().unwrap(),
                    deadline: 1_800_000_000,
                    task_uri: "ipfs://task".into(),
                    skill_tags: vec!["rust".into()],
                },
            },
        );
        index
    }

    #[test]
    fn missing_file_yields_fresh_default() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(config_at(&dir));
        let index = store.load();
        assert_eq!(index.last_block, 19_000_000);
        assert_eq!(index.factory_address, FACTORY);
        assert!(index.bounties.is_empty());
        assert!(index.agents.is_empty());
        // The containing directory now exists, so the next save succeeds.
        assert!(store.path().parent().unwrap().exists());
    }

    #[test]
    fn roundtrip_preserves_the_snapshot() {
        let dir = TempDir::new().unwrap();
        let config = config_at(&dir);
        let store = SnapshotStore::new(config.clone());

        let index = populated(&config);
        store.save(&index).unwrap();

        let loaded = store.load();
        assert_eq!(loaded, index);
    }

    #[test]
    fn corrupt_file_is_swallowed() {
        let dir = TempDir::new().unwrap();
        let config = config_at(&dir);
        let store = SnapshotStore::new(config);
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "{ not valid json").unwrap();

        let index = store.load();
        assert_eq!(index.last_block, 19_000_000);
        assert!(index.bounties.is_empty());
    }

    #[test]
    fn factory_mismatch_resets_to_default() {
        let dir = TempDir::new().unwrap();
        let config = config_at(&dir);
        let store = SnapshotStore::new(config.clone());

        let mut foreign = populated(&config);
        foreign.factory_address = "0xother000000000000000000000000000000000ff".into();
        store.save(&foreign).unwrap();

        let loaded = store.load();
        assert_eq!(loaded.last_block, 19_000_000);
        assert_eq!(loaded.factory_address, FACTORY);
        assert!(loaded.bounties.is_empty());
    }

    #[test]
    fn legacy_shape_is_backfilled_with_defaults() {
        let dir = TempDir::new().unwrap();
        let config = config_at(&dir);
        let store = SnapshotStore::new(config);
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        // An older document with only the factory and a checkpoint.
        fs::write(
            store.path(),
            format!(r#"{{ "factoryAddress": "{FACTORY}", "lastBlock": 19100000 }}"#),
        )
        .unwrap();

        let loaded = store.load();
        assert_eq!(loaded.last_block, 19_100_000);
        assert_eq!(loaded.chain_id, 8453);
        assert!(loaded.bounties.is_empty());
        assert!(loaded.agents.is_empty());
    }

    #[test]
    fn saved_document_is_pretty_and_camel_case() {
        let dir = TempDir::new().unwrap();
        let config = config_at(&dir);
        let store = SnapshotStore::new(config.clone());
        store.save(&populated(&config)).unwrap();

        let text = fs::read_to_string(store.path()).unwrap();
        assert!(text.contains("\n  \"lastBlock\""));
        assert!(text.contains("\"taskURI\""));
        assert!(text.contains("0xb0007"));
    }

    #[test]
    fn save_leaves_no_temp_file_behind() {
        let dir = TempDir::new().unwrap();
        let config = config_at(&dir);
        let store = SnapshotStore::new(config.clone());
        store.save(&populated(&config)).unwrap();

        let siblings: Vec<_> = fs::read_dir(store.path().parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(siblings, vec!["bounty-index.json"]);
    }
}
