//! The bounty-marketplace snapshot — the persisted projection of every
//! entity derived from the event stream.
//!
//! Field names follow the persisted JSON document exactly (camelCase, with
//! `taskURI`/`proofURI`/`agentURI` spelled as emitted by the contracts), so
//! the on-disk shape mirrors these structs one-to-one.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::IndexerConfig;

/// Lowercase an address (or any identifier compared case-insensitively).
///
/// Every address stored in the snapshot goes through this, and every lookup
/// normalizes its input the same way before comparison.
pub fn normalize_address(addr: &str) -> String {
    addr.to_ascii_lowercase()
}

// ─── BountyStatus ─────────────────────────────────────────────────────────────

/// Lifecycle status of a bounty.
///
/// `open → claimed → submitted → {approved | rejected}`;
/// `rejected → resolved` on the second rejection;
/// `open → {expired | cancelled}` bypassing the claim path.
/// `approved`, `expired`, `cancelled`, and `resolved` are terminal as far as
/// this engine is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BountyStatus {
    Open,
    Claimed,
    Submitted,
    Approved,
    Expired,
    Cancelled,
    Rejected,
    Resolved,
}

impl BountyStatus {
    /// Every status, in declaration order (used for exhaustive stats).
    pub const ALL: [BountyStatus; 8] = [
        Self::Open,
        Self::Claimed,
        Self::Submitted,
        Self::Approved,
        Self::Expired,
        Self::Cancelled,
        Self::Rejected,
        Self::Resolved,
    ];
}

impl std::fmt::Display for BountyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Claimed => write!(f, "claimed"),
            Self::Submitted => write!(f, "submitted"),
            Self::Approved => write!(f, "approved"),
            Self::Expired => write!(f, "expired"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Rejected => write!(f, "rejected"),
            Self::Resolved => write!(f, "resolved"),
        }
    }
}

// ─── BountyRecord ─────────────────────────────────────────────────────────────

/// One bounty, keyed in the snapshot by its lowercase contract address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BountyRecord {
    /// Bounty contract address (lowercase hex).
    pub bounty_address: String,
    /// Address that created the bounty (lowercase hex).
    pub poster: String,
    /// ERC-20 token the bounty pays out in (lowercase hex).
    pub token: String,
    /// Escrowed amount as the decimal string of a 256-bit integer.
    /// Never a float — amounts near 2^256 would lose precision.
    pub amount: String,
    /// Claim deadline, unix seconds.
    pub deadline: u64,
    /// Opaque task descriptor; decoding its contents is a consumer concern.
    #[serde(rename = "taskURI")]
    pub task_uri: String,
    /// Skill tags copied out of the creation event (independently mutable).
    pub skill_tags: Vec<String>,
    /// Current lifecycle status.
    pub status: BountyStatus,
    /// Block the creation event was observed in.
    pub created_block: u64,
    /// Transaction hash of the creation event; empty string when the source
    /// log carried none (never null).
    pub created_tx_hash: String,

    // Populated only by lifecycle events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claimer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claimer_agent_id: Option<String>,
    #[serde(rename = "proofURI", default, skip_serializing_if = "Option::is_none")]
    pub proof_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_bond: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bond_rate: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_block: Option<u64>,
}

// ─── AgentRecord ──────────────────────────────────────────────────────────────

/// One registered agent, keyed in the snapshot by its registry identifier.
///
/// Follows the same rules as bounties: created exactly once by the first
/// registration event, mutated by later registry events, never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRecord {
    /// Identity-registry identifier for this agent.
    pub agent_id: String,
    /// Address that owns the registration (lowercase hex).
    pub owner: String,
    /// Opaque agent metadata descriptor.
    #[serde(rename = "agentURI")]
    pub agent_uri: String,
    /// Block the registration event was observed in.
    pub registered_block: u64,
    /// Transaction hash of the registration; empty string when absent.
    pub registered_tx_hash: String,
    /// Number of reputation-registry feedback events applied.
    pub feedback_count: u64,
    /// Sum of all feedback ratings (consumers derive the average).
    pub rating_sum: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_block: Option<u64>,
}

// ─── BountyIndex ──────────────────────────────────────────────────────────────

/// The snapshot aggregate — one per configured deployment.
///
/// Mutated only by the sync engine, persisted wholesale by the store.
/// `BTreeMap` keeps the serialized document deterministic and diffable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BountyIndex {
    /// Highest block fully processed and persisted (the checkpoint).
    pub last_block: u64,
    /// Factory contract this snapshot was built against. A mismatch with the
    /// configured factory on load signals a network switch and a full reset.
    pub factory_address: String,
    pub identity_registry_address: String,
    pub reputation_registry_address: String,
    pub chain_id: u64,
    /// Bounty-contract address (lowercase hex) → record.
    pub bounties: BTreeMap<String, BountyRecord>,
    /// Agent identifier → record.
    pub agents: BTreeMap<String, AgentRecord>,
}

impl BountyIndex {
    /// A fresh default snapshot for the configured deployment: the checkpoint
    /// sits at the factory's deploy block and both entity maps are empty.
    pub fn fresh(config: &IndexerConfig) -> Self {
        Self {
            last_block: config.deploy_block,
            factory_address: normalize_address(&config.factory_address),
            identity_registry_address: normalize_address(&config.identity_registry_address),
            reputation_registry_address: normalize_address(&config.reputation_registry_address),
            chain_id: config.chain_id,
            bounties: BTreeMap::new(),
            agents: BTreeMap::new(),
        }
    }

    /// The known bounty contract addresses (already lowercase), used to scope
    /// lifecycle log queries.
    pub fn bounty_addresses(&self) -> Vec<String> {
        self.bounties.keys().cloned().collect()
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
