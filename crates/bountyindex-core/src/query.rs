//! Read views over the resident snapshot.
//!
//! Every function takes `Option<&BountyIndex>` so callers can query before
//! the first sync has run: an uninitialized snapshot yields empty results and
//! zeroed statistics, never an error. Nothing here touches the remote source.

use std::collections::BTreeMap;

use alloy_primitives::U256;

use crate::types::{normalize_address, BountyIndex, BountyRecord, BountyStatus};

/// Default result cap for [`open_bounties`].
pub const DEFAULT_LIMIT: usize = 50;

// ─── BountyFilter ─────────────────────────────────────────────────────────────

/// Filter for [`open_bounties`].
#[derive(Debug, Clone, Default)]
pub struct BountyFilter {
    /// Status to match; defaults to `open`.
    pub status: Option<BountyStatus>,
    /// Case-insensitive substring matched against any skill tag.
    pub skill: Option<String>,
    /// Inclusive lower bound on the escrowed amount.
    pub min_amount: Option<U256>,
    /// Inclusive upper bound on the escrowed amount.
    pub max_amount: Option<U256>,
    /// Result cap; defaults to [`DEFAULT_LIMIT`].
    pub limit: Option<usize>,
}

impl BountyFilter {
    fn matches(&self, bounty: &BountyRecord) -> bool {
        if bounty.status != self.status.unwrap_or(BountyStatus::Open) {
            return false;
        }
        if let Some(skill) = &self.skill {
            let needle = skill.to_ascii_lowercase();
            let hit = bounty
                .skill_tags
                .iter()
                .any(|tag| tag.to_ascii_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        if self.min_amount.is_some() || self.max_amount.is_some() {
            // Amounts are 256-bit decimal strings; the comparison stays
            // arbitrary-precision so large escrows filter exactly.
            let Ok(amount) = bounty.amount.parse::<U256>() else {
                return false;
            };
            if self.min_amount.is_some_and(|min| amount < min) {
                return false;
            }
            if self.max_amount.is_some_and(|max| amount > max) {
                return false;
            }
        }
        true
    }
}

// ─── Queries ──────────────────────────────────────────────────────────────────

/// Bounties matching `filter`, sorted ascending by deadline and truncated to
/// the filter's limit.
pub fn open_bounties<'a>(
    index: Option<&'a BountyIndex>,
    filter: &BountyFilter,
) -> Vec<&'a BountyRecord> {
    let Some(index) = index else {
        return Vec::new();
    };
    let mut matches: Vec<&BountyRecord> = index
        .bounties
        .values()
        .filter(|b| filter.matches(b))
        .collect();
    matches.sort_by_key(|b| b.deadline);
    matches.truncate(filter.limit.unwrap_or(DEFAULT_LIMIT));
    matches
}

/// Exact lookup by bounty contract address (input lowercased first).
pub fn bounty_by_address<'a>(
    index: Option<&'a BountyIndex>,
    address: &str,
) -> Option<&'a BountyRecord> {
    index?.bounties.get(&normalize_address(address))
}

/// All bounties created by `poster`.
pub fn bounties_by_poster<'a>(
    index: Option<&'a BountyIndex>,
    poster: &str,
) -> Vec<&'a BountyRecord> {
    let Some(index) = index else {
        return Vec::new();
    };
    let poster = normalize_address(poster);
    index
        .bounties
        .values()
        .filter(|b| b.poster == poster)
        .collect()
}

/// All bounties claimed by `claimer`.
pub fn bounties_by_claimer<'a>(
    index: Option<&'a BountyIndex>,
    claimer: &str,
) -> Vec<&'a BountyRecord> {
    let Some(index) = index else {
        return Vec::new();
    };
    let claimer = normalize_address(claimer);
    index
        .bounties
        .values()
        .filter(|b| b.claimer.as_deref() == Some(claimer.as_str()))
        .collect()
}

// ─── IndexStats ───────────────────────────────────────────────────────────────

/// Aggregate counts over the snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexStats {
    /// Total bounty records.
    pub total: usize,
    /// Count per status; every status is present, zero or not.
    pub by_status: BTreeMap<BountyStatus, usize>,
    /// Total agent records.
    pub agent_count: usize,
    /// The persisted checkpoint.
    pub last_synced_block: u64,
}

impl Default for IndexStats {
    fn default() -> Self {
        Self {
            total: 0,
            by_status: BountyStatus::ALL.iter().map(|s| (*s, 0)).collect(),
            agent_count: 0,
            last_synced_block: 0,
        }
    }
}

/// Per-status counts, totals, and the checkpoint; all zero when the snapshot
/// is uninitialized.
pub fn index_stats(index: Option<&BountyIndex>) -> IndexStats {
    let mut stats = IndexStats::default();
    let Some(index) = index else {
        return stats;
    };
    stats.total = index.bounties.len();
    stats.agent_count = index.agents.len();
    stats.last_synced_block = index.last_block;
    for bounty in index.bounties.values() {
        *stats.by_status.entry(bounty.status).or_insert(0) += 1;
    }
    stats
}

// ─── Tests ────────────────────────────────────────────────────────────────────
