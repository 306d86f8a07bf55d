//! The event applier — turns one decoded log into a snapshot mutation.
//!
//! Pure in-memory work with no side effects beyond the entity maps, and
//! infallible by contract: duplicate creations and lifecycle events for
//! unknown addresses are normal traffic (redundant delivery, foreign
//! deployments sharing chain history) and are dropped silently.

use tracing::debug;

use crate::event::{ChainEvent, EventKind, EventPayload};
use crate::types::{normalize_address, AgentRecord, BountyIndex, BountyRecord, BountyStatus};

/// The legal event → status transitions, declared once.
///
/// Every lifecycle kind requires an existing record; none validates the prior
/// status, because the emitting contract is the source of truth and the
/// stream dictates whatever transition it dictates. `SubmissionRejected` is
/// absent here — its target status depends on the cumulative count (see
/// [`rejection_status`]).
pub const BOUNTY_TRANSITIONS: &[(EventKind, BountyStatus)] = &[
    (EventKind::BountyClaimed, BountyStatus::Claimed),
    (EventKind::WorkSubmitted, BountyStatus::Submitted),
    (EventKind::SubmissionApproved, BountyStatus::Approved),
    (EventKind::SubmissionAutoApproved, BountyStatus::Approved),
    (EventKind::BountyExpired, BountyStatus::Expired),
    (EventKind::BountyCancelled, BountyStatus::Cancelled),
];

fn transition_for(kind: EventKind) -> Option<BountyStatus> {
    BOUNTY_TRANSITIONS
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, status)| *status)
}

/// First strike allows resubmission; the second is terminal and returns the
/// escrow to the poster.
fn rejection_status(count: u32) -> BountyStatus {
    if count >= 2 {
        BountyStatus::Resolved
    } else {
        BountyStatus::Rejected
    }
}

/// Apply one decoded event to the snapshot.
pub fn apply_event(index: &mut BountyIndex, event: &ChainEvent) {
    match &event.payload {
        EventPayload::BountyCreated {
            poster,
            token,
            amount,
            deadline,
            task_uri,
            skill_tags,
        } => {
            let key = normalize_address(&event.address);
            if index.bounties.contains_key(&key) {
                // First write wins; a redundant creation never overwrites.
                debug!(bounty = %key, "duplicate creation event dropped");
                return;
            }
            index.bounties.insert(
                key.clone(),
                BountyRecord {
                    bounty_address: key,
                    poster: normalize_address(poster),
                    token: normalize_address(token),
                    amount: amount.to_string(),
                    deadline: *deadline,
                    task_uri: task_uri.clone(),
                    skill_tags: skill_tags.clone(),
                    status: BountyStatus::Open,
                    created_block: event.block_number,
                    created_tx_hash: event.tx_hash.clone().unwrap_or_default(),
                    claimer: None,
                    claimer_agent_id: None,
                    proof_uri: None,
                    rejection_count: None,
                    poster_bond: None,
                    bond_rate: None,
                    updated_block: None,
                },
            );
        }

        EventPayload::AgentRegistered {
            agent_id,
            owner,
            agent_uri,
        } => {
            if index.agents.contains_key(agent_id) {
                debug!(agent = %agent_id, "duplicate registration event dropped");
                return;
            }
            index.agents.insert(
                agent_id.clone(),
                AgentRecord {
                    agent_id: agent_id.clone(),
                    owner: normalize_address(owner),
                    agent_uri: agent_uri.clone(),
                    registered_block: event.block_number,
                    registered_tx_hash: event.tx_hash.clone().unwrap_or_default(),
                    feedback_count: 0,
                    rating_sum: 0,
                    updated_block: None,
                },
            );
        }

        EventPayload::AgentUpdated { agent_id, agent_uri } => {
            let Some(agent) = index.agents.get_mut(agent_id) else {
                debug!(agent = %agent_id, "update for unknown agent dropped");
                return;
            };
            agent.agent_uri = agent_uri.clone();
            agent.updated_block = Some(event.block_number);
        }

        EventPayload::FeedbackSubmitted { agent_id, rating } => {
            let Some(agent) = index.agents.get_mut(agent_id) else {
                debug!(agent = %agent_id, "feedback for unknown agent dropped");
                return;
            };
            agent.feedback_count += 1;
            agent.rating_sum += u64::from(*rating);
            agent.updated_block = Some(event.block_number);
        }

        payload => apply_bounty_lifecycle(index, event, payload),
    }
}

fn apply_bounty_lifecycle(index: &mut BountyIndex, event: &ChainEvent, payload: &EventPayload) {
    let key = normalize_address(&event.address);
    let Some(bounty) = index.bounties.get_mut(&key) else {
        // No phantom records: an event referencing a bounty we never saw
        // created is ignored, not an error.
        debug!(kind = %payload.kind(), bounty = %key, "lifecycle event for unknown bounty dropped");
        return;
    };

    match payload {
        EventPayload::BountyClaimed {
            claimer,
            claimer_agent_id,
        } => {
            bounty.claimer = Some(normalize_address(claimer));
            bounty.claimer_agent_id = Some(claimer_agent_id.clone());
        }
        EventPayload::WorkSubmitted { proof_uri } => {
            bounty.proof_uri = Some(proof_uri.clone());
        }
        EventPayload::SubmissionRejected {
            rejection_count,
            poster_bond,
            bond_rate,
        } => {
            bounty.rejection_count = Some(*rejection_count);
            if let Some(bond) = poster_bond {
                bounty.poster_bond = Some(bond.to_string());
            }
            if let Some(rate) = bond_rate {
                bounty.bond_rate = Some(*rate);
            }
            bounty.status = rejection_status(*rejection_count);
            bounty.updated_block = Some(event.block_number);
            return;
        }
        // Approved / auto-approved / expired / cancelled carry no fields.
        _ => {}
    }

    if let Some(status) = transition_for(payload.kind()) {
        bounty.status = status;
    }
    bounty.updated_block = Some(event.block_number);
}

// ─── Tests ────────────────────────────────────────────────────────────────────
