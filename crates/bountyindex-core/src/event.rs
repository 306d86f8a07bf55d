//! The fixed event vocabulary the indexer understands.
//!
//! The remote collaborator hands back logs already decoded into named fields
//! ([`ChainEvent`]); raw ABI decoding never enters this crate. [`EventKind`]
//! is the fieldless mirror used to scope `get_logs` queries, the way a
//! topic0 filter scopes an `eth_getLogs` call.

use alloy_primitives::U256;

// ─── EventKind ────────────────────────────────────────────────────────────────

/// Every event type the indexer decodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    BountyCreated,
    BountyClaimed,
    WorkSubmitted,
    SubmissionApproved,
    SubmissionAutoApproved,
    BountyExpired,
    BountyCancelled,
    SubmissionRejected,
    AgentRegistered,
    AgentUpdated,
    FeedbackSubmitted,
}

impl EventKind {
    /// Kinds emitted by the factory and the two registries. Fetched first in
    /// every window so creations land before any lifecycle event.
    pub const FACTORY_AND_REGISTRY: [EventKind; 4] = [
        Self::BountyCreated,
        Self::AgentRegistered,
        Self::AgentUpdated,
        Self::FeedbackSubmitted,
    ];

    /// Kinds emitted by individual bounty contracts. Fetched scoped to the
    /// bounty addresses already present in the snapshot.
    pub const BOUNTY_LIFECYCLE: [EventKind; 7] = [
        Self::BountyClaimed,
        Self::WorkSubmitted,
        Self::SubmissionApproved,
        Self::SubmissionAutoApproved,
        Self::BountyExpired,
        Self::BountyCancelled,
        Self::SubmissionRejected,
    ];

    /// The event name as emitted by the contracts.
    pub fn name(&self) -> &'static str {
        match self {
            Self::BountyCreated => "BountyCreated",
            Self::BountyClaimed => "BountyClaimed",
            Self::WorkSubmitted => "WorkSubmitted",
            Self::SubmissionApproved => "SubmissionApproved",
            Self::SubmissionAutoApproved => "SubmissionAutoApproved",
            Self::BountyExpired => "BountyExpired",
            Self::BountyCancelled => "BountyCancelled",
            Self::SubmissionRejected => "SubmissionRejected",
            Self::AgentRegistered => "AgentRegistered",
            Self::AgentUpdated => "AgentUpdated",
            Self::FeedbackSubmitted => "FeedbackSubmitted",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ─── EventPayload ─────────────────────────────────────────────────────────────

/// Decoded, typed fields of one event.
///
/// Raw integer amounts stay `U256` until the applier turns them into decimal
/// strings for storage.
#[derive(Debug, Clone)]
pub enum EventPayload {
    BountyCreated {
        poster: String,
        token: String,
        amount: U256,
        deadline: u64,
        task_uri: String,
        skill_tags: Vec<String>,
    },
    BountyClaimed {
        claimer: String,
        claimer_agent_id: String,
    },
    WorkSubmitted {
        proof_uri: String,
    },
    SubmissionApproved,
    SubmissionAutoApproved,
    BountyExpired,
    BountyCancelled,
    SubmissionRejected {
        /// Cumulative rejection count as reported by the contract.
        rejection_count: u32,
        poster_bond: Option<U256>,
        bond_rate: Option<u64>,
    },
    AgentRegistered {
        agent_id: String,
        owner: String,
        agent_uri: String,
    },
    AgentUpdated {
        agent_id: String,
        agent_uri: String,
    },
    FeedbackSubmitted {
        agent_id: String,
        rating: u8,
    },
}

impl EventPayload {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::BountyCreated { .. } => EventKind::BountyCreated,
            Self::BountyClaimed { .. } => EventKind::BountyClaimed,
            Self::WorkSubmitted { .. } => EventKind::WorkSubmitted,
            Self::SubmissionApproved => EventKind::SubmissionApproved,
            Self::SubmissionAutoApproved => EventKind::SubmissionAutoApproved,
            Self::BountyExpired => EventKind::BountyExpired,
            Self::BountyCancelled => EventKind::BountyCancelled,
            Self::SubmissionRejected { .. } => EventKind::SubmissionRejected,
            Self::AgentRegistered { .. } => EventKind::AgentRegistered,
            Self::AgentUpdated { .. } => EventKind::AgentUpdated,
            Self::FeedbackSubmitted { .. } => EventKind::FeedbackSubmitted,
        }
    }
}

// ─── ChainEvent ───────────────────────────────────────────────────────────────

/// One decoded log, as returned by the remote log source.
#[derive(Debug, Clone)]
pub struct ChainEvent {
    /// For bounty events: the bounty contract address — on creations the
    /// collaborator fills in the freshly deployed address decoded out of the
    /// factory log. For registry events: the emitting registry (the subject
    /// agent id lives in the payload).
    pub address: String,
    /// Block the log was emitted in.
    pub block_number: u64,
    /// Transaction hash; some sources omit it, the applier normalizes `None`
    /// to the empty string.
    pub tx_hash: Option<String>,
    /// Decoded named fields.
    pub payload: EventPayload,
}

impl ChainEvent {
    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }
}
