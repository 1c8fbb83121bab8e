//! # Directory-Service Events
//!
//! Defines all event types that flow through the shared bus.

use serde::{Deserialize, Serialize};
use shared_types::entities::{BlsPublicKey, Hash, PeerAddress, RoundId, ShardId, U256};

/// Subsystem id of the DS microblock collection subsystem.
pub const DS_MICROBLOCK_SUBSYSTEM_ID: u8 = 18;

/// All events that can be published to the event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DsEvent {
    // =========================================================================
    // SUBSYSTEM 18: DS MICROBLOCK COLLECTION
    // =========================================================================
    /// A shard microblock passed every check and was stored for the epoch.
    MicroblockAccepted {
        /// DS block number the submission was made for.
        ds_block_num: U256,
        /// Consensus round id of the submission.
        round_id: RoundId,
        /// Submitting shard.
        shard_id: ShardId,
        /// keccak256 of the encoded microblock.
        microblock_hash: Hash,
        /// Shard leader that proposed the microblock.
        proposer: BlsPublicKey,
        /// Microblocks held for the epoch after this insertion.
        collected: usize,
        /// Microblocks required to complete the epoch.
        expected: usize,
    },

    /// A submission was dropped.
    MicroblockRejected {
        /// Shard id declared by the message, if it could be decoded.
        shard_id: Option<ShardId>,
        /// Network address the submission came from.
        peer: PeerAddress,
        /// Stable snake_case rejection kind.
        reason: String,
    },

    /// Every registered shard has reported for the epoch.
    /// **CHOREOGRAPHY:** this is the trigger for final block consensus.
    MicroblocksCollected {
        /// DS block number of the completed epoch.
        ds_block_num: U256,
        /// Consensus round id of the completed epoch.
        round_id: RoundId,
        /// Shards in ascending order.
        shard_ids: Vec<ShardId>,
        /// Microblock hashes, positionally matching `shard_ids`.
        microblock_hashes: Vec<Hash>,
    },

    /// Internal invariant violation routed to the dead letter queue.
    CriticalError {
        /// Subsystem that detected the violation.
        subsystem_id: u8,
        /// Human-readable description.
        error: String,
    },
}

impl DsEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::MicroblockAccepted { .. } | Self::MicroblockRejected { .. } => {
                EventTopic::MicroblockSubmission
            }
            Self::MicroblocksCollected { .. } => EventTopic::FinalBlock,
            Self::CriticalError { .. } => EventTopic::DeadLetterQueue,
        }
    }

    /// Get the originating subsystem ID.
    #[must_use]
    pub fn source_subsystem(&self) -> u8 {
        match self {
            Self::MicroblockAccepted { .. }
            | Self::MicroblockRejected { .. }
            | Self::MicroblocksCollected { .. } => DS_MICROBLOCK_SUBSYSTEM_ID,
            Self::CriticalError { subsystem_id, .. } => *subsystem_id,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Per-submission outcomes.
    MicroblockSubmission,
    /// Epoch completion (input of final block consensus).
    FinalBlock,
    /// Dead Letter Queue for critical errors.
    DeadLetterQueue,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self { topics }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &DsEvent) -> bool {
        self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic())
    }
}
