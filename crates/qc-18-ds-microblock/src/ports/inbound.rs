//! # Inbound Ports
//!
//! API trait defining what the DS microblock subsystem can do.

use crate::domain::{ConsensusState, EpochKey, SubmissionError};
use async_trait::async_trait;
use shared_types::{Hash, PeerAddress, ShardId};

/// What an accepted submission did to the epoch set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmissionOutcome {
    /// Epoch the microblock was stored for.
    pub epoch: EpochKey,
    /// Submitting shard.
    pub shard_id: ShardId,
    /// keccak256 of the stored microblock.
    pub microblock_hash: Hash,
    /// Entries after this submission.
    pub collected: usize,
    /// Entries needed to complete the epoch.
    pub expected: usize,
    /// An earlier microblock from the same shard was superseded.
    pub replaced: bool,
    /// This submission completed the epoch.
    pub completed_epoch: bool,
}

/// Microblock submission API - inbound port.
#[async_trait]
pub trait MicroblockSubmissionApi: Send + Sync {
    /// Process one submission message and report why it was dropped, if it was.
    async fn process_submission(
        &self,
        message: &[u8],
        offset: usize,
        from: PeerAddress,
        state: &ConsensusState,
    ) -> Result<SubmissionOutcome, SubmissionError>;

    /// Process one submission message. Rejections are logged, never returned.
    ///
    /// Returns `true` when the microblock was stored.
    async fn submit(
        &self,
        message: &[u8],
        offset: usize,
        from: PeerAddress,
        state: &ConsensusState,
    ) -> bool;
}
