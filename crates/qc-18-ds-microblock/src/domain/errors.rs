//! # Domain Errors
//!
//! Error types for the DS microblock collection subsystem.
//!
//! Every submission failure is local and recoverable: the offending message is
//! dropped and logged. [`SubmissionError::InvariantViolation`] is also dropped,
//! but logged at error level: it marks a registry/codec disagreement, which a
//! peer sending a bitmap of the wrong width can trigger as well.

use super::consensus_state::DsPhase;
use shared_types::{BlsPublicKey, RoundId, ShardId, U256};
use thiserror::Error;

/// Wire decoding failures. All map to `MalformedMessage`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    /// Fewer bytes remain than the next field (or the format minimum) needs.
    #[error("Truncated message: need {required} bytes at offset {offset}, {available} available")]
    Truncated {
        /// Read position.
        offset: usize,
        /// Bytes needed from `offset`.
        required: usize,
        /// Bytes actually left.
        available: usize,
    },

    /// Start offset lies past the end of the buffer.
    #[error("Offset {offset} beyond message length {len}")]
    OffsetOutOfBounds {
        /// Requested start offset.
        offset: usize,
        /// Buffer length.
        len: usize,
    },

    /// Message exceeds the configured size cap.
    #[error("Message too large: {size} bytes > {limit} bytes")]
    TooLarge {
        /// Message size.
        size: usize,
        /// Configured limit.
        limit: usize,
    },

    /// Unused trailing bits of the signer bitmap are set.
    #[error("Signer bitmap has non-zero padding bits")]
    BitmapPadding,

    /// Signer bitmap is wider than any committee may be.
    #[error("Signer bitmap has {bits} bits, limit is {limit}")]
    BitmapTooLarge {
        /// Declared bit length.
        bits: usize,
        /// Configured committee size cap.
        limit: usize,
    },

    /// Transaction count exceeds the configured cap.
    #[error("Too many transactions: {count} > {limit}")]
    TooManyTransactions {
        /// Declared transaction count.
        count: u32,
        /// Configured limit.
        limit: u32,
    },
}

/// Shard registry lookups and construction.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// No committee registered for the shard.
    #[error("Unknown shard: {0}")]
    UnknownShard(ShardId),

    /// A committee was registered twice.
    #[error("Duplicate shard: {0}")]
    DuplicateShard(ShardId),

    /// A committee has no members.
    #[error("Shard {0} has an empty committee")]
    EmptyCommittee(ShardId),

    /// A committee is larger than the bitmap format allows.
    #[error("Shard {shard_id} committee has {size} members, limit is {limit}")]
    CommitteeTooLarge {
        /// Offending shard.
        shard_id: ShardId,
        /// Committee size.
        size: usize,
        /// Configured limit.
        limit: usize,
    },

    /// The same key sits in two committees (or twice in one).
    #[error("Key {key:?} registered in shard {first} and shard {second}")]
    DuplicateMember {
        /// Repeated key.
        key: BlsPublicKey,
        /// Shard that registered it first.
        first: ShardId,
        /// Shard that registered it again.
        second: ShardId,
    },
}

/// Public key aggregation failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AggregationError {
    /// Nothing to aggregate.
    #[error("Cannot aggregate an empty key set")]
    EmptyKeySet,

    /// A key is not a valid compressed G2 point.
    #[error("Invalid public key encoding at index {0}")]
    InvalidKey(usize),

    /// The underlying group operation failed.
    #[error("Key aggregation failed")]
    Failed,
}

/// Co-signature verification outcomes other than success.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoSignatureError {
    /// No committee for the claimed shard.
    #[error("Unknown shard: {0}")]
    UnknownShard(ShardId),

    /// Bitmap width disagrees with the committee size.
    #[error("Signer bitmap has {bitmap} bits but committee has {committee} members")]
    BitmapLengthMismatch {
        /// Bits on the microblock.
        bitmap: usize,
        /// Members in the committee.
        committee: usize,
    },

    /// Fewer signers than the quorum threshold.
    #[error("Insufficient signers: {got}/{required}")]
    InsufficientSigners {
        /// Set bits in the bitmap.
        got: usize,
        /// Quorum for the committee size.
        required: usize,
    },

    /// Signer keys could not be aggregated.
    #[error("Aggregation failed: {0}")]
    AggregationFailed(#[from] AggregationError),

    /// Collective signature does not verify under the aggregated key.
    #[error("Collective signature invalid")]
    SignatureInvalid,
}

/// Consensus state gate errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StateError {
    /// Phase change not allowed by the DS protocol.
    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        /// Current phase.
        from: DsPhase,
        /// Requested phase.
        to: DsPhase,
    },
}

/// Reasons a microblock submission is dropped.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubmissionError {
    /// Wire decode failure.
    #[error("Malformed message: {0}")]
    MalformedMessage(#[from] CodecError),

    /// Node is not collecting microblocks.
    #[error("Not accepting microblock submissions (phase {phase:?}, lookup {lookup})")]
    NotAccepting {
        /// Phase at the time of the submission.
        phase: DsPhase,
        /// True when the node role never collects microblocks.
        lookup: bool,
    },

    /// Submission targets another DS epoch.
    #[error("Stale or premature DS block: submitted {submitted}, current {current}")]
    StaleOrPrematureEpoch {
        /// DS block number carried by the submission.
        submitted: U256,
        /// DS block number the node is collecting for.
        current: U256,
    },

    /// Submission carries another consensus round id.
    #[error("Round mismatch: expected {expected}, got {actual}")]
    RoundMismatch {
        /// Node's round id.
        expected: RoundId,
        /// Submission's round id.
        actual: RoundId,
    },

    /// No committee registered for the shard.
    #[error("Unknown shard: {0}")]
    UnknownShard(ShardId),

    /// Proposer key, message shard id and header shard id disagree.
    #[error(
        "Identity mismatch: message shard {declared}, header shard {header}, proposer registered in {registered:?}"
    )]
    IdentityMismatch {
        /// Shard id in the message prefix.
        declared: ShardId,
        /// Shard id in the microblock header.
        header: ShardId,
        /// Shard the proposer key is registered in, if any.
        registered: Option<ShardId>,
    },

    /// Below the quorum threshold.
    #[error("Insufficient signers: {got}/{required}")]
    InsufficientSigners {
        /// Set bits in the bitmap.
        got: usize,
        /// Quorum for the committee size.
        required: usize,
    },

    /// Signer keys could not be aggregated.
    #[error("Aggregation failed: {0}")]
    AggregationFailed(AggregationError),

    /// Collective signature does not verify.
    #[error("Collective signature invalid")]
    SignatureInvalid,

    /// Epoch already complete; late submissions are dropped.
    #[error("Epoch already complete")]
    EpochSealed,

    /// Registry and codec disagree on the committee width.
    ///
    /// A peer can also produce this by sending a bitmap of the wrong width,
    /// so it is reported distinctly but still treated as a dropped submission.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

impl SubmissionError {
    /// Stable snake_case label for logs and events.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedMessage(_) => "malformed_message",
            Self::NotAccepting { .. } => "not_accepting",
            Self::StaleOrPrematureEpoch { .. } => "stale_or_premature_epoch",
            Self::RoundMismatch { .. } => "round_mismatch",
            Self::UnknownShard(_) => "unknown_shard",
            Self::IdentityMismatch { .. } => "identity_mismatch",
            Self::InsufficientSigners { .. } => "insufficient_signers",
            Self::AggregationFailed(_) => "aggregation_failed",
            Self::SignatureInvalid => "signature_invalid",
            Self::EpochSealed => "epoch_sealed",
            Self::InvariantViolation(_) => "invariant_violation",
        }
    }

    /// True when the registry and the decoded microblock disagree structurally.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Self::InvariantViolation(_))
    }
}

impl From<CoSignatureError> for SubmissionError {
    fn from(err: CoSignatureError) -> Self {
        match err {
            CoSignatureError::UnknownShard(id) => Self::UnknownShard(id),
            CoSignatureError::BitmapLengthMismatch { .. } => {
                Self::InvariantViolation(err.to_string())
            }
            CoSignatureError::InsufficientSigners { got, required } => {
                Self::InsufficientSigners { got, required }
            }
            CoSignatureError::AggregationFailed(inner) => Self::AggregationFailed(inner),
            CoSignatureError::SignatureInvalid => Self::SignatureInvalid,
        }
    }
}
