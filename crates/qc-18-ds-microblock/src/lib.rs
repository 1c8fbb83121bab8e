//! # QC-18 DS Microblock Collection
//!
//! Collects per-shard microblocks on directory-service (DS) nodes and hands
//! the complete set to final block consensus.
//!
//! **Subsystem ID:** 18
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Each shard committee co-signs its microblock header with BLS. A DS node:
//!
//! - decodes the submission message (bounds-checked, big-endian)
//! - checks phase, DS block freshness, round id and proposer identity
//! - verifies the committee co-signature against a quorum of the bitmap
//! - stores the microblock, one per shard, for the current epoch
//! - fires the completion trigger exactly once when every shard reported
//!
//! ### Choreography
//!
//! ```text
//! Shard leaders ──submission──→ MicroblockAggregator
//!                                      │ (all shards in)
//!                                      ↓
//!                        EpochCompletionHandler ──MicroblocksCollected──→ [Event Bus]
//!                                                                              │
//!                                                                 [Final block consensus]
//! ```
//!
//! ## Module Structure
//!
//! ```text
//! qc-18-ds-microblock/
//! ├── domain/      # Microblock, committees, bitmaps, consensus state, submission set
//! ├── codec/       # Wire format
//! ├── algorithms/  # Co-signature verification
//! ├── ports/       # API trait + dependency traits
//! ├── adapters/    # blst aggregator, in-memory registry, bus-backed trigger
//! ├── config.rs    # MicroblockConfig
//! └── service.rs   # MicroblockAggregator
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use qc_18_ds_microblock::*;
//!
//! let service = MicroblockAggregator::new(
//!     MicroblockDependencies {
//!         aggregator: Arc::new(BlsSignatureAggregator::new()),
//!         registry: Arc::new(registry),
//!         completion: Arc::new(EventBusCompletionHandler::new(bus.clone())),
//!     },
//!     MicroblockConfig::from_env(),
//!     EpochKey::new(ds_block_num, round_id),
//! )?;
//!
//! let stored = service.submit(&message, 0, peer, &gate.snapshot()).await;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod codec;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

#[cfg(test)]
mod test_support;

// Re-exports
pub use adapters::{
    BlsSignatureAggregator, EventBusCompletionHandler, InMemoryShardRegistry,
    RecordingCompletionHandler, ShardRegistryBuilder, BLS_DST,
};
pub use algorithms::{CoSignatureReport, CoSignatureVerifier};
pub use codec::{
    decode_submission, encode_submission, DecodeLimits, MicroblockSubmission, HEADER_SIZE,
    MIN_MICROBLOCK_SIZE, MIN_SUBMISSION_SIZE,
};
pub use config::{ConfigError, MicroblockConfig, QuorumRule};
pub use domain::{
    AggregationError, CoSignatureError, CodecError, CommitteeMember, CommitteeSigners,
    ConsensusState, ConsensusStateGate, DsPhase, EpochCompletion, EpochKey, FixedQuorum,
    Microblock, MicroblockHeader, NodeRole, QuorumPolicy, RegistryError, ShardCommittee,
    SignerBitmap, StateError, SubmissionError, SupermajorityQuorum,
};
pub use ports::{
    EpochCompletionHandler, MicroblockSubmissionApi, ShardRegistry, SignatureAggregator,
    SubmissionOutcome,
};
pub use service::{MicroblockAggregator, MicroblockDependencies};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
