//! Ports layer (Hexagonal Architecture)
//!
//! - inbound: the submission API
//! - outbound: signature aggregation, shard registry, completion trigger

pub mod inbound;
pub mod outbound;

pub use inbound::{MicroblockSubmissionApi, SubmissionOutcome};
pub use outbound::{EpochCompletionHandler, ShardRegistry, SignatureAggregator};
