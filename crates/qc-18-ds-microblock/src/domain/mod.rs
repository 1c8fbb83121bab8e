//! Domain layer for DS microblock collection
//!
//! - committee: ordered shard committees and signer bitmaps
//! - consensus_state: DS phases, node role, state gate
//! - microblock: header and microblock entities
//! - quorum: co-signature thresholds
//! - submission_set: per-epoch insert-and-check set

mod committee;
mod consensus_state;
mod errors;
mod microblock;
mod quorum;
mod submission_set;

pub use committee::*;
pub use consensus_state::*;
pub use errors::*;
pub use microblock::*;
pub use quorum::*;
pub use submission_set::*;
