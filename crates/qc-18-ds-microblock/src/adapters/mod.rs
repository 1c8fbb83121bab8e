//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implements the outbound port traits.

mod bls;
mod completion;
mod registry;

pub use bls::{BlsSignatureAggregator, BLS_DST};
pub use completion::{EventBusCompletionHandler, RecordingCompletionHandler};
pub use registry::{InMemoryShardRegistry, ShardRegistryBuilder};
