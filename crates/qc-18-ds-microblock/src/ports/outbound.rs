//! # Outbound Ports
//!
//! Capabilities the subsystem consumes: BLS math, the epoch's shard
//! membership and the next consensus stage.

use crate::domain::{AggregationError, EpochCompletion, RegistryError, ShardCommittee};
use async_trait::async_trait;
use shared_types::{BlsPublicKey, BlsSignature, ShardId};

/// Multi-signature primitives - outbound port.
///
/// Only the boolean outcome of `verify` is inspected.
pub trait SignatureAggregator: Send + Sync {
    /// Combine public keys into one aggregated key.
    fn aggregate(&self, public_keys: &[BlsPublicKey]) -> Result<BlsPublicKey, AggregationError>;

    /// Check `signature` over `message` under `aggregated_key`.
    fn verify(
        &self,
        message: &[u8],
        signature: &BlsSignature,
        aggregated_key: &BlsPublicKey,
    ) -> bool;
}

/// Shard membership for the current epoch - outbound port.
///
/// Implementations are read-only snapshots taken at epoch start.
pub trait ShardRegistry: Send + Sync {
    /// Ordered committee of a shard.
    fn committee_of(&self, shard_id: ShardId) -> Result<&ShardCommittee, RegistryError>;

    /// Shard a key is a committee member of.
    fn shard_of(&self, public_key: &BlsPublicKey) -> Option<ShardId>;

    /// Number of shards expected to submit each epoch.
    fn shard_count(&self) -> usize;

    /// Member count of the widest committee.
    fn largest_committee(&self) -> usize;
}

/// Next consensus stage - outbound port.
///
/// Called exactly once per epoch, after the last expected shard reported.
#[async_trait]
pub trait EpochCompletionHandler: Send + Sync {
    /// Hand the collected microblocks to final block construction.
    async fn on_epoch_complete(&self, completion: EpochCompletion) -> Result<(), String>;
}
