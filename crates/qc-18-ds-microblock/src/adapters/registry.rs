//! In-memory shard registry, frozen for one epoch.

use crate::domain::{RegistryError, ShardCommittee};
use crate::ports::ShardRegistry;
use shared_types::{BlsPublicKey, ShardId};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Validating builder for [`InMemoryShardRegistry`].
#[derive(Debug, Default)]
pub struct ShardRegistryBuilder {
    committees: Vec<ShardCommittee>,
    max_committee_size: Option<usize>,
}

impl ShardRegistryBuilder {
    /// Empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject committees with more members than `limit`.
    pub fn max_committee_size(mut self, limit: usize) -> Self {
        self.max_committee_size = Some(limit);
        self
    }

    /// Add a committee.
    pub fn committee(mut self, committee: ShardCommittee) -> Self {
        self.committees.push(committee);
        self
    }

    /// Add several committees.
    pub fn committees(mut self, committees: impl IntoIterator<Item = ShardCommittee>) -> Self {
        self.committees.extend(committees);
        self
    }

    /// Validate and freeze.
    ///
    /// # Errors
    /// `DuplicateShard`, `EmptyCommittee`, `CommitteeTooLarge` or
    /// `DuplicateMember` (a key may sit in one seat of one committee only).
    pub fn build(self) -> Result<InMemoryShardRegistry, RegistryError> {
        let mut committees = BTreeMap::new();
        let mut key_to_shard: HashMap<BlsPublicKey, ShardId> = HashMap::new();

        for committee in self.committees {
            let shard_id = committee.shard_id();
            if committee.is_empty() {
                return Err(RegistryError::EmptyCommittee(shard_id));
            }
            if let Some(limit) = self.max_committee_size {
                if committee.len() > limit {
                    return Err(RegistryError::CommitteeTooLarge {
                        shard_id,
                        size: committee.len(),
                        limit,
                    });
                }
            }
            if committees.contains_key(&shard_id) {
                return Err(RegistryError::DuplicateShard(shard_id));
            }

            for member in committee.members() {
                if let Some(first) = key_to_shard.insert(member.public_key, shard_id) {
                    return Err(RegistryError::DuplicateMember {
                        key: member.public_key,
                        first,
                        second: shard_id,
                    });
                }
            }
            committees.insert(shard_id, committee);
        }

        debug!(
            "[qc-18] Shard registry built: {} shards, {} members",
            committees.len(),
            key_to_shard.len()
        );

        Ok(InMemoryShardRegistry {
            committees,
            key_to_shard,
        })
    }
}

/// Read-only committee map with a reverse key index.
#[derive(Debug, Clone)]
pub struct InMemoryShardRegistry {
    committees: BTreeMap<ShardId, ShardCommittee>,
    key_to_shard: HashMap<BlsPublicKey, ShardId>,
}

impl InMemoryShardRegistry {
    /// Start a builder.
    pub fn builder() -> ShardRegistryBuilder {
        ShardRegistryBuilder::new()
    }
}

impl ShardRegistry for InMemoryShardRegistry {
    fn committee_of(&self, shard_id: ShardId) -> Result<&ShardCommittee, RegistryError> {
        self.committees
            .get(&shard_id)
            .ok_or(RegistryError::UnknownShard(shard_id))
    }

    fn shard_of(&self, public_key: &BlsPublicKey) -> Option<ShardId> {
        self.key_to_shard.get(public_key).copied()
    }

    fn shard_count(&self) -> usize {
        self.committees.len()
    }

    fn largest_committee(&self) -> usize {
        self.committees
            .values()
            .map(ShardCommittee::len)
            .max()
            .unwrap_or(0)
    }
}
