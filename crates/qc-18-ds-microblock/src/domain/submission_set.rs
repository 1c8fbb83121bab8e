//! # Epoch Submission Set
//!
//! Accepted microblocks of one epoch, at most one per shard.
//!
//! The only mutating entry point is [`EpochSubmissionSet::insert_and_check`]:
//! insertion and the completion decision happen under one lock, so exactly one
//! caller observes the transition to "complete".

use super::microblock::Microblock;
use parking_lot::Mutex;
use shared_types::{Hash, RoundId, ShardId, U256};
use std::collections::BTreeMap;
use std::fmt;

/// Identifies one collection epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EpochKey {
    /// DS block number submissions carry.
    pub ds_block_num: U256,
    /// Consensus round id submissions carry.
    pub round_id: RoundId,
}

impl EpochKey {
    /// Create an epoch key.
    pub fn new(ds_block_num: U256, round_id: RoundId) -> Self {
        Self {
            ds_block_num,
            round_id,
        }
    }
}

impl fmt::Display for EpochKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ds={}/round={}", self.ds_block_num, self.round_id)
    }
}

/// Everything final block construction needs from a completed epoch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpochCompletion {
    /// Completed epoch.
    pub key: EpochKey,
    /// Microblocks in ascending shard order.
    pub microblocks: Vec<(ShardId, Microblock)>,
}

impl EpochCompletion {
    /// Shard ids in ascending order.
    pub fn shard_ids(&self) -> Vec<ShardId> {
        self.microblocks.iter().map(|(id, _)| *id).collect()
    }

    /// Microblock hashes in ascending shard order.
    pub fn microblock_hashes(&self) -> Vec<Hash> {
        self.microblocks.iter().map(|(_, mb)| mb.hash()).collect()
    }
}

/// Result of [`EpochSubmissionSet::insert_and_check`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// First microblock from this shard.
    Inserted {
        /// Entries after insertion.
        collected: usize,
        /// Entries needed to complete the epoch.
        expected: usize,
        /// Present only for the insertion that completed the epoch.
        completion: Option<EpochCompletion>,
    },
    /// Superseded an earlier microblock from the same shard.
    Replaced {
        /// Entries (unchanged).
        collected: usize,
        /// Entries needed to complete the epoch.
        expected: usize,
    },
    /// Epoch already complete; nothing stored.
    Sealed,
    /// Submission belongs to another epoch; nothing stored.
    WrongEpoch {
        /// Epoch the set is collecting for.
        current: EpochKey,
    },
}

impl InsertOutcome {
    /// Whether the microblock was stored.
    pub fn is_stored(&self) -> bool {
        matches!(self, Self::Inserted { .. } | Self::Replaced { .. })
    }

    /// Whether this call completed the epoch.
    pub fn completed_now(&self) -> bool {
        matches!(
            self,
            Self::Inserted {
                completion: Some(_),
                ..
            }
        )
    }
}

#[derive(Debug)]
struct EpochEntries {
    key: EpochKey,
    expected: usize,
    entries: BTreeMap<ShardId, Microblock>,
    sealed: bool,
}

/// Per-epoch submission set.
#[derive(Debug)]
pub struct EpochSubmissionSet {
    inner: Mutex<EpochEntries>,
}

impl EpochSubmissionSet {
    /// Empty set collecting `expected` shards for `key`.
    pub fn new(key: EpochKey, expected: usize) -> Self {
        Self {
            inner: Mutex::new(EpochEntries {
                key,
                expected,
                entries: BTreeMap::new(),
                sealed: false,
            }),
        }
    }

    /// Store `microblock` for `shard_id` and report whether the epoch just completed.
    pub fn insert_and_check(
        &self,
        key: EpochKey,
        shard_id: ShardId,
        microblock: Microblock,
    ) -> InsertOutcome {
        let mut inner = self.inner.lock();

        if inner.key != key {
            return InsertOutcome::WrongEpoch { current: inner.key };
        }
        if inner.sealed {
            return InsertOutcome::Sealed;
        }

        let expected = inner.expected;
        if inner.entries.insert(shard_id, microblock).is_some() {
            return InsertOutcome::Replaced {
                collected: inner.entries.len(),
                expected,
            };
        }

        let collected = inner.entries.len();
        let completion = if collected >= expected {
            inner.sealed = true;
            Some(EpochCompletion {
                key,
                microblocks: inner
                    .entries
                    .iter()
                    .map(|(id, mb)| (*id, mb.clone()))
                    .collect(),
            })
        } else {
            None
        };

        InsertOutcome::Inserted {
            collected,
            expected,
            completion,
        }
    }

    /// Drop all entries and start collecting for `key`.
    pub fn begin_epoch(&self, key: EpochKey, expected: usize) {
        let mut inner = self.inner.lock();
        inner.key = key;
        inner.expected = expected;
        inner.entries.clear();
        inner.sealed = false;
    }

    /// Epoch currently collected.
    pub fn key(&self) -> EpochKey {
        self.inner.lock().key
    }

    /// Number of stored microblocks.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    /// Whether the epoch has completed.
    pub fn is_sealed(&self) -> bool {
        self.inner.lock().sealed
    }

    /// Ordered copy of the stored microblocks.
    pub fn snapshot(&self) -> BTreeMap<ShardId, Microblock> {
        self.inner.lock().entries.clone()
    }
}
