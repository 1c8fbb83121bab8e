//! DS Microblock Service - Core business logic
//!
//! # Pipeline
//!
//! ```text
//! role/phase gate → decode → freshness → round → identity → co-signature
//!                                                               │
//!                    [exclusive] insert + completion check ◄────┘
//!                                       │
//!                          on_epoch_complete (once per epoch)
//! ```
//!
//! Every step before the insert runs without shared locks. A failing step
//! drops the submission and leaves the epoch set untouched.

use crate::algorithms::CoSignatureVerifier;
use crate::codec::{decode_submission, DecodeLimits, MicroblockSubmission, WireReader};
use crate::config::{ConfigError, MicroblockConfig};
use crate::domain::{
    ConsensusState, EpochKey, InsertOutcome, Microblock, NodeRole, ShardCommittee,
    EpochSubmissionSet, SubmissionError,
};
use crate::ports::{
    EpochCompletionHandler, MicroblockSubmissionApi, ShardRegistry, SignatureAggregator,
    SubmissionOutcome,
};
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_bus::{DsEvent, EventPublisher, DS_MICROBLOCK_SUBSYSTEM_ID};
use shared_types::{PeerAddress, ShardId};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Outbound collaborators of the service.
pub struct MicroblockDependencies<A, R, H> {
    /// BLS aggregation and verification.
    pub aggregator: Arc<A>,
    /// Shard membership for the initial epoch.
    pub registry: Arc<R>,
    /// Next consensus stage.
    pub completion: Arc<H>,
}

/// Collects shard microblocks for the DS committee.
pub struct MicroblockAggregator<A, R, H>
where
    A: SignatureAggregator,
    R: ShardRegistry,
    H: EpochCompletionHandler,
{
    verifier: CoSignatureVerifier<A>,
    registry: RwLock<Arc<R>>,
    submissions: EpochSubmissionSet,
    completion: Arc<H>,
    publisher: Option<Arc<dyn EventPublisher>>,
    role: NodeRole,
    limits: DecodeLimits,
}

impl<A, R, H> MicroblockAggregator<A, R, H>
where
    A: SignatureAggregator,
    R: ShardRegistry,
    H: EpochCompletionHandler,
{
    /// Create a service collecting for `epoch`.
    ///
    /// Fails when `config` does not validate or a committee of the registry is
    /// wider than `max_committee_size`.
    pub fn new(
        deps: MicroblockDependencies<A, R, H>,
        config: MicroblockConfig,
        epoch: EpochKey,
    ) -> Result<Self, ConfigError> {
        if let Err(e) = config
            .validate()
            .and_then(|()| config.check_registry(deps.registry.as_ref()))
        {
            error!("[qc-18] Rejected microblock collection config: {}", e);
            return Err(e);
        }

        let expected = deps.registry.shard_count();
        info!(
            role = ?config.role,
            quorum = %config.quorum,
            "[qc-18] Microblock collection for {} expecting {} shards",
            epoch,
            expected
        );

        Ok(Self {
            verifier: CoSignatureVerifier::new(deps.aggregator, config.quorum.policy()),
            registry: RwLock::new(deps.registry),
            submissions: EpochSubmissionSet::new(epoch, expected),
            completion: deps.completion,
            publisher: None,
            role: config.role,
            limits: config.decode_limits(),
        })
    }

    /// Publish accept/reject events on the shared bus.
    pub fn with_publisher(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Node role fixed at construction.
    pub fn role(&self) -> NodeRole {
        self.role
    }

    /// Epoch currently collected.
    pub fn epoch(&self) -> EpochKey {
        self.submissions.key()
    }

    /// Accepted microblocks of the current epoch, by shard id.
    pub fn collected(&self) -> BTreeMap<ShardId, Microblock> {
        self.submissions.snapshot()
    }

    /// Start a new epoch with a fresh registry snapshot.
    ///
    /// Called by the orchestrator once the previous epoch completed (or was
    /// abandoned). Submissions already in flight for the old epoch are dropped
    /// at insertion. A registry with a committee wider than the bitmap cap is
    /// refused and the current epoch stays in place.
    pub fn begin_epoch(&self, epoch: EpochKey, registry: Arc<R>) -> Result<(), ConfigError> {
        let size = registry.largest_committee();
        if size > self.limits.max_bitmap_bits {
            let err = ConfigError::CommitteeTooLarge {
                size,
                limit: self.limits.max_bitmap_bits,
            };
            error!("[qc-18] Cannot begin {}: {}", epoch, err);
            return Err(err);
        }

        let expected = registry.shard_count();
        *self.registry.write() = registry;
        self.submissions.begin_epoch(epoch, expected);
        info!(
            "[qc-18] Begin microblock collection for {} expecting {} shards",
            epoch, expected
        );
        Ok(())
    }

    fn check_gate(&self, state: &ConsensusState) -> Result<(), SubmissionError> {
        if !self.role.collects_microblocks() {
            return Err(SubmissionError::NotAccepting {
                phase: state.phase,
                lookup: true,
            });
        }
        if !state.is_accepting_submissions() {
            return Err(SubmissionError::NotAccepting {
                phase: state.phase,
                lookup: false,
            });
        }
        Ok(())
    }

    fn check_freshness(
        submission: &MicroblockSubmission,
        state: &ConsensusState,
    ) -> Result<(), SubmissionError> {
        if submission.ds_block_num.checked_add(1u64.into()) != Some(state.expected_next_ds_block()) {
            return Err(SubmissionError::StaleOrPrematureEpoch {
                submitted: submission.ds_block_num,
                current: state.ds_block_num,
            });
        }
        // The header must agree with the envelope it travels in.
        if submission.microblock.header().ds_block_num != submission.ds_block_num {
            return Err(SubmissionError::StaleOrPrematureEpoch {
                submitted: submission.microblock.header().ds_block_num,
                current: state.ds_block_num,
            });
        }

        if submission.round_id != state.round_id {
            return Err(SubmissionError::RoundMismatch {
                expected: state.round_id,
                actual: submission.round_id,
            });
        }
        Ok(())
    }

    fn check_identity<'r>(
        registry: &'r R,
        submission: &MicroblockSubmission,
    ) -> Result<&'r ShardCommittee, SubmissionError> {
        let committee = registry
            .committee_of(submission.shard_id)
            .map_err(|_| SubmissionError::UnknownShard(submission.shard_id))?;

        let header = submission.microblock.header();
        let registered = registry.shard_of(&header.miner_pub_key);
        if registered != Some(submission.shard_id) || header.shard_id != submission.shard_id {
            return Err(SubmissionError::IdentityMismatch {
                declared: submission.shard_id,
                header: header.shard_id,
                registered,
            });
        }
        Ok(committee)
    }

    async fn publish(&self, event: DsEvent) {
        if let Some(publisher) = &self.publisher {
            publisher.publish(event).await;
        }
    }

    async fn run(
        &self,
        message: &[u8],
        offset: usize,
        from: PeerAddress,
        state: &ConsensusState,
    ) -> Result<SubmissionOutcome, SubmissionError> {
        self.check_gate(state)?;

        let (submission, _) = decode_submission(message, offset, &self.limits)?;
        let shard_id = submission.shard_id;
        debug!(
            peer = %from,
            shard_id,
            ds_block = %submission.ds_block_num,
            round = submission.round_id,
            "[qc-18] Decoded microblock submission"
        );

        Self::check_freshness(&submission, state)?;

        let registry = Arc::clone(&self.registry.read());
        let committee = Self::check_identity(&registry, &submission)?;
        debug!(
            shard_id,
            "[qc-18] Proposer {} is a member of shard {} ({} members)",
            submission.microblock.header().miner_pub_key.short_hex(),
            shard_id,
            committee.len()
        );

        self.verifier
            .verify(registry.as_ref(), shard_id, &submission.microblock)?;

        let microblock_hash = submission.microblock.hash();
        let proposer = submission.microblock.header().miner_pub_key;
        let epoch = EpochKey::new(submission.ds_block_num, submission.round_id);

        let (collected, expected, replaced, completion) = match self
            .submissions
            .insert_and_check(epoch, shard_id, submission.microblock)
        {
            InsertOutcome::Inserted {
                collected,
                expected,
                completion,
            } => (collected, expected, false, completion),
            InsertOutcome::Replaced {
                collected,
                expected,
            } => (collected, expected, true, None),
            InsertOutcome::Sealed => return Err(SubmissionError::EpochSealed),
            InsertOutcome::WrongEpoch { current } if current.round_id != epoch.round_id => {
                return Err(SubmissionError::RoundMismatch {
                    expected: current.round_id,
                    actual: epoch.round_id,
                })
            }
            InsertOutcome::WrongEpoch { current } => {
                return Err(SubmissionError::StaleOrPrematureEpoch {
                    submitted: epoch.ds_block_num,
                    current: current.ds_block_num,
                })
            }
        };

        info!(
            peer = %from,
            shard_id,
            ds_block = %epoch.ds_block_num,
            round = epoch.round_id,
            "[qc-18] Microblock accepted ({}/{}){}",
            collected,
            expected,
            if replaced { ", replaced earlier submission" } else { "" }
        );
        if self.role == NodeRole::PrimaryDs && collected == 1 && !replaced {
            info!(shard_id, "[qc-18] [FRST] First microblock of {} received", epoch);
        }

        self.publish(DsEvent::MicroblockAccepted {
            ds_block_num: epoch.ds_block_num,
            round_id: epoch.round_id,
            shard_id,
            microblock_hash,
            proposer,
            collected,
            expected,
        })
        .await;

        let completed_epoch = completion.is_some();
        if let Some(completion) = completion {
            if self.role == NodeRole::PrimaryDs {
                info!(shard_id, "[qc-18] [LAST] Last microblock of {} received", epoch);
            }
            info!(
                "[qc-18] All {} microblocks collected for {}, triggering final block consensus",
                expected, epoch
            );
            if let Err(e) = self.completion.on_epoch_complete(completion).await {
                error!("[qc-18] Epoch completion handler failed for {}: {}", epoch, e);
            }
        }

        Ok(SubmissionOutcome {
            epoch,
            shard_id,
            microblock_hash,
            collected,
            expected,
            replaced,
            completed_epoch,
        })
    }
}

/// Shard id from the message prefix, if the prefix is there at all.
fn declared_shard(message: &[u8], offset: usize) -> Option<ShardId> {
    let mut reader = WireReader::new(message, offset).ok()?;
    reader.take(36).ok()?;
    reader.u32().ok()
}

#[async_trait]
impl<A, R, H> MicroblockSubmissionApi for MicroblockAggregator<A, R, H>
where
    A: SignatureAggregator + 'static,
    R: ShardRegistry + 'static,
    H: EpochCompletionHandler + 'static,
{
    async fn process_submission(
        &self,
        message: &[u8],
        offset: usize,
        from: PeerAddress,
        state: &ConsensusState,
    ) -> Result<SubmissionOutcome, SubmissionError> {
        self.run(message, offset, from, state).await
    }

    async fn submit(
        &self,
        message: &[u8],
        offset: usize,
        from: PeerAddress,
        state: &ConsensusState,
    ) -> bool {
        let err = match self.run(message, offset, from, state).await {
            Ok(_) => return true,
            Err(err) => err,
        };

        let shard_id = declared_shard(message, offset);
        if err.is_invariant_violation() {
            error!(
                peer = %from,
                shard_id = ?shard_id,
                reason = err.kind(),
                "[qc-18] Microblock submission hit an invariant violation: {}",
                err
            );
            self.publish(DsEvent::CriticalError {
                subsystem_id: DS_MICROBLOCK_SUBSYSTEM_ID,
                error: err.to_string(),
            })
            .await;
        } else {
            warn!(
                peer = %from,
                shard_id = ?shard_id,
                reason = err.kind(),
                "[qc-18] Microblock submission rejected: {}",
                err
            );
        }

        self.publish(DsEvent::MicroblockRejected {
            shard_id,
            peer: from,
            reason: err.kind().to_string(),
        })
        .await;
        false
    }
}
