//! # Co-Signature Verification
//!
//! Checks that a microblock header carries a valid collective signature from
//! a quorum of its shard committee:
//!
//! 1. committee lookup
//! 2. zip committee with the signer bitmap (length-checked)
//! 3. quorum check on the set bits
//! 4. aggregate the signer keys
//! 5. verify the header signature under the aggregate
//!
//! The quorum check precedes any curve arithmetic, so under-signed
//! microblocks are rejected cheaply.

use crate::domain::{CoSignatureError, CommitteeSigners, Microblock, QuorumPolicy};
use crate::ports::{ShardRegistry, SignatureAggregator};
use shared_types::ShardId;
use std::sync::Arc;
use tracing::debug;

/// Participation figures of a verified co-signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoSignatureReport {
    /// Set bits in the bitmap.
    pub signers: usize,
    /// Committee size.
    pub committee_size: usize,
    /// Quorum that applied.
    pub required: usize,
}

/// Verifies shard committee co-signatures.
pub struct CoSignatureVerifier<A: SignatureAggregator> {
    aggregator: Arc<A>,
    quorum: Arc<dyn QuorumPolicy>,
}

impl<A: SignatureAggregator> CoSignatureVerifier<A> {
    /// Create a verifier.
    pub fn new(aggregator: Arc<A>, quorum: Arc<dyn QuorumPolicy>) -> Self {
        Self { aggregator, quorum }
    }

    /// Verify the co-signature of `microblock` against the committee of `shard_id`.
    pub fn verify<R: ShardRegistry + ?Sized>(
        &self,
        registry: &R,
        shard_id: ShardId,
        microblock: &Microblock,
    ) -> Result<CoSignatureReport, CoSignatureError> {
        let committee = registry
            .committee_of(shard_id)
            .map_err(|_| CoSignatureError::UnknownShard(shard_id))?;

        let signers = CommitteeSigners::zip(committee, microblock.signer_bitmap())?;

        let required = self.quorum.quorum_for(signers.committee_size());
        if signers.signer_count() < required {
            return Err(CoSignatureError::InsufficientSigners {
                got: signers.signer_count(),
                required,
            });
        }

        let aggregated = self.aggregator.aggregate(&signers.signer_keys())?;

        let message = microblock.header().signing_bytes();
        if !self
            .aggregator
            .verify(&message, microblock.header_sig(), &aggregated)
        {
            return Err(CoSignatureError::SignatureInvalid);
        }

        debug!(
            shard_id,
            "[qc-18] Co-signature valid: {}/{} signers (quorum {})",
            signers.signer_count(),
            signers.committee_size(),
            required
        );

        Ok(CoSignatureReport {
            signers: signers.signer_count(),
            committee_size: signers.committee_size(),
            required,
        })
    }
}
