//! # BLS Signature Aggregator (BLS12-381)
//!
//! `min_sig` variant: signatures on G1 (48 bytes), public keys on G2
//! (96 bytes). Shard committees co-sign the microblock header; the DS node
//! aggregates the participating keys and checks the single collective
//! signature against the aggregate.

use crate::domain::AggregationError;
use crate::ports::SignatureAggregator;
use blst::min_sig::{AggregatePublicKey, PublicKey, Signature};
use blst::BLST_ERROR;
use shared_types::{BlsPublicKey, BlsSignature};

/// Domain Separation Tag for BLS signatures (Ethereum 2.0 style)
pub const BLS_DST: &[u8] = b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_POP_";

/// blst-backed [`SignatureAggregator`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BlsSignatureAggregator;

impl BlsSignatureAggregator {
    /// Create an aggregator.
    pub fn new() -> Self {
        Self
    }
}

impl SignatureAggregator for BlsSignatureAggregator {
    fn aggregate(&self, public_keys: &[BlsPublicKey]) -> Result<BlsPublicKey, AggregationError> {
        if public_keys.is_empty() {
            return Err(AggregationError::EmptyKeySet);
        }

        let pks = public_keys
            .iter()
            .enumerate()
            .map(|(i, pk)| {
                PublicKey::from_bytes(&pk.bytes).map_err(|_| AggregationError::InvalidKey(i))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let pk_refs: Vec<&PublicKey> = pks.iter().collect();

        // Group check on every key; committee keys come off the wire.
        let aggregate =
            AggregatePublicKey::aggregate(&pk_refs, true).map_err(|_| AggregationError::Failed)?;

        Ok(BlsPublicKey::from_bytes(aggregate.to_public_key().to_bytes()))
    }

    fn verify(
        &self,
        message: &[u8],
        signature: &BlsSignature,
        aggregated_key: &BlsPublicKey,
    ) -> bool {
        let Ok(sig) = Signature::from_bytes(&signature.bytes) else {
            return false;
        };
        let Ok(pk) = PublicKey::from_bytes(&aggregated_key.bytes) else {
            return false;
        };

        sig.verify(true, message, BLS_DST, &[], &pk, true) == BLST_ERROR::BLST_SUCCESS
    }
}
