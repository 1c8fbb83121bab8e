//! # Microblock
//!
//! A shard's per-epoch transaction batch: header, collective header signature
//! and the signer bitmap. Immutable once built.

use super::committee::SignerBitmap;
use crate::codec;
use sha3::{Digest, Keccak256};
use shared_types::{BlsPublicKey, BlsSignature, Hash, ShardId, U256};

/// Microblock header. Its wire encoding is the collective signature's message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MicroblockHeader {
    /// Transaction block number.
    pub block_num: U256,
    /// DS block number the microblock was produced under.
    pub ds_block_num: U256,
    /// Unix timestamp (seconds).
    pub timestamp: u64,
    /// Producing shard.
    pub shard_id: ShardId,
    /// Shard leader that proposed the microblock.
    pub miner_pub_key: BlsPublicKey,
    /// Digest over the batched transactions.
    pub tx_root: Hash,
    /// Number of transaction hashes in the body.
    pub num_txs: u32,
}

impl MicroblockHeader {
    /// Deterministic header bytes, exactly as transmitted.
    pub fn signing_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(codec::HEADER_SIZE);
        codec::encode_header(self, &mut out);
        out
    }
}

/// A shard microblock.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Microblock {
    header: MicroblockHeader,
    header_sig: BlsSignature,
    signer_bitmap: SignerBitmap,
    tx_hashes: Vec<Hash>,
}

impl Microblock {
    /// Assemble a microblock. `header.num_txs` must equal `tx_hashes.len()`;
    /// the decoder guarantees this for wire input.
    pub fn new(
        header: MicroblockHeader,
        header_sig: BlsSignature,
        signer_bitmap: SignerBitmap,
        tx_hashes: Vec<Hash>,
    ) -> Self {
        debug_assert_eq!(header.num_txs as usize, tx_hashes.len());
        Self {
            header,
            header_sig,
            signer_bitmap,
            tx_hashes,
        }
    }

    /// Header.
    pub fn header(&self) -> &MicroblockHeader {
        &self.header
    }

    /// Collective signature over the header.
    pub fn header_sig(&self) -> &BlsSignature {
        &self.header_sig
    }

    /// Which committee members took part in the collective signature.
    pub fn signer_bitmap(&self) -> &SignerBitmap {
        &self.signer_bitmap
    }

    /// Transaction hashes in batch order.
    pub fn tx_hashes(&self) -> &[Hash] {
        &self.tx_hashes
    }

    /// Shard id declared by the header.
    pub fn shard_id(&self) -> ShardId {
        self.header.shard_id
    }

    /// keccak256 of the full wire encoding.
    pub fn hash(&self) -> Hash {
        let mut hasher = Keccak256::new();
        hasher.update(codec::encode_microblock(self));
        hasher.finalize().into()
    }
}
