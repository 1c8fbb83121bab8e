//! BLS fixtures for unit tests.

use crate::adapters::BLS_DST;
use crate::codec::{encode_submission, MicroblockSubmission};
use crate::domain::{CommitteeMember, Microblock, MicroblockHeader, ShardCommittee, SignerBitmap};
use blst::min_sig::{AggregateSignature, SecretKey};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use shared_types::{BlsPublicKey, BlsSignature, PeerAddress, RoundId, ShardId, U256};
use std::net::{IpAddr, Ipv4Addr};

/// A committee member that can sign.
#[derive(Clone, Debug)]
pub struct TestSigner {
    pub secret: SecretKey,
    pub public_key: BlsPublicKey,
}

/// `n` deterministic key pairs.
pub fn test_signers(seed: u64, n: usize) -> Vec<TestSigner> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let mut ikm = [0u8; 32];
            rng.fill_bytes(&mut ikm);
            let secret = SecretKey::key_gen(&ikm, &[]).unwrap();
            let public_key = BlsPublicKey::from_bytes(secret.sk_to_pk().to_bytes());
            TestSigner { secret, public_key }
        })
        .collect()
}

/// Collective signature of `signers` over `message`.
pub fn co_sign(signers: &[TestSigner], message: &[u8]) -> BlsSignature {
    let sigs: Vec<_> = signers
        .iter()
        .map(|s| s.secret.sign(message, BLS_DST, &[]))
        .collect();
    let refs: Vec<_> = sigs.iter().collect();
    let aggregate = AggregateSignature::aggregate(&refs, true).unwrap();
    BlsSignature::from_bytes(aggregate.to_signature().to_bytes())
}

/// Committee with members in the given order.
pub fn committee_of(shard_id: ShardId, signers: &[TestSigner]) -> ShardCommittee {
    let members = signers
        .iter()
        .enumerate()
        .map(|(i, s)| {
            CommitteeMember::new(
                s.public_key,
                PeerAddress::new(
                    IpAddr::V4(Ipv4Addr::new(10, 0, shard_id as u8, i as u8)),
                    33133,
                ),
            )
        })
        .collect();
    ShardCommittee::new(shard_id, members)
}

/// Encoded submission from `signers[0]` co-signed by `participating`.
pub fn signed_submission(
    shard_id: ShardId,
    signers: &[TestSigner],
    participating: &[usize],
    ds_block_num: U256,
    round_id: RoundId,
) -> Vec<u8> {
    let header = MicroblockHeader {
        block_num: U256::from(1u64),
        ds_block_num,
        timestamp: 1_700_000_000,
        shard_id,
        miner_pub_key: signers[0].public_key,
        tx_root: [shard_id as u8; 32],
        num_txs: 0,
    };
    let subset: Vec<TestSigner> = participating.iter().map(|&i| signers[i].clone()).collect();
    let sig = co_sign(&subset, &header.signing_bytes());
    encode_submission(&MicroblockSubmission {
        ds_block_num,
        round_id,
        shard_id,
        microblock: Microblock::new(
            header,
            sig,
            SignerBitmap::with_signers(signers.len(), participating),
            vec![],
        ),
    })
}
