//! Shared fixtures for the submission flow tests.

#![allow(dead_code)]

use blst::min_sig::{AggregateSignature, SecretKey};
use qc_18_ds_microblock::{
    encode_submission, BlsSignatureAggregator, CommitteeMember, ConsensusState, DsPhase, EpochKey,
    InMemoryShardRegistry, Microblock, MicroblockAggregator, MicroblockConfig,
    MicroblockDependencies, MicroblockHeader, MicroblockSubmission, RecordingCompletionHandler,
    ShardCommittee, SignerBitmap, BLS_DST,
};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use shared_types::{BlsPublicKey, BlsSignature, PeerAddress, RoundId, ShardId, U256};
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

pub type TestService =
    MicroblockAggregator<BlsSignatureAggregator, InMemoryShardRegistry, RecordingCompletionHandler>;

pub const ROUND: RoundId = 3;

pub fn ds_block() -> U256 {
    U256::from(1_000u64)
}

/// Install a test subscriber once; `RUST_LOG` controls verbosity.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn accepting_state() -> ConsensusState {
    ConsensusState::new(DsPhase::MicroblockSubmission, ROUND, ds_block())
}

pub fn peer(shard_id: ShardId) -> PeerAddress {
    PeerAddress::new(IpAddr::V4(Ipv4Addr::new(172, 16, shard_id as u8, 1)), 33133)
}

/// One shard committee with signing keys.
pub struct TestShard {
    pub id: ShardId,
    pub secrets: Vec<SecretKey>,
    pub keys: Vec<BlsPublicKey>,
}

impl TestShard {
    pub fn generate(id: ShardId, size: usize, rng: &mut StdRng) -> Self {
        let mut secrets = Vec::with_capacity(size);
        let mut keys = Vec::with_capacity(size);
        for _ in 0..size {
            let mut ikm = [0u8; 32];
            rng.fill_bytes(&mut ikm);
            let sk = SecretKey::key_gen(&ikm, &[]).unwrap();
            keys.push(BlsPublicKey::from_bytes(sk.sk_to_pk().to_bytes()));
            secrets.push(sk);
        }
        Self { id, secrets, keys }
    }

    pub fn committee(&self) -> ShardCommittee {
        let members = self
            .keys
            .iter()
            .enumerate()
            .map(|(i, key)| {
                CommitteeMember::new(
                    *key,
                    PeerAddress::new(
                        IpAddr::V4(Ipv4Addr::new(10, self.id as u8, (i / 256) as u8, i as u8)),
                        33133,
                    ),
                )
            })
            .collect();
        ShardCommittee::new(self.id, members)
    }

    pub fn size(&self) -> usize {
        self.keys.len()
    }

    /// Submission builder; every member co-signs unless told otherwise.
    pub fn submission(&self) -> SubmissionBuilder<'_> {
        let all: Vec<usize> = (0..self.size()).collect();
        SubmissionBuilder {
            shard: self,
            signers: all,
            ds_block_num: ds_block(),
            round_id: ROUND,
            declared_shard: self.id,
            header_shard: self.id,
            proposer: self.keys[0],
            timestamp: 1_700_000_000,
            tx_hashes: vec![[self.id as u8; 32]],
        }
    }
}

pub struct SubmissionBuilder<'a> {
    shard: &'a TestShard,
    signers: Vec<usize>,
    ds_block_num: U256,
    round_id: RoundId,
    declared_shard: ShardId,
    header_shard: ShardId,
    proposer: BlsPublicKey,
    timestamp: u64,
    tx_hashes: Vec<[u8; 32]>,
}

impl<'a> SubmissionBuilder<'a> {
    pub fn signers(mut self, signers: &[usize]) -> Self {
        self.signers = signers.to_vec();
        self
    }

    pub fn ds_block(mut self, ds_block_num: U256) -> Self {
        self.ds_block_num = ds_block_num;
        self
    }

    pub fn round(mut self, round_id: RoundId) -> Self {
        self.round_id = round_id;
        self
    }

    pub fn declared_shard(mut self, shard_id: ShardId) -> Self {
        self.declared_shard = shard_id;
        self
    }

    pub fn header_shard(mut self, shard_id: ShardId) -> Self {
        self.header_shard = shard_id;
        self
    }

    pub fn proposer(mut self, key: BlsPublicKey) -> Self {
        self.proposer = key;
        self
    }

    pub fn timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn build(self) -> MicroblockSubmission {
        let header = MicroblockHeader {
            block_num: U256::from(50_000u64),
            ds_block_num: self.ds_block_num,
            timestamp: self.timestamp,
            shard_id: self.header_shard,
            miner_pub_key: self.proposer,
            tx_root: [0x5a; 32],
            num_txs: self.tx_hashes.len() as u32,
        };
        let message = header.signing_bytes();
        let sigs: Vec<_> = self
            .signers
            .iter()
            .map(|&i| self.shard.secrets[i].sign(&message, BLS_DST, &[]))
            .collect();
        let refs: Vec<_> = sigs.iter().collect();
        let header_sig = if refs.is_empty() {
            BlsSignature::from_bytes([0u8; 48])
        } else {
            let agg = AggregateSignature::aggregate(&refs, true).unwrap();
            BlsSignature::from_bytes(agg.to_signature().to_bytes())
        };

        MicroblockSubmission {
            ds_block_num: self.ds_block_num,
            round_id: self.round_id,
            shard_id: self.declared_shard,
            microblock: Microblock::new(
                header,
                header_sig,
                SignerBitmap::with_signers(self.shard.size(), &self.signers),
                self.tx_hashes,
            ),
        }
    }

    pub fn encode(self) -> Vec<u8> {
        encode_submission(&self.build())
    }
}

/// Shards plus a service wired to them.
pub struct Network {
    pub shards: Vec<TestShard>,
    pub service: Arc<TestService>,
    pub completion: Arc<RecordingCompletionHandler>,
}

impl Network {
    pub fn new(shard_count: usize, committee_size: usize) -> Self {
        Self::with_config(shard_count, committee_size, MicroblockConfig::default())
    }

    pub fn with_config(shard_count: usize, committee_size: usize, config: MicroblockConfig) -> Self {
        init_test_tracing();
        let mut rng = StdRng::seed_from_u64(0x0d5_b10c);
        let shards: Vec<_> = (0..shard_count as ShardId)
            .map(|id| TestShard::generate(id, committee_size, &mut rng))
            .collect();
        let registry = InMemoryShardRegistry::builder()
            .max_committee_size(config.max_committee_size)
            .committees(shards.iter().map(TestShard::committee))
            .build()
            .unwrap();
        let completion = Arc::new(RecordingCompletionHandler::new());
        let service = MicroblockAggregator::new(
            MicroblockDependencies {
                aggregator: Arc::new(BlsSignatureAggregator::new()),
                registry: Arc::new(registry),
                completion: completion.clone(),
            },
            config,
            EpochKey::new(ds_block(), ROUND),
        )
        .unwrap();
        Self {
            shards,
            service: Arc::new(service),
            completion,
        }
    }
}
