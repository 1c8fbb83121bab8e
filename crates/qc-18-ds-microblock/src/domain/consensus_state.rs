//! # DS Consensus State
//!
//! Phase, round id and DS block number of the local DS node.
//!
//! The orchestrator owns a [`ConsensusStateGate`] and advances it; every
//! submission is judged against an immutable [`ConsensusState`] snapshot taken
//! once at the start of `submit`.

use super::errors::StateError;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use shared_types::{RoundId, U256};
use std::str::FromStr;

/// DS node protocol phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DsPhase {
    /// Not participating yet.
    Idle,
    /// Collecting PoW solutions for the next DS committee.
    PowSubmission,
    /// Running consensus on the DS block.
    DsBlockConsensus,
    /// Collecting shard microblocks.
    MicroblockSubmission,
    /// Running consensus on the final block.
    FinalBlockConsensus,
    /// Replacing a faulty DS leader.
    ViewChange,
}

impl DsPhase {
    /// Whether microblock submissions are processed in this phase.
    pub fn accepts_microblocks(&self) -> bool {
        matches!(self, Self::MicroblockSubmission)
    }

    /// Check if transition is valid.
    pub fn can_transition_to(&self, next: DsPhase) -> bool {
        match (self, next) {
            (Self::Idle, Self::PowSubmission) => true,
            (Self::PowSubmission, Self::DsBlockConsensus) => true,
            (Self::DsBlockConsensus, Self::MicroblockSubmission) => true,
            (Self::MicroblockSubmission, Self::FinalBlockConsensus) => true,
            // Next tx epoch inside the same DS epoch.
            (Self::FinalBlockConsensus, Self::MicroblockSubmission) => true,
            // Last tx epoch of the DS epoch.
            (Self::FinalBlockConsensus, Self::PowSubmission) => true,
            (
                Self::DsBlockConsensus | Self::MicroblockSubmission | Self::FinalBlockConsensus,
                Self::ViewChange,
            ) => true,
            (
                Self::ViewChange,
                Self::DsBlockConsensus | Self::MicroblockSubmission | Self::FinalBlockConsensus,
            ) => true,
            (_, Self::Idle) => true,
            _ => false,
        }
    }
}

/// Role of the local node, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NodeRole {
    /// DS leader of the current round.
    PrimaryDs,
    /// DS committee member other than the leader.
    #[default]
    BackupDs,
    /// Lookup/archival node; never collects microblocks.
    Lookup,
}

impl NodeRole {
    /// Lookup nodes never take part in DS consensus.
    pub fn collects_microblocks(&self) -> bool {
        !matches!(self, Self::Lookup)
    }
}

impl FromStr for NodeRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "primary_ds" | "primary" => Ok(Self::PrimaryDs),
            "backup_ds" | "backup" => Ok(Self::BackupDs),
            "lookup" => Ok(Self::Lookup),
            other => Err(format!("unknown node role: {other}")),
        }
    }
}

/// Immutable view of the consensus state at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsensusState {
    /// Bumped on every write to the gate.
    pub version: u64,
    /// Current phase.
    pub phase: DsPhase,
    /// Current consensus round id.
    pub round_id: RoundId,
    /// Number of the DS block the node is currently working under.
    pub ds_block_num: U256,
}

impl ConsensusState {
    /// Snapshot for tests and bootstrapping.
    pub fn new(phase: DsPhase, round_id: RoundId, ds_block_num: U256) -> Self {
        Self {
            version: 0,
            phase,
            round_id,
            ds_block_num,
        }
    }

    /// Whether submissions are processed in this state.
    pub fn is_accepting_submissions(&self) -> bool {
        self.phase.accepts_microblocks()
    }

    /// DS block number the node will produce next.
    ///
    /// A submission for DS block `n` is fresh when `n + 1` equals this value.
    /// Saturates at `U256::MAX`, which no real chain reaches.
    pub fn expected_next_ds_block(&self) -> U256 {
        self.ds_block_num.saturating_add(U256::one())
    }
}

/// Orchestrator-owned holder of the live consensus state.
#[derive(Debug)]
pub struct ConsensusStateGate {
    state: RwLock<ConsensusState>,
}

impl ConsensusStateGate {
    /// Create a gate in `Idle` at the given DS block.
    pub fn new(ds_block_num: U256, round_id: RoundId) -> Self {
        Self::from_state(ConsensusState::new(DsPhase::Idle, round_id, ds_block_num))
    }

    /// Create a gate from an explicit state.
    pub fn from_state(state: ConsensusState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> ConsensusState {
        *self.state.read()
    }

    /// Shortcut for `snapshot().is_accepting_submissions()`.
    pub fn is_accepting_submissions(&self) -> bool {
        self.state.read().is_accepting_submissions()
    }

    /// Move to `next` if the protocol allows it.
    pub fn transition_to(&self, next: DsPhase) -> Result<ConsensusState, StateError> {
        let mut state = self.state.write();
        if !state.phase.can_transition_to(next) {
            return Err(StateError::InvalidTransition {
                from: state.phase,
                to: next,
            });
        }
        state.phase = next;
        state.version += 1;
        tracing::debug!(
            "[qc-18] Phase -> {:?} (version {})",
            next,
            state.version
        );
        Ok(*state)
    }

    /// Record a new DS block / round without touching the phase.
    pub fn advance_epoch(&self, ds_block_num: U256, round_id: RoundId) -> ConsensusState {
        let mut state = self.state.write();
        state.ds_block_num = ds_block_num;
        state.round_id = round_id;
        state.version += 1;
        tracing::debug!(
            ds_block = %ds_block_num,
            round = round_id,
            "[qc-18] Epoch advanced (version {})",
            state.version
        );
        *state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_microblock_phase_accepts() {
        let accepting: Vec<_> = [
            DsPhase::Idle,
            DsPhase::PowSubmission,
            DsPhase::DsBlockConsensus,
            DsPhase::MicroblockSubmission,
            DsPhase::FinalBlockConsensus,
            DsPhase::ViewChange,
        ]
        .into_iter()
        .filter(DsPhase::accepts_microblocks)
        .collect();
        assert_eq!(accepting, vec![DsPhase::MicroblockSubmission]);
    }

    #[test]
    fn test_phase_cycle() {
        let gate = ConsensusStateGate::new(U256::from(1u64), 0);
        for phase in [
            DsPhase::PowSubmission,
            DsPhase::DsBlockConsensus,
            DsPhase::MicroblockSubmission,
            DsPhase::FinalBlockConsensus,
            DsPhase::MicroblockSubmission,
        ] {
            gate.transition_to(phase).unwrap();
        }
        assert!(gate.is_accepting_submissions());
        assert_eq!(gate.snapshot().version, 5);
    }

    #[test]
    fn test_invalid_transition_leaves_state() {
        let gate = ConsensusStateGate::new(U256::zero(), 0);
        let err = gate.transition_to(DsPhase::FinalBlockConsensus).unwrap_err();
        assert_eq!(
            err,
            StateError::InvalidTransition {
                from: DsPhase::Idle,
                to: DsPhase::FinalBlockConsensus
            }
        );
        assert_eq!(gate.snapshot().phase, DsPhase::Idle);
        assert_eq!(gate.snapshot().version, 0);
    }

    #[test]
    fn test_view_change_returns_to_consensus() {
        assert!(DsPhase::MicroblockSubmission.can_transition_to(DsPhase::ViewChange));
        assert!(DsPhase::ViewChange.can_transition_to(DsPhase::MicroblockSubmission));
        assert!(!DsPhase::PowSubmission.can_transition_to(DsPhase::ViewChange));
    }

    #[test]
    fn test_snapshot_is_detached() {
        let gate = ConsensusStateGate::new(U256::from(10u64), 3);
        let before = gate.snapshot();

        let after = gate.advance_epoch(U256::from(11u64), 4);

        assert_eq!(before.ds_block_num, U256::from(10u64));
        assert_eq!(after.ds_block_num, U256::from(11u64));
        assert_eq!(after.round_id, 4);
        assert!(after.version > before.version);
    }

    #[test]
    fn test_expected_next_ds_block() {
        let state = ConsensusState::new(DsPhase::MicroblockSubmission, 0, U256::from(41u64));
        assert_eq!(state.expected_next_ds_block(), U256::from(42u64));
    }

    #[test]
    fn test_node_role_parse() {
        assert_eq!("primary_ds".parse::<NodeRole>(), Ok(NodeRole::PrimaryDs));
        assert_eq!("Lookup".parse::<NodeRole>(), Ok(NodeRole::Lookup));
        assert!("miner".parse::<NodeRole>().is_err());
        assert!(!NodeRole::Lookup.collects_microblocks());
    }
}
