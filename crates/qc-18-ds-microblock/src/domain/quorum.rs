//! Quorum thresholds for committee co-signatures.

/// Minimum number of signers required for a committee of `n` members.
pub trait QuorumPolicy: Send + Sync {
    /// Signers required out of `committee_size`.
    fn quorum_for(&self, committee_size: usize) -> usize;
}

/// Strictly more than two thirds: `floor(2n / 3) + 1`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SupermajorityQuorum;

impl QuorumPolicy for SupermajorityQuorum {
    fn quorum_for(&self, committee_size: usize) -> usize {
        if committee_size == 0 {
            return 0;
        }
        (committee_size * 2) / 3 + 1
    }
}

/// Constant threshold, capped at the committee size. Devnets and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedQuorum(pub usize);

impl QuorumPolicy for FixedQuorum {
    fn quorum_for(&self, committee_size: usize) -> usize {
        self.0.min(committee_size)
    }
}
