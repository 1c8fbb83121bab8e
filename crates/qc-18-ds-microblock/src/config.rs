//! Subsystem configuration.

use crate::codec::{DecodeLimits, MIN_SUBMISSION_SIZE};
use crate::domain::{FixedQuorum, NodeRole, QuorumPolicy, SupermajorityQuorum};
use crate::ports::ShardRegistry;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Quorum rule string could not be parsed.
    #[error("Invalid quorum rule: {0}")]
    InvalidQuorum(String),

    /// A limit is out of range.
    #[error("Invalid {field}: {reason}")]
    InvalidLimit {
        /// Offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// A registry committee is wider than the decoder accepts.
    #[error("Committee of {size} members exceeds max_committee_size {limit}")]
    CommitteeTooLarge {
        /// Members in the widest committee.
        size: usize,
        /// Configured cap.
        limit: usize,
    },
}

/// How many committee members must co-sign a microblock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum QuorumRule {
    /// `floor(2n / 3) + 1`.
    #[default]
    Supermajority,
    /// Constant threshold (`fixed:<n>`), capped at the committee size.
    Fixed(usize),
}

impl QuorumRule {
    /// Policy object for the verifier.
    pub fn policy(&self) -> Arc<dyn QuorumPolicy> {
        match self {
            Self::Supermajority => Arc::new(SupermajorityQuorum),
            Self::Fixed(n) => Arc::new(FixedQuorum(*n)),
        }
    }
}

impl FromStr for QuorumRule {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("supermajority") {
            return Ok(Self::Supermajority);
        }
        s.strip_prefix("fixed:")
            .and_then(|n| n.trim().parse().ok())
            .map(Self::Fixed)
            .ok_or_else(|| ConfigError::InvalidQuorum(s.to_string()))
    }
}

impl TryFrom<String> for QuorumRule {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<QuorumRule> for String {
    fn from(rule: QuorumRule) -> Self {
        rule.to_string()
    }
}

impl fmt::Display for QuorumRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Supermajority => f.write_str("supermajority"),
            Self::Fixed(n) => write!(f, "fixed:{n}"),
        }
    }
}

/// DS microblock collection configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MicroblockConfig {
    /// Larger submission messages are dropped as malformed.
    pub max_message_size: usize,
    /// Transaction hashes allowed in one microblock.
    pub max_txs_per_microblock: u32,
    /// Largest shard committee (and signer bitmap) accepted.
    pub max_committee_size: usize,
    /// Role of this node.
    pub role: NodeRole,
    /// Co-signature threshold.
    pub quorum: QuorumRule,
}

impl Default for MicroblockConfig {
    fn default() -> Self {
        Self {
            max_message_size: 1024 * 1024, // 1 MiB
            max_txs_per_microblock: 10_000,
            max_committee_size: 2_048,
            role: NodeRole::BackupDs,
            quorum: QuorumRule::Supermajority,
        }
    }
}

impl MicroblockConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `QC_DS_MAX_MESSAGE_SIZE`: message size cap in bytes (default: 1048576)
    /// - `QC_DS_MAX_TXS`: transactions per microblock (default: 10000)
    /// - `QC_DS_MAX_COMMITTEE`: committee size cap (default: 2048)
    /// - `QC_DS_ROLE`: `primary_ds`, `backup_ds` or `lookup` (default: backup_ds)
    /// - `QC_DS_QUORUM`: `supermajority` or `fixed:<n>` (default: supermajority)
    ///
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            max_message_size: parse_var(&lookup, "QC_DS_MAX_MESSAGE_SIZE")
                .unwrap_or(defaults.max_message_size),
            max_txs_per_microblock: parse_var(&lookup, "QC_DS_MAX_TXS")
                .unwrap_or(defaults.max_txs_per_microblock),
            max_committee_size: parse_var(&lookup, "QC_DS_MAX_COMMITTEE")
                .unwrap_or(defaults.max_committee_size),
            role: parse_var(&lookup, "QC_DS_ROLE").unwrap_or(defaults.role),
            quorum: parse_var(&lookup, "QC_DS_QUORUM").unwrap_or(defaults.quorum),
        }
    }

    /// Check limits against the wire format.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_message_size < MIN_SUBMISSION_SIZE {
            return Err(ConfigError::InvalidLimit {
                field: "max_message_size",
                reason: format!("must be at least {MIN_SUBMISSION_SIZE} bytes"),
            });
        }

        // Bitmap width travels as a u16.
        if self.max_committee_size == 0 || self.max_committee_size > u16::MAX as usize {
            return Err(ConfigError::InvalidLimit {
                field: "max_committee_size",
                reason: format!("must be between 1 and {}", u16::MAX),
            });
        }

        if let QuorumRule::Fixed(0) = self.quorum {
            return Err(ConfigError::InvalidQuorum("fixed:0".to_string()));
        }

        Ok(())
    }

    /// Every committee of `registry` must fit the bitmap cap, or its shard
    /// could never get a microblock past the decoder.
    pub fn check_registry<R>(&self, registry: &R) -> Result<(), ConfigError>
    where
        R: ShardRegistry + ?Sized,
    {
        let size = registry.largest_committee();
        if size > self.max_committee_size {
            return Err(ConfigError::CommitteeTooLarge {
                size,
                limit: self.max_committee_size,
            });
        }
        Ok(())
    }

    /// Decoder caps derived from this configuration.
    pub fn decode_limits(&self) -> DecodeLimits {
        DecodeLimits {
            max_message_size: self.max_message_size,
            max_txs: self.max_txs_per_microblock,
            max_bitmap_bits: self.max_committee_size,
        }
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = MicroblockConfig::default();
        assert_eq!(config.max_message_size, 1_048_576);
        assert_eq!(config.max_committee_size, 2048);
        assert_eq!(config.role, NodeRole::BackupDs);
        assert!(config.validate().is_ok());
        assert_eq!(config.decode_limits(), DecodeLimits::default());
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("QC_DS_MAX_TXS", "500"),
            ("QC_DS_ROLE", "primary_ds"),
            ("QC_DS_QUORUM", "fixed:4"),
            ("QC_DS_MAX_COMMITTEE", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let config = MicroblockConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.max_txs_per_microblock, 500);
        assert_eq!(config.role, NodeRole::PrimaryDs);
        assert_eq!(config.quorum, QuorumRule::Fixed(4));
        assert_eq!(config.max_committee_size, 2048);
    }

    #[test]
    fn test_quorum_rule_parse() {
        assert_eq!(
            "supermajority".parse::<QuorumRule>(),
            Ok(QuorumRule::Supermajority)
        );
        assert_eq!(" fixed:7 ".parse::<QuorumRule>(), Ok(QuorumRule::Fixed(7)));
        assert!("fixed:".parse::<QuorumRule>().is_err());
        assert!("majority".parse::<QuorumRule>().is_err());
        assert_eq!(QuorumRule::Fixed(3).policy().quorum_for(10), 3);
    }

    #[test]
    fn test_validate_rejects_bad_limits() {
        let config = MicroblockConfig {
            max_message_size: 100,
            ..MicroblockConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidLimit {
                field: "max_message_size",
                ..
            })
        ));

        let config = MicroblockConfig {
            max_committee_size: 70_000,
            ..MicroblockConfig::default()
        };
        assert!(config.validate().is_err());

        let config = MicroblockConfig {
            quorum: QuorumRule::Fixed(0),
            ..MicroblockConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_check_registry_against_committee_cap() {
        use crate::adapters::InMemoryShardRegistry;
        use crate::domain::{CommitteeMember, ShardCommittee};
        use shared_types::BlsPublicKey;

        let members = (1..=3u8)
            .map(|seed| {
                CommitteeMember::new(
                    BlsPublicKey::from_bytes([seed; 96]),
                    format!("10.0.0.{seed}:33133").parse().unwrap(),
                )
            })
            .collect();
        let registry = InMemoryShardRegistry::builder()
            .committee(ShardCommittee::new(0, members))
            .build()
            .unwrap();

        assert!(MicroblockConfig::default().check_registry(&registry).is_ok());

        let narrow = MicroblockConfig {
            max_committee_size: 2,
            ..MicroblockConfig::default()
        };
        assert_eq!(
            narrow.check_registry(&registry),
            Err(ConfigError::CommitteeTooLarge { size: 3, limit: 2 })
        );
    }

    #[test]
    fn test_deserialize_partial_json() {
        let config: MicroblockConfig =
            serde_json::from_str(r#"{"role":"lookup","quorum":"fixed:2"}"#).unwrap();
        assert_eq!(config.role, NodeRole::Lookup);
        assert_eq!(config.quorum, QuorumRule::Fixed(2));
        assert_eq!(config.max_txs_per_microblock, 10_000);

        assert!(serde_json::from_str::<MicroblockConfig>(r#"{"quorum":"half"}"#).is_err());
    }
}
