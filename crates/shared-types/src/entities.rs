//! # Core Domain Entities
//!
//! Primitive types shared between the directory-service crates.
//!
//! ## Clusters
//!
//! - **Identifiers**: `ShardId`, `RoundId`, `Hash`, `U256` block numbers
//! - **Cryptography**: `BlsPublicKey`, `BlsSignature` (BLS12-381, `min_sig`)
//! - **Networking**: `PeerAddress`

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use crate::errors::EntityError;

// Re-export U256 from primitive-types; DS and block numbers are 32-byte integers on the wire.
pub use primitive_types::U256;

// =============================================================================
// CLUSTER A: IDENTIFIERS
// =============================================================================

/// A 32-byte digest (keccak256).
pub type Hash = [u8; 32];

/// Shard identifier as carried on the wire (4 bytes).
pub type ShardId = u32;

/// Consensus round identifier as carried on the wire (4 bytes).
pub type RoundId = u32;

/// Size of a compressed BLS public key (G2 point).
pub const BLS_PUBLIC_KEY_LEN: usize = 96;

/// Size of a compressed BLS signature (G1 point).
pub const BLS_SIGNATURE_LEN: usize = 48;

// =============================================================================
// CLUSTER B: CRYPTOGRAPHY
// =============================================================================

/// BLS public key (G2 point, compressed).
///
/// Ordering is byte-wise so keys can be used in ordered maps.
#[serde_as]
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlsPublicKey {
    /// G2 point (96 bytes compressed)
    #[serde_as(as = "Bytes")]
    pub bytes: [u8; BLS_PUBLIC_KEY_LEN],
}

impl BlsPublicKey {
    /// Wrap raw compressed bytes. No curve validation happens here.
    pub const fn from_bytes(bytes: [u8; BLS_PUBLIC_KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Short hex prefix for log lines.
    pub fn short_hex(&self) -> String {
        hex::encode(&self.bytes[..6])
    }
}

impl fmt::Debug for BlsPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlsPublicKey({}..)", self.short_hex())
    }
}

impl fmt::Display for BlsPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.bytes))
    }
}

/// BLS signature (G1 point, compressed).
#[serde_as]
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlsSignature {
    /// G1 point (48 bytes compressed)
    #[serde_as(as = "Bytes")]
    pub bytes: [u8; BLS_SIGNATURE_LEN],
}

impl BlsSignature {
    /// Wrap raw compressed bytes.
    pub const fn from_bytes(bytes: [u8; BLS_SIGNATURE_LEN]) -> Self {
        Self { bytes }
    }
}

impl fmt::Debug for BlsSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlsSignature({}..)", hex::encode(&self.bytes[..6]))
    }
}

// =============================================================================
// CLUSTER C: NETWORKING
// =============================================================================

/// Network address of a peer (committee member or message sender).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerAddress {
    /// IP address.
    pub ip: IpAddr,
    /// Listening port.
    pub port: u16,
}

impl PeerAddress {
    /// Create a new peer address.
    pub const fn new(ip: IpAddr, port: u16) -> Self {
        Self { ip, port }
    }

    /// Convert into a socket address.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port)
    }
}

impl From<SocketAddr> for PeerAddress {
    fn from(addr: SocketAddr) -> Self {
        Self::new(addr.ip(), addr.port())
    }
}

impl FromStr for PeerAddress {
    type Err = EntityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<SocketAddr>()
            .map(Self::from)
            .map_err(|_| EntityError::InvalidPeerAddress(s.to_string()))
    }
}

impl fmt::Debug for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.socket_addr())
    }
}
