//! # Error Types
//!
//! Errors raised while constructing shared entities.

use thiserror::Error;

/// Errors that can occur when parsing shared entities from external input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EntityError {
    /// Address string is not a valid `ip:port` pair.
    #[error("Invalid peer address: {0}")]
    InvalidPeerAddress(String),
}
