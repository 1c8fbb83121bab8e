//! # Shared Types Crate
//!
//! Primitive entities shared by the directory-service crates: identifiers,
//! BLS key/signature wrappers and peer addresses.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: cross-crate types live here so the event bus
//!   and the DS subsystems agree on them without depending on each other.
//! - **No validation of key material**: wrappers only carry bytes; curve checks
//!   are the job of the signature aggregator.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
