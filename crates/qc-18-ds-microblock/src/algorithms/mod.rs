//! # Algorithms Module
//!
//! Core algorithms for DS microblock collection.

pub mod cosig;

pub use cosig::{CoSignatureReport, CoSignatureVerifier};
