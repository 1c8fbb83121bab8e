//! # Wire Codec
//!
//! Big-endian, bounds-checked encoding of submission messages and the
//! microblocks they carry. Decoding performs structural checks only.

mod microblock;
mod reader;
mod submission;

pub use microblock::{
    decode_microblock, encode_header, encode_microblock, read_microblock, write_microblock,
    DecodeLimits, HEADER_SIZE, MIN_MICROBLOCK_SIZE,
};
pub use reader::WireReader;
pub use submission::{
    decode_submission, encode_submission, MicroblockSubmission, MIN_SUBMISSION_SIZE,
    SUBMISSION_PREFIX_SIZE,
};
