//! Microblock submission message.
//!
//! ```text
//! ds_block_num u256 | round_id u32 | shard_id u32 | microblock
//! ```

use super::microblock::{read_microblock, write_microblock, DecodeLimits, MIN_MICROBLOCK_SIZE};
use super::reader::{put_u256, WireReader};
use crate::domain::{CodecError, Microblock};
use shared_types::{RoundId, ShardId, U256};

/// Fixed prefix ahead of the microblock.
pub const SUBMISSION_PREFIX_SIZE: usize = 32 + 4 + 4;

/// Smallest possible submission message.
pub const MIN_SUBMISSION_SIZE: usize = SUBMISSION_PREFIX_SIZE + MIN_MICROBLOCK_SIZE;

/// A decoded submission. No semantic checks have been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MicroblockSubmission {
    /// DS block number the shard claims to work under.
    pub ds_block_num: U256,
    /// Consensus round id the shard claims.
    pub round_id: RoundId,
    /// Shard id from the message prefix.
    pub shard_id: ShardId,
    /// Embedded microblock.
    pub microblock: Microblock,
}

/// Decode a submission starting at `offset`.
///
/// Returns the submission and the offset just past it.
///
/// # Errors
/// Any [`CodecError`]; nothing past the end of `bytes` is ever read.
pub fn decode_submission(
    bytes: &[u8],
    offset: usize,
    limits: &DecodeLimits,
) -> Result<(MicroblockSubmission, usize), CodecError> {
    let mut reader = WireReader::new(bytes, offset)?;

    if reader.remaining() > limits.max_message_size {
        return Err(CodecError::TooLarge {
            size: reader.remaining(),
            limit: limits.max_message_size,
        });
    }
    reader.require(MIN_SUBMISSION_SIZE)?;

    let ds_block_num = reader.u256()?;
    let round_id = reader.u32()?;
    let shard_id = reader.u32()?;
    let microblock = read_microblock(&mut reader, limits)?;

    Ok((
        MicroblockSubmission {
            ds_block_num,
            round_id,
            shard_id,
            microblock,
        },
        reader.position(),
    ))
}

/// Encode a submission message.
pub fn encode_submission(submission: &MicroblockSubmission) -> Vec<u8> {
    let mut out = Vec::with_capacity(MIN_SUBMISSION_SIZE);
    put_u256(&mut out, &submission.ds_block_num);
    out.extend_from_slice(&submission.round_id.to_be_bytes());
    out.extend_from_slice(&submission.shard_id.to_be_bytes());
    write_microblock(&submission.microblock, &mut out);
    out
}
