//! Microblock wire format.
//!
//! ```text
//! header (208)  block_num u256 | ds_block_num u256 | timestamp u64 | shard_id u32
//!               | miner_pub_key [96] | tx_root [32] | num_txs u32
//! bitmap        bit_len u16 | ceil(bit_len / 8) bytes, MSB first, zero padding
//! signature     [48]
//! body          num_txs * [32]
//! ```

use super::reader::{put_u256, WireReader};
use crate::domain::{CodecError, Microblock, MicroblockHeader, SignerBitmap};
use shared_types::{BlsPublicKey, BlsSignature, Hash, BLS_PUBLIC_KEY_LEN, BLS_SIGNATURE_LEN};

/// Encoded header size; also the length of the co-signed message.
pub const HEADER_SIZE: usize = 32 + 32 + 8 + 4 + BLS_PUBLIC_KEY_LEN + 32 + 4;

/// Smallest possible encoded microblock (empty bitmap, no transactions).
pub const MIN_MICROBLOCK_SIZE: usize = HEADER_SIZE + 2 + BLS_SIGNATURE_LEN;

const TX_HASH_SIZE: usize = 32;

/// Caps applied while decoding, before anything is allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    /// Whole-message size cap in bytes.
    pub max_message_size: usize,
    /// Transaction hashes per microblock.
    pub max_txs: u32,
    /// Signer bitmap width.
    pub max_bitmap_bits: usize,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_message_size: 1024 * 1024,
            max_txs: 10_000,
            max_bitmap_bits: 2048,
        }
    }
}

/// Append the header encoding to `out`.
pub fn encode_header(header: &MicroblockHeader, out: &mut Vec<u8>) {
    put_u256(out, &header.block_num);
    put_u256(out, &header.ds_block_num);
    out.extend_from_slice(&header.timestamp.to_be_bytes());
    out.extend_from_slice(&header.shard_id.to_be_bytes());
    out.extend_from_slice(&header.miner_pub_key.bytes);
    out.extend_from_slice(&header.tx_root);
    out.extend_from_slice(&header.num_txs.to_be_bytes());
}

/// Append the full microblock encoding to `out`.
///
/// Bitmaps wider than `u16::MAX` bits have no encoding; the registry caps
/// committees far below that.
pub fn write_microblock(microblock: &Microblock, out: &mut Vec<u8>) {
    let bitmap = microblock.signer_bitmap();
    debug_assert!(bitmap.len() <= u16::MAX as usize);

    encode_header(microblock.header(), out);
    out.extend_from_slice(&(bitmap.len() as u16).to_be_bytes());
    out.extend_from_slice(&bitmap.to_packed());
    out.extend_from_slice(&microblock.header_sig().bytes);
    for tx in microblock.tx_hashes() {
        out.extend_from_slice(tx);
    }
}

/// Full microblock encoding.
pub fn encode_microblock(microblock: &Microblock) -> Vec<u8> {
    let mut out = Vec::with_capacity(
        MIN_MICROBLOCK_SIZE
            + SignerBitmap::packed_len(microblock.signer_bitmap().len())
            + microblock.tx_hashes().len() * TX_HASH_SIZE,
    );
    write_microblock(microblock, &mut out);
    out
}

fn read_header(reader: &mut WireReader<'_>) -> Result<MicroblockHeader, CodecError> {
    Ok(MicroblockHeader {
        block_num: reader.u256()?,
        ds_block_num: reader.u256()?,
        timestamp: reader.u64()?,
        shard_id: reader.u32()?,
        miner_pub_key: BlsPublicKey::from_bytes(reader.array()?),
        tx_root: reader.array()?,
        num_txs: reader.u32()?,
    })
}

/// Decode one microblock at the reader's position.
pub fn read_microblock(
    reader: &mut WireReader<'_>,
    limits: &DecodeLimits,
) -> Result<Microblock, CodecError> {
    reader.require(MIN_MICROBLOCK_SIZE)?;

    let header = read_header(reader)?;
    if header.num_txs > limits.max_txs {
        return Err(CodecError::TooManyTransactions {
            count: header.num_txs,
            limit: limits.max_txs,
        });
    }

    let bit_len = reader.u16()? as usize;
    if bit_len > limits.max_bitmap_bits {
        return Err(CodecError::BitmapTooLarge {
            bits: bit_len,
            limit: limits.max_bitmap_bits,
        });
    }
    let packed = reader.take(SignerBitmap::packed_len(bit_len))?;
    let bitmap = SignerBitmap::from_packed(packed, bit_len)?;

    let header_sig = BlsSignature::from_bytes(reader.array()?);

    // Checked before allocating so a lying count cannot reserve memory.
    reader.require(header.num_txs as usize * TX_HASH_SIZE)?;
    let tx_hashes = (0..header.num_txs)
        .map(|_| reader.array::<TX_HASH_SIZE>())
        .collect::<Result<Vec<Hash>, _>>()?;

    Ok(Microblock::new(header, header_sig, bitmap, tx_hashes))
}

/// Decode a standalone microblock starting at `offset`.
///
/// Returns the microblock and the offset just past it.
pub fn decode_microblock(
    bytes: &[u8],
    offset: usize,
    limits: &DecodeLimits,
) -> Result<(Microblock, usize), CodecError> {
    let mut reader = WireReader::new(bytes, offset)?;
    let microblock = read_microblock(&mut reader, limits)?;
    Ok((microblock, reader.position()))
}
