//! Bounds-checked big-endian cursor over a byte slice.

use crate::domain::CodecError;
use shared_types::U256;

/// Read cursor. Every read checks the remaining length first and never
/// indexes past the end of the buffer.
#[derive(Debug, Clone)]
pub struct WireReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    /// Cursor positioned at `offset`.
    pub fn new(buf: &'a [u8], offset: usize) -> Result<Self, CodecError> {
        if offset > buf.len() {
            return Err(CodecError::OffsetOutOfBounds {
                offset,
                len: buf.len(),
            });
        }
        Ok(Self { buf, pos: offset })
    }

    /// Current position.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Fail unless at least `n` bytes remain.
    pub fn require(&self, n: usize) -> Result<(), CodecError> {
        if self.remaining() < n {
            return Err(CodecError::Truncated {
                offset: self.pos,
                required: n,
                available: self.remaining(),
            });
        }
        Ok(())
    }

    /// Next `n` bytes.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        self.require(n)?;
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    /// Next `N` bytes as an array.
    pub fn array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Big-endian u16.
    pub fn u16(&mut self) -> Result<u16, CodecError> {
        self.array().map(u16::from_be_bytes)
    }

    /// Big-endian u32.
    pub fn u32(&mut self) -> Result<u32, CodecError> {
        self.array().map(u32::from_be_bytes)
    }

    /// Big-endian u64.
    pub fn u64(&mut self) -> Result<u64, CodecError> {
        self.array().map(u64::from_be_bytes)
    }

    /// Big-endian 256-bit unsigned integer.
    pub fn u256(&mut self) -> Result<U256, CodecError> {
        self.take(32).map(U256::from_big_endian)
    }
}

/// Append a U256 as 32 big-endian bytes.
pub fn put_u256(out: &mut Vec<u8>, value: &U256) {
    let mut bytes = [0u8; 32];
    value.to_big_endian(&mut bytes);
    out.extend_from_slice(&bytes);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_big_endian() {
        let buf = [0x00, 0x01, 0x00, 0x00, 0x00, 0x02, 0xff];
        let mut r = WireReader::new(&buf, 0).unwrap();
        assert_eq!(r.u16().unwrap(), 1);
        assert_eq!(r.u32().unwrap(), 2);
        assert_eq!(r.remaining(), 1);
        assert_eq!(r.position(), 6);
    }

    #[test]
    fn test_short_read_does_not_advance() {
        let buf = [1u8, 2, 3];
        let mut r = WireReader::new(&buf, 1).unwrap();
        let err = r.u32().unwrap_err();
        assert_eq!(
            err,
            CodecError::Truncated {
                offset: 1,
                required: 4,
                available: 2
            }
        );
        assert_eq!(r.position(), 1);
    }

    #[test]
    fn test_offset_past_end() {
        assert_eq!(
            WireReader::new(&[0u8; 4], 5).unwrap_err(),
            CodecError::OffsetOutOfBounds { offset: 5, len: 4 }
        );
        assert_eq!(WireReader::new(&[0u8; 4], 4).unwrap().remaining(), 0);
    }

    #[test]
    fn test_u256_roundtrip() {
        let value = U256::from(0x0102_0304_0506_0708u64) << 128;
        let mut out = Vec::new();
        put_u256(&mut out, &value);
        assert_eq!(out.len(), 32);
        assert_eq!(WireReader::new(&out, 0).unwrap().u256().unwrap(), value);
    }
}
