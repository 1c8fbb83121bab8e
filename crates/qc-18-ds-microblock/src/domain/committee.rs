//! # Shard Committees and Signer Bitmaps
//!
//! A committee is an ordered member list; bit *i* of a microblock's signer
//! bitmap refers to member *i*. [`CommitteeSigners`] is the only way to pair
//! the two, and it refuses to do so unless the lengths agree.

use super::errors::{CodecError, CoSignatureError};
use shared_types::{BlsPublicKey, PeerAddress, ShardId};

/// One committee seat.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitteeMember {
    /// Member's BLS key.
    pub public_key: BlsPublicKey,
    /// Member's network address.
    pub address: PeerAddress,
}

impl CommitteeMember {
    /// Create a committee member.
    pub fn new(public_key: BlsPublicKey, address: PeerAddress) -> Self {
        Self {
            public_key,
            address,
        }
    }
}

/// Ordered membership of one shard for one epoch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShardCommittee {
    shard_id: ShardId,
    members: Vec<CommitteeMember>,
}

impl ShardCommittee {
    /// Create a committee. Member order is significant and kept as given.
    pub fn new(shard_id: ShardId, members: Vec<CommitteeMember>) -> Self {
        Self { shard_id, members }
    }

    /// Shard this committee serves.
    pub fn shard_id(&self) -> ShardId {
        self.shard_id
    }

    /// Members in committee order.
    pub fn members(&self) -> &[CommitteeMember] {
        &self.members
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the committee has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Position of a key in committee order.
    pub fn position_of(&self, key: &BlsPublicKey) -> Option<usize> {
        self.members.iter().position(|m| &m.public_key == key)
    }
}

/// Participation bitmap carried by a microblock.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct SignerBitmap {
    bits: Vec<bool>,
}

impl SignerBitmap {
    /// Build from explicit bits.
    pub fn from_bits(bits: Vec<bool>) -> Self {
        Self { bits }
    }

    /// Bitmap of `len` bits with the given positions set. Out-of-range indices are ignored.
    pub fn with_signers(len: usize, signers: &[usize]) -> Self {
        let mut bits = vec![false; len];
        for &i in signers {
            if let Some(bit) = bits.get_mut(i) {
                *bit = true;
            }
        }
        Self { bits }
    }

    /// Decode MSB-first packed bytes holding `bit_len` bits.
    ///
    /// `bytes` must be exactly `ceil(bit_len / 8)` long and the unused trailing
    /// bits must be zero.
    pub fn from_packed(bytes: &[u8], bit_len: usize) -> Result<Self, CodecError> {
        let expected = Self::packed_len(bit_len);
        if bytes.len() != expected {
            return Err(CodecError::Truncated {
                offset: 0,
                required: expected,
                available: bytes.len(),
            });
        }

        let bits: Vec<bool> = (0..bit_len)
            .map(|i| bytes[i / 8] & (0x80 >> (i % 8)) != 0)
            .collect();

        let padding = expected * 8 - bit_len;
        if padding > 0 {
            let mask = (1u8 << padding) - 1;
            if bytes[expected - 1] & mask != 0 {
                return Err(CodecError::BitmapPadding);
            }
        }

        Ok(Self { bits })
    }

    /// MSB-first packed encoding.
    pub fn to_packed(&self) -> Vec<u8> {
        let mut out = vec![0u8; Self::packed_len(self.bits.len())];
        for (i, _) in self.bits.iter().enumerate().filter(|(_, &b)| b) {
            out[i / 8] |= 0x80 >> (i % 8);
        }
        out
    }

    /// Bytes needed to pack `bit_len` bits.
    pub fn packed_len(bit_len: usize) -> usize {
        bit_len.div_ceil(8)
    }

    /// Number of bits.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Whether the bitmap has no bits.
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Number of set bits.
    pub fn count_set(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    /// Bit at `index`.
    pub fn get(&self, index: usize) -> Option<bool> {
        self.bits.get(index).copied()
    }

    /// Bits in order.
    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    /// Copy with bit `index` inverted.
    pub fn toggled(&self, index: usize) -> Self {
        let mut bits = self.bits.clone();
        if let Some(bit) = bits.get_mut(index) {
            *bit = !*bit;
        }
        Self { bits }
    }
}

/// Committee members zipped with their bitmap bits.
#[derive(Debug)]
pub struct CommitteeSigners<'a> {
    seats: Vec<(&'a CommitteeMember, bool)>,
    signer_count: usize,
}

impl<'a> CommitteeSigners<'a> {
    /// Pair members with bits positionally.
    ///
    /// # Errors
    /// `BitmapLengthMismatch` when the bitmap width differs from the committee size.
    pub fn zip(
        committee: &'a ShardCommittee,
        bitmap: &SignerBitmap,
    ) -> Result<Self, CoSignatureError> {
        if committee.len() != bitmap.len() {
            return Err(CoSignatureError::BitmapLengthMismatch {
                bitmap: bitmap.len(),
                committee: committee.len(),
            });
        }

        let seats: Vec<_> = committee
            .members()
            .iter()
            .zip(bitmap.bits().iter().copied())
            .collect();
        let signer_count = seats.iter().filter(|(_, signed)| *signed).count();

        Ok(Self {
            seats,
            signer_count,
        })
    }

    /// Keys of the members whose bit is set, in committee order.
    pub fn signer_keys(&self) -> Vec<BlsPublicKey> {
        self.seats
            .iter()
            .filter(|(_, signed)| *signed)
            .map(|(member, _)| member.public_key)
            .collect()
    }

    /// Number of set bits.
    pub fn signer_count(&self) -> usize {
        self.signer_count
    }

    /// Committee size (equals the bitmap width).
    pub fn committee_size(&self) -> usize {
        self.seats.len()
    }

    /// Seats in committee order.
    pub fn seats(&self) -> impl Iterator<Item = (&'a CommitteeMember, bool)> + '_ {
        self.seats.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn committee(size: u8) -> ShardCommittee {
        let members = (0..size)
            .map(|i| {
                CommitteeMember::new(
                    BlsPublicKey::from_bytes([i; 96]),
                    format!("10.0.0.{i}:4000").parse().unwrap(),
                )
            })
            .collect();
        ShardCommittee::new(0, members)
    }

    #[test]
    fn test_packed_roundtrip_with_padding() {
        let bitmap = SignerBitmap::from_bits(vec![true, false, true, true, false, false, true, false, true, true]);
        let packed = bitmap.to_packed();
        assert_eq!(packed, vec![0b1011_0010, 0b1100_0000]);
        assert_eq!(SignerBitmap::from_packed(&packed, 10).unwrap(), bitmap);
    }

    #[test]
    fn test_from_packed_rejects_padding_bits() {
        let result = SignerBitmap::from_packed(&[0xff, 0xff], 10);
        assert_eq!(result, Err(CodecError::BitmapPadding));
    }

    #[test]
    fn test_from_packed_rejects_wrong_length() {
        assert!(SignerBitmap::from_packed(&[0xff], 10).is_err());
    }

    #[test]
    fn test_with_signers_and_toggle() {
        let bitmap = SignerBitmap::with_signers(4, &[0, 2, 9]);
        assert_eq!(bitmap.bits(), &[true, false, true, false]);
        assert_eq!(bitmap.count_set(), 2);

        let toggled = bitmap.toggled(1);
        assert_eq!(toggled.count_set(), 3);
        assert_eq!(toggled.toggled(1), bitmap);
    }

    #[test]
    fn test_zip_collects_keys_in_committee_order() {
        let committee = committee(4);
        let bitmap = SignerBitmap::with_signers(4, &[3, 1]);

        let signers = CommitteeSigners::zip(&committee, &bitmap).unwrap();

        assert_eq!(signers.signer_count(), 2);
        assert_eq!(signers.committee_size(), 4);
        assert_eq!(
            signers.signer_keys(),
            vec![
                BlsPublicKey::from_bytes([1; 96]),
                BlsPublicKey::from_bytes([3; 96])
            ]
        );
    }

    #[test]
    fn test_zip_rejects_length_mismatch() {
        let committee = committee(4);
        let bitmap = SignerBitmap::with_signers(5, &[0, 1, 2]);

        let result = CommitteeSigners::zip(&committee, &bitmap);
        assert!(matches!(
            result,
            Err(CoSignatureError::BitmapLengthMismatch {
                bitmap: 5,
                committee: 4
            })
        ));
    }

    #[test]
    fn test_position_of() {
        let committee = committee(3);
        assert_eq!(committee.position_of(&BlsPublicKey::from_bytes([2; 96])), Some(2));
        assert_eq!(committee.position_of(&BlsPublicKey::from_bytes([9; 96])), None);
    }
}
