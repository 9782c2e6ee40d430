//! Digest-based partitioner.
//!
//! Keys are hashed with SHA-256, the digest is read as one big-endian
//! unsigned integer and its leading decimal digits become the identifier.
//! Peers written in other languages compute the same value from the same
//! bytes, so the scheme must not change.

use super::identifier::Identifier;
use num_bigint::BigUint;
use sha2::{Digest, Sha256};

/// Largest digit count whose identifiers still fit in a `u64`.
pub const MAX_DIGITS: u32 = 18;

/// Converts keys into identifiers with a fixed number of decimal digits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DigitPartitioner {
    digits: u32,
}

impl DigitPartitioner {
    /// `digits` must be in `1..=MAX_DIGITS`; the key space validates this.
    pub(crate) fn new(digits: u32) -> Self {
        Self { digits }
    }

    pub fn digits(&self) -> u32 {
        self.digits
    }

    /// Hash `key` into an identifier.
    pub fn partition(&self, key: &[u8]) -> Identifier {
        let digest = Sha256::digest(key);
        let decimal = BigUint::from_bytes_be(&digest).to_str_radix(10);

        // A digest shorter than the digit count is kept whole.
        let take = decimal.len().min(self.digits as usize);
        let leading = decimal[..take]
            .bytes()
            .fold(0u64, |acc, b| acc * 10 + u64::from(b - b'0'));
        Identifier(leading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vectors() {
        let p = DigitPartitioner::new(3);
        assert_eq!(p.partition(b"photon-1"), Identifier(578));
        assert_eq!(p.partition(b"127.0.0.15000"), Identifier(383));
        assert_eq!(p.partition(b"127.0.0.15001"), Identifier(318));
        assert_eq!(p.partition(b"abc"), Identifier(843));
        assert_eq!(p.partition(b""), Identifier(102));
    }

    #[test]
    fn test_wider_digit_count() {
        let p = DigitPartitioner::new(6);
        assert_eq!(p.partition(b"photon-1"), Identifier(578_736));
        assert_eq!(p.partition(b"abc"), Identifier(843_423));
    }

    #[test]
    fn test_stable_across_calls() {
        let p = DigitPartitioner::new(MAX_DIGITS);
        assert_eq!(p.partition(b"sensor"), p.partition(b"sensor"));
        assert!(p.partition(b"sensor").0 < 10u64.pow(MAX_DIGITS));
    }
}
