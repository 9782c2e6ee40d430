//! The circular identifier space peers and records are hashed into.
//!
//! A key space of `digits` decimal digits covers `[0, 10^digits)`. The
//! [`KeySpace::in_interval`] predicate is the only ordering primitive the ring
//! uses: every ownership and routing decision goes through it.

pub mod identifier;
pub mod partitioner;

pub use identifier::Identifier;
pub use partitioner::{DigitPartitioner, MAX_DIGITS};

use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeySpace {
    partitioner: DigitPartitioner,
    modulus: u64,
}

impl KeySpace {
    /// Build a key space of `digits` decimal digits (`1..=18`).
    pub fn new(digits: u32) -> Result<Self> {
        if digits == 0 || digits > MAX_DIGITS {
            return Err(Error::InvalidConfig(format!(
                "interval digits must be in 1..={MAX_DIGITS}, got {digits}"
            )));
        }
        Ok(Self {
            partitioner: DigitPartitioner::new(digits),
            modulus: 10u64.pow(digits),
        })
    }

    /// Size of the ring, `M = 10^digits`.
    #[inline]
    pub fn modulus(&self) -> u64 {
        self.modulus
    }

    pub fn digits(&self) -> u32 {
        self.partitioner.digits()
    }

    pub fn hash(&self, key: &[u8]) -> Identifier {
        self.partitioner.partition(key)
    }

    pub fn hash_str(&self, key: &str) -> Identifier {
        self.hash(key.as_bytes())
    }

    /// Identifier of a peer: the address immediately followed by the port.
    pub fn peer_identifier(&self, address: &str, port: u16) -> Identifier {
        self.hash_str(&format!("{address}{port}"))
    }

    /// True if `key` lies in `(start, stop]` walking clockwise.
    ///
    /// When `start >= stop` the interval wraps through zero; `start == stop`
    /// therefore covers the whole ring.
    #[inline]
    pub fn in_interval(&self, start: Identifier, stop: Identifier, key: Identifier) -> bool {
        if start < stop {
            start < key && key <= stop
        } else {
            (start < key && key.0 < self.modulus) || key <= stop
        }
    }

    /// Clockwise distance from `from` to `to`.
    pub fn distance(&self, from: Identifier, to: Identifier) -> u64 {
        if to >= from {
            to.0 - from.0
        } else {
            self.modulus - from.0 + to.0
        }
    }

    /// Index of the last finger, `K = floor(log2(M))`.
    pub fn max_finger(&self) -> usize {
        (63 - self.modulus.leading_zeros()) as usize
    }

    /// Start of finger `i` for a node at `id`: `(id + 2^i) mod M`.
    pub fn finger_start(&self, id: Identifier, i: usize) -> Identifier {
        Identifier((id.0 + (1u64 << i)) % self.modulus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ring100() -> KeySpace {
        KeySpace::new(2).unwrap()
    }

    #[test]
    fn test_rejects_bad_digit_counts() {
        assert!(KeySpace::new(0).is_err());
        assert!(KeySpace::new(19).is_err());
        assert_eq!(KeySpace::new(3).unwrap().modulus(), 1000);
    }

    #[test]
    fn test_in_interval_plain() {
        let ks = ring100();
        let id = Identifier;
        assert!(ks.in_interval(id(10), id(20), id(15)));
        assert!(ks.in_interval(id(10), id(20), id(20)));
        assert!(!ks.in_interval(id(10), id(20), id(10)));
        assert!(!ks.in_interval(id(10), id(20), id(50)));
    }

    #[test]
    fn test_in_interval_wraparound() {
        let ks = ring100();
        let id = Identifier;
        assert!(ks.in_interval(id(90), id(10), id(95)));
        assert!(ks.in_interval(id(90), id(10), id(0)));
        assert!(ks.in_interval(id(90), id(10), id(10)));
        assert!(!ks.in_interval(id(90), id(10), id(50)));
        assert!(!ks.in_interval(id(90), id(10), id(90)));
    }

    #[test]
    fn test_in_interval_full_ring() {
        let ks = ring100();
        for k in 0..100 {
            assert!(ks.in_interval(Identifier(42), Identifier(42), Identifier(k)));
        }
    }

    #[test]
    fn test_finger_geometry() {
        let ks = KeySpace::new(3).unwrap();
        assert_eq!(ks.max_finger(), 9);
        assert_eq!(ks.finger_start(Identifier(900), 0), Identifier(901));
        assert_eq!(ks.finger_start(Identifier(900), 9), Identifier(412));
        assert_eq!(ring100().max_finger(), 6);
    }

    #[test]
    fn test_peer_identifier_concatenates() {
        let ks = KeySpace::new(3).unwrap();
        assert_eq!(ks.peer_identifier("127.0.0.1", 5000), Identifier(383));
        assert_eq!(ks.peer_identifier("127.0.0.1", 5000), ks.hash_str("127.0.0.15000"));
    }

    proptest! {
        #[test]
        fn prop_in_interval_matches_clockwise_distance(
            start in 0u64..1000,
            stop in 0u64..1000,
            key in 0u64..1000,
        ) {
            let ks = KeySpace::new(3).unwrap();
            let (start, stop, key) = (Identifier(start), Identifier(stop), Identifier(key));
            let expected = if start == stop {
                true
            } else {
                let d = ks.distance(start, key);
                d > 0 && d <= ks.distance(start, stop)
            };
            prop_assert_eq!(ks.in_interval(start, stop, key), expected);
        }
    }
}
