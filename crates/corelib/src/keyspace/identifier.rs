//! Ring identifier type.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A position on the ring, in `[0, M)` for the owning [`KeySpace`](super::KeySpace).
///
/// Identifiers carry no modulus of their own; arithmetic that can wrap goes
/// through the key space.
#[derive(
    Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Identifier(pub u64);

impl Identifier {
    #[inline]
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
