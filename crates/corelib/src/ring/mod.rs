//! Chord ring membership and routing.
//!
//! A [`RingNode`] keeps its successor, predecessor, successor list and finger
//! table, answers lookups, and repairs those pointers through periodic
//! maintenance (`stabilize`, `update_successor_list`, `check_predecessor`,
//! `fix_fingers`).

pub mod lookup;
mod maintenance;
mod node;
mod routing;

pub use lookup::{Lookup, LookupFailure, Route};
pub use node::{RingNode, RingSnapshot};
