//! Shared helper types used across the analysis and coverage modules.

mod bitset;

pub use bitset::{BitSet, BitSetIter};
