//! Coverage counters and the coverage nodes produced by the analysis.
//!
//! The analysis reduces every instruction to an instruction counter and a branch counter.
//! This module aggregates those counters per source line, per method and per class.
//!
//! # Key Types
//!
//! - [`Counter`] / [`CounterStatus`] - Missed/covered pairs and their derived status
//! - [`LineCoverage`] / [`Lines`] - Per-line counters
//! - [`MethodCoverage`] - Coverage node of one method
//! - [`ClassCoverage`] - Coverage node of one class
//! - [`ChangeRange`] / [`ChangeKind`] - Externally supplied change metadata for source lines

mod class;
mod counter;
mod diff;
mod line;
mod method;

pub use class::ClassCoverage;
pub use counter::{Counter, CounterStatus};
pub use diff::{change_at, ChangeKind, ChangeRange};
pub use line::{LineCoverage, Lines};
pub use method::MethodCoverage;
