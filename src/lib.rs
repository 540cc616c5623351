// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # covscope
//!
//! Bytecode coverage analysis with signature based merging of runs.
//!
//! `covscope` reconstructs, per method, the control flow implied by an instruction stream,
//! correlates it with the probe array collected by an instrumentation runtime and derives
//! instruction, branch, line, complexity and method counters. Two analyses of the same
//! method, from separate executions or even separate builds, can be merged: instructions are
//! matched by a structural signature instead of identity, so probes fired in either run add
//! up to one result.
//!
//! ## Features
//!
//! - **Iterative propagation** - Executed branches flow backwards through arbitrarily long
//!   instruction chains without recursion
//! - **Two-phase graph construction** - Forward jumps are recorded by label and wired once
//!   the complete method is known
//! - **Cross-run merge** - Signature matched merging of coverage and probe arrays
//! - **Pluggable filters** - Compiler generated code is skipped before counting
//! - **Parallel batch analysis** - Distinct classes are analyzed on worker threads
//!
//! ## Quick Start
//!
//! ```rust
//! use covscope::prelude::*;
//!
//! let events = vec![
//!     MethodEvent::LineNumber(7),
//!     MethodEvent::Instruction { handle: InsnHandle(0), signature: Some("0:ICONST_1".into()) },
//!     MethodEvent::Instruction { handle: InsnHandle(1), signature: Some("1:IRETURN".into()) },
//!     MethodEvent::Probe { probe: 0, branch: 0 },
//!     MethodEvent::EndMethod,
//! ];
//! let method = MethodBody::new(MethodDescriptor::new(AccessFlags::PUBLIC, "one", "()I"), events);
//! let input = ClassInput::new(ClassDescriptor::new("com/example/Foo"), vec![method], Some(vec![true]));
//!
//! let session = AnalysisSession::new(AnalysisConfig::default());
//! let analysis = session.analyze_class(&input)?;
//!
//! assert_eq!(analysis.coverage.instruction_counter(), Counter::new(0, 2));
//! assert_eq!(analysis.coverage.lines().get(7).map(LineCoverage::status), Some(CounterStatus::FullyCovered));
//! # Ok::<(), covscope::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`prelude`] - Convenient re-exports of commonly used types
//! - [`analysis`] - Event model, instruction graph, builder, merge and the analysis session
//! - [`filter`] - Filters for compiler generated code
//! - [`coverage`] - Counters and coverage nodes
//! - [`Error`] and [`Result`] - Error handling
//!
//! The bytecode reader which produces the event streams, the instrumentation runtime which
//! fills the probe arrays, and report rendering are not part of this crate.

#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use covscope::prelude::*;
///
/// let session = AnalysisSession::new(AnalysisConfig::default());
/// assert_eq!(session.snapshot_count(), 0);
/// ```
pub mod prelude;

/// Instruction graphs, merging and the analysis driver.
pub mod analysis;

/// Coverage counters and the coverage nodes of methods and classes.
pub mod coverage;

/// Filters for code which should not be reported.
pub mod filter;

/// Supporting data structures.
pub mod utils;

/// `covscope` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `covscope` Error type
///
/// The main error type for all operations in this crate.
///
/// # Examples
///
/// ```rust
/// use covscope::{analysis::InstructionsBuilder, Error};
///
/// match InstructionsBuilder::build(None, &[]) {
///     Ok(_) => println!("built"),
///     Err(Error::Malformed { message, .. }) => println!("Malformed: {}", message),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
pub use error::Error;
