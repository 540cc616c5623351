//! Coverage analysis of method instruction streams.
//!
//! This module reconstructs, per method, the control flow implied by the instruction stream
//! of the bytecode reader, correlates it with the probe array collected at runtime and reduces
//! it to coverage counters. On top of that, two runs of the same method can be merged, so
//! probes fired in separate executions or builds add up to one result.
//!
//! # Architecture
//!
//! The analysis of a method runs in a single pass:
//!
//! ```text
//! MethodEvent stream
//!       |
//!       v
//! InstructionsBuilder --finish--> MethodGraph --merge_method--> MethodGraph
//!                                                                   |
//!                                   Filter --> MethodCoverageCalculator --> MethodCoverage
//! ```
//!
//! - [`event`] types describe what the bytecode reader reports.
//! - [`Instruction`] nodes live in the arena of a [`MethodGraph`]. Executed branches are
//!   propagated backwards along predecessor links, iteratively.
//! - [`InstructionsBuilder`] wires forward jumps only after the complete stream is known.
//! - [`merge_method`] matches two runs by instruction signature.
//! - [`ClassAnalyzer`] drives all methods of a class, [`AnalysisSession`] holds the snapshots
//!   of previous runs for many classes.
//!
//! # Usage
//!
//! ```rust
//! use covscope::analysis::{InsnHandle, InstructionsBuilder, MethodEvent, MethodCoverageCalculator};
//! use covscope::coverage::MethodCoverage;
//!
//! let events = [
//!     MethodEvent::LineNumber(10),
//!     MethodEvent::Instruction { handle: InsnHandle(0), signature: None },
//!     MethodEvent::Instruction { handle: InsnHandle(1), signature: None },
//!     MethodEvent::Probe { probe: 0, branch: 0 },
//!     MethodEvent::EndMethod,
//! ];
//! let graph = InstructionsBuilder::build(Some(&[true]), &events)?;
//!
//! let mut coverage = MethodCoverage::new("run", "()V", None);
//! MethodCoverageCalculator::new(&graph).calculate(&mut coverage);
//! assert_eq!(coverage.instruction_counter().covered(), 2);
//! assert!(coverage.contains_code());
//! # Ok::<(), covscope::Error>(())
//! ```

mod builder;
mod calculator;
mod class;
mod config;
pub mod event;
mod graph;
mod instruction;
mod merge;
mod metadata;
mod session;

pub use builder::{InstructionsBuilder, Jump, MAX_BRANCH};
pub use calculator::MethodCoverageCalculator;
pub use class::{capture_class, ClassAnalysis, ClassAnalyzer};
pub use config::AnalysisConfig;
pub use event::{instruction_signature, InsnHandle, Label, MethodEvent};
pub use graph::MethodGraph;
pub use instruction::{InsnId, Instruction};
pub use merge::{merge_method, MergeOutcome, ProbeSpan, SignatureMap};
pub use metadata::{AccessFlags, ClassDescriptor, MethodBody, MethodDescriptor};
pub use session::{AnalysisSession, ClassInput, ClassSnapshot};
