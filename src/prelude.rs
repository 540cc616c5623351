//! # covscope Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the covscope library. Import this module to get quick access to the essential
//! types for coverage analysis.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all covscope operations
pub use crate::Error;

/// The result type used throughout covscope
pub use crate::Result;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// Session holding previous runs, and its configuration
pub use crate::analysis::{AnalysisConfig, AnalysisSession, ClassInput, ClassSnapshot};

/// Per-class analysis driver
pub use crate::analysis::{ClassAnalysis, ClassAnalyzer};

// ================================================================================================
// Event Model
// ================================================================================================

/// Events reported by the bytecode reader
pub use crate::analysis::{instruction_signature, InsnHandle, Label, MethodEvent};

/// Class and method metadata
pub use crate::analysis::{AccessFlags, ClassDescriptor, MethodBody, MethodDescriptor};

// ================================================================================================
// Instruction Graph and Merge
// ================================================================================================

/// Instruction graph and its construction
pub use crate::analysis::{InsnId, Instruction, InstructionsBuilder, MethodGraph};

/// Merging of two runs
pub use crate::analysis::{merge_method, MergeOutcome, SignatureMap};

/// Counter calculation honoring filter decisions
pub use crate::analysis::MethodCoverageCalculator;

// ================================================================================================
// Filters
// ================================================================================================

/// Filter seam and built-in filters
pub use crate::filter::{
    Filter, FilterChain, FilterContext, FilterFlags, FilterOutput, GeneratedFilter,
    SyntheticFilter,
};

// ================================================================================================
// Coverage Model
// ================================================================================================

/// Counters and coverage nodes
pub use crate::coverage::{
    ChangeKind, ChangeRange, ClassCoverage, Counter, CounterStatus, LineCoverage, MethodCoverage,
};
