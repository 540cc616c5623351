//! Filters for compiler generated code.
//!
//! Compilers emit bytecode which has no counterpart in the source code: bridge methods,
//! accessors for nested classes, generated boilerplate. Reporting such code as missed would be
//! noise, so before the counters of a method are computed a [`Filter`] inspects the completed
//! [`MethodGraph`] and reports instructions to skip or rewrite through a [`FilterOutput`].
//!
//! Filters never modify the graph themselves. Class level information is available through
//! the [`FilterContext`].
//!
//! # Key Types
//!
//! - [`Filter`] - A single filter, must be thread-safe
//! - [`FilterChain`] - Runs several filters in order
//! - [`FilterFlags`] - Selects the built-in filters
//! - [`SyntheticFilter`] / [`GeneratedFilter`] - Built-in filters
//!
//! # Examples
//!
//! ```rust
//! use covscope::filter::{FilterChain, FilterFlags};
//!
//! let chain = FilterChain::from_flags(FilterFlags::all());
//! assert_eq!(chain.len(), 2);
//! ```

use bitflags::bitflags;
use tracing::trace;

use crate::analysis::{ClassDescriptor, InsnHandle, MethodDescriptor, MethodGraph};

mod generated;
mod synthetic;

pub use generated::GeneratedFilter;
pub use synthetic::SyntheticFilter;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    /// Built-in filters to install
    pub struct FilterFlags: u32 {
        /// Skip compiler synthetic methods, see [`SyntheticFilter`]
        const SYNTHETIC = 0x0001;
        /// Skip methods marked as generated, see [`GeneratedFilter`]
        const GENERATED = 0x0002;
    }
}

impl Default for FilterFlags {
    fn default() -> Self {
        FilterFlags::all()
    }
}

/// Class level information available to filters.
pub trait FilterContext {
    /// VM name of the enclosing class.
    fn class_name(&self) -> &str;

    /// VM name of the superclass, if any.
    fn super_class_name(&self) -> Option<&str>;

    /// Descriptors of the annotations on the class.
    fn class_annotations(&self) -> &[String];

    /// Types of the non-standard attributes of the class.
    fn class_attributes(&self) -> &[String];

    /// Name of the source file, if known.
    fn source_file_name(&self) -> Option<&str>;

    /// Embedded source debug information (SMAP), if present.
    fn source_debug_extension(&self) -> Option<&str>;
}

impl FilterContext for ClassDescriptor {
    fn class_name(&self) -> &str {
        &self.name
    }

    fn super_class_name(&self) -> Option<&str> {
        self.super_name.as_deref()
    }

    fn class_annotations(&self) -> &[String] {
        &self.annotations
    }

    fn class_attributes(&self) -> &[String] {
        &self.attributes
    }

    fn source_file_name(&self) -> Option<&str> {
        self.source_file.as_deref()
    }

    fn source_debug_extension(&self) -> Option<&str> {
        self.source_debug_extension.as_deref()
    }
}

/// Receives the decisions of filters.
pub trait FilterOutput {
    /// Skips all instructions from `from` to `to`, both inclusive, in original order.
    fn ignore(&mut self, from: InsnHandle, to: InsnHandle);

    /// Counts two instructions as one.
    ///
    /// The executed branches of both are combined; only one of them is reported.
    fn merge(&mut self, a: InsnHandle, b: InsnHandle);

    /// Replaces the branches of `source` with one branch per target.
    ///
    /// Each new branch is executed if the corresponding target instruction is covered.
    fn replace_branches(&mut self, source: InsnHandle, targets: &[InsnHandle]);
}

/// A filter for code which should not be reported.
pub trait Filter: Send + Sync {
    /// Unique name for logging and debugging.
    fn name(&self) -> &'static str;

    /// Inspects one method and reports decisions to `output`.
    ///
    /// # Arguments
    ///
    /// * `method` - Declaration of the method
    /// * `graph` - Completed instruction graph of the method
    /// * `context` - Information about the enclosing class
    /// * `output` - Receiver of all decisions
    fn filter(
        &self,
        method: &MethodDescriptor,
        graph: &MethodGraph,
        context: &dyn FilterContext,
        output: &mut dyn FilterOutput,
    );
}

/// Runs several filters in the order they have been added.
#[derive(Default)]
pub struct FilterChain {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterChain {
    /// Creates an empty chain, which filters nothing.
    #[must_use]
    pub fn new() -> Self {
        FilterChain::default()
    }

    /// Creates a chain holding the selected built-in filters.
    #[must_use]
    pub fn from_flags(flags: FilterFlags) -> Self {
        let mut chain = FilterChain::new();
        if flags.contains(FilterFlags::SYNTHETIC) {
            chain.push(SyntheticFilter);
        }
        if flags.contains(FilterFlags::GENERATED) {
            chain.push(GeneratedFilter);
        }
        chain
    }

    /// Appends a filter.
    pub fn push<F: Filter + 'static>(&mut self, filter: F) {
        self.filters.push(Box::new(filter));
    }

    /// Appends a filter, builder style.
    #[must_use]
    pub fn with<F: Filter + 'static>(mut self, filter: F) -> Self {
        self.push(filter);
        self
    }

    /// Number of filters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Returns `true` if the chain holds no filters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl Filter for FilterChain {
    fn name(&self) -> &'static str {
        "chain"
    }

    fn filter(
        &self,
        method: &MethodDescriptor,
        graph: &MethodGraph,
        context: &dyn FilterContext,
        output: &mut dyn FilterOutput,
    ) {
        for filter in &self.filters {
            trace!(filter = filter.name(), method = %method.name, "applying filter");
            filter.filter(method, graph, context, output);
        }
    }
}

/// Skips the complete method.
fn ignore_method(graph: &MethodGraph, output: &mut dyn FilterOutput) {
    if let (Some(first), Some(last)) = (graph.handles().first(), graph.handles().last()) {
        output.ignore(*first, *last);
    }
}
