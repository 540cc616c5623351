//! Configuration for the analysis session.

use crate::filter::FilterFlags;

/// Configuration for an [`AnalysisSession`](crate::analysis::AnalysisSession).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisConfig {
    /// Merge previously captured runs into analyzed classes (default: true).
    pub merge: bool,

    /// Built-in filters installed when no custom filter is given (default: all).
    pub filters: FilterFlags,

    /// Worker threads for batch analysis, `None` uses the global rayon pool.
    pub threads: Option<usize>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            merge: true,
            filters: FilterFlags::all(),
            threads: None,
        }
    }
}

impl AnalysisConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration reporting every single instruction.
    ///
    /// No filters are installed and previous runs are not merged.
    #[must_use]
    pub fn raw() -> Self {
        Self {
            merge: false,
            filters: FilterFlags::empty(),
            threads: None,
        }
    }

    /// Enables or disables merging of previous runs.
    #[must_use]
    pub fn with_merge(mut self, merge: bool) -> Self {
        self.merge = merge;
        self
    }

    /// Selects the built-in filters.
    #[must_use]
    pub fn with_filters(mut self, filters: FilterFlags) -> Self {
        self.filters = filters;
        self
    }

    /// Sets the number of worker threads for batch analysis.
    ///
    /// # Arguments
    ///
    /// * `threads` - Number of workers, `0` falls back to the global pool
    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = (threads > 0).then_some(threads);
        self
    }
}
