//! Caller owned state shared across the classes of one analysis.
//!
//! An [`AnalysisSession`] holds the snapshots of previous runs, keyed by class name and then
//! by method merge key. Snapshots are recorded with [`AnalysisSession::capture_class`] and
//! consulted by [`AnalysisSession::analyze_class`]; they live until the session is dropped or
//! [`reset`](AnalysisSession::reset).
//!
//! Distinct classes may be analyzed concurrently. All methods of one class are always
//! analyzed by the calling thread, so the probe array of a class is never shared. Snapshots
//! are shared through `Arc`, no lock on the snapshot map is held while a class is analyzed,
//! so filters may use the session themselves.
//!
//! # Examples
//!
//! ```rust
//! use covscope::prelude::*;
//!
//! let events = vec![
//!     MethodEvent::LineNumber(1),
//!     MethodEvent::Instruction { handle: InsnHandle(0), signature: Some("0:RETURN".into()) },
//!     MethodEvent::Probe { probe: 0, branch: 0 },
//!     MethodEvent::EndMethod,
//! ];
//! let method = MethodBody::new(MethodDescriptor::new(AccessFlags::PUBLIC, "run", "()V"), events);
//! let class = ClassDescriptor::new("com/example/Foo");
//!
//! let session = AnalysisSession::new(AnalysisConfig::default());
//! session.capture_class(&ClassInput::new(class.clone(), vec![method.clone()], Some(vec![true])))?;
//!
//! let analysis = session.analyze_class(&ClassInput::new(class, vec![method], Some(vec![false])))?;
//! assert_eq!(analysis.probes, Some(vec![true]));
//! assert_eq!(analysis.coverage.instruction_counter().covered(), 1);
//! # Ok::<(), covscope::Error>(())
//! ```

use std::{
    collections::HashMap,
    sync::{Arc, OnceLock},
};

use dashmap::DashMap;
use rayon::{prelude::*, ThreadPool, ThreadPoolBuilder};
use tracing::debug;

use crate::{
    analysis::{
        capture_class, AnalysisConfig, ClassAnalysis, ClassAnalyzer, ClassDescriptor, MethodBody,
        SignatureMap,
    },
    filter::{Filter, FilterChain},
    Error, Result,
};

/// What remains of a previous run of one class.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassSnapshot {
    probes: Option<Vec<bool>>,
    methods: HashMap<String, SignatureMap>,
}

impl ClassSnapshot {
    /// Creates an empty snapshot holding the probe array of the run.
    #[must_use]
    pub fn new(probes: Option<Vec<bool>>) -> Self {
        ClassSnapshot {
            probes,
            methods: HashMap::new(),
        }
    }

    /// Probe array of the previous run.
    #[must_use]
    pub fn probes(&self) -> Option<&[bool]> {
        self.probes.as_deref()
    }

    /// Instructions of the method with the given merge key.
    #[must_use]
    pub fn method(&self, key: &str) -> Option<&SignatureMap> {
        self.methods.get(key)
    }

    /// Adds the instructions of one method.
    pub fn insert(&mut self, key: String, signatures: SignatureMap) {
        self.methods.insert(key, signatures);
    }

    /// Number of captured methods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Returns `true` if no method has been captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

/// Everything the bytecode reader delivers for one class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassInput {
    /// Class metadata
    pub class: ClassDescriptor,
    /// Methods in declaration order
    pub methods: Vec<MethodBody>,
    /// Execution data, `None` for static analysis
    pub probes: Option<Vec<bool>>,
}

impl ClassInput {
    /// Bundles the input of one class.
    #[must_use]
    pub fn new(class: ClassDescriptor, methods: Vec<MethodBody>, probes: Option<Vec<bool>>) -> Self {
        ClassInput {
            class,
            methods,
            probes,
        }
    }
}

/// Analysis context owning the snapshots of previous runs.
pub struct AnalysisSession {
    config: AnalysisConfig,
    filter: Arc<dyn Filter>,
    snapshots: DashMap<String, Arc<ClassSnapshot>>,
    /// Worker pool for batch calls, built on first use when `threads` is set
    pool: OnceLock<ThreadPool>,
}

impl AnalysisSession {
    /// Creates a session using the built-in filters selected by the configuration.
    #[must_use]
    pub fn new(config: AnalysisConfig) -> Self {
        let filter = Arc::new(FilterChain::from_flags(config.filters));
        Self::with_filter(config, filter)
    }

    /// Creates a session using a custom filter.
    #[must_use]
    pub fn with_filter(config: AnalysisConfig, filter: Arc<dyn Filter>) -> Self {
        AnalysisSession {
            config,
            filter,
            snapshots: DashMap::new(),
            pool: OnceLock::new(),
        }
    }

    /// The configuration of this session.
    #[must_use]
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Records a run of a class for merging with later runs, without producing coverage.
    ///
    /// A previously captured run of the same class is replaced.
    ///
    /// # Errors
    ///
    /// Returns an error if the event stream of any method is malformed.
    pub fn capture_class(&self, input: &ClassInput) -> Result<()> {
        let snapshot = capture_class(&input.class, &input.methods, input.probes.clone())?;
        self.snapshots
            .insert(input.class.name.clone(), Arc::new(snapshot));
        Ok(())
    }

    /// Computes the coverage of a class.
    ///
    /// If merging is enabled and a previous run of the class has been captured, every
    /// unchanged method is merged with it.
    ///
    /// # Errors
    ///
    /// Returns an error if the event stream of any method is malformed, or if merging detects
    /// an inconsistent probe span.
    pub fn analyze_class(&self, input: &ClassInput) -> Result<ClassAnalysis> {
        let snapshot = if self.config.merge {
            self.snapshots
                .get(&input.class.name)
                .map(|entry| Arc::clone(entry.value()))
        } else {
            None
        };

        let mut analyzer = ClassAnalyzer::new(&input.class, input.probes.clone(), &*self.filter)
            .with_previous(snapshot.as_deref());
        let mut merged = 0usize;
        for method in &input.methods {
            if analyzer.analyze_method(method)?.is_merged() {
                merged += 1;
            }
        }

        debug!(
            class = %input.class.name,
            methods = input.methods.len(),
            merged,
            "analyzed class"
        );
        Ok(analyzer.finish())
    }

    /// Captures several classes in parallel.
    ///
    /// # Errors
    ///
    /// Returns the first error of any class, or [`Error::Error`] if the worker pool cannot be
    /// created.
    pub fn capture_classes(&self, inputs: &[ClassInput]) -> Result<()> {
        self.install(|| inputs.par_iter().try_for_each(|input| self.capture_class(input)))
    }

    /// Analyzes several classes in parallel, results are in input order.
    ///
    /// # Errors
    ///
    /// Returns the first error of any class, or [`Error::Error`] if the worker pool cannot be
    /// created.
    pub fn analyze_classes(&self, inputs: &[ClassInput]) -> Result<Vec<ClassAnalysis>> {
        self.install(|| {
            inputs
                .par_iter()
                .map(|input| self.analyze_class(input))
                .collect()
        })
    }

    /// Drops all captured runs.
    pub fn reset(&self) {
        self.snapshots.clear();
    }

    /// Number of classes with a captured run.
    #[must_use]
    pub fn snapshot_count(&self) -> usize {
        self.snapshots.len()
    }

    /// Returns `true` if a run of the class has been captured.
    #[must_use]
    pub fn has_snapshot(&self, class: &str) -> bool {
        self.snapshots.contains_key(class)
    }

    /// Runs `op` on the configured worker pool.
    fn install<T, F>(&self, op: F) -> Result<T>
    where
        T: Send,
        F: FnOnce() -> Result<T> + Send,
    {
        match self.config.threads {
            Some(threads) => self.pool(threads)?.install(op),
            None => op(),
        }
    }

    /// The session's worker pool, built once.
    fn pool(&self, threads: usize) -> Result<&ThreadPool> {
        if let Some(pool) = self.pool.get() {
            return Ok(pool);
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|err| Error::Error(format!("Failed to create worker pool: {err}")))?;
        // a concurrent first call may have won, its pool is used and ours dropped
        Ok(self.pool.get_or_init(|| pool))
    }
}
