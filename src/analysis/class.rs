//! Analysis of all methods of one class.

use tracing::{trace, warn};

use crate::{
    analysis::{
        merge_method, ClassDescriptor, ClassSnapshot, InstructionsBuilder,
        MethodBody, MethodCoverageCalculator, MergeOutcome,
    },
    coverage::{ClassCoverage, MethodCoverage},
    filter::Filter,
    Result,
};

/// Coverage of one class together with the probes it has been computed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassAnalysis {
    /// Coverage node of the class
    pub coverage: ClassCoverage,
    /// Probe array after merging previous runs, `None` for static analysis
    pub probes: Option<Vec<bool>>,
}

/// Analyzes the methods of a class one after another.
///
/// The analyzer owns a working copy of the probe array of the class. When a snapshot of a
/// previous run is attached, every method found unchanged in the snapshot is merged and the
/// probes of the previous run are folded into the working copy.
pub struct ClassAnalyzer<'a> {
    class: &'a ClassDescriptor,
    probes: Option<Vec<bool>>,
    filter: &'a dyn Filter,
    previous: Option<&'a ClassSnapshot>,
    coverage: ClassCoverage,
}

impl<'a> ClassAnalyzer<'a> {
    /// Creates an analyzer for one class.
    ///
    /// ## Arguments
    /// * `class` - Metadata of the class, also handed to filters
    /// * `probes` - Execution data of the class, `None` for static analysis
    /// * `filter` - Filter applied to every method
    #[must_use]
    pub fn new(class: &'a ClassDescriptor, probes: Option<Vec<bool>>, filter: &'a dyn Filter) -> Self {
        let mut coverage = ClassCoverage::new(class.name.clone());
        coverage.set_metadata(
            class.signature.clone(),
            class.super_name.clone(),
            class.interfaces.clone(),
            class.source_file.clone(),
        );
        ClassAnalyzer {
            class,
            probes,
            filter,
            previous: None,
            coverage,
        }
    }

    /// Attaches the snapshot of a previous run to merge with.
    #[must_use]
    pub fn with_previous(mut self, previous: Option<&'a ClassSnapshot>) -> Self {
        self.previous = previous;
        self
    }

    /// Analyzes one method and adds its coverage to the class.
    ///
    /// Methods without any instruction left after filtering are not added.
    ///
    /// # Errors
    ///
    /// Returns an error if the event stream of the method is malformed, or if merging with the
    /// previous run detects an inconsistent probe span.
    pub fn analyze_method(&mut self, body: &MethodBody) -> Result<MergeOutcome> {
        let method = &body.descriptor;
        let mut graph = InstructionsBuilder::build(self.probes.as_deref(), &body.events)?;

        let outcome = match self.previous {
            Some(previous) => {
                let key = method.merge_key();
                merge_method(
                    &self.class.name,
                    &key,
                    &mut graph,
                    previous.method(&key),
                    self.probes.as_deref_mut(),
                    previous.probes(),
                )?
            }
            None => MergeOutcome::NoPrevious,
        };

        let mut calculator = MethodCoverageCalculator::new(&graph);
        self.filter.filter(method, &graph, self.class, &mut calculator);

        let mut coverage = MethodCoverage::new(
            method.name.clone(),
            method.desc.clone(),
            method.signature.clone(),
        );
        calculator.calculate(&mut coverage);

        if coverage.contains_code() {
            self.coverage.add_method(coverage);
        } else {
            trace!(class = %self.class.name, method = %method.name, "method contains no code");
        }
        Ok(outcome)
    }

    /// Returns the class coverage and the merged probe array.
    #[must_use]
    pub fn finish(self) -> ClassAnalysis {
        ClassAnalysis {
            coverage: self.coverage,
            probes: self.probes,
        }
    }
}

/// Builds the snapshot of a class for merging with later runs.
///
/// Methods whose instructions do not all carry a signature cannot be matched and are left
/// out of the snapshot.
///
/// # Errors
///
/// Returns an error if the event stream of any method is malformed.
pub fn capture_class(
    class: &ClassDescriptor,
    methods: &[MethodBody],
    probes: Option<Vec<bool>>,
) -> Result<ClassSnapshot> {
    let mut snapshot = ClassSnapshot::new(probes);
    for body in methods {
        let method = &body.descriptor;
        if method.is_bodiless() {
            continue;
        }
        let graph = InstructionsBuilder::build(snapshot.probes(), &body.events)?;
        match graph.signature_map() {
            Some(signatures) => {
                snapshot.insert(method.merge_key(), signatures);
            }
            None => {
                warn!(
                    class = %class.name,
                    method = %method.name,
                    "instructions without signature, method cannot be merged"
                );
            }
        }
    }
    trace!(class = %class.name, methods = snapshot.len(), "captured class snapshot");
    Ok(snapshot)
}
