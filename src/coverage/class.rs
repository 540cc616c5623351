//! Coverage node of a class.

use crate::coverage::{diff, ChangeKind, ChangeRange, Counter, LineCoverage, Lines, MethodCoverage};

/// Coverage data of a class, rolled up from its methods.
///
/// Only methods which contain code after filtering are added. Counters and per-line data
/// are accumulated on [`add_method`](Self::add_method).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassCoverage {
    name: String,
    signature: Option<String>,
    super_name: Option<String>,
    interfaces: Vec<String>,
    source_file: Option<String>,
    methods: Vec<MethodCoverage>,
    instructions: Counter,
    branches: Counter,
    complexity: Counter,
    method_counter: Counter,
    lines: Lines,
}

impl ClassCoverage {
    /// Creates empty coverage for the class with the given VM name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            signature: None,
            super_name: None,
            interfaces: Vec::new(),
            source_file: None,
            methods: Vec::new(),
            instructions: Counter::EMPTY,
            branches: Counter::EMPTY,
            complexity: Counter::EMPTY,
            method_counter: Counter::EMPTY,
            lines: Lines::default(),
        }
    }

    pub(crate) fn set_metadata(
        &mut self,
        signature: Option<String>,
        super_name: Option<String>,
        interfaces: Vec<String>,
        source_file: Option<String>,
    ) {
        self.signature = signature;
        self.super_name = super_name;
        self.interfaces = interfaces;
        self.source_file = source_file;
    }

    /// Adds a method and rolls its counters into the class totals.
    pub fn add_method(&mut self, method: MethodCoverage) {
        self.instructions += method.instruction_counter();
        self.branches += method.branch_counter();
        self.complexity += method.complexity_counter();
        self.method_counter += method.method_counter();
        self.lines.merge(method.lines());
        self.methods.push(method);
    }

    /// VM name of the class.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Generic signature of the class.
    #[must_use]
    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    /// VM name of the superclass.
    #[must_use]
    pub fn super_name(&self) -> Option<&str> {
        self.super_name.as_deref()
    }

    /// VM names of implemented interfaces.
    #[must_use]
    pub fn interfaces(&self) -> &[String] {
        &self.interfaces
    }

    /// Name of the source file the class was compiled from.
    #[must_use]
    pub fn source_file(&self) -> Option<&str> {
        self.source_file.as_deref()
    }

    /// Methods containing code, in analysis order.
    #[must_use]
    pub fn methods(&self) -> &[MethodCoverage] {
        &self.methods
    }

    /// Instruction counter over all methods.
    #[must_use]
    pub const fn instruction_counter(&self) -> Counter {
        self.instructions
    }

    /// Branch counter over all methods.
    #[must_use]
    pub const fn branch_counter(&self) -> Counter {
        self.branches
    }

    /// Complexity counter over all methods.
    #[must_use]
    pub const fn complexity_counter(&self) -> Counter {
        self.complexity
    }

    /// Method counter.
    #[must_use]
    pub const fn method_counter(&self) -> Counter {
        self.method_counter
    }

    /// Line counter over the merged per-line data of all methods.
    #[must_use]
    pub fn line_counter(&self) -> Counter {
        self.lines.counter()
    }

    /// Per-line coverage of all methods.
    #[must_use]
    pub const fn lines(&self) -> &Lines {
        &self.lines
    }

    /// Pairs every line containing code with the change affecting it, if any.
    ///
    /// # Arguments
    ///
    /// * `ranges` - Change ranges of the class' source file
    pub fn changed_lines<'a>(
        &'a self,
        ranges: &'a [ChangeRange],
    ) -> impl Iterator<Item = (u32, &'a LineCoverage, Option<ChangeKind>)> + 'a {
        self.lines
            .iter()
            .map(move |(nr, line)| (nr, line, diff::change_at(ranges, nr)))
    }
}
