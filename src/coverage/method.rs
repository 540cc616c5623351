//! Coverage node of a single method.

use crate::coverage::{Counter, Lines};

/// Coverage data of a single method.
///
/// Instances are filled by the analysis through [`increment`](Self::increment), once per
/// instruction, followed by exactly one call to
/// [`increment_method_counter`](Self::increment_method_counter).
///
/// Instructions with unknown line information count toward the instruction, branch and
/// complexity totals but never appear in the per-line data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodCoverage {
    name: String,
    desc: String,
    signature: Option<String>,
    instructions: Counter,
    branches: Counter,
    complexity: Counter,
    methods: Counter,
    lines: Lines,
}

impl MethodCoverage {
    /// Creates empty coverage for the given method.
    ///
    /// # Arguments
    ///
    /// * `name` - Method name
    /// * `desc` - Method descriptor
    /// * `signature` - Generic signature, if any
    #[must_use]
    pub fn new(name: impl Into<String>, desc: impl Into<String>, signature: Option<String>) -> Self {
        Self {
            name: name.into(),
            desc: desc.into(),
            signature,
            instructions: Counter::EMPTY,
            branches: Counter::EMPTY,
            complexity: Counter::EMPTY,
            methods: Counter::EMPTY,
            lines: Lines::default(),
        }
    }

    /// Adds the counters of one instruction.
    pub fn increment(&mut self, instructions: Counter, branches: Counter, line: Option<u32>) {
        self.instructions += instructions;
        self.branches += branches;
        if let Some(line) = line {
            self.lines.increment(line, instructions, branches);
        }
        if branches.total() > 1 {
            let covered = branches.covered().saturating_sub(1);
            let missed = branches.total().saturating_sub(covered + 1);
            self.complexity = self.complexity.increment(missed, covered);
        }
    }

    /// Adds the method itself to the method and complexity counters.
    ///
    /// Must be called once after all instructions have been added.
    pub fn increment_method_counter(&mut self) {
        let base = if self.instructions.covered() == 0 {
            Counter::ONE_MISSED
        } else {
            Counter::ONE_COVERED
        };
        self.methods += base;
        self.complexity += base;
    }

    /// Method name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Method descriptor.
    #[must_use]
    pub fn desc(&self) -> &str {
        &self.desc
    }

    /// Generic signature of the method.
    #[must_use]
    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    /// Instruction counter.
    #[must_use]
    pub const fn instruction_counter(&self) -> Counter {
        self.instructions
    }

    /// Branch counter.
    #[must_use]
    pub const fn branch_counter(&self) -> Counter {
        self.branches
    }

    /// Cyclomatic complexity counter.
    #[must_use]
    pub const fn complexity_counter(&self) -> Counter {
        self.complexity
    }

    /// Method counter (one item, covered if any instruction was executed).
    #[must_use]
    pub const fn method_counter(&self) -> Counter {
        self.methods
    }

    /// Line counter derived from the per-line data.
    #[must_use]
    pub fn line_counter(&self) -> Counter {
        self.lines.counter()
    }

    /// Per-line coverage.
    #[must_use]
    pub const fn lines(&self) -> &Lines {
        &self.lines
    }

    /// First line containing code.
    #[must_use]
    pub fn first_line(&self) -> Option<u32> {
        self.lines.first_line()
    }

    /// Last line containing code.
    #[must_use]
    pub fn last_line(&self) -> Option<u32> {
        self.lines.last_line()
    }

    /// Returns `true` if the method has at least one instruction left after filtering.
    #[must_use]
    pub const fn contains_code(&self) -> bool {
        self.instructions.total() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_method_contains_no_code() {
        let mut mc = MethodCoverage::new("<init>", "()V", None);
        mc.increment_method_counter();
        assert!(!mc.contains_code());
        assert_eq!(mc.method_counter(), Counter::ONE_MISSED);
    }

    #[test]
    fn complexity_per_decision() {
        let mut mc = MethodCoverage::new("run", "(I)V", None);
        mc.increment(Counter::ONE_COVERED, Counter::new(1, 1), Some(1));
        mc.increment(Counter::ONE_COVERED, Counter::new(0, 3), Some(2));
        mc.increment(Counter::ONE_MISSED, Counter::EMPTY, None);
        mc.increment_method_counter();

        // (1 missed, 0 covered) + (0 missed, 2 covered) + method (0, 1)
        assert_eq!(mc.complexity_counter(), Counter::new(1, 3));
        assert_eq!(mc.instruction_counter(), Counter::new(1, 2));
        assert_eq!(mc.branch_counter(), Counter::new(1, 4));
        assert_eq!(mc.line_counter(), Counter::new(0, 2));
        assert_eq!(mc.method_counter(), Counter::ONE_COVERED);
        assert_eq!(mc.first_line(), Some(1));
        assert_eq!(mc.last_line(), Some(2));
    }

    #[test]
    fn unknown_line_counts_only_toward_totals() {
        let mut mc = MethodCoverage::new("run", "()V", Some("<T:Ljava/lang/Object;>()V".into()));
        mc.increment(Counter::ONE_COVERED, Counter::EMPTY, None);
        assert!(mc.contains_code());
        assert!(mc.lines().is_empty());
        assert_eq!(mc.line_counter(), Counter::EMPTY);
        assert_eq!(mc.signature(), Some("<T:Ljava/lang/Object;>()V"));
    }
}
