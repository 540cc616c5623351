//! Execution status of a single instruction.
//!
//! For every instruction of a method one [`Instruction`] is created. The execution status is
//! recorded separately for each outgoing branch; every instruction has at least one branch,
//! by convention branch 0 for falling through to the next instruction.
//!
//! Instances live in the arena of a [`MethodGraph`](crate::analysis::MethodGraph) and are
//! used in two steps:
//!
//! 1. **Building the CFG** - branches are registered through the graph, either backed
//!    directly by a probe or derived from the status of a target instruction. Executed
//!    branches are propagated backwards along predecessor links.
//! 2. **Querying the status** - once all branches are registered each instruction knows its
//!    [`line`](Instruction::line), [`instruction_counter`](Instruction::instruction_counter)
//!    and [`branch_counter`](Instruction::branch_counter).
//!
//! For filtering, instructions can be combined into new instructions with
//! [`merge`](Instruction::merge) and [`replace_branches`](Instruction::replace_branches).
//! Both leave the existing instances untouched.

use std::fmt;

use crate::{coverage::Counter, utils::BitSet};

/// Index of an instruction within the arena of its [`MethodGraph`](crate::analysis::MethodGraph).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InsnId(pub(crate) usize);

impl InsnId {
    /// Returns the raw arena index.
    #[must_use]
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Debug for InsnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InsnId({})", self.0)
    }
}

impl fmt::Display for InsnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "i{}", self.0)
    }
}

/// Execution status of a single instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// Source line, `None` if the method carries no line information.
    line: Option<u32>,
    /// Number of registered outgoing branches.
    pub(crate) branches: u32,
    /// Indices of executed branches.
    pub(crate) covered: BitSet,
    /// Instruction (and its branch) leading into this one, used for propagation only.
    pub(crate) predecessor: Option<(InsnId, u32)>,
    /// Line independent structural identity.
    signature: Option<String>,
    /// Probe which most recently determined the status of this instruction.
    probe_index: Option<usize>,
}

impl Instruction {
    /// Creates a new instruction without branches at the given line.
    #[must_use]
    pub fn new(line: Option<u32>) -> Self {
        Self::with_signature(line, None)
    }

    /// Creates a new instruction carrying a structural signature.
    #[must_use]
    pub fn with_signature(line: Option<u32>, signature: Option<String>) -> Self {
        Self {
            line,
            branches: 0,
            covered: BitSet::new(),
            predecessor: None,
            signature,
            probe_index: None,
        }
    }

    /// Source line this instruction belongs to.
    #[must_use]
    pub const fn line(&self) -> Option<u32> {
        self.line
    }

    /// Number of outgoing branches.
    #[must_use]
    pub const fn branch_count(&self) -> u32 {
        self.branches
    }

    /// Indices of executed branches.
    #[must_use]
    pub const fn covered_branches(&self) -> &BitSet {
        &self.covered
    }

    /// Returns `true` if any outgoing branch has been executed.
    #[must_use]
    pub fn is_covered(&self) -> bool {
        !self.covered.is_empty()
    }

    /// Structural signature used for cross-run matching.
    #[must_use]
    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    /// Probe which most recently determined the status of this instruction.
    #[must_use]
    pub const fn probe_index(&self) -> Option<usize> {
        self.probe_index
    }

    pub(crate) fn set_probe_index(&mut self, probe: usize) {
        self.probe_index = Some(probe);
    }

    /// Instruction counter: always one instruction, which is covered or not.
    #[must_use]
    pub fn instruction_counter(&self) -> Counter {
        if self.covered.is_empty() {
            Counter::ONE_MISSED
        } else {
            Counter::ONE_COVERED
        }
    }

    /// Branch counter: only instructions with at least two outgoing branches report branches.
    #[must_use]
    pub fn branch_counter(&self) -> Counter {
        if self.branches < 2 {
            return Counter::EMPTY;
        }
        let covered = u32::try_from(self.covered.count()).unwrap_or(u32::MAX);
        Counter::new(self.branches.saturating_sub(covered), covered)
    }

    /// Returns a new instruction combining the executed branches of both instructions.
    ///
    /// The result keeps the line and signature of `self` and takes the branch count of
    /// `other`.
    #[must_use]
    pub fn merge(&self, other: &Instruction) -> Instruction {
        let mut result = Instruction::with_signature(self.line, self.signature.clone());
        result.branches = other.branches;
        result.covered.union_with(&self.covered);
        result.covered.union_with(&other.covered);
        result
    }

    /// Adds the executed branches of `other` to this instruction.
    ///
    /// Used to combine two instructions already known to share a signature. The operation is
    /// idempotent. Returns `true` if any branch became covered.
    pub fn merge_from(&mut self, other: &Instruction) -> bool {
        self.covered.union_with(&other.covered)
    }

    /// Returns a copy of this instruction whose outgoing branches are replaced by edges to
    /// the given instructions.
    ///
    /// The new branch `i` counts as executed when the `i`-th target instruction is covered.
    #[must_use]
    pub fn replace_branches<'a, I>(&self, targets: I) -> Instruction
    where
        I: IntoIterator<Item = &'a Instruction>,
    {
        let mut result = Instruction::with_signature(self.line, self.signature.clone());
        let mut idx = 0;
        for target in targets {
            if target.is_covered() {
                result.covered.insert(idx);
            }
            idx += 1;
        }
        result.branches = u32::try_from(idx).unwrap_or(u32::MAX);
        result
    }
}
