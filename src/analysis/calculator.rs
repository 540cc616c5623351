//! Reduction of a finished method graph to method level counters.
//!
//! The [`MethodCoverageCalculator`] collects the decisions of filters and applies them when
//! the coverage is calculated:
//!
//! 1. merged instructions are combined into one representative, the others are skipped,
//! 2. replaced branch sets are rebuilt from the coverage of their targets,
//! 3. every instruction which is not skipped adds its counters at its line.
//!
//! The graph itself is never modified, rewritten instructions are kept aside.

use std::collections::{BTreeMap, HashMap};

use tracing::trace;

use crate::{
    analysis::{InsnHandle, InsnId, Instruction, MethodGraph},
    coverage::MethodCoverage,
    filter::FilterOutput,
};

/// Computes the coverage of one method, honoring filter decisions.
pub struct MethodCoverageCalculator<'g> {
    graph: &'g MethodGraph,
    ignored: Vec<bool>,
    /// Merged instructions mapped to the instruction they have been merged into
    merged: BTreeMap<InsnId, InsnId>,
    replacements: BTreeMap<InsnId, Vec<InsnId>>,
}

impl<'g> MethodCoverageCalculator<'g> {
    /// Creates a calculator for a completed graph.
    #[must_use]
    pub fn new(graph: &'g MethodGraph) -> Self {
        MethodCoverageCalculator {
            graph,
            ignored: vec![false; graph.len()],
            merged: BTreeMap::new(),
            replacements: BTreeMap::new(),
        }
    }

    /// Returns `true` if the instruction has been skipped by a filter.
    #[must_use]
    pub fn is_ignored(&self, handle: InsnHandle) -> bool {
        self.graph
            .id(handle)
            .is_some_and(|id| self.ignored[id.index()])
    }

    /// Follows merge links to the instruction representing `id`.
    fn representative(&self, mut id: InsnId) -> InsnId {
        while let Some(&next) = self.merged.get(&id) {
            id = next;
        }
        id
    }

    /// Adds the counters of all remaining instructions to `coverage`.
    ///
    /// Consumes the calculator, filter decisions apply to one calculation only.
    pub fn calculate(mut self, coverage: &mut MethodCoverage) {
        let mut rewritten = HashMap::new();
        self.apply_merges(&mut rewritten);
        self.apply_replacements(&mut rewritten);

        for (idx, insn) in self.graph.iter().map(|(_, insn)| insn).enumerate() {
            if self.ignored[idx] {
                continue;
            }
            let insn = rewritten.get(&InsnId(idx)).unwrap_or(insn);
            coverage.increment(insn.instruction_counter(), insn.branch_counter(), insn.line());
        }
        coverage.increment_method_counter();

        trace!(
            method = coverage.name(),
            instructions = %coverage.instruction_counter(),
            branches = %coverage.branch_counter(),
            "calculated method coverage"
        );
    }

    fn current<'a>(&'a self, rewritten: &'a HashMap<InsnId, Instruction>, id: InsnId) -> Option<&'a Instruction> {
        rewritten.get(&id).or_else(|| self.graph.node(id))
    }

    fn apply_merges(&mut self, rewritten: &mut HashMap<InsnId, Instruction>) {
        let merged: Vec<InsnId> = self.merged.keys().copied().collect();

        // Merge into the representative
        for &id in &merged {
            let rep = self.representative(id);
            self.ignored[id.index()] = true;
            let combined = match (self.current(rewritten, rep), self.current(rewritten, id)) {
                (Some(rep_insn), Some(insn)) => rep_insn.merge(insn),
                _ => continue,
            };
            rewritten.insert(rep, combined);
        }

        // Merged instructions take the value of their representative
        for &id in &merged {
            let rep = self.representative(id);
            if let Some(value) = self.current(rewritten, rep).cloned() {
                rewritten.insert(id, value);
            }
        }
    }

    fn apply_replacements(&self, rewritten: &mut HashMap<InsnId, Instruction>) {
        for (&source, targets) in &self.replacements {
            let replaced = {
                let Some(insn) = self.current(rewritten, source) else {
                    continue;
                };
                let targets = targets
                    .iter()
                    .filter_map(|&target| self.current(rewritten, target));
                insn.replace_branches(targets)
            };
            rewritten.insert(source, replaced);
        }
    }
}

impl FilterOutput for MethodCoverageCalculator<'_> {
    fn ignore(&mut self, from: InsnHandle, to: InsnHandle) {
        let (Some(from), Some(to)) = (self.graph.id(from), self.graph.id(to)) else {
            return;
        };
        for flag in self.ignored.iter_mut().take(to.index() + 1).skip(from.index()) {
            *flag = true;
        }
    }

    fn merge(&mut self, a: InsnHandle, b: InsnHandle) {
        let (Some(a), Some(b)) = (self.graph.id(a), self.graph.id(b)) else {
            return;
        };
        let a = self.representative(a);
        let b = self.representative(b);
        if a != b {
            self.merged.insert(b, a);
        }
    }

    fn replace_branches(&mut self, source: InsnHandle, targets: &[InsnHandle]) {
        let Some(source) = self.graph.id(source) else {
            return;
        };
        let targets = targets
            .iter()
            .filter_map(|&target| self.graph.id(target))
            .collect();
        self.replacements.insert(source, targets);
    }
}
