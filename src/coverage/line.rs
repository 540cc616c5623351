//! Per-line coverage counters.

use std::collections::BTreeMap;

use crate::coverage::{Counter, CounterStatus};

/// Instruction and branch counters of one source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineCoverage {
    instructions: Counter,
    branches: Counter,
}

impl LineCoverage {
    /// Creates line coverage from its two counters.
    #[must_use]
    pub const fn new(instructions: Counter, branches: Counter) -> Self {
        Self {
            instructions,
            branches,
        }
    }

    /// Instruction counter of all instructions mapped to this line.
    #[must_use]
    pub const fn instructions(&self) -> Counter {
        self.instructions
    }

    /// Branch counter of all instructions mapped to this line.
    #[must_use]
    pub const fn branches(&self) -> Counter {
        self.branches
    }

    /// Combined status of this line.
    ///
    /// A line is partly covered if either some of its instructions or some of its branches
    /// were missed while others were executed.
    #[must_use]
    pub const fn status(&self) -> CounterStatus {
        self.instructions.status().combine(self.branches.status())
    }

    /// Adds instruction and branch counters to this line.
    pub fn increment(&mut self, instructions: Counter, branches: Counter) {
        self.instructions += instructions;
        self.branches += branches;
    }
}

/// Line coverage keyed by source line number.
///
/// Instructions without line information are never recorded here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lines {
    lines: BTreeMap<u32, LineCoverage>,
}

impl Lines {
    /// Adds counters to the given line.
    pub fn increment(&mut self, line: u32, instructions: Counter, branches: Counter) {
        self.lines
            .entry(line)
            .or_default()
            .increment(instructions, branches);
    }

    /// Adds all lines of `other` to this map.
    pub fn merge(&mut self, other: &Lines) {
        for (&nr, line) in &other.lines {
            self.increment(nr, line.instructions, line.branches);
        }
    }

    /// Coverage of the given line, if any instruction is mapped to it.
    #[must_use]
    pub fn get(&self, line: u32) -> Option<&LineCoverage> {
        self.lines.get(&line)
    }

    /// Iterates the lines in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &LineCoverage)> {
        self.lines.iter().map(|(&nr, line)| (nr, line))
    }

    /// Number of lines containing code.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns `true` if no line contains code.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// First line containing code.
    #[must_use]
    pub fn first_line(&self) -> Option<u32> {
        self.lines.keys().next().copied()
    }

    /// Last line containing code.
    #[must_use]
    pub fn last_line(&self) -> Option<u32> {
        self.lines.keys().next_back().copied()
    }

    /// Counter over lines: a line counts as covered once any of its instructions was executed.
    #[must_use]
    pub fn counter(&self) -> Counter {
        self.lines
            .values()
            .fold(Counter::EMPTY, |acc, line| match line.status() {
                CounterStatus::Empty => acc,
                CounterStatus::NotCovered => acc + Counter::ONE_MISSED,
                CounterStatus::FullyCovered | CounterStatus::PartlyCovered => {
                    acc + Counter::ONE_COVERED
                }
            })
    }
}
