//! Signature based merge of two analysis runs of the same method.
//!
//! Two runs are combined when the previous run produced a graph whose instructions carry the
//! same signatures as the current one. Instructions are matched by signature only, never by
//! handle, as both graphs are built independently. A successful merge
//!
//! 1. ORs the probes of the previous run into the probe array of the current run, aligned at
//!    the first probe each run uses for the method, and
//! 2. adds the executed branches of every previous instruction to the current instruction
//!    with the same signature.
//!
//! Methods which changed between both runs are simply not merged. The only error is a
//! [`ProbeSpanMismatch`](crate::Error::ProbeSpanMismatch), which means the signature
//! matching itself is broken.
//!
//! Matching is a set membership test: every previous signature must occur somewhere in the
//! current graph. Reordered instructions with identical signatures are accepted as equal.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::{
    analysis::{Instruction, MethodGraph},
    Error, Result,
};

/// Contiguous range of probes used by the instructions of one method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeSpan {
    /// Lowest probe id
    pub first: usize,
    /// Highest probe id
    pub last: usize,
}

impl ProbeSpan {
    /// Computes the span over all probe backed instructions, `None` if there are none.
    pub fn of<'a, I>(insns: I) -> Option<ProbeSpan>
    where
        I: IntoIterator<Item = &'a Instruction>,
    {
        insns
            .into_iter()
            .filter_map(Instruction::probe_index)
            .fold(None, |span, probe| match span {
                None => Some(ProbeSpan {
                    first: probe,
                    last: probe,
                }),
                Some(ProbeSpan { first, last }) => Some(ProbeSpan {
                    first: first.min(probe),
                    last: last.max(probe),
                }),
            })
    }

    /// Number of probes in the span.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.last - self.first + 1
    }
}

/// Instructions of a method graph keyed by their signature.
///
/// This is what survives of a previous run: the graph structure is gone, only the coverage
/// state of each instruction remains.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignatureMap {
    insns: HashMap<String, Instruction>,
}

impl SignatureMap {
    /// Wraps a signature keyed instruction map.
    #[must_use]
    pub fn new(insns: HashMap<String, Instruction>) -> Self {
        SignatureMap { insns }
    }

    /// Number of distinct signatures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.insns.len()
    }

    /// Returns `true` if the map holds no instructions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.insns.is_empty()
    }

    /// Instruction with the given signature.
    #[must_use]
    pub fn get(&self, signature: &str) -> Option<&Instruction> {
        self.insns.get(signature)
    }

    /// Iterates all signatures and their instructions in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Instruction)> {
        self.insns.iter().map(|(sign, insn)| (sign.as_str(), insn))
    }

    /// Range of probes backing the instructions of this map.
    #[must_use]
    pub fn probe_span(&self) -> Option<ProbeSpan> {
        ProbeSpan::of(self.insns.values())
    }
}

/// Result of a merge attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Both runs have been combined.
    Merged,
    /// There is no previous run of this method.
    NoPrevious,
    /// The method changed, the number of instructions differs.
    NodeCountMismatch {
        /// Instructions of the current run
        current: usize,
        /// Instructions of the previous run
        previous: usize,
    },
    /// The method changed, a previous instruction has no counterpart.
    SignatureMismatch {
        /// Signature only present in the previous run
        signature: String,
    },
}

impl MergeOutcome {
    /// Returns `true` if both runs have been combined.
    #[must_use]
    pub fn is_merged(&self) -> bool {
        matches!(self, MergeOutcome::Merged)
    }
}

/// Merges the previous run of a method into the current one.
///
/// ## Arguments
/// * `class` - Name of the class, used for diagnostics
/// * `method` - Merge key of the method, used for diagnostics
/// * `graph` - Completed graph of the current run, updated in place
/// * `previous` - Snapshot of the previous run, if any
/// * `probes` - Probe array of the current run, updated in place
/// * `previous_probes` - Probe array of the previous run
///
/// Probes are only combined if both runs provide a probe array. Merging the same previous run
/// twice has no further effect.
///
/// # Errors
///
/// Returns [`Error::ProbeSpanMismatch`] if both graphs match by signature but span a different
/// number of probes, and [`Error::ProbeOutOfBounds`] if a span does not fit into its probe
/// array.
pub fn merge_method(
    class: &str,
    method: &str,
    graph: &mut MethodGraph,
    previous: Option<&SignatureMap>,
    probes: Option<&mut [bool]>,
    previous_probes: Option<&[bool]>,
) -> Result<MergeOutcome> {
    let Some(previous) = previous else {
        return Ok(MergeOutcome::NoPrevious);
    };

    if previous.len() != graph.len() {
        debug!(
            class,
            method,
            current = graph.len(),
            previous = previous.len(),
            "method changed, skipping merge"
        );
        return Ok(MergeOutcome::NodeCountMismatch {
            current: graph.len(),
            previous: previous.len(),
        });
    }

    let signatures: HashSet<&str> = graph
        .iter()
        .filter_map(|(_, insn)| insn.signature())
        .collect();
    if let Some((missing, _)) = previous
        .iter()
        .find(|(sign, _)| !signatures.contains(sign))
    {
        debug!(class, method, signature = missing, "method changed, skipping merge");
        return Ok(MergeOutcome::SignatureMismatch {
            signature: missing.to_string(),
        });
    }

    let span = match (graph.probe_span(), previous.probe_span()) {
        (Some(current), Some(prior)) if current.width() == prior.width() => Some((current, prior)),
        (None, None) => None,
        (current, prior) => {
            return Err(Error::ProbeSpanMismatch {
                class: class.to_string(),
                method: method.to_string(),
                current: current.map_or(0, |span| span.width()),
                previous: prior.map_or(0, |span| span.width()),
            });
        }
    };

    if let (Some((current, prior)), Some(probes), Some(previous_probes)) =
        (span, probes, previous_probes)
    {
        or_probes(probes, current, previous_probes, prior)?;
    }

    let mut changed = 0usize;
    for (_, insn) in graph.iter_mut() {
        let Some(prior) = insn.signature().and_then(|sign| previous.get(sign)) else {
            continue;
        };
        if insn.merge_from(prior) {
            changed += 1;
        }
    }

    debug!(class, method, changed, "merged previous run");
    Ok(MergeOutcome::Merged)
}

fn or_probes(
    probes: &mut [bool],
    span: ProbeSpan,
    previous: &[bool],
    previous_span: ProbeSpan,
) -> Result<()> {
    if span.last >= probes.len() {
        return Err(Error::ProbeOutOfBounds {
            probe: span.last,
            len: probes.len(),
        });
    }
    if previous_span.last >= previous.len() {
        return Err(Error::ProbeOutOfBounds {
            probe: previous_span.last,
            len: previous.len(),
        });
    }

    let target = &mut probes[span.first..=span.last];
    let source = &previous[previous_span.first..=previous_span.last];
    for (probe, fired) in target.iter_mut().zip(source) {
        *probe |= *fired;
    }
    Ok(())
}
