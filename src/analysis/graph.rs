//! Instruction graph of a single method.
//!
//! The [`MethodGraph`] owns all [`Instruction`]s of a method in a flat arena. Edges are not
//! stored as adjacency lists: coverage only ever flows backwards, from a probe-backed
//! instruction to the instructions leading into it, so every instruction keeps a single
//! predecessor link (an arena index plus the branch of the predecessor) and its branch
//! bookkeeping.

use std::collections::HashMap;

use crate::{
    analysis::{InsnHandle, InsnId, Instruction, Jump, ProbeSpan, SignatureMap},
    Error, Result,
};

/// The instructions of one method, keyed by their reader assigned handles.
///
/// Graphs are produced by [`InstructionsBuilder::finish`](crate::analysis::InstructionsBuilder::finish)
/// with all jumps wired. Arena indices follow the original instruction order.
#[derive(Debug, Clone, Default)]
pub struct MethodGraph {
    nodes: Vec<Instruction>,
    handles: Vec<InsnHandle>,
    index: HashMap<InsnHandle, InsnId>,
    jumps: Vec<Jump>,
}

impl MethodGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an instruction to the arena.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateInstruction`] if the handle is already part of the graph.
    pub fn add(&mut self, handle: InsnHandle, insn: Instruction) -> Result<InsnId> {
        if self.index.contains_key(&handle) {
            return Err(Error::DuplicateInstruction(handle));
        }
        let id = InsnId(self.nodes.len());
        self.nodes.push(insn);
        self.handles.push(handle);
        self.index.insert(handle, id);
        Ok(id)
    }

    /// Number of instructions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the method has no instructions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Arena index of the instruction with the given handle.
    #[must_use]
    pub fn id(&self, handle: InsnHandle) -> Option<InsnId> {
        self.index.get(&handle).copied()
    }

    /// Handle of the instruction at the given arena index.
    #[must_use]
    pub fn handle(&self, id: InsnId) -> Option<InsnHandle> {
        self.handles.get(id.index()).copied()
    }

    /// Handles of all instructions in original order.
    #[must_use]
    pub fn handles(&self) -> &[InsnHandle] {
        &self.handles
    }

    /// Instruction at the given arena index.
    #[must_use]
    pub fn node(&self, id: InsnId) -> Option<&Instruction> {
        self.nodes.get(id.index())
    }

    pub(crate) fn node_mut(&mut self, id: InsnId) -> Option<&mut Instruction> {
        self.nodes.get_mut(id.index())
    }

    /// Instruction with the given handle.
    #[must_use]
    pub fn get(&self, handle: InsnHandle) -> Option<&Instruction> {
        self.id(handle).and_then(|id| self.node(id))
    }

    /// Iterates all instructions in original order.
    pub fn iter(&self) -> impl Iterator<Item = (InsnHandle, &Instruction)> {
        self.handles.iter().copied().zip(self.nodes.iter())
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (InsnHandle, &mut Instruction)> {
        self.handles.iter().copied().zip(self.nodes.iter_mut())
    }

    /// Jumps which have been wired into this graph.
    #[must_use]
    pub fn jumps(&self) -> &[Jump] {
        &self.jumps
    }

    pub(crate) fn set_jumps(&mut self, jumps: Vec<Jump>) {
        self.jumps = jumps;
    }

    /// Registers a branch of `id` whose status is directly known from a probe.
    ///
    /// If the branch was executed the status is propagated to the predecessors of `id`.
    ///
    /// Must be called exactly once for every branch index of an instruction. The operation is
    /// not idempotent: a repeated call for the same index inflates the branch count.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownInstruction`] if `id` does not belong to this graph.
    pub fn register_direct_branch(&mut self, id: InsnId, executed: bool, branch: u32) -> Result<()> {
        let insn = self
            .nodes
            .get_mut(id.index())
            .ok_or(Error::UnknownInstruction(id))?;
        insn.branches += 1;
        if executed {
            self.propagate(id, branch);
        }
        Ok(())
    }

    /// Registers a branch of `source` whose status is derived from the status of `target`.
    ///
    /// `target` records `source` as its predecessor. If `target` is already covered the
    /// branch is marked executed right away, otherwise this happens once `target` becomes
    /// covered through one of its own branches.
    ///
    /// Must be called exactly once for every branch index of an instruction. The operation is
    /// not idempotent: a repeated call for the same index inflates the branch count.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownInstruction`] if `source` or `target` does not belong to this
    /// graph. The graph is left unchanged in that case.
    pub fn register_indirect_branch(&mut self, source: InsnId, target: InsnId, branch: u32) -> Result<()> {
        for id in [source, target] {
            if id.index() >= self.nodes.len() {
                return Err(Error::UnknownInstruction(id));
            }
        }
        self.nodes[source.index()].branches += 1;
        let target = &mut self.nodes[target.index()];
        target.predecessor = Some((source, branch));
        if target.is_covered() {
            self.propagate(source, branch);
        }
        Ok(())
    }

    /// Marks `branch` of `id` as executed and walks the predecessor chain backwards until an
    /// instruction is reached which was already covered before.
    fn propagate(&mut self, mut id: InsnId, mut branch: u32) {
        // Iterative on purpose, straight-line chains can be arbitrarily long
        while let Some(insn) = self.nodes.get_mut(id.index()) {
            let was_covered = insn.is_covered();
            insn.covered.insert(branch as usize);
            if was_covered {
                return;
            }
            match insn.predecessor {
                Some((pred, pred_branch)) => {
                    id = pred;
                    branch = pred_branch;
                }
                None => return,
            }
        }
    }

    /// Range of probes backing instructions of this graph.
    #[must_use]
    pub fn probe_span(&self) -> Option<ProbeSpan> {
        ProbeSpan::of(self.nodes.iter())
    }

    /// Number of covered instructions.
    #[must_use]
    pub fn covered_count(&self) -> usize {
        self.nodes.iter().filter(|insn| insn.is_covered()).count()
    }

    /// Snapshot of this graph keyed by instruction signature.
    ///
    /// Returns `None` if any instruction lacks a signature, such a graph can never be matched
    /// against another run.
    #[must_use]
    pub fn signature_map(&self) -> Option<SignatureMap> {
        self.nodes
            .iter()
            .map(|insn| insn.signature().map(|sign| (sign.to_string(), insn.clone())))
            .collect::<Option<HashMap<_, _>>>()
            .map(SignatureMap::new)
    }
}
