//! Two-phase construction of a [`MethodGraph`] from the event stream of one method.
//!
//! Phase one consumes the events in original order: every instruction becomes a node at the
//! current source line, labels seen since the previous instruction are bound to the next one,
//! fall-through edges are registered immediately and probes resolve directly against the probe
//! array of the class. Jumps may reference labels whose instruction has not been seen yet, so
//! they are only recorded.
//!
//! Phase two runs in [`InstructionsBuilder::finish`]: every recorded jump is resolved through
//! the label bindings and registered as an indirect branch. `finish` consumes the builder,
//! wiring can therefore never run twice.
//!
//! # Examples
//!
//! ```rust
//! use covscope::analysis::{InsnHandle, InstructionsBuilder, Label, MethodEvent};
//!
//! let probes = [true];
//! let events = [
//!     MethodEvent::LineNumber(3),
//!     MethodEvent::Instruction { handle: InsnHandle(0), signature: None },
//!     MethodEvent::Jump { target: Label(1), branch: 1 },
//!     MethodEvent::Instruction { handle: InsnHandle(1), signature: None },
//!     MethodEvent::Label { label: Label(1), successor: true },
//!     MethodEvent::Instruction { handle: InsnHandle(2), signature: None },
//!     MethodEvent::Probe { probe: 0, branch: 0 },
//!     MethodEvent::EndMethod,
//! ];
//!
//! let graph = InstructionsBuilder::build(Some(&probes), &events)?;
//! assert_eq!(graph.len(), 3);
//! assert_eq!(graph.covered_count(), 3);
//! # Ok::<(), covscope::Error>(())
//! ```

use std::collections::HashMap;

use crate::{
    analysis::{InsnHandle, InsnId, Instruction, Label, MethodEvent, MethodGraph},
    Error, Result,
};

/// Largest branch index accepted for a single instruction.
///
/// Table switches are the widest instructions and are limited to far fewer targets by the
/// class file format.
pub const MAX_BRANCH: u32 = u16::MAX as u32;

/// A control transfer recorded while its target instruction may still be unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Jump {
    /// Instruction issuing the jump
    pub source: InsnId,
    /// Label of the jump target
    pub target: Label,
    /// Branch of `source` taken by the jump
    pub branch: u32,
}

/// Stateful builder for the instruction graph of a single method.
///
/// All instructions of a method must be added in their original sequence, along with line
/// numbers, labels, jumps and probes. Use [`InstructionsBuilder::finish`] to obtain the
/// completed graph.
pub struct InstructionsBuilder<'a> {
    /// Probe array of the class, `None` for static analysis
    probes: Option<&'a [bool]>,
    /// Line of subsequently added instructions
    current_line: Option<u32>,
    /// Last added instruction, `None` if the flow has been broken
    current_insn: Option<InsnId>,
    /// Labels marking the next instruction
    pending_labels: Vec<Label>,
    labels: HashMap<Label, InsnId>,
    jumps: Vec<Jump>,
    graph: MethodGraph,
    ended: bool,
}

impl<'a> InstructionsBuilder<'a> {
    /// Creates a builder for one method.
    ///
    /// ## Arguments
    /// * `probes` - Probe array of the class the method belongs to, or `None` to treat every
    ///   probe as not executed
    #[must_use]
    pub fn new(probes: Option<&'a [bool]>) -> Self {
        InstructionsBuilder {
            probes,
            current_line: None,
            current_insn: None,
            pending_labels: Vec::with_capacity(2),
            labels: HashMap::new(),
            jumps: Vec::new(),
            graph: MethodGraph::new(),
            ended: false,
        }
    }

    /// Builds the graph of a complete event stream in one go.
    ///
    /// # Errors
    ///
    /// Returns any error raised by [`InstructionsBuilder::consume`] or
    /// [`InstructionsBuilder::finish`].
    pub fn build(probes: Option<&'a [bool]>, events: &[MethodEvent]) -> Result<MethodGraph> {
        let mut builder = InstructionsBuilder::new(probes);
        builder.consume(events)?;
        builder.finish()
    }

    /// Sets the source line of all subsequently added instructions.
    pub fn set_current_line(&mut self, line: u32) {
        self.current_line = Some(line);
    }

    /// Adds a label which marks the next instruction.
    ///
    /// A label can mark more than one instruction handle, all pending labels are bound to the
    /// next added instruction. If `successor` is `false` the next instruction is not reached
    /// by falling through from the current one.
    pub fn add_label(&mut self, label: Label, successor: bool) {
        self.pending_labels.push(label);
        if !successor {
            self.no_successor();
        }
    }

    /// Adds a new instruction.
    ///
    /// The instruction is linked with the previous one through branch 0, unless the flow has
    /// been broken with [`InstructionsBuilder::no_successor`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateInstruction`] if `handle` has already been added.
    pub fn add_instruction(&mut self, handle: InsnHandle, signature: Option<String>) -> Result<InsnId> {
        let insn = Instruction::with_signature(self.current_line, signature);
        let id = self.graph.add(handle, insn)?;
        for label in self.pending_labels.drain(..) {
            self.labels.insert(label, id);
        }
        if let Some(previous) = self.current_insn {
            self.graph.register_indirect_branch(previous, id, 0)?;
        }
        self.current_insn = Some(id);
        Ok(id)
    }

    /// Declares that the next instruction is not a successor of the current one.
    ///
    /// This is the case after unconditional control transfers, or where a probe has been
    /// inserted before.
    pub fn no_successor(&mut self) {
        self.current_insn = None;
    }

    /// Records a jump from the current instruction to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoCurrentInstruction`] if no instruction is current, or
    /// [`Error::BranchOutOfRange`] if `branch` exceeds [`MAX_BRANCH`].
    pub fn add_jump(&mut self, target: Label, branch: u32) -> Result<()> {
        let source = self.current_insn.ok_or(Error::NoCurrentInstruction)?;
        self.check_branch(source, branch)?;
        self.jumps.push(Jump {
            source,
            target,
            branch,
        });
        Ok(())
    }

    /// Adds a probe for `branch` of the current instruction.
    ///
    /// The branch counts as executed if the probe array holds `true` at `probe`. Without a
    /// probe array every probe resolves to not executed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoCurrentInstruction`] if no instruction is current,
    /// [`Error::BranchOutOfRange`] if `branch` exceeds [`MAX_BRANCH`], or
    /// [`Error::ProbeOutOfBounds`] if `probe` does not fit the probe array.
    pub fn add_probe(&mut self, probe: usize, branch: u32) -> Result<()> {
        let id = self.current_insn.ok_or(Error::NoCurrentInstruction)?;
        self.check_branch(id, branch)?;
        let executed = match self.probes {
            Some(probes) => *probes.get(probe).ok_or(Error::ProbeOutOfBounds {
                probe,
                len: probes.len(),
            })?,
            None => false,
        };
        if let Some(insn) = self.graph.node_mut(id) {
            insn.set_probe_index(probe);
        }
        self.graph.register_direct_branch(id, executed, branch)
    }

    fn check_branch(&self, id: InsnId, branch: u32) -> Result<()> {
        if branch > MAX_BRANCH {
            return Err(Error::BranchOutOfRange {
                handle: self.graph.handle(id).ok_or(Error::UnknownInstruction(id))?,
                branch,
            });
        }
        Ok(())
    }

    /// Dispatches a single event.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Malformed`] for events after [`MethodEvent::EndMethod`], and any error
    /// of the operation the event maps to.
    pub fn accept(&mut self, event: &MethodEvent) -> Result<()> {
        if self.ended {
            return Err(malformed_error!("Event {:?} after end of method", event));
        }
        match event {
            MethodEvent::LineNumber(line) => self.set_current_line(*line),
            MethodEvent::Label { label, successor } => self.add_label(*label, *successor),
            MethodEvent::Instruction { handle, signature } => {
                self.add_instruction(*handle, signature.clone())?;
            }
            MethodEvent::Jump { target, branch } => self.add_jump(*target, *branch)?,
            MethodEvent::Probe { probe, branch } => self.add_probe(*probe, *branch)?,
            MethodEvent::NoSuccessor => self.no_successor(),
            MethodEvent::EndMethod => self.ended = true,
        }
        Ok(())
    }

    /// Consumes a complete event stream, which must be terminated by
    /// [`MethodEvent::EndMethod`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Malformed`] if the stream is not terminated, or any error raised by
    /// [`InstructionsBuilder::accept`].
    pub fn consume(&mut self, events: &[MethodEvent]) -> Result<()> {
        for event in events {
            self.accept(event)?;
        }
        if !self.ended {
            return Err(malformed_error!(
                "Event stream of {} events is not terminated",
                events.len()
            ));
        }
        Ok(())
    }

    /// Wires all recorded jumps and returns the completed graph.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnresolvedLabel`] if a jump targets a label which never marked an
    /// instruction.
    pub fn finish(mut self) -> Result<MethodGraph> {
        for jump in &self.jumps {
            let target = *self
                .labels
                .get(&jump.target)
                .ok_or(Error::UnresolvedLabel(jump.target))?;
            self.graph
                .register_indirect_branch(jump.source, target, jump.branch)?;
        }
        self.graph.set_jumps(self.jumps);
        Ok(self.graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{coverage::Counter, test::factories::*};

    #[test]
    fn straight_line_method_is_fully_covered() {
        let probes = [true];
        let graph = InstructionsBuilder::build(Some(&probes), &straight_line(5, 0)).unwrap();
        assert_eq!(graph.len(), 5);
        for (_, insn) in graph.iter() {
            assert_eq!(insn.instruction_counter(), Counter::ONE_COVERED);
            assert_eq!(insn.branch_counter(), Counter::EMPTY);
        }
    }

    #[test]
    fn if_method_covers_taken_branch_only() {
        let probes = [true, false];
        let graph = InstructionsBuilder::build(Some(&probes), &if_method(0)).unwrap();

        let decision = graph.get(InsnHandle(IF_DECISION)).unwrap();
        assert_eq!(decision.branch_counter(), Counter::new(1, 1));
        for handle in IF_ELSE_ONLY {
            assert!(!graph.get(InsnHandle(handle)).unwrap().is_covered());
        }
        for handle in IF_THEN_ONLY {
            assert!(graph.get(InsnHandle(handle)).unwrap().is_covered());
        }
    }

    #[test]
    fn static_mode_resolves_all_probes_as_missed() {
        let graph = InstructionsBuilder::build(None, &if_method(0)).unwrap();
        assert_eq!(graph.covered_count(), 0);
        assert!(graph.iter().any(|(_, insn)| insn.probe_index().is_some()));
    }

    #[test]
    fn probe_index_is_stamped() {
        let probes = [false, false, true];
        let graph = InstructionsBuilder::build(Some(&probes), &straight_line(2, 2)).unwrap();
        assert_eq!(graph.get(InsnHandle(1)).unwrap().probe_index(), Some(2));
        assert_eq!(graph.get(InsnHandle(0)).unwrap().probe_index(), None);
    }

    #[test]
    fn backward_jump_to_covered_instruction() {
        // loop header covered before the jump back gets wired
        let probes = [true];
        let events = [
            MethodEvent::Label { label: Label(0), successor: true },
            MethodEvent::Instruction { handle: InsnHandle(0), signature: None },
            MethodEvent::Instruction { handle: InsnHandle(1), signature: None },
            MethodEvent::Jump { target: Label(0), branch: 1 },
            MethodEvent::Instruction { handle: InsnHandle(2), signature: None },
            MethodEvent::Probe { probe: 0, branch: 0 },
            MethodEvent::EndMethod,
        ];
        let graph = InstructionsBuilder::build(Some(&probes), &events).unwrap();
        let jump = graph.get(InsnHandle(1)).unwrap();
        assert_eq!(jump.branch_count(), 2);
        assert_eq!(jump.branch_counter(), Counter::new(0, 2));
        assert_eq!(graph.jumps().len(), 1);
    }

    #[test]
    fn label_without_successor_breaks_fall_through() {
        let events = [
            MethodEvent::Instruction { handle: InsnHandle(0), signature: None },
            MethodEvent::Probe { probe: 0, branch: 0 },
            MethodEvent::Label { label: Label(0), successor: false },
            MethodEvent::Instruction { handle: InsnHandle(1), signature: None },
            MethodEvent::Probe { probe: 1, branch: 0 },
            MethodEvent::EndMethod,
        ];
        let probes = [false, true];
        let graph = InstructionsBuilder::build(Some(&probes), &events).unwrap();
        assert!(!graph.get(InsnHandle(0)).unwrap().is_covered());
        assert_eq!(graph.get(InsnHandle(0)).unwrap().branch_count(), 1);
        assert!(graph.get(InsnHandle(1)).unwrap().is_covered());
    }

    #[test]
    fn unknown_line_without_line_numbers() {
        let graph = InstructionsBuilder::build(None, &[
            MethodEvent::Instruction { handle: InsnHandle(0), signature: None },
            MethodEvent::EndMethod,
        ])
        .unwrap();
        assert_eq!(graph.get(InsnHandle(0)).unwrap().line(), None);
    }

    #[test]
    fn empty_method() {
        let graph = InstructionsBuilder::build(None, &[MethodEvent::EndMethod]).unwrap();
        assert!(graph.is_empty());
    }

    #[test]
    fn malformed_streams() {
        assert!(matches!(
            InstructionsBuilder::build(None, &[]),
            Err(Error::Malformed { .. })
        ));
        assert!(matches!(
            InstructionsBuilder::build(None, &[MethodEvent::EndMethod, MethodEvent::NoSuccessor]),
            Err(Error::Malformed { .. })
        ));
        assert!(matches!(
            InstructionsBuilder::build(None, &[
                MethodEvent::Probe { probe: 0, branch: 0 },
                MethodEvent::EndMethod,
            ]),
            Err(Error::NoCurrentInstruction)
        ));
    }

    #[test]
    fn unresolved_label() {
        let events = [
            MethodEvent::Instruction { handle: InsnHandle(0), signature: None },
            MethodEvent::Jump { target: Label(7), branch: 1 },
            MethodEvent::EndMethod,
        ];
        assert!(matches!(
            InstructionsBuilder::build(None, &events),
            Err(Error::UnresolvedLabel(Label(7)))
        ));
    }

    #[test]
    fn probe_out_of_bounds() {
        let probes = [true];
        assert!(matches!(
            InstructionsBuilder::build(Some(&probes), &straight_line(1, 3)),
            Err(Error::ProbeOutOfBounds { probe: 3, len: 1 })
        ));
    }

    #[test]
    fn huge_branch_index_is_rejected() {
        let direct = [
            MethodEvent::Instruction { handle: InsnHandle(3), signature: None },
            MethodEvent::Probe { probe: 0, branch: u32::MAX },
            MethodEvent::EndMethod,
        ];
        assert!(matches!(
            InstructionsBuilder::build(Some(&[true]), &direct),
            Err(Error::BranchOutOfRange { handle: InsnHandle(3), branch: u32::MAX })
        ));

        let jump = [
            MethodEvent::Instruction { handle: InsnHandle(0), signature: None },
            MethodEvent::Jump { target: Label(0), branch: MAX_BRANCH + 1 },
            MethodEvent::Label { label: Label(0), successor: true },
            MethodEvent::Instruction { handle: InsnHandle(1), signature: None },
            MethodEvent::EndMethod,
        ];
        assert!(matches!(
            InstructionsBuilder::build(None, &jump),
            Err(Error::BranchOutOfRange { handle: InsnHandle(0), .. })
        ));
    }

    #[test]
    fn largest_branch_index_is_accepted() {
        let events = [
            MethodEvent::Instruction { handle: InsnHandle(0), signature: None },
            MethodEvent::Probe { probe: 0, branch: MAX_BRANCH },
            MethodEvent::EndMethod,
        ];
        let graph = InstructionsBuilder::build(Some(&[true]), &events).unwrap();
        assert!(graph.get(InsnHandle(0)).unwrap().covered_branches().contains(MAX_BRANCH as usize));
    }

    #[test]
    fn duplicate_handle() {
        let events = [
            MethodEvent::Instruction { handle: InsnHandle(0), signature: None },
            MethodEvent::Instruction { handle: InsnHandle(0), signature: None },
            MethodEvent::EndMethod,
        ];
        assert!(matches!(
            InstructionsBuilder::build(None, &events),
            Err(Error::DuplicateInstruction(InsnHandle(0)))
        ));
    }
}
