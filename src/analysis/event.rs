//! Event stream emitted by the bytecode reader for one method.
//!
//! The reader walks the method body in original order and reports line number markers,
//! labels, instructions, jumps and probes. [`InstructionsBuilder`](crate::analysis::InstructionsBuilder)
//! consumes these events in a single pass.

use std::fmt;

/// Opaque handle of an instruction, as assigned by the bytecode reader.
///
/// Handles only need to be unique within one method. They identify instructions towards
/// filters and are the keys of a [`MethodGraph`](crate::analysis::MethodGraph).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InsnHandle(pub u32);

impl fmt::Debug for InsnHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InsnHandle({})", self.0)
    }
}

impl fmt::Display for InsnHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A position in the instruction stream which may be the target of jumps.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Label(pub u32);

impl fmt::Debug for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Label({})", self.0)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// One event of a method's instruction stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodEvent {
    /// All subsequent instructions belong to this source line.
    LineNumber(u32),
    /// A label marking the next instruction.
    Label {
        /// The label
        label: Label,
        /// `true` if the next instruction can be reached by falling through from the previous
        /// one. `false` breaks the implicit edge between both instructions.
        successor: bool,
    },
    /// A decoded instruction.
    Instruction {
        /// Reader assigned handle
        handle: InsnHandle,
        /// Structural signature for cross-run matching, see [`instruction_signature`]
        signature: Option<String>,
    },
    /// The current instruction transfers control to `target` through branch `branch`.
    Jump {
        /// Jump target
        target: Label,
        /// Branch index, unique for the current instruction
        branch: u32,
    },
    /// A probe records the execution of branch `branch` of the current instruction.
    Probe {
        /// Index into the probe array of the class
        probe: usize,
        /// Branch index, unique for the current instruction
        branch: u32,
    },
    /// The next instruction is not a successor of the current one.
    NoSuccessor,
    /// End of the method body.
    EndMethod,
}

/// Builds the structural signature of an instruction.
///
/// The signature identifies an instruction across independent analysis runs. It consists of
/// the position of the instruction within its method, its opcode and its operands, and it
/// deliberately leaves out source line information, so recompiling with shifted lines keeps
/// all signatures stable.
///
/// # Examples
///
/// ```rust
/// use covscope::analysis::instruction_signature;
///
/// let a = instruction_signature(3, "INVOKEVIRTUAL", &["java/io/PrintStream", "println"]);
/// let b = instruction_signature(3, "INVOKEVIRTUAL", &["java/io/PrintStream", "println"]);
/// assert_eq!(a, b);
/// assert_ne!(a, instruction_signature(4, "INVOKEVIRTUAL", &["java/io/PrintStream", "println"]));
/// ```
pub fn instruction_signature<T: fmt::Display>(ordinal: usize, opcode: &str, operands: &[T]) -> String {
    let mut sign = format!("{ordinal}:{opcode}");
    for operand in operands {
        sign.push('|');
        sign.push_str(&operand.to_string());
    }
    sign
}
