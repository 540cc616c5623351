use thiserror::Error;

use crate::analysis::{InsnHandle, InsnId, Label};

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Most variants describe malformed input handed over by the bytecode reader, e.g. a jump to a
/// label that never got bound to an instruction. One variant is special:
/// [`Error::ProbeSpanMismatch`] is never caused by input data. It is raised when two method
/// graphs have been declared structurally identical but cover probe ranges of different length,
/// which can only happen if the instruction signature scheme itself is broken.
///
/// # Error Categories
///
/// ## Event Stream Errors
/// - [`Error::Malformed`] - Event stream violates the method framing (e.g. events after the end)
/// - [`Error::NoCurrentInstruction`] - Jump or probe without a preceding instruction
/// - [`Error::DuplicateInstruction`] - The same instruction handle was added twice
/// - [`Error::UnresolvedLabel`] - A jump targets a label which never marked an instruction
/// - [`Error::ProbeOutOfBounds`] - A probe id is outside of the supplied probe array
/// - [`Error::BranchOutOfRange`] - A jump or probe uses an implausibly large branch index
///
/// ## Graph Errors
/// - [`Error::UnknownInstruction`] - An arena index does not belong to the graph
///
/// ## Merge Errors
/// - [`Error::ProbeSpanMismatch`] - Internal consistency failure while merging two runs
///
/// # Examples
///
/// ```rust
/// use covscope::Error;
///
/// fn describe(err: &Error) -> &'static str {
///     match err {
///         Error::ProbeSpanMismatch { .. } => "signature scheme is inconsistent",
///         Error::Malformed { .. } => "bytecode reader produced a malformed stream",
///         _ => "invalid input",
///     }
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The event stream of a method is damaged and could not be processed.
    ///
    /// The error includes the source location where the malformation was detected for
    /// debugging purposes.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// A jump or probe was declared while no instruction was current.
    ///
    /// Jumps and probes always belong to the most recently added instruction. This error
    /// occurs if they appear before the first instruction of a method, or directly after the
    /// flow has been broken with a no-successor marker.
    #[error("Jump or probe declared without a current instruction")]
    NoCurrentInstruction,

    /// The same instruction handle has been added twice to one method.
    #[error("Instruction {0} has already been added")]
    DuplicateInstruction(InsnHandle),

    /// A jump targets a label that was never bound to an instruction.
    ///
    /// Labels are resolved after the complete instruction stream of a method has been
    /// consumed, so this can only be detected when the jumps get wired.
    #[error("Jump target {0} does not mark any instruction")]
    UnresolvedLabel(Label),

    /// A probe id does not fit into the probe array of the class.
    #[error("Probe {probe} is out of bounds for a probe array of length {len}")]
    ProbeOutOfBounds {
        /// The offending probe id
        probe: usize,
        /// Length of the probe array
        len: usize,
    },

    /// A jump or probe declares a branch index beyond [`MAX_BRANCH`](crate::analysis::MAX_BRANCH).
    ///
    /// Branch indices are dense per instruction, a larger index can only come from a damaged
    /// event stream.
    #[error("Branch {branch} of {handle} exceeds the maximum branch index")]
    BranchOutOfRange {
        /// Instruction declaring the branch
        handle: InsnHandle,
        /// The offending branch index
        branch: u32,
    },

    /// An arena index was used with a graph it does not belong to.
    #[error("Instruction {0} is not part of this graph")]
    UnknownInstruction(InsnId),

    /// Two structurally identical methods use probe ranges of different length.
    ///
    /// Probes are assigned contiguously per method, so two methods whose instruction
    /// signatures all match must span the same number of probes. Hitting this error means the
    /// signature matching declared two different methods equal.
    #[error(
        "Probe span mismatch in {class}.{method}: current run spans {current} probes, previous run spans {previous}"
    )]
    ProbeSpanMismatch {
        /// Name of the class containing the method
        class: String,
        /// Merge key of the method
        method: String,
        /// Number of probes spanned by the current run
        current: usize,
        /// Number of probes spanned by the previous run
        previous: usize,
    },

    /// Generic error for miscellaneous failures.
    ///
    /// Used for errors that don't fit into other categories or for
    /// wrapping external library errors with additional context.
    #[error("{0}")]
    Error(String),
}
