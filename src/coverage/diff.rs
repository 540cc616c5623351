//! Change-range metadata attached to source lines.
//!
//! Change ranges are produced outside of this crate, typically from a diff between two
//! revisions of a source file. They only annotate coverage data, they never influence how
//! coverage is computed.

use strum::{Display, EnumIter, EnumString};

/// Kind of a source change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString)]
#[strum(serialize_all = "UPPERCASE")]
pub enum ChangeKind {
    /// Lines were added
    Insert,
    /// Lines were removed right after this range
    Delete,
    /// Lines were modified
    Replace,
    /// No change
    Empty,
}

/// An inclusive range of source lines affected by one change.
///
/// # Examples
///
/// ```rust
/// use covscope::coverage::{ChangeKind, ChangeRange};
///
/// let range = ChangeRange::new(ChangeKind::Replace, 10, 12);
/// assert!(range.contains(10));
/// assert!(range.contains(12));
/// assert!(!range.contains(13));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChangeRange {
    kind: ChangeKind,
    start: u32,
    end: u32,
}

impl ChangeRange {
    /// Creates a new change range covering `start..=end`.
    #[must_use]
    pub const fn new(kind: ChangeKind, start: u32, end: u32) -> Self {
        Self { kind, start, end }
    }

    /// Kind of the change.
    #[must_use]
    pub const fn kind(&self) -> ChangeKind {
        self.kind
    }

    /// First affected line.
    #[must_use]
    pub const fn start(&self) -> u32 {
        self.start
    }

    /// Last affected line.
    #[must_use]
    pub const fn end(&self) -> u32 {
        self.end
    }

    /// Returns `true` if the line lies within this range.
    #[must_use]
    pub const fn contains(&self, line: u32) -> bool {
        self.start <= line && line <= self.end
    }
}

/// Returns the kind of the first range containing `line`.
pub fn change_at(ranges: &[ChangeRange], line: u32) -> Option<ChangeKind> {
    ranges
        .iter()
        .find(|range| range.contains(line))
        .map(ChangeRange::kind)
}
