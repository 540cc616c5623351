//! Coverage counters and their derived status.

use std::ops::{Add, AddAssign};

use strum::{Display, EnumIter};

/// Coverage status derived from one or more counters.
///
/// The numeric representation allows combining statuses with a bitwise or: a line with
/// missed instructions ([`NotCovered`](Self::NotCovered)) and covered branches
/// ([`FullyCovered`](Self::FullyCovered)) is [`PartlyCovered`](Self::PartlyCovered).
///
/// # Examples
///
/// ```rust
/// use covscope::coverage::CounterStatus;
///
/// let status = CounterStatus::NotCovered.combine(CounterStatus::FullyCovered);
/// assert_eq!(status, CounterStatus::PartlyCovered);
/// assert_eq!(CounterStatus::Empty.combine(CounterStatus::NotCovered), CounterStatus::NotCovered);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum CounterStatus {
    /// No items at all
    Empty = 0,
    /// All items missed
    NotCovered = 1,
    /// All items covered
    FullyCovered = 2,
    /// Some items missed, some covered
    PartlyCovered = 3,
}

impl CounterStatus {
    const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => Self::Empty,
            1 => Self::NotCovered,
            2 => Self::FullyCovered,
            _ => Self::PartlyCovered,
        }
    }

    /// Combines two statuses, e.g. the instruction and branch status of one line.
    #[must_use]
    pub const fn combine(self, other: Self) -> Self {
        Self::from_bits(self as u8 | other as u8)
    }
}

/// A pair of missed and covered item counts.
///
/// Counters are plain values. All instruction nodes report one of the shared constants
/// [`Counter::ONE_MISSED`] or [`Counter::ONE_COVERED`] for their instruction, and
/// [`Counter::EMPTY`] as branch counter unless they declare at least two branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Counter {
    missed: u32,
    covered: u32,
}

impl Counter {
    /// Counter without any items.
    pub const EMPTY: Counter = Counter::new(0, 0);
    /// Counter with one missed item.
    pub const ONE_MISSED: Counter = Counter::new(1, 0);
    /// Counter with one covered item.
    pub const ONE_COVERED: Counter = Counter::new(0, 1);

    /// Creates a counter from missed and covered counts.
    #[must_use]
    pub const fn new(missed: u32, covered: u32) -> Self {
        Self { missed, covered }
    }

    /// Number of missed items.
    #[must_use]
    pub const fn missed(&self) -> u32 {
        self.missed
    }

    /// Number of covered items.
    #[must_use]
    pub const fn covered(&self) -> u32 {
        self.covered
    }

    /// Total number of items.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.missed + self.covered
    }

    /// Returns a new counter with the given amounts added.
    #[must_use]
    pub const fn increment(self, missed: u32, covered: u32) -> Self {
        Self::new(self.missed + missed, self.covered + covered)
    }

    /// Ratio of covered items, or `None` for an empty counter.
    #[must_use]
    pub fn covered_ratio(&self) -> Option<f64> {
        (self.total() > 0).then(|| f64::from(self.covered) / f64::from(self.total()))
    }

    /// Coverage status of this counter.
    #[must_use]
    pub const fn status(&self) -> CounterStatus {
        let mut bits = 0;
        if self.covered > 0 {
            bits |= CounterStatus::FullyCovered as u8;
        }
        if self.missed > 0 {
            bits |= CounterStatus::NotCovered as u8;
        }
        CounterStatus::from_bits(bits)
    }
}

impl Add for Counter {
    type Output = Counter;

    fn add(self, rhs: Self) -> Self::Output {
        self.increment(rhs.missed, rhs.covered)
    }
}

impl AddAssign for Counter {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl std::fmt::Display for Counter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} of {} missed", self.missed, self.total())
    }
}
