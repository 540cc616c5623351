//! A growable bit vector for small sets of branch indices.
//!
//! Instructions record which of their outgoing branches have been executed. Branch indices are
//! small and dense (usually 0 and 1, a few dozen for table switches) but the number of branches
//! is not known when the first one is marked as covered, so unlike a fixed-capacity bit vector
//! this set grows on insertion.
//!
//! # Example
//!
//! ```rust
//! use covscope::utils::BitSet;
//!
//! let mut set = BitSet::new();
//! set.insert(0);
//! set.insert(70);
//!
//! assert!(set.contains(70));
//! assert!(!set.contains(1000));
//! assert_eq!(set.count(), 2);
//! assert_eq!(set.iter().collect::<Vec<_>>(), vec![0, 70]);
//! ```

/// A growable bit vector.
///
/// Trailing zero words do not take part in comparisons, so two sets containing the same
/// indices are equal no matter how far either of them has grown.
#[derive(Clone, Default)]
pub struct BitSet {
    /// The bits, stored as a vector of words.
    words: Vec<u64>,
}

impl BitSet {
    /// Creates a new empty bit set.
    #[must_use]
    pub const fn new() -> Self {
        Self { words: Vec::new() }
    }

    /// Returns `true` if the bit set has no bits set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Sets the bit at the given index, growing the set if required.
    ///
    /// Returns `true` if the bit was not set before.
    pub fn insert(&mut self, index: usize) -> bool {
        let word = index / 64;
        let bit = index % 64;
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        let old = self.words[word];
        self.words[word] |= 1u64 << bit;
        old != self.words[word]
    }

    /// Returns `true` if the bit at the given index is set.
    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        self.words
            .get(index / 64)
            .is_some_and(|word| word & (1u64 << (index % 64)) != 0)
    }

    /// Returns the number of bits set.
    #[must_use]
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Clears all bits.
    pub fn clear(&mut self) {
        self.words.clear();
    }

    /// Computes the union with another bit set (in place).
    ///
    /// Returns `true` if `self` changed.
    pub fn union_with(&mut self, other: &Self) -> bool {
        if other.words.len() > self.words.len() {
            self.words.resize(other.words.len(), 0);
        }
        let mut changed = false;
        for (a, b) in self.words.iter_mut().zip(other.words.iter()) {
            let old = *a;
            *a |= *b;
            changed |= old != *a;
        }
        changed
    }

    /// Returns an iterator over the indices of set bits in ascending order.
    pub fn iter(&self) -> BitSetIter<'_> {
        BitSetIter {
            set: self,
            word_idx: 0,
            bit_idx: 0,
        }
    }

    fn significant_words(&self) -> &[u64] {
        let len = self
            .words
            .iter()
            .rposition(|&w| w != 0)
            .map_or(0, |last| last + 1);
        &self.words[..len]
    }
}

impl PartialEq for BitSet {
    fn eq(&self, other: &Self) -> bool {
        self.significant_words() == other.significant_words()
    }
}

impl Eq for BitSet {}

impl std::fmt::Debug for BitSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<usize> for BitSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut set = Self::new();
        for index in iter {
            set.insert(index);
        }
        set
    }
}

/// Iterator over the set bits in a `BitSet`.
pub struct BitSetIter<'a> {
    set: &'a BitSet,
    word_idx: usize,
    bit_idx: usize,
}

impl Iterator for BitSetIter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(&word) = self.set.words.get(self.word_idx) {
            // Skip the rest of the word once no higher bits are left
            if self.bit_idx >= 64 || word >> self.bit_idx == 0 {
                self.word_idx += 1;
                self.bit_idx = 0;
                continue;
            }
            let bit = self.bit_idx;
            self.bit_idx += 1;
            if word & (1u64 << bit) != 0 {
                return Some(self.word_idx * 64 + bit);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitset_basic() {
        let mut bs = BitSet::new();
        assert!(bs.is_empty());
        assert_eq!(bs.count(), 0);

        assert!(bs.insert(0));
        assert!(bs.insert(50));
        assert!(bs.insert(99));
        assert!(!bs.insert(50));

        assert!(!bs.is_empty());
        assert_eq!(bs.count(), 3);
        assert!(bs.contains(0));
        assert!(bs.contains(50));
        assert!(bs.contains(99));
        assert!(!bs.contains(1));
        assert!(!bs.contains(10_000));
    }

    #[test]
    fn test_bitset_union_grows() {
        let mut a = BitSet::new();
        let mut b = BitSet::new();

        a.insert(0);
        a.insert(1);
        b.insert(1);
        b.insert(130);

        assert!(a.union_with(&b));
        assert!(a.contains(0));
        assert!(a.contains(1));
        assert!(a.contains(130));
        assert_eq!(a.count(), 3);

        assert!(!a.union_with(&b), "second union must not change anything");
    }

    #[test]
    fn test_bitset_iter() {
        let bs: BitSet = [5, 42, 63, 64, 99].into_iter().collect();
        let bits: Vec<_> = bs.iter().collect();
        assert_eq!(bits, vec![5, 42, 63, 64, 99]);
    }

    #[test]
    fn test_bitset_eq_ignores_capacity() {
        let mut a = BitSet::new();
        a.insert(3);
        let mut b = BitSet::new();
        b.insert(3);
        b.insert(500);
        assert_ne!(a, b);

        let c: BitSet = [3].into_iter().collect();
        let d = BitSet {
            words: vec![1 << 3, 0, 0, 0],
        };
        assert_eq!(a, c);
        assert_eq!(a, d);
    }

    #[test]
    fn test_bitset_clear() {
        let mut bs = BitSet::new();
        bs.insert(50);
        bs.clear();
        assert!(bs.is_empty());
        assert_eq!(format!("{bs:?}"), "{}");
    }
}
