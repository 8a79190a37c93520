//! Compact sets of variable ids.
//!
//! Rows of the adjacency matrix, clique members, separators and the running
//! union used by the clique-tree builder are all sets of small integers, so
//! they share one bit set backed by `u64` words.

use std::fmt;

/// A set of variable ids backed by a vector of u64 words.
///
/// The set grows as needed when inserting ids beyond the current capacity.
/// Iteration always yields ids in ascending order.
#[derive(Clone, Default)]
pub struct VarSet {
    /// Storage: each u64 holds 64 bits
    words: Vec<u64>,
    /// Number of set bits (cached for O(1) len())
    count: usize,
}

impl VarSet {
    /// Number of bits per word.
    const BITS_PER_WORD: usize = 64;

    /// Creates a new empty set able to hold ids below `capacity` without growing.
    pub fn new(capacity: usize) -> Self {
        let num_words = (capacity + Self::BITS_PER_WORD - 1) / Self::BITS_PER_WORD;
        Self {
            words: vec![0; num_words],
            count: 0,
        }
    }

    /// Creates an empty set with no pre-allocated capacity.
    pub fn empty() -> Self {
        Self {
            words: Vec::new(),
            count: 0,
        }
    }

    /// Returns the number of variables in the set.
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    /// Returns true if the set has no members.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[inline]
    fn word_and_bit(index: usize) -> (usize, usize) {
        (index / Self::BITS_PER_WORD, index % Self::BITS_PER_WORD)
    }

    /// Returns true if `var` is a member.
    #[inline]
    pub fn contains(&self, var: usize) -> bool {
        let (word_idx, bit_idx) = Self::word_and_bit(var);
        match self.words.get(word_idx) {
            Some(word) => (word >> bit_idx) & 1 == 1,
            None => false,
        }
    }

    /// Adds `var`. Returns true if it was not previously a member.
    #[inline]
    pub fn insert(&mut self, var: usize) -> bool {
        let (word_idx, bit_idx) = Self::word_and_bit(var);

        if word_idx >= self.words.len() {
            self.words.resize(word_idx + 1, 0);
        }

        let mask = 1u64 << bit_idx;
        let was_clear = (self.words[word_idx] & mask) == 0;
        if was_clear {
            self.words[word_idx] |= mask;
            self.count += 1;
        }
        was_clear
    }

    /// Removes `var`. Returns true if it was a member.
    #[inline]
    pub fn remove(&mut self, var: usize) -> bool {
        let (word_idx, bit_idx) = Self::word_and_bit(var);
        if word_idx >= self.words.len() {
            return false;
        }

        let mask = 1u64 << bit_idx;
        let was_set = (self.words[word_idx] & mask) != 0;
        if was_set {
            self.words[word_idx] &= !mask;
            self.count -= 1;
        }
        was_set
    }

    /// Returns true if every member of `self` is also in `other`.
    pub fn is_subset(&self, other: &VarSet) -> bool {
        if self.count > other.count {
            return false;
        }
        self.words.iter().enumerate().all(|(i, &word)| {
            let theirs = other.words.get(i).copied().unwrap_or(0);
            word & !theirs == 0
        })
    }

    /// Returns true if every member of `other` is also in `self`.
    pub fn is_superset(&self, other: &VarSet) -> bool {
        other.is_subset(self)
    }

    /// Returns the members present in both sets.
    pub fn intersection(&self, other: &VarSet) -> VarSet {
        let words: Vec<u64> = self
            .words
            .iter()
            .zip(other.words.iter())
            .map(|(a, b)| a & b)
            .collect();
        let count = words.iter().map(|w| w.count_ones() as usize).sum();
        VarSet { words, count }
    }

    /// Adds every member of `other` to `self`.
    pub fn union_with(&mut self, other: &VarSet) {
        if other.words.len() > self.words.len() {
            self.words.resize(other.words.len(), 0);
        }
        for (mine, theirs) in self.words.iter_mut().zip(other.words.iter()) {
            *mine |= theirs;
        }
        self.count = self.words.iter().map(|w| w.count_ones() as usize).sum();
    }

    /// Returns an iterator over the members in ascending order.
    pub fn iter(&self) -> VarSetIter<'_> {
        VarSetIter {
            set: self,
            word_idx: 0,
            current_word: self.words.first().copied().unwrap_or(0),
        }
    }

    /// Collects the members into a sorted vector.
    pub fn to_vec(&self) -> Vec<usize> {
        self.iter().collect()
    }
}

impl PartialEq for VarSet {
    fn eq(&self, other: &Self) -> bool {
        self.count == other.count && self.is_subset(other)
    }
}

impl Eq for VarSet {}

impl FromIterator<usize> for VarSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut set = VarSet::empty();
        set.extend(iter);
        set
    }
}

impl Extend<usize> for VarSet {
    fn extend<I: IntoIterator<Item = usize>>(&mut self, iter: I) {
        for var in iter {
            self.insert(var);
        }
    }
}

impl<'a> IntoIterator for &'a VarSet {
    type Item = usize;
    type IntoIter = VarSetIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Debug for VarSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl fmt::Display for VarSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, var) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", var)?;
        }
        write!(f, "}}")
    }
}

/// Iterator over the members of a [`VarSet`].
pub struct VarSetIter<'a> {
    set: &'a VarSet,
    word_idx: usize,
    current_word: u64,
}

impl Iterator for VarSetIter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.current_word != 0 {
                let bit_idx = self.current_word.trailing_zeros() as usize;
                self.current_word &= self.current_word - 1; // Clear lowest set bit
                return Some(self.word_idx * VarSet::BITS_PER_WORD + bit_idx);
            }

            self.word_idx += 1;
            if self.word_idx >= self.set.words.len() {
                return None;
            }
            self.current_word = self.set.words[self.word_idx];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        let s = VarSet::empty();
        assert!(s.is_empty());
        assert_eq!(s.len(), 0);
        assert!(!s.contains(0));
        assert!(!s.contains(100));
    }

    #[test]
    fn test_insert_remove() {
        let mut s = VarSet::new(10);
        assert!(s.insert(3));
        assert!(!s.insert(3));
        assert!(s.insert(70)); // grows past the initial word
        assert_eq!(s.len(), 2);
        assert!(s.remove(3));
        assert!(!s.remove(3));
        assert_eq!(s.to_vec(), vec![70]);
    }

    #[test]
    fn test_subset() {
        let a: VarSet = [1, 2].into_iter().collect();
        let b: VarSet = [1, 2, 65].into_iter().collect();
        assert!(a.is_subset(&b));
        assert!(b.is_superset(&a));
        assert!(!b.is_subset(&a));
        assert!(VarSet::empty().is_subset(&a));
    }

    #[test]
    fn test_intersection_and_union() {
        let a: VarSet = [0, 2, 4, 64].into_iter().collect();
        let b: VarSet = [2, 3, 64].into_iter().collect();
        assert_eq!(a.intersection(&b).to_vec(), vec![2, 64]);

        let mut u = a.clone();
        u.union_with(&b);
        assert_eq!(u.to_vec(), vec![0, 2, 3, 4, 64]);
        assert_eq!(u.len(), 5);
    }

    #[test]
    fn test_equality_ignores_capacity() {
        let mut a = VarSet::new(256);
        a.insert(5);
        let b: VarSet = [5].into_iter().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_display() {
        let s: VarSet = [3, 1, 2].into_iter().collect();
        assert_eq!(s.to_string(), "{1,2,3}");
    }
}
