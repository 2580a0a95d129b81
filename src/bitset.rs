//! Compact bitset representation for leaf sets in phylogenetic trees.
//!
//! # Overview
//! Each bit position corresponds to a taxon index in the sorted taxon universe,
//! so a bitset describes one side of a bipartition.
//!
//! # Example
//! For a tree with leaves [A, B, C, D] mapped to indices [0, 1, 2, 3]:
//! - Side {A, C} → bitset `0b0101` (bits 0 and 2 set)
//! - Side {B, C, D} → bitset `0b1110` (bits 1, 2, 3 set)

/// A compact bitset for representing which leaves belong to one side of a split.
///
/// Internally stores bits in `Vec<u64>` words to support arbitrarily large trees.
/// Each u64 word holds 64 leaf indices.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Bitset(pub Vec<u64>);

impl Bitset {
    /// Creates a new bitset with all bits set to 0.
    ///
    /// # Parameters
    /// - `words`: Number of u64 words needed, see [`Bitset::words_for`].
    ///
    /// # Example
    /// ```
    /// # use bayes_mapper::bitset::Bitset;
    /// let bs = Bitset::zeros(Bitset::words_for(100));
    /// assert_eq!(bs.0.len(), 2);
    /// ```
    pub fn zeros(words: usize) -> Self {
        Bitset(vec![0u64; words])
    }

    /// Number of words needed to hold `num_leaves` bits.
    #[inline]
    pub fn words_for(num_leaves: usize) -> usize {
        num_leaves.div_ceil(64)
    }

    /// Sets the bit at the given index to 1.
    ///
    /// # Example
    /// ```
    /// # use bayes_mapper::bitset::Bitset;
    /// let mut bs = Bitset::zeros(1);
    /// bs.set(0);
    /// bs.set(5);
    /// assert_eq!(bs.0[0], 0b00100001);
    /// ```
    #[inline]
    pub fn set(&mut self, idx: usize) {
        let word = idx >> 6; // idx / 64
        let bit = idx & 63; // idx % 64
        self.0[word] |= 1u64 << bit;
    }

    /// Whether leaf `idx` is on this side.
    #[inline]
    pub fn contains(&self, idx: usize) -> bool {
        (self.0[idx >> 6] >> (idx & 63)) & 1 == 1
    }

    /// Bitwise OR with another bitset: `self` becomes `self ∪ other`.
    ///
    /// # Example
    /// ```
    /// # use bayes_mapper::bitset::Bitset;
    /// let mut left = Bitset::zeros(1);
    /// left.set(0);
    /// let mut right = Bitset::zeros(1);
    /// right.set(1);
    /// left.or_assign(&right);
    /// assert_eq!(left.0[0], 0b11);
    /// ```
    #[inline]
    pub fn or_assign(&mut self, other: &Bitset) {
        for (a, b) in self.0.iter_mut().zip(&other.0) {
            *a |= *b;
        }
    }

    /// Counts the number of set bits, i.e. the number of leaves on this side.
    #[inline]
    pub fn count_ones(&self) -> usize {
        self.0.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// The other side of the split: flips the first `num_leaves` bits and
    /// leaves the padding bits of the last word at 0.
    ///
    /// # Example
    /// ```
    /// # use bayes_mapper::bitset::Bitset;
    /// let mut ab = Bitset::zeros(1);
    /// ab.set(0);
    /// ab.set(1);
    /// assert_eq!(ab.complement(4).0[0], 0b1100);
    /// ```
    pub fn complement(&self, num_leaves: usize) -> Bitset {
        let mut out = Bitset(self.0.iter().map(|w| !w).collect());
        let tail = num_leaves & 63;
        if tail != 0 {
            if let Some(last) = out.0.last_mut() {
                *last &= (1u64 << tail) - 1;
            }
        }
        out
    }

    /// Indices of the set bits in ascending order.
    pub fn ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().enumerate().flat_map(|(w, &word)| {
            (0..64)
                .filter(move |bit| (word >> bit) & 1 == 1)
                .map(move |bit| w * 64 + bit)
        })
    }
}
