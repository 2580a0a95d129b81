//! Canonical bipartitions of the taxon universe.
//!
//! # Overview
//! Removing an internal branch splits the leaves into two sides. The same
//! split read from two different files (different child order, different
//! rooting) must produce the same key, so a [`Bipartition`] is stored as the
//! bitset of the side containing taxon 0 (the alphabetically first taxon),
//! which is also the lexicographically smaller of the two sorted sides.
//!
//! ```text
//!        root                      root
//!       /    \                   /  |   \
//!     n1      n2               C    D    n1
//!    /  \    /  \                        /  \
//!   A    B  C    D                      B    A
//! ```
//! Both trees contain `A,B|C,D`; in both, the canonical side is {A,B} = `0b0011`.
//!
//! # CRITICAL: Why we use taxon NAMES not node IDs
//! Node IDs are assigned during parsing and differ across files. Taxon names
//! are consistent, so leaves are sorted by name and bit positions follow that
//! order.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use itertools::Itertools;

use crate::bitset::Bitset;
use crate::error::{MapperError, Result};
use crate::tree::{NodeId, SupportTree};

/// The sorted set of leaf labels shared by both trees.
#[derive(Clone, Debug, PartialEq)]
pub struct TaxonUniverse {
    taxa: Vec<String>,
    index: HashMap<String, usize>,
}

impl TaxonUniverse {
    /// Build a universe from any collection of taxon names. Duplicates collapse.
    pub fn new<I, S>(taxa: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let taxa: Vec<String> = taxa
            .into_iter()
            .map(Into::into)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let index = taxa
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), idx))
            .collect();
        TaxonUniverse { taxa, index }
    }

    /// Universe shared by the ML and the Bayesian tree.
    ///
    /// # Errors
    /// [`MapperError::TaxonMismatch`] with the symmetric difference when the
    /// leaf label sets differ.
    pub fn from_trees(ml: &SupportTree, bayes: &SupportTree) -> Result<Self> {
        let ml_taxa: BTreeSet<&str> = ml.leaf_labels().into_iter().collect();
        let bayes_taxa: BTreeSet<&str> = bayes.leaf_labels().into_iter().collect();

        if ml_taxa != bayes_taxa {
            return Err(MapperError::TaxonMismatch {
                ml_only: ml_taxa.difference(&bayes_taxa).map(|t| t.to_string()).collect(),
                bayes_only: bayes_taxa.difference(&ml_taxa).map(|t| t.to_string()).collect(),
            });
        }

        Ok(TaxonUniverse::new(ml_taxa))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.taxa.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.taxa.is_empty()
    }

    #[inline]
    pub fn index_of(&self, taxon: &str) -> Option<usize> {
        self.index.get(taxon).copied()
    }

    #[inline]
    pub fn name(&self, idx: usize) -> &str {
        &self.taxa[idx]
    }

    pub fn taxa(&self) -> &[String] {
        &self.taxa
    }

    fn words(&self) -> usize {
        Bitset::words_for(self.taxa.len())
    }
}

/// An unordered, unrooted, non-trivial split of the taxon universe.
///
/// Equality is equality of the pair of sides: `{A,B}|{C,D}` and `{C,D}|{A,B}`
/// are the same value.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Bipartition(Bitset);

impl Bipartition {
    /// Canonicalize one side of a split.
    ///
    /// Returns `None` for trivial splits: a side with 0 or 1 taxa, or with all
    /// taxa but at most one.
    pub fn from_side(side: Bitset, num_leaves: usize) -> Option<Self> {
        let size = side.count_ones();
        if size <= 1 || size + 1 >= num_leaves {
            return None;
        }
        if side.contains(0) {
            Some(Bipartition(side))
        } else {
            Some(Bipartition(side.complement(num_leaves)))
        }
    }

    /// Bitset of the side holding taxon 0.
    pub fn first_side(&self) -> &Bitset {
        &self.0
    }

    /// Both sides as sorted taxon names, the side holding the first taxon first.
    pub fn sides<'u>(&self, universe: &'u TaxonUniverse) -> (Vec<&'u str>, Vec<&'u str>) {
        (0..universe.len())
            .map(|idx| (idx, universe.name(idx)))
            .partition_map(|(idx, name)| {
                if self.0.contains(idx) {
                    itertools::Either::Left(name)
                } else {
                    itertools::Either::Right(name)
                }
            })
    }

    /// Deterministic text form, e.g. `A,B|C,D`.
    pub fn display<'a>(&'a self, universe: &'a TaxonUniverse) -> SplitDisplay<'a> {
        SplitDisplay {
            split: self,
            universe,
        }
    }
}

pub struct SplitDisplay<'a> {
    split: &'a Bipartition,
    universe: &'a TaxonUniverse,
}

impl fmt::Display for SplitDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (first, second) = self.split.sides(self.universe);
        write!(f, "{}|{}", first.iter().join(","), second.iter().join(","))
    }
}

/// Split of the branch above `node`, computed straight from the leaf labels
/// below it.
///
/// For many queries on the same tree, build a [`SplitTable`] once instead.
///
/// # Errors
/// [`MapperError::UnknownTaxon`] if a leaf below `node` is not in `universe`.
pub fn split_for(
    tree: &SupportTree,
    node: NodeId,
    universe: &TaxonUniverse,
) -> Result<Option<Bipartition>> {
    if tree.root() == Some(node) {
        return Ok(None);
    }
    let mut side = Bitset::zeros(universe.words());
    for label in tree.leaf_labels_under(node) {
        let idx = universe
            .index_of(label)
            .ok_or_else(|| MapperError::UnknownTaxon { taxon: label.to_string() })?;
        side.set(idx);
    }
    Ok(Bipartition::from_side(side, universe.len()))
}

/// Leaf bitsets for every node of one tree, filled in a single post-order pass.
#[derive(Debug, Clone)]
pub struct SplitTable {
    /// Indexed by `NodeId`; `None` for arena slots not reachable from the root.
    leaf_sets: Vec<Option<Bitset>>,
    num_leaves: usize,
    root: Option<NodeId>,
}

impl SplitTable {
    /// # Algorithm
    /// - **Leaf node**: bitset with the taxon's bit set
    /// - **Internal node**: OR of the child bitsets
    ///
    /// # Errors
    /// [`MapperError::UnknownTaxon`] when a leaf label is missing from `universe`.
    pub fn new(tree: &SupportTree, universe: &TaxonUniverse) -> Result<Self> {
        let words = universe.words();
        let mut leaf_sets: Vec<Option<Bitset>> = vec![None; tree.size()];

        for id in tree.postorder() {
            let node = tree.get(id);
            let mut bitset = Bitset::zeros(words);
            if node.is_leaf() {
                let label = node.label.as_deref().unwrap_or_default();
                let idx = universe
                    .index_of(label)
                    .ok_or_else(|| MapperError::UnknownTaxon { taxon: label.to_string() })?;
                bitset.set(idx);
            } else {
                for &child in &node.children {
                    if let Some(child_set) = &leaf_sets[child] {
                        bitset.or_assign(child_set);
                    }
                }
            }
            leaf_sets[id] = Some(bitset);
        }

        Ok(SplitTable {
            leaf_sets,
            num_leaves: universe.len(),
            root: tree.root(),
        })
    }

    /// Leaves below `node`.
    pub fn leaf_set(&self, node: NodeId) -> Option<&Bitset> {
        self.leaf_sets.get(node)?.as_ref()
    }

    /// Split of the branch above `node`; `None` for the root and for trivial splits.
    pub fn split_for(&self, node: NodeId) -> Option<Bipartition> {
        if self.root == Some(node) {
            return None;
        }
        Bipartition::from_side(self.leaf_set(node)?.clone(), self.num_leaves)
    }

    /// Every non-trivial split of `tree`, in pre-order.
    ///
    /// # Bifurcating root
    /// ```text
    ///        root
    ///       /    \
    ///     n1      n2        n1 and n2 both induce A,B|C,D
    ///    /  \    /  \
    ///   A    B  C    D
    /// ```
    /// The two root branches are one edge of the unrooted tree, so only one of
    /// them is reported: the first child carrying a support value, or the first
    /// child when neither (or both) do. See [`SplitTable::merged_root_pair`].
    pub fn branch_splits(&self, tree: &SupportTree) -> Vec<(NodeId, Bipartition)> {
        let skipped = self.merged_root_pair(tree).map(|(_, folded)| folded);
        tree.preorder()
            .into_iter()
            .filter(|&id| Some(id) != skipped)
            .filter_map(|id| self.split_for(id).map(|split| (id, split)))
            .collect()
    }

    /// `(kept, folded)` children of a bifurcating root: `kept` stands for the
    /// shared edge in [`SplitTable::branch_splits`], `folded` is left out.
    pub fn merged_root_pair(&self, tree: &SupportTree) -> Option<(NodeId, NodeId)> {
        let root = tree.root()?;
        let &[first, second] = tree.children(root) else {
            return None;
        };
        let first_has_support = tree.get(first).support.is_some();
        let second_has_support = tree.get(second).support.is_some();
        if second_has_support && !first_has_support {
            Some((second, first))
        } else {
            Some((first, second))
        }
    }
}
