//! Lookup table from canonical bipartition to support value.
//!
//! Built once from the Bayesian tree and only read afterwards.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use tracing::{debug, warn};

use crate::error::Result;
use crate::split::{Bipartition, SplitTable, TaxonUniverse};
use crate::tree::{NodeId, SupportTree};

/// Two branches of the indexed tree sharing a split but not a support value.
///
/// Only possible with unary nodes or otherwise degenerate input; the value of
/// `kept` is the one stored in the index.
#[derive(Clone, Debug, PartialEq)]
pub struct SplitConflict {
    pub split: Bipartition,
    pub kept: NodeId,
    pub kept_value: f64,
    pub dropped: NodeId,
    pub dropped_value: f64,
}

#[derive(Clone, Debug, Default)]
pub struct SupportIndex {
    entries: HashMap<Bipartition, (NodeId, f64)>,
    conflicts: Vec<SplitConflict>,
}

impl SupportIndex {
    /// Index every supported, non-trivial branch of `tree`.
    ///
    /// Branches without a support value are skipped: there is nothing to carry
    /// over. When a split is seen twice, the first value wins; a differing
    /// second value is recorded as a [`SplitConflict`].
    ///
    /// # Errors
    /// Propagates [`crate::error::MapperError::UnknownTaxon`] from split extraction.
    pub fn build(tree: &SupportTree, universe: &TaxonUniverse) -> Result<Self> {
        let table = SplitTable::new(tree, universe)?;
        let mut index = SupportIndex::default();

        for (node, split) in table.branch_splits(tree) {
            let Some(support) = tree.get(node).support else {
                continue;
            };
            index.insert(split, node, support.value, universe);
        }

        debug!(
            splits = index.len(),
            conflicts = index.conflicts.len(),
            "support index built"
        );
        Ok(index)
    }

    fn insert(&mut self, split: Bipartition, node: NodeId, value: f64, universe: &TaxonUniverse) {
        match self.entries.entry(split) {
            Entry::Vacant(slot) => {
                slot.insert((node, value));
            }
            Entry::Occupied(slot) => {
                let &(kept, kept_value) = slot.get();
                if kept_value == value {
                    return;
                }
                warn!(
                    split = %slot.key().display(universe),
                    kept_node = kept,
                    kept_value,
                    dropped_node = node,
                    dropped_value = value,
                    "ambiguous topology: split appears twice with different support, keeping the first"
                );
                self.conflicts.push(SplitConflict {
                    split: slot.key().clone(),
                    kept,
                    kept_value,
                    dropped: node,
                    dropped_value: value,
                });
            }
        }
    }

    #[inline]
    pub fn lookup(&self, split: &Bipartition) -> Option<f64> {
        self.entries.get(split).map(|&(_, value)| value)
    }

    pub fn contains(&self, split: &Bipartition) -> bool {
        self.entries.contains_key(split)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn conflicts(&self) -> &[SplitConflict] {
        &self.conflicts
    }
}
