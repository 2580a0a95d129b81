//! Carry posterior probabilities from the index onto the ML tree.
//!
//! Only `Node::posterior` is written; labels, lengths, BP values and child
//! order of the ML tree are left exactly as parsed.

use tracing::debug;

use crate::error::Result;
use crate::index::SupportIndex;
use crate::split::{Bipartition, SplitTable, TaxonUniverse};
use crate::tree::{NodeId, Support, SupportTree};

/// Outcome of one mapping pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MappingReport {
    /// Non-trivial ML branches looked up in the index.
    pub considered: usize,
    pub matched: usize,
    /// ML branches whose split has no supported counterpart in the Bayesian tree.
    pub unmatched: Vec<(NodeId, Bipartition)>,
}

impl MappingReport {
    pub fn unmatched_count(&self) -> usize {
        self.unmatched.len()
    }
}

/// Attach PP values from `index` to every ML branch whose split it contains.
///
/// Unmatched branches keep `posterior == None`. A bifurcating root is counted
/// like in [`SplitTable::branch_splits`]: the shared split is looked up and
/// reported once, but both root branches show its PP.
///
/// # Errors
/// Propagates [`crate::error::MapperError::UnknownTaxon`] from split extraction.
pub fn map(
    ml_tree: &mut SupportTree,
    index: &SupportIndex,
    universe: &TaxonUniverse,
) -> Result<MappingReport> {
    let table = SplitTable::new(ml_tree, universe)?;
    let mut report = MappingReport::default();
    let root_pair = table.merged_root_pair(ml_tree);

    for (node, split) in table.branch_splits(ml_tree) {
        report.considered += 1;
        match index.lookup(&split) {
            Some(value) => {
                ml_tree.get_mut(node).posterior = Some(Support::new(value));
                report.matched += 1;
                if let Some((kept, folded)) = root_pair {
                    if kept == node && table.split_for(folded).is_some() {
                        ml_tree.get_mut(folded).posterior = Some(Support::new(value));
                    }
                }
            }
            None => {
                debug!(node, split = %split.display(universe), "no Bayesian counterpart");
                report.unmatched.push((node, split));
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Node;

    /// ML tree: ((A,B)95,(C,D)80); with BP on both root children.
    fn ml() -> SupportTree {
        crate::tree::tests::abcd()
    }

    /// Bayesian tree: (C,D,(B,A)0.98); unrooted, different child order.
    fn bayes() -> SupportTree {
        let mut t = SupportTree::new();
        let root = t.add_root(Node::new());
        t.add_child(root, Node::leaf("C"));
        t.add_child(root, Node::leaf("D"));
        let n = t.add_child(root, Node::new().with_support(0.98));
        t.add_child(n, Node::leaf("B"));
        t.add_child(n, Node::leaf("A"));
        t
    }

    #[test]
    fn attaches_pp_next_to_bp() {
        let mut ml = ml();
        let bayes = bayes();
        let u = TaxonUniverse::from_trees(&ml, &bayes).unwrap();
        let index = SupportIndex::build(&bayes, &u).unwrap();
        let report = map(&mut ml, &index, &u).unwrap();

        assert_eq!(report.considered, 1);
        assert_eq!(report.matched, 1);
        assert_eq!(report.unmatched_count(), 0);

        let annotated = ml.get(1);
        assert_eq!(annotated.support.and_then(|s| s.visible()), Some(95.0));
        assert_eq!(annotated.posterior.and_then(|s| s.visible()), Some(0.98));
        // the sibling root branch is the same edge and shows the same PP
        assert_eq!(ml.get(4).posterior.and_then(|s| s.visible()), Some(0.98));
        assert_eq!(ml.get(4).support.map(|s| s.value), Some(80.0));
    }

    #[test]
    fn leaf_sibling_of_root_branch_gets_no_pp() {
        // ((A,B)95,C) style root: the leaf side is a trivial split
        let mut ml = SupportTree::new();
        let root = ml.add_root(Node::new());
        let n = ml.add_child(root, Node::new().with_support(90.0));
        let inner = ml.add_child(n, Node::new().with_support(70.0));
        ml.add_child(inner, Node::leaf("A"));
        ml.add_child(inner, Node::leaf("B"));
        ml.add_child(n, Node::leaf("C"));
        let d = ml.add_child(root, Node::leaf("D"));

        let bayes = bayes();
        let u = TaxonUniverse::from_trees(&ml, &bayes).unwrap();
        let index = SupportIndex::build(&bayes, &u).unwrap();
        let report = map(&mut ml, &index, &u).unwrap();

        assert_eq!(report.considered, 1);
        assert_eq!(report.matched, 1);
        assert_eq!(ml.get(inner).posterior.map(|s| s.value), Some(0.98));
        assert_eq!(ml.get(n).posterior, None);
        assert_eq!(ml.get(d).posterior, None);
    }

    #[test]
    fn topology_is_untouched() {
        let mut ml = ml();
        let before: Vec<_> = ml
            .nodes()
            .map(|n| (n.label.clone(), n.length, n.support, n.children.clone()))
            .collect();
        let bayes = bayes();
        let u = TaxonUniverse::from_trees(&ml, &bayes).unwrap();
        let index = SupportIndex::build(&bayes, &u).unwrap();
        map(&mut ml, &index, &u).unwrap();

        let after: Vec<_> = ml
            .nodes()
            .map(|n| (n.label.clone(), n.length, n.support, n.children.clone()))
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn missing_split_leaves_posterior_unset() {
        // ML: (A,C,(B,D)70) does not share any split with the Bayesian tree
        let mut ml = SupportTree::new();
        let root = ml.add_root(Node::new());
        ml.add_child(root, Node::leaf("A"));
        ml.add_child(root, Node::leaf("C"));
        let n = ml.add_child(root, Node::new().with_support(70.0));
        ml.add_child(n, Node::leaf("B"));
        ml.add_child(n, Node::leaf("D"));

        let bayes = bayes();
        let u = TaxonUniverse::from_trees(&ml, &bayes).unwrap();
        let index = SupportIndex::build(&bayes, &u).unwrap();
        let report = map(&mut ml, &index, &u).unwrap();

        assert_eq!(report.matched, 0);
        assert_eq!(report.unmatched_count(), 1);
        assert_eq!(report.unmatched[0].1.display(&u).to_string(), "A,C|B,D");
        assert_eq!(ml.get(n).posterior, None);
    }
}
