//! In-memory tree model carrying both support metrics per branch.
//!
//! # Overview
//! Nodes live in an arena (`Vec<Node>`) and refer to each other by [`NodeId`],
//! the same layout `phylotree` uses. Each node describes the branch leading
//! *to* it: its length, the support value read from the input file (BP for
//! the ML tree, PP for the Bayesian tree) and, once the mapper has run, the
//! posterior probability (PP) carried over from the Bayesian tree.
//!
//! ```text
//!          root
//!         /    \
//!      n1(95)   n2
//!      /  \    /  \
//!     A    B  C    D
//! ```
//! `n1` holds BP=95 for the branch separating {A,B} from {C,D}.
//!
//! Polytomies and unary nodes are legal; only leaf naming is validated.

use std::collections::HashSet;

use crate::error::{MapperError, Result, TreeRole};

pub type NodeId = usize;

/// A support value together with its visibility.
///
/// The filter hides a value instead of dropping it, so "absent" (`None` on the
/// node) and "present but below threshold" (`shown == false`) stay distinct.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Support {
    pub value: f64,
    pub shown: bool,
}

impl Support {
    pub fn new(value: f64) -> Self {
        Support { value, shown: true }
    }

    /// The value if it should be rendered.
    #[inline]
    pub fn visible(&self) -> Option<f64> {
        self.shown.then_some(self.value)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Node {
    pub id: NodeId,
    /// Taxon name for leaves; free-form (non-numeric) label for internal nodes.
    pub label: Option<String>,
    /// Length of the branch leading to this node.
    pub length: Option<f64>,
    /// Support read from the input tree: BP on the ML tree, PP on the Bayesian one.
    pub support: Option<Support>,
    /// Posterior probability attached by the mapper.
    pub posterior: Option<Support>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl Node {
    pub fn new() -> Self {
        Node::default()
    }

    pub fn leaf(name: impl Into<String>) -> Self {
        Node {
            label: Some(name.into()),
            ..Node::default()
        }
    }

    pub fn with_length(mut self, length: f64) -> Self {
        self.length = Some(length);
        self
    }

    pub fn with_support(mut self, value: f64) -> Self {
        self.support = Some(Support::new(value));
        self
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Arena-backed rooted tree. An unrooted tree is represented with an
/// arbitrary root of degree three or more.
#[derive(Clone, Debug, Default)]
pub struct SupportTree {
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl SupportTree {
    pub fn new() -> Self {
        SupportTree::default()
    }

    /// Insert the root node. Any previous root stays in the arena unreachable,
    /// so this should be the first insertion.
    pub fn add_root(&mut self, node: Node) -> NodeId {
        let id = self.push(node, None);
        self.root = Some(id);
        id
    }

    /// Append `node` as the last child of `parent`.
    pub fn add_child(&mut self, parent: NodeId, node: Node) -> NodeId {
        let id = self.push(node, Some(parent));
        self.nodes[parent].children.push(id);
        id
    }

    fn push(&mut self, mut node: Node, parent: Option<NodeId>) -> NodeId {
        let id = self.nodes.len();
        node.id = id;
        node.parent = parent;
        node.children.clear();
        self.nodes.push(node);
        id
    }

    #[inline]
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Panics on an id that was not produced by this tree.
    #[inline]
    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }

    #[inline]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].children
    }

    #[inline]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    #[inline]
    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.nodes[id].is_leaf()
    }

    /// Number of nodes reachable or not; the arena never shrinks.
    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.iter_mut()
    }

    /// A bifurcating root, i.e. one whose two branches form a single edge of
    /// the unrooted topology.
    pub fn is_rooted(&self) -> bool {
        self.root.is_some_and(|r| self.children(r).len() == 2)
    }

    /// Parents before children, children in their stored order.
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.root.into_iter().collect();
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.children(id).iter().rev());
        }
        order
    }

    /// Children before parents.
    pub fn postorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<(NodeId, bool)> = self.root.map(|r| (r, false)).into_iter().collect();
        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                order.push(id);
            } else {
                stack.push((id, true));
                stack.extend(self.children(id).iter().rev().map(|&c| (c, false)));
            }
        }
        order
    }

    /// Labels of the leaves below `id`, left to right. Unnamed leaves are skipped.
    pub fn leaf_labels_under(&self, id: NodeId) -> Vec<&str> {
        let mut labels = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let node = &self.nodes[current];
            if node.is_leaf() {
                if let Some(label) = node.label.as_deref() {
                    labels.push(label);
                }
            } else {
                stack.extend(node.children.iter().rev());
            }
        }
        labels
    }

    pub fn leaf_labels(&self) -> Vec<&str> {
        self.root.map(|r| self.leaf_labels_under(r)).unwrap_or_default()
    }

    /// Structural checks required before splits can be computed: the tree is
    /// non-empty, every leaf is named and no leaf name repeats.
    pub fn validate(&self, role: TreeRole) -> Result<()> {
        let root = self
            .root
            .ok_or_else(|| MapperError::malformed(role, "tree is empty"))?;

        let mut seen = HashSet::new();
        for id in self.preorder() {
            let node = &self.nodes[id];
            if !node.is_leaf() {
                continue;
            }
            match node.label.as_deref() {
                None | Some("") => {
                    return Err(MapperError::malformed(role, format!("leaf node {id} has no name")));
                }
                Some(label) if !seen.insert(label) => {
                    return Err(MapperError::malformed(
                        role,
                        format!("duplicate leaf label '{label}'"),
                    ));
                }
                Some(_) => {}
            }
        }

        if self.is_leaf(root) {
            return Err(MapperError::malformed(role, "tree consists of a single leaf"));
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// ```text
    ///          root
    ///         /    \
    ///      n1(95)   n2(80)
    ///      /  \    /  \
    ///     A    B  C    D
    /// ```
    pub(crate) fn abcd() -> SupportTree {
        let mut t = SupportTree::new();
        let root = t.add_root(Node::new());
        let n1 = t.add_child(root, Node::new().with_support(95.0).with_length(0.2));
        t.add_child(n1, Node::leaf("A").with_length(0.1));
        t.add_child(n1, Node::leaf("B").with_length(0.1));
        let n2 = t.add_child(root, Node::new().with_support(80.0).with_length(0.3));
        t.add_child(n2, Node::leaf("C").with_length(0.1));
        t.add_child(n2, Node::leaf("D").with_length(0.1));
        t
    }

    #[test]
    fn traversals_visit_every_node_once() {
        let t = abcd();
        assert_eq!(t.preorder(), vec![0, 1, 2, 3, 4, 5, 6]);
        assert_eq!(t.postorder(), vec![2, 3, 1, 5, 6, 4, 0]);
    }

    #[test]
    fn navigation() {
        let t = abcd();
        assert_eq!(t.root(), Some(0));
        assert_eq!(t.children(0), &[1, 4]);
        assert_eq!(t.parent(2), Some(1));
        assert_eq!(t.parent(0), None);
        assert!(t.is_leaf(5));
        assert!(t.is_rooted());
    }

    #[test]
    fn leaf_labels_follow_child_order() {
        let t = abcd();
        assert_eq!(t.leaf_labels(), vec!["A", "B", "C", "D"]);
        assert_eq!(t.leaf_labels_under(4), vec!["C", "D"]);
        assert_eq!(t.leaf_labels_under(3), vec!["B"]);
    }

    #[test]
    fn polytomies_are_valid() {
        let mut t = SupportTree::new();
        let root = t.add_root(Node::new());
        for name in ["A", "B", "C", "D"] {
            t.add_child(root, Node::leaf(name));
        }
        assert!(t.validate(TreeRole::Ml).is_ok());
        assert!(!t.is_rooted());
    }

    #[test]
    fn duplicate_leaf_is_rejected() {
        let mut t = abcd();
        t.get_mut(6).label = Some("A".into());
        let err = t.validate(TreeRole::Bayes).unwrap_err();
        assert!(matches!(err, MapperError::MalformedTree { tree: TreeRole::Bayes, .. }));
        assert!(err.to_string().contains("duplicate leaf label 'A'"));
    }

    #[test]
    fn unnamed_leaf_is_rejected() {
        let mut t = abcd();
        t.get_mut(2).label = None;
        assert!(t.validate(TreeRole::Ml).is_err());
    }

    #[test]
    fn empty_tree_is_rejected() {
        assert!(SupportTree::new().validate(TreeRole::Ml).is_err());
    }

    #[test]
    fn hidden_support_is_not_visible() {
        let mut s = Support::new(0.5);
        assert_eq!(s.visible(), Some(0.5));
        s.shown = false;
        assert_eq!(s.visible(), None);
        assert_eq!(s.value, 0.5);
    }
}
