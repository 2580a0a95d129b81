//! Random unrooted topologies and ways to root them.
#![allow(dead_code)]

use bayes_mapper::tree::{Node, NodeId, SupportTree};

/// An unrooted binary tree as an edge list. Nodes `0..n` are leaves.
#[derive(Debug, Clone)]
pub struct Unrooted {
    pub num_leaves: usize,
    pub num_nodes: usize,
    pub edges: Vec<(usize, usize)>,
}

impl Unrooted {
    /// Stepwise addition: start from a 3-leaf star and attach leaf `k` to the
    /// edge chosen by `picks[k - 3]`.
    pub fn build(num_leaves: usize, picks: &[usize]) -> Self {
        assert!(num_leaves >= 3);
        let mut num_nodes = num_leaves;
        let center = num_nodes;
        num_nodes += 1;
        let mut edges = vec![(0, center), (1, center), (2, center)];

        for leaf in 3..num_leaves {
            let pick = picks.get(leaf - 3).copied().unwrap_or(leaf);
            let e = pick % edges.len();
            let (a, b) = edges[e];
            let mid = num_nodes;
            num_nodes += 1;
            edges[e] = (a, mid);
            edges.push((mid, b));
            edges.push((mid, leaf));
        }

        Unrooted {
            num_leaves,
            num_nodes,
            edges,
        }
    }

    fn adjacency(&self, rotation: usize) -> Vec<Vec<usize>> {
        let mut adj = vec![Vec::new(); self.num_nodes];
        for &(a, b) in &self.edges {
            adj[a].push(b);
            adj[b].push(a);
        }
        for (node, neighbours) in adj.iter_mut().enumerate() {
            let len = neighbours.len();
            if len > 0 {
                neighbours.rotate_left((rotation + node) % len);
            }
        }
        adj
    }

    pub fn internal_nodes(&self) -> impl Iterator<Item = usize> {
        self.num_leaves..self.num_nodes
    }

    /// Root on one of the edges (bifurcating root) or on one of the internal
    /// nodes, depending on `choice`. `rotation` permutes child order.
    pub fn rooted(&self, choice: usize, rotation: usize, length: f64) -> SupportTree {
        let adj = self.adjacency(rotation);
        let mut tree = SupportTree::new();
        let slots = self.edges.len() + (self.num_nodes - self.num_leaves);
        let choice = choice % slots;

        if choice < self.edges.len() {
            let (a, b) = self.edges[choice];
            let root = tree.add_root(Node::new());
            self.attach(&adj, &mut tree, root, a, b, length);
            self.attach(&adj, &mut tree, root, b, a, length);
        } else {
            let center = self.num_leaves + (choice - self.edges.len());
            let root = tree.add_root(Node::new());
            for &next in &adj[center] {
                self.attach(&adj, &mut tree, root, next, center, length);
            }
        }
        tree
    }

    fn attach(
        &self,
        adj: &[Vec<usize>],
        tree: &mut SupportTree,
        parent: NodeId,
        node: usize,
        from: usize,
        length: f64,
    ) {
        if node < self.num_leaves {
            tree.add_child(parent, Node::leaf(taxon(node)).with_length(length));
            return;
        }
        let id = tree.add_child(
            parent,
            Node::new().with_support(support_for(node)).with_length(length),
        );
        for &next in adj[node].iter().filter(|&&n| n != from) {
            self.attach(adj, tree, id, next, node, length);
        }
    }
}

pub fn taxon(idx: usize) -> String {
    format!("t{idx:02}")
}

/// A distinct, deterministic support value per internal node of the topology.
pub fn support_for(node: usize) -> f64 {
    ((node * 37) % 100) as f64 / 100.0
}

/// Copy `tree`, dissolving every non-root internal node for which `drop`
/// returns true: its children are re-attached to the nearest kept ancestor.
pub fn collapse(tree: &SupportTree, drop: impl Fn(NodeId) -> bool) -> SupportTree {
    fn copy(
        src: &SupportTree,
        out: &mut SupportTree,
        node: NodeId,
        parent: NodeId,
        drop: &dyn Fn(NodeId) -> bool,
    ) {
        if !src.is_leaf(node) && drop(node) {
            for &child in src.children(node) {
                copy(src, out, child, parent, drop);
            }
            return;
        }
        let id = out.add_child(parent, src.get(node).clone());
        for &child in src.children(node) {
            copy(src, out, child, id, drop);
        }
    }

    let mut out = SupportTree::new();
    let Some(root) = tree.root() else {
        return out;
    };
    let new_root = out.add_root(tree.get(root).clone());
    for &child in tree.children(root) {
        copy(tree, &mut out, child, new_root, &drop);
    }
    out
}
