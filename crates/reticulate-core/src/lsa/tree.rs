//! The LSA tree: a spanning tree of a network for tree-like traversal.
//!
//! Every tree node hangs under its unique parent, every reticulation hangs
//! under its lowest stable ancestor. Layout code walks this tree instead of
//! the DAG so each node is visited exactly once.

use std::collections::{BTreeMap, HashMap};

use petgraph::stable_graph::NodeIndex;
use tracing::instrument;

use crate::error::NetworkError;
use crate::lsa::resolver::{compute_reticulation_to_lsa, lsa_children_from};
use crate::network::PhyloNetwork;

/// Spanning tree derived from the reticulation → LSA map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LsaTree {
    root: NodeIndex,
    lsa: BTreeMap<NodeIndex, NodeIndex>,
    children: BTreeMap<NodeIndex, Vec<NodeIndex>>,
    parent: HashMap<NodeIndex, NodeIndex>,
}

impl LsaTree {
    /// Resolve every reticulation of `net` and build the tree.
    ///
    /// # Errors
    ///
    /// Fails when `net` is not a single-rooted DAG, see
    /// [`compute_reticulation_to_lsa`].
    #[instrument(skip(net))]
    pub fn build(net: &PhyloNetwork) -> Result<Self, NetworkError> {
        let lsa = compute_reticulation_to_lsa(net)?;
        let root = net.single_root()?;
        let children = lsa_children_from(net, &lsa);

        let parent = children
            .iter()
            .flat_map(|(&p, kids)| kids.iter().map(move |&kid| (kid, p)))
            .collect();

        Ok(Self {
            root,
            lsa,
            children,
            parent,
        })
    }

    /// The network root.
    #[must_use]
    pub const fn root(&self) -> NodeIndex {
        self.root
    }

    /// The reticulation → LSA map.
    #[must_use]
    pub const fn lsa_map(&self) -> &BTreeMap<NodeIndex, NodeIndex> {
        &self.lsa
    }

    /// The full LSA-children map.
    #[must_use]
    pub const fn children_map(&self) -> &BTreeMap<NodeIndex, Vec<NodeIndex>> {
        &self.children
    }

    /// LSA of `reticulation`, or `None` if it is not a reticulation.
    #[must_use]
    pub fn lsa_of(&self, reticulation: NodeIndex) -> Option<NodeIndex> {
        self.lsa.get(&reticulation).copied()
    }

    /// Children of `v` in the LSA tree (empty for leaves and unknown nodes).
    #[must_use]
    pub fn children_of(&self, v: NodeIndex) -> &[NodeIndex] {
        self.children.get(&v).map(Vec::as_slice).unwrap_or_default()
    }

    /// Parent of `v` in the LSA tree; `None` for the root.
    #[must_use]
    pub fn parent_of(&self, v: NodeIndex) -> Option<NodeIndex> {
        self.parent.get(&v).copied()
    }

    /// Number of reticulations.
    #[must_use]
    pub fn reticulation_count(&self) -> usize {
        self.lsa.len()
    }

    /// Number of nodes in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// `true` if the tree has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Nodes in depth-first preorder, children in LSA-children order.
    #[must_use]
    pub fn preorder(&self) -> Vec<NodeIndex> {
        let mut order = Vec::with_capacity(self.children.len());
        let mut stack = vec![self.root];
        while let Some(v) = stack.pop() {
            order.push(v);
            stack.extend(self.children_of(v).iter().rev().copied());
        }
        order
    }

    /// Depth of `v` below the root in the LSA tree.
    #[must_use]
    pub fn depth_of(&self, v: NodeIndex) -> Option<usize> {
        if !self.children.contains_key(&v) {
            return None;
        }
        let mut depth = 0;
        let mut cursor = v;
        while let Some(p) = self.parent_of(cursor) {
            depth += 1;
            cursor = p;
        }
        Some(depth)
    }
}
