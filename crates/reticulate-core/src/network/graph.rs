//! Rooted phylogenetic network storage.
//!
//! # Overview
//!
//! [`PhyloNetwork`] is a thin wrapper around a petgraph
//! [`StableDiGraph`]. Stable indices matter here: the normalizer deletes
//! edges and contracts pass-through nodes while holding a node mapping, and
//! the resolver keys its per-reticulation state by [`EdgeIndex`].
//!
//! ## Edge Direction
//!
//! An edge `u → v` means "`u` is a parent of `v`". The root is the unique
//! node with in-degree 0, leaves have out-degree 0, and any node with
//! in-degree ≥ 2 is a *reticulation*.
//!
//! ## Edge Order
//!
//! [`PhyloNetwork::in_edges`] and [`PhyloNetwork::out_edges`] return edges in
//! ascending [`EdgeIndex`] order. petgraph itself walks adjacency lists most
//! recent first; sorting by index gives the insertion order, which is stable
//! across repeated calls on an unmodified network.

#![allow(clippy::module_name_repetitions)]

use std::collections::HashMap;

use petgraph::{
    Direction,
    stable_graph::{EdgeIndex, NodeIndex, StableDiGraph},
    visit::EdgeRef,
};
use serde::{Deserialize, Serialize};

use crate::error::NetworkError;

// ---------------------------------------------------------------------------
// NodeData
// ---------------------------------------------------------------------------

/// Payload stored on every network node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeData {
    /// Taxon or clade label. Never `Some("")`.
    pub label: Option<String>,
}

impl NodeData {
    /// Build node data from an optional label, dropping empty strings.
    #[must_use]
    pub fn with_label(label: Option<String>) -> Self {
        Self {
            label: label.filter(|l| !l.is_empty()),
        }
    }
}

// ---------------------------------------------------------------------------
// PhyloNetwork
// ---------------------------------------------------------------------------

/// A directed phylogenetic network.
///
/// Nothing here enforces acyclicity or a single root; those are
/// preconditions checked by the algorithms that need them (see
/// [`PhyloNetwork::single_root`] and [`crate::network::acyclic::is_dag`]).
#[derive(Debug, Clone, Default)]
pub struct PhyloNetwork {
    graph: StableDiGraph<NodeData, ()>,
}

impl PhyloNetwork {
    /// Create an empty network.
    #[must_use]
    pub fn new() -> Self {
        Self {
            graph: StableDiGraph::new(),
        }
    }

    /// Build a network from `(parent, child)` name pairs.
    ///
    /// Every distinct name becomes one node labelled with that name, created
    /// in order of first appearance. Duplicate pairs yield a single edge.
    #[must_use]
    pub fn from_edges(edges: &[(&str, &str)]) -> Self {
        let mut net = Self::new();
        let mut by_name: HashMap<&str, NodeIndex> = HashMap::new();

        for &(parent, child) in edges {
            let p = *by_name
                .entry(parent)
                .or_insert_with(|| net.add_labelled_node(parent));
            let c = *by_name
                .entry(child)
                .or_insert_with(|| net.add_labelled_node(child));
            if !net.contains_edge(p, c) {
                net.add_edge(p, c);
            }
        }

        net
    }

    /// Borrow the underlying petgraph graph (read-only).
    #[must_use]
    pub const fn graph(&self) -> &StableDiGraph<NodeData, ()> {
        &self.graph
    }

    // -- mutation -----------------------------------------------------------

    /// Add a node carrying `data`.
    pub fn add_node(&mut self, data: NodeData) -> NodeIndex {
        self.graph.add_node(data)
    }

    /// Add a node labelled `label` (empty labels are stored as unlabelled).
    pub fn add_labelled_node(&mut self, label: &str) -> NodeIndex {
        self.add_node(NodeData::with_label(Some(label.to_string())))
    }

    /// Add the edge `parent → child`. Parallel edges are allowed.
    ///
    /// # Panics
    ///
    /// Panics if either endpoint does not exist (petgraph contract).
    pub fn add_edge(&mut self, parent: NodeIndex, child: NodeIndex) -> EdgeIndex {
        self.graph.add_edge(parent, child, ())
    }

    /// Remove an edge. Returns `false` if it did not exist.
    pub fn remove_edge(&mut self, edge: EdgeIndex) -> bool {
        self.graph.remove_edge(edge).is_some()
    }

    /// Remove a node and every edge incident to it.
    pub fn remove_node(&mut self, node: NodeIndex) -> Option<NodeData> {
        self.graph.remove_node(node)
    }

    /// Contract a pass-through node (in-degree 1, out-degree 1).
    ///
    /// `v` is removed and its parent becomes a parent of its child. If the
    /// parent already has an edge to the child no second edge is added.
    /// Returns the edge that now joins parent and child.
    ///
    /// # Errors
    ///
    /// [`NetworkError::UnknownNode`] if `v` is not in the network, or
    /// [`NetworkError::NotPassThrough`] if its degrees are not `(1, 1)`.
    pub fn contract_pass_through(&mut self, v: NodeIndex) -> Result<EdgeIndex, NetworkError> {
        if !self.contains_node(v) {
            return Err(NetworkError::UnknownNode(v));
        }
        let (in_degree, out_degree) = (self.in_degree(v), self.out_degree(v));
        let (Some(parent), Some(child), 1, 1) = (
            self.parents(v).next(),
            self.children(v).next(),
            in_degree,
            out_degree,
        ) else {
            return Err(NetworkError::NotPassThrough {
                node: v,
                in_degree,
                out_degree,
            });
        };

        self.graph.remove_node(v);
        Ok(match self.find_edge(parent, child) {
            Some(existing) => existing,
            None => self.add_edge(parent, child),
        })
    }

    /// Replace the label of `v`. No-op for unknown nodes.
    pub fn set_label(&mut self, v: NodeIndex, label: Option<String>) {
        if let Some(data) = self.graph.node_weight_mut(v) {
            *data = NodeData::with_label(label);
        }
    }

    // -- queries ------------------------------------------------------------

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// `true` if the network has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// `true` if `v` is a live node of this network.
    #[must_use]
    pub fn contains_node(&self, v: NodeIndex) -> bool {
        self.graph.contains_node(v)
    }

    /// `true` if at least one edge `parent → child` exists.
    #[must_use]
    pub fn contains_edge(&self, parent: NodeIndex, child: NodeIndex) -> bool {
        self.graph.find_edge(parent, child).is_some()
    }

    /// Find one edge `parent → child`.
    #[must_use]
    pub fn find_edge(&self, parent: NodeIndex, child: NodeIndex) -> Option<EdgeIndex> {
        self.graph.find_edge(parent, child)
    }

    /// Return `(source, target)` of an edge.
    #[must_use]
    pub fn edge_endpoints(&self, edge: EdgeIndex) -> Option<(NodeIndex, NodeIndex)> {
        self.graph.edge_endpoints(edge)
    }

    /// All nodes in ascending index order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    /// All edges in ascending index order.
    pub fn edges(&self) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.graph.edge_indices()
    }

    /// Node payload.
    #[must_use]
    pub fn node_data(&self, v: NodeIndex) -> Option<&NodeData> {
        self.graph.node_weight(v)
    }

    /// Node label, if any.
    #[must_use]
    pub fn label(&self, v: NodeIndex) -> Option<&str> {
        self.graph
            .node_weight(v)
            .and_then(|data| data.label.as_deref())
    }

    /// First node carrying `label`, in index order.
    #[must_use]
    pub fn node_by_label(&self, label: &str) -> Option<NodeIndex> {
        self.nodes().find(|&v| self.label(v) == Some(label))
    }

    /// Display name for logs and reports: the label, or `#<index>`.
    #[must_use]
    pub fn display_name(&self, v: NodeIndex) -> String {
        self.label(v)
            .map_or_else(|| format!("#{}", v.index()), str::to_string)
    }

    /// Number of edges entering `v`.
    #[must_use]
    pub fn in_degree(&self, v: NodeIndex) -> usize {
        self.graph.edges_directed(v, Direction::Incoming).count()
    }

    /// Number of edges leaving `v`.
    #[must_use]
    pub fn out_degree(&self, v: NodeIndex) -> usize {
        self.graph.edges_directed(v, Direction::Outgoing).count()
    }

    /// Edges entering `v`, in insertion order.
    #[must_use]
    pub fn in_edges(&self, v: NodeIndex) -> Vec<EdgeIndex> {
        self.sorted_edges(v, Direction::Incoming)
    }

    /// Edges leaving `v`, in insertion order.
    #[must_use]
    pub fn out_edges(&self, v: NodeIndex) -> Vec<EdgeIndex> {
        self.sorted_edges(v, Direction::Outgoing)
    }

    /// The first edge entering `v` (in insertion order).
    #[must_use]
    pub fn first_in_edge(&self, v: NodeIndex) -> Option<EdgeIndex> {
        self.graph
            .edges_directed(v, Direction::Incoming)
            .map(|e| e.id())
            .min()
    }

    /// Parents of `v`, one entry per in-edge, in insertion order.
    pub fn parents(&self, v: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.in_edges(v)
            .into_iter()
            .filter_map(|e| self.graph.edge_endpoints(e).map(|(source, _)| source))
    }

    /// Children of `v`, one entry per out-edge, in insertion order.
    pub fn children(&self, v: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.out_edges(v)
            .into_iter()
            .filter_map(|e| self.graph.edge_endpoints(e).map(|(_, target)| target))
    }

    /// `true` if `v` has in-degree ≥ 2.
    #[must_use]
    pub fn is_reticulation(&self, v: NodeIndex) -> bool {
        self.graph
            .edges_directed(v, Direction::Incoming)
            .nth(1)
            .is_some()
    }

    /// `true` if `v` has out-degree 0.
    #[must_use]
    pub fn is_leaf(&self, v: NodeIndex) -> bool {
        self.graph
            .edges_directed(v, Direction::Outgoing)
            .next()
            .is_none()
    }

    /// Nodes with in-degree 0.
    #[must_use]
    pub fn roots(&self) -> Vec<NodeIndex> {
        self.nodes().filter(|&v| self.in_degree(v) == 0).collect()
    }

    /// Nodes with out-degree 0.
    #[must_use]
    pub fn leaves(&self) -> Vec<NodeIndex> {
        self.nodes().filter(|&v| self.is_leaf(v)).collect()
    }

    /// Nodes with in-degree ≥ 2.
    #[must_use]
    pub fn reticulations(&self) -> Vec<NodeIndex> {
        self.nodes().filter(|&v| self.is_reticulation(v)).collect()
    }

    /// Return the unique root.
    ///
    /// # Errors
    ///
    /// [`NetworkError::NoRoot`] when no node has in-degree 0 (this includes
    /// the empty network), [`NetworkError::MultipleRoots`] when several do.
    pub fn single_root(&self) -> Result<NodeIndex, NetworkError> {
        let roots = self.roots();
        match roots.as_slice() {
            [] => Err(NetworkError::NoRoot),
            [root] => Ok(*root),
            _ => Err(NetworkError::MultipleRoots { count: roots.len() }),
        }
    }

    /// BLAKE3 hash of the sorted `(parent, child)` display-name list.
    ///
    /// Two networks with the same labelled edge set share a hash, which
    /// makes it usable as a cache key for LSA trees.
    #[must_use]
    pub fn content_hash(&self) -> String {
        let mut edges: Vec<(String, String)> = self
            .edges()
            .filter_map(|e| self.edge_endpoints(e))
            .map(|(source, target)| (self.display_name(source), self.display_name(target)))
            .collect();
        edges.sort_unstable();

        let mut hasher = blake3::Hasher::new();
        for (source, target) in edges {
            hasher.update(source.as_bytes());
            hasher.update(b"\x00");
            hasher.update(target.as_bytes());
            hasher.update(b"\x00");
        }
        format!("blake3:{}", hasher.finalize())
    }

    fn sorted_edges(&self, v: NodeIndex, dir: Direction) -> Vec<EdgeIndex> {
        let mut edges: Vec<EdgeIndex> = self.graph.edges_directed(v, dir).map(|e| e.id()).collect();
        edges.sort_unstable();
        edges
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
