//! Acyclicity checks for phylogenetic networks.
//!
//! [`is_dag`] is the guard run before the resolver and the normalizer, and
//! after speculative edits: [`PhyloNetwork::add_edge_checked`] inserts an
//! edge, checks, and rolls the insertion back when a cycle appears.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::{
    Direction,
    stable_graph::{EdgeIndex, NodeIndex},
};

use crate::error::NetworkError;
use crate::network::graph::PhyloNetwork;

/// Return `true` if `net` contains no directed cycle.
///
/// Runs a depth-first search from every undiscovered node, numbering nodes
/// by departure (post-order finish) time. The network is acyclic iff every
/// edge `u → w` satisfies `departure(u) > departure(w)`; a back edge is the
/// only way to reach an unfinished node. Self-loops count as cycles.
///
/// The search uses an explicit stack, so deep networks cannot overflow the
/// call stack. The network is not modified.
#[must_use]
pub fn is_dag(net: &PhyloNetwork) -> bool {
    let departure = departure_times(net);

    net.edges().all(|edge| {
        net.edge_endpoints(edge).is_none_or(|(u, w)| {
            match (departure.get(&u), departure.get(&w)) {
                (Some(du), Some(dw)) => du > dw,
                _ => false,
            }
        })
    })
}

/// Check that `net` is a single-rooted DAG and return its root.
///
/// # Errors
///
/// [`NetworkError::NoRoot`] or [`NetworkError::MultipleRoots`] from
/// [`PhyloNetwork::single_root`], then [`NetworkError::NotAcyclic`].
pub fn require_rooted_dag(net: &PhyloNetwork) -> Result<NodeIndex, NetworkError> {
    let root = net.single_root()?;
    if !is_dag(net) {
        return Err(NetworkError::NotAcyclic);
    }
    Ok(root)
}

fn departure_times(net: &PhyloNetwork) -> HashMap<NodeIndex, usize> {
    let graph = net.graph();
    let mut departure: HashMap<NodeIndex, usize> = HashMap::with_capacity(net.node_count());
    let mut discovered: HashSet<NodeIndex> = HashSet::with_capacity(net.node_count());
    let mut counter = 0usize;

    // Each frame: (node, its successors, next successor to try).
    let mut stack: Vec<(NodeIndex, Vec<NodeIndex>, usize)> = Vec::new();

    for start in net.nodes() {
        if !discovered.insert(start) {
            continue;
        }
        stack.push((
            start,
            graph.neighbors_directed(start, Direction::Outgoing).collect(),
            0,
        ));

        while let Some((node, successors, next)) = stack.last_mut() {
            if let Some(&succ) = successors.get(*next) {
                *next += 1;
                if discovered.insert(succ) {
                    let succ_children =
                        graph.neighbors_directed(succ, Direction::Outgoing).collect();
                    stack.push((succ, succ_children, 0));
                }
            } else {
                departure.insert(*node, counter);
                counter += 1;
                stack.pop();
            }
        }
    }

    departure
}

/// Check whether adding `from → to` would introduce a cycle.
///
/// Returns the cycle the new edge would close, as the node sequence
/// `from, to, …, from`. Self-edges return `[from, from]`.
#[must_use]
pub fn would_create_cycle(
    net: &PhyloNetwork,
    from: NodeIndex,
    to: NodeIndex,
) -> Option<Vec<NodeIndex>> {
    if from == to {
        return Some(vec![from, from]);
    }

    // BFS from `to` looking for `from`.
    let mut queue: VecDeque<NodeIndex> = VecDeque::from([to]);
    let mut visited: HashSet<NodeIndex> = HashSet::from([to]);
    let mut parent: HashMap<NodeIndex, NodeIndex> = HashMap::new();

    while let Some(current) = queue.pop_front() {
        if current == from {
            return Some(reconstruct_cycle_path(from, to, &parent));
        }
        for next in net.graph().neighbors_directed(current, Direction::Outgoing) {
            if visited.insert(next) {
                parent.insert(next, current);
                queue.push_back(next);
            }
        }
    }

    None
}

fn reconstruct_cycle_path(
    from: NodeIndex,
    to: NodeIndex,
    parent: &HashMap<NodeIndex, NodeIndex>,
) -> Vec<NodeIndex> {
    // Parent links describe to -> ... -> from; walk them back from `from`.
    let mut to_to_from = vec![from];
    let mut cursor = from;
    while cursor != to {
        let Some(&next) = parent.get(&cursor) else {
            break;
        };
        cursor = next;
        to_to_from.push(cursor);
    }
    to_to_from.reverse();

    let mut cycle = Vec::with_capacity(to_to_from.len() + 1);
    cycle.push(from);
    cycle.extend(to_to_from);
    cycle
}

impl PhyloNetwork {
    /// Add `parent → child` only if the network stays acyclic.
    ///
    /// The edge is inserted, the whole network is checked with [`is_dag`],
    /// and the insertion is rolled back if the check fails.
    ///
    /// # Errors
    ///
    /// [`NetworkError::UnknownNode`] if an endpoint is missing, or
    /// [`NetworkError::CycleDetected`] with the closed cycle.
    pub fn add_edge_checked(
        &mut self,
        parent: NodeIndex,
        child: NodeIndex,
    ) -> Result<EdgeIndex, NetworkError> {
        for v in [parent, child] {
            if !self.contains_node(v) {
                return Err(NetworkError::UnknownNode(v));
            }
        }

        let edge = self.add_edge(parent, child);
        if is_dag(self) {
            return Ok(edge);
        }

        self.remove_edge(edge);
        let path = would_create_cycle(self, parent, child).unwrap_or_else(|| vec![parent, child]);
        tracing::debug!(
            parent = %self.display_name(parent),
            child = %self.display_name(child),
            "rolled back edge that would close a cycle"
        );
        Err(NetworkError::CycleDetected { path })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
