//! The three graph phases of normalization.
//!
//! 1. [`visibility_below`] — for every node, the essential nodes reachable
//!    from it by a directed path of length ≥ 1. The recursion never stops at
//!    the first essential node, so the sets are full transitive sets.
//! 2. [`reduce_transitive_single_pass`] — drop `x → z` when some other
//!    parent `y` of `z` is itself a child of `x`.
//! 3. [`suppress_pass_through`] — contract nodes with in-degree 1 and
//!    out-degree 1.

use std::collections::{HashMap, HashSet, VecDeque};

use fixedbitset::FixedBitSet;
use petgraph::{
    algo::toposort,
    stable_graph::{EdgeIndex, NodeIndex},
};
use tracing::trace;

use crate::error::NetworkError;
use crate::network::PhyloNetwork;

// ---------------------------------------------------------------------------
// Visibility
// ---------------------------------------------------------------------------

/// Essential descendants of every node, stored as bitsets over a dense
/// numbering of the essential nodes.
#[derive(Debug, Clone)]
pub struct VisibilityBelow {
    /// Essential nodes in ascending index order; a bit `i` means `essential[i]`.
    essential: Vec<NodeIndex>,
    sets: HashMap<NodeIndex, FixedBitSet>,
}

impl VisibilityBelow {
    /// Essential nodes reachable from `v`, in ascending index order.
    pub fn visible_from(&self, v: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.sets
            .get(&v)
            .into_iter()
            .flat_map(FixedBitSet::ones)
            .map(|bit| self.essential[bit])
    }

    /// Number of essential nodes reachable from `v`.
    #[must_use]
    pub fn count_from(&self, v: NodeIndex) -> usize {
        self.sets.get(&v).map_or(0, |set| set.count_ones(..))
    }

    /// The essential nodes, ascending.
    #[must_use]
    pub fn essential(&self) -> &[NodeIndex] {
        &self.essential
    }
}

/// Compute the essential descendants of every node of `net`.
///
/// Nodes are processed in reverse topological order, so each node unions
/// the already-finished sets of its children.
///
/// # Errors
///
/// [`NetworkError::NotAcyclic`] if `net` has a cycle.
pub fn visibility_below(
    net: &PhyloNetwork,
    essential: &HashSet<NodeIndex>,
) -> Result<VisibilityBelow, NetworkError> {
    let topo = toposort(net.graph(), None).map_err(|_| NetworkError::NotAcyclic)?;

    let mut ordered: Vec<NodeIndex> = essential.iter().copied().collect();
    ordered.sort_unstable();
    let ordinal: HashMap<NodeIndex, usize> =
        ordered.iter().enumerate().map(|(i, &v)| (v, i)).collect();

    let width = ordered.len();
    let mut sets: HashMap<NodeIndex, FixedBitSet> = HashMap::with_capacity(topo.len());

    for &u in topo.iter().rev() {
        let mut below = FixedBitSet::with_capacity(width);
        for child in net.children(u) {
            if let Some(child_set) = sets.get(&child) {
                below.union_with(child_set);
            }
            if let Some(&bit) = ordinal.get(&child) {
                below.insert(bit);
            }
        }
        sets.insert(u, below);
    }

    Ok(VisibilityBelow {
        essential: ordered,
        sets,
    })
}

// ---------------------------------------------------------------------------
// Transitive reduction
// ---------------------------------------------------------------------------

/// Remove edges implied by a path of length two. Returns how many were removed.
///
/// An edge `x → z` is redundant when `z` has another parent `y ≠ x` and
/// `x → y` is an edge. All redundant edges are collected against the
/// unmodified graph first, then removed together.
///
/// This is a local one-step check, not an iterated closure-minus-square.
/// On a full transitive closure (which is what the normalizer feeds it) the
/// result is the exact transitive reduction; on arbitrary input, edges that
/// are only implied by paths of length ≥ 3 survive.
pub fn reduce_transitive_single_pass(net: &mut PhyloNetwork) -> usize {
    let redundant: Vec<EdgeIndex> = net
        .edges()
        .filter(|&edge| {
            net.edge_endpoints(edge).is_some_and(|(x, z)| {
                net.parents(z).any(|y| y != x && net.contains_edge(x, y))
            })
        })
        .collect();

    for &edge in &redundant {
        if let Some((x, z)) = net.edge_endpoints(edge) {
            trace!(
                parent = %net.display_name(x),
                child = %net.display_name(z),
                "removing transitive edge"
            );
        }
        net.remove_edge(edge);
    }

    redundant.len()
}

// ---------------------------------------------------------------------------
// Pass-through suppression
// ---------------------------------------------------------------------------

/// Contract every node with in-degree 1 and out-degree 1. Returns how many
/// nodes were removed.
///
/// Runs as a worklist: when a contraction reuses an existing parent → child
/// edge, both endpoints lose a degree and may become pass-through nodes
/// themselves, so they are queued again. On return no node that is eligible
/// for suppression has degrees `(1, 1)`. With `keep_labelled`, labelled
/// pass-through nodes are left in place.
pub fn suppress_pass_through(net: &mut PhyloNetwork, keep_labelled: bool) -> usize {
    let mut queue: VecDeque<NodeIndex> = net.nodes().collect();
    let mut queued: HashSet<NodeIndex> = queue.iter().copied().collect();
    let mut suppressed = 0;

    while let Some(v) = queue.pop_front() {
        queued.remove(&v);
        if !net.contains_node(v) || (keep_labelled && net.label(v).is_some()) {
            continue;
        }
        if net.in_degree(v) != 1 || net.out_degree(v) != 1 {
            continue;
        }
        let (Some(parent), Some(child)) = (net.parents(v).next(), net.children(v).next()) else {
            continue;
        };

        trace!(node = %net.display_name(v), "suppressing pass-through node");
        if net.contract_pass_through(v).is_ok() {
            suppressed += 1;
            for neighbour in [parent, child] {
                if queued.insert(neighbour) {
                    queue.push_back(neighbour);
                }
            }
        }
    }

    suppressed
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
