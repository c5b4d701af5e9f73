//! Essential-node oracles.
//!
//! The normalizer keeps exactly the nodes an [`EssentialNodes`] oracle
//! returns, plus every leaf. Deciding which internal nodes are structurally
//! significant (visible nodes, stable ancestors, …) is the caller's job;
//! this module ships a few simple, deterministic oracles and lets any
//! closure act as one.

use std::collections::HashSet;

use petgraph::stable_graph::NodeIndex;

use crate::network::PhyloNetwork;

/// Oracle returning the nodes that must survive normalization.
///
/// Implementations must be deterministic for a fixed network and return a
/// subset of its nodes. Leaves may be omitted; the normalizer adds them.
pub trait EssentialNodes {
    fn essential_nodes(&self, net: &PhyloNetwork) -> HashSet<NodeIndex>;
}

impl<F> EssentialNodes for F
where
    F: Fn(&PhyloNetwork) -> HashSet<NodeIndex>,
{
    fn essential_nodes(&self, net: &PhyloNetwork) -> HashSet<NodeIndex> {
        self(net)
    }
}

/// Keep only the root and the leaves.
#[derive(Debug, Clone, Copy, Default)]
pub struct RootAndLeaves;

impl EssentialNodes for RootAndLeaves {
    fn essential_nodes(&self, net: &PhyloNetwork) -> HashSet<NodeIndex> {
        net.roots().into_iter().chain(net.leaves()).collect()
    }
}

/// Keep the root, the leaves and every labelled node.
#[derive(Debug, Clone, Copy, Default)]
pub struct LabelledNodes;

impl EssentialNodes for LabelledNodes {
    fn essential_nodes(&self, net: &PhyloNetwork) -> HashSet<NodeIndex> {
        let mut keep: HashSet<NodeIndex> = RootAndLeaves.essential_nodes(net);
        keep.extend(net.nodes().filter(|&v| net.label(v).is_some()));
        keep
    }
}

/// Keep every node. Normalizing with this oracle only reduces edges and
/// suppresses pass-through nodes.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllNodes;

impl EssentialNodes for AllNodes {
    fn essential_nodes(&self, net: &PhyloNetwork) -> HashSet<NodeIndex> {
        net.nodes().collect()
    }
}

/// A fixed, caller-computed node set (used as-is, the root is not added).
#[derive(Debug, Clone, Default)]
pub struct ExplicitNodes(pub HashSet<NodeIndex>);

impl EssentialNodes for ExplicitNodes {
    fn essential_nodes(&self, _net: &PhyloNetwork) -> HashSet<NodeIndex> {
        self.0.clone()
    }
}
