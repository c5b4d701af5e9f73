//! Basic size statistics for a phylogenetic network.
//!
//! # Statistics Provided
//!
//! - **node_count** / **edge_count**: raw sizes.
//! - **reticulation_count**: nodes with in-degree ≥ 2.
//! - **leaf_count**: nodes with out-degree 0.
//! - **root_count**: nodes with in-degree 0 (exactly 1 for a valid network).
//! - **labelled_count**: nodes carrying a non-empty label.
//! - **max_in_degree** / **max_out_degree**: largest degrees in the network.
//!
//! The normalizer logs a before/after pair of these for every run.

use std::fmt;

use serde::Serialize;

use crate::network::graph::PhyloNetwork;

/// Summary statistics for a network.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NetworkStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub reticulation_count: usize,
    pub leaf_count: usize,
    pub root_count: usize,
    pub labelled_count: usize,
    pub max_in_degree: usize,
    pub max_out_degree: usize,
}

impl NetworkStats {
    /// Compute statistics for `net` in one pass over its nodes.
    #[must_use]
    pub fn from_network(net: &PhyloNetwork) -> Self {
        let mut stats = Self {
            node_count: net.node_count(),
            edge_count: net.edge_count(),
            ..Self::default()
        };

        for v in net.nodes() {
            let in_degree = net.in_degree(v);
            let out_degree = net.out_degree(v);

            if in_degree >= 2 {
                stats.reticulation_count += 1;
            }
            if in_degree == 0 {
                stats.root_count += 1;
            }
            if out_degree == 0 {
                stats.leaf_count += 1;
            }
            if net.label(v).is_some() {
                stats.labelled_count += 1;
            }
            stats.max_in_degree = stats.max_in_degree.max(in_degree);
            stats.max_out_degree = stats.max_out_degree.max(out_degree);
        }

        stats
    }

    /// Return `true` if the network has no reticulations (it is a tree or forest).
    #[must_use]
    pub const fn is_tree(&self) -> bool {
        self.reticulation_count == 0
    }
}

impl fmt::Display for NetworkStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "nodes={} edges={} reticulations={}",
            self.node_count, self.edge_count, self.reticulation_count
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_network_has_zero_stats() {
        let stats = NetworkStats::from_network(&PhyloNetwork::new());
        assert_eq!(stats, NetworkStats::default());
        assert!(stats.is_tree());
    }

    #[test]
    fn counts_for_single_reticulation() {
        // R → A, R → B, A → C, A → H, B → H, H → D
        let net = PhyloNetwork::from_edges(&[
            ("R", "A"),
            ("R", "B"),
            ("A", "C"),
            ("A", "H"),
            ("B", "H"),
            ("H", "D"),
        ]);
        let stats = NetworkStats::from_network(&net);

        assert_eq!(stats.node_count, 6);
        assert_eq!(stats.edge_count, 6);
        assert_eq!(stats.reticulation_count, 1);
        assert_eq!(stats.leaf_count, 2);
        assert_eq!(stats.root_count, 1);
        assert_eq!(stats.labelled_count, 6);
        assert_eq!(stats.max_in_degree, 2);
        assert_eq!(stats.max_out_degree, 2);
        assert!(!stats.is_tree());
        assert_eq!(stats.to_string(), "nodes=6 edges=6 reticulations=1");
    }
}
