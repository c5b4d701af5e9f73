//! Phylogenetic network model.
//!
//! # Overview
//!
//! A rooted phylogenetic network is a directed acyclic graph with a single
//! in-degree-0 root, leaves of out-degree 0 and *reticulations* of in-degree
//! ≥ 2. This module owns the storage ([`PhyloNetwork`]), the acyclicity
//! guard ([`acyclic::is_dag`]) and summary statistics ([`NetworkStats`]).
//!
//! ```rust
//! use reticulate_core::network::{PhyloNetwork, is_dag};
//!
//! let net = PhyloNetwork::from_edges(&[("R", "A"), ("R", "B"), ("A", "H"), ("B", "H")]);
//! assert!(is_dag(&net));
//! assert_eq!(net.reticulations().len(), 1);
//! ```

pub mod acyclic;
pub mod graph;
pub mod stats;

pub use acyclic::{is_dag, require_rooted_dag, would_create_cycle};
pub use graph::{NodeData, PhyloNetwork};
pub use petgraph::stable_graph::{EdgeIndex, NodeIndex};
pub use stats::NetworkStats;
