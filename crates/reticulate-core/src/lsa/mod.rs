//! Lowest stable ancestors of reticulations.
//!
//! # Overview
//!
//! For a reticulation `r`, its *lowest stable ancestor* (LSA) is the deepest
//! node through which every directed path from the root to `r` passes.
//! Attaching each reticulation below its LSA, and every other node below its
//! unique parent, turns the network into a spanning tree ([`LsaTree`]).
//!
//! ## Pipeline
//!
//! ```text
//! PhyloNetwork (single-rooted DAG)
//!        ↓  resolver::compute_reticulation_to_lsa()
//! BTreeMap<reticulation, lsa>
//!        ↓  resolver::lsa_children_from()
//! BTreeMap<node, Vec<child>>
//!        ↓  tree::LsaTree::build()
//! LsaTree (preorder, parent, depth)
//! ```
//!
//! ## Typical Usage
//!
//! ```rust
//! use reticulate_core::lsa::LsaTree;
//! use reticulate_core::network::PhyloNetwork;
//!
//! let net = PhyloNetwork::from_edges(&[
//!     ("R", "A"), ("R", "B"), ("A", "C"), ("A", "H"), ("B", "H"), ("H", "D"),
//! ]);
//! let tree = LsaTree::build(&net)?;
//! let h = net.node_by_label("H").expect("H");
//! assert_eq!(tree.lsa_of(h), net.node_by_label("R"));
//! # Ok::<(), reticulate_core::error::NetworkError>(())
//! ```

pub mod resolver;
pub mod tree;

pub use resolver::{compute_lsa_children, compute_reticulation_to_lsa, lsa_children_from};
pub use tree::LsaTree;
