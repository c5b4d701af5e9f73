//! Network normalization.
//!
//! # Overview
//!
//! Normalization produces a fresh, independent network whose nodes are the
//! essential nodes of the input (chosen by an [`EssentialNodes`] oracle,
//! plus every leaf) and whose edges preserve reachability between them.
//!
//! ## Pipeline
//!
//! ```text
//! PhyloNetwork + oracle
//!        ↓  preconditions (single root, acyclic, root essential)
//! essential set ∪ leaves
//!        ↓  reduce::visibility_below()
//! essential descendants per node
//!        ↓  closure (copy(v) → copy(w) for each visible w)
//!        ↓  reduce::reduce_transitive_single_pass()
//!        ↓  reduce::suppress_pass_through()
//! Normalized { network, copy_of, report }
//! ```
//!
//! ## Typical Usage
//!
//! ```rust
//! use reticulate_core::network::PhyloNetwork;
//! use reticulate_core::normalize::{RootAndLeaves, normalize};
//!
//! let net = PhyloNetwork::from_edges(&[("R", "X"), ("X", "L1"), ("X", "L2")]);
//! let out = normalize(&net, &RootAndLeaves)?;
//! assert_eq!(out.network.node_count(), 3);
//! assert_eq!(out.report.lost_labels, vec!["X".to_string()]);
//! # Ok::<(), reticulate_core::error::NetworkError>(())
//! ```

pub mod essential;
pub mod pipeline;
pub mod reduce;

pub use essential::{AllNodes, EssentialNodes, ExplicitNodes, LabelledNodes, RootAndLeaves};
pub use pipeline::{NormalizeOptions, NormalizeReport, Normalized, normalize, normalize_with};
pub use reduce::{
    VisibilityBelow, reduce_transitive_single_pass, suppress_pass_through, visibility_below,
};
