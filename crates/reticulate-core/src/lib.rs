//! reticulate-core library.
//!
//! Rooted phylogenetic networks: the graph model, lowest-stable-ancestor
//! resolution for reticulations, and normalization onto essential nodes.
//!
//! # Conventions
//!
//! - **Errors**: graph algorithms return [`error::NetworkError`]; file and
//!   config loading use `anyhow::Result` with context.
//! - **Logging**: use `tracing` macros (`info!`, `warn!`, `debug!`, `trace!`).
//! - **Indices**: nodes and edges are petgraph stable indices; removing a
//!   node never renumbers the others.

#![forbid(unsafe_code)]

pub mod config;
pub mod document;
pub mod error;
pub mod lsa;
pub mod network;
pub mod normalize;
pub mod timing;
