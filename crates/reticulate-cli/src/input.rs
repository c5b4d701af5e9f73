//! Reading and writing network documents.
//!
//! `.json` files use the JSON document format; anything else is read as an
//! edge list.

use std::path::Path;

use anyhow::Context;
use reticulate_core::document::{NamedNetwork, NetworkDocument};
use reticulate_core::network::PhyloNetwork;
use tracing::debug;

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Load and build the network stored at `path`.
pub fn load_network(path: &Path) -> anyhow::Result<NamedNetwork> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let doc = if is_json(path) {
        NetworkDocument::from_json(&text)
    } else {
        NetworkDocument::from_edge_list(&text)
    }
    .with_context(|| format!("Failed to parse {}", path.display()))?;

    let named = doc
        .to_network()
        .with_context(|| format!("Invalid network in {}", path.display()))?;
    debug!(
        path = %path.display(),
        nodes = named.network.node_count(),
        edges = named.network.edge_count(),
        "loaded network"
    );
    Ok(named)
}

/// Serialize `net` in the format implied by `path` (JSON when `path` is
/// `None`).
pub fn render_network(net: &PhyloNetwork, path: Option<&Path>) -> anyhow::Result<String> {
    let doc = NetworkDocument::from_network(net);
    match path {
        Some(p) if !is_json(p) => Ok(doc.to_edge_list()),
        _ => Ok(doc.to_json()?),
    }
}

/// Write `net` to `path`.
pub fn write_network(net: &PhyloNetwork, path: &Path) -> anyhow::Result<()> {
    let text = render_network(net, Some(path))?;
    std::fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))
}
