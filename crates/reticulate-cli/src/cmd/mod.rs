pub mod check;
pub mod lsa;
pub mod normalize;
pub mod stats;

use std::collections::HashMap;

use reticulate_core::document::NamedNetwork;
use reticulate_core::network::NodeIndex;

/// Reverse of [`NamedNetwork::by_name`], so reports use document names.
pub fn names_by_index(named: &NamedNetwork) -> HashMap<NodeIndex, String> {
    named
        .by_name
        .iter()
        .map(|(name, &v)| (v, name.clone()))
        .collect()
}

/// Document name of `v`, falling back to the network's display name.
pub fn name_of(names: &HashMap<NodeIndex, String>, named: &NamedNetwork, v: NodeIndex) -> String {
    names
        .get(&v)
        .cloned()
        .unwrap_or_else(|| named.network.display_name(v))
}
