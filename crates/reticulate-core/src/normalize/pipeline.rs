//! End-to-end normalization of a phylogenetic network.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::time::{Duration, Instant};

use petgraph::stable_graph::NodeIndex;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::error::NetworkError;
use crate::network::{NetworkStats, NodeData, PhyloNetwork, require_rooted_dag};
use crate::normalize::essential::EssentialNodes;
use crate::normalize::reduce::{
    VisibilityBelow, reduce_transitive_single_pass, suppress_pass_through, visibility_below,
};
use crate::timing::timed;

/// Switches for the optional normalization phases.
///
/// The defaults run every phase. Unlabelled pass-through nodes are
/// contracted; labelled ones are essential nodes carrying information and
/// stay, so `R → A, R → B, A → B` reduces to `R → A → B`. Set
/// `keep_labelled_pass_through` to `false` to contract those too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeOptions {
    pub reduce_transitive: bool,
    pub suppress_pass_through: bool,
    pub keep_labelled_pass_through: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            reduce_transitive: true,
            suppress_pass_through: true,
            keep_labelled_pass_through: true,
        }
    }
}

/// Diagnostics gathered during one normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizeReport {
    pub before: NetworkStats,
    pub after: NetworkStats,
    pub elapsed: Duration,
    /// Non-empty input labels absent from the output, sorted.
    pub lost_labels: Vec<String>,
    pub removed_transitive: usize,
    pub suppressed: usize,
}

/// Result of [`normalize`]: an independent network plus the node mapping.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub network: PhyloNetwork,
    /// Original node → its copy, for copies that survived suppression.
    pub copy_of: HashMap<NodeIndex, NodeIndex>,
    pub report: NormalizeReport,
}

/// Normalize `net` with default options, cloning node payloads.
///
/// # Errors
///
/// See [`normalize_with`].
pub fn normalize<O>(net: &PhyloNetwork, oracle: &O) -> Result<Normalized, NetworkError>
where
    O: EssentialNodes + ?Sized,
{
    normalize_with(net, oracle, &NormalizeOptions::default(), NodeData::clone)
}

/// Build a reduced network over the essential nodes of `net`.
///
/// Steps:
/// 1. Copy every essential node (oracle result ∪ leaves) through `copy`.
/// 2. Compute each node's essential descendants.
/// 3. Add `copy(v) → copy(w)` for every essential `v` and every essential
///    descendant `w`, giving the reachability closure on essential nodes.
/// 4. Remove transitive edges with a single local pass.
/// 5. Contract pass-through nodes until none that is eligible is left.
///
/// Lost labels are reported at `info` level; they are not an error. The
/// input network is never modified.
///
/// # Errors
///
/// Checked before any work: [`NetworkError::NoRoot`],
/// [`NetworkError::MultipleRoots`], [`NetworkError::NotAcyclic`],
/// [`NetworkError::UnknownNode`] for oracle nodes outside `net`, and
/// [`NetworkError::RootNotEssential`].
#[instrument(skip_all, fields(nodes = net.node_count(), edges = net.edge_count()))]
pub fn normalize_with<O, F>(
    net: &PhyloNetwork,
    oracle: &O,
    options: &NormalizeOptions,
    mut copy: F,
) -> Result<Normalized, NetworkError>
where
    O: EssentialNodes + ?Sized,
    F: FnMut(&NodeData) -> NodeData,
{
    let started = Instant::now();
    let root = require_rooted_dag(net)?;

    let mut essential = oracle.essential_nodes(net);
    if let Some(unknown) = essential
        .iter()
        .copied()
        .filter(|&v| !net.contains_node(v))
        .min()
    {
        return Err(NetworkError::UnknownNode(unknown));
    }
    if !essential.contains(&root) {
        return Err(NetworkError::RootNotEssential(root));
    }
    essential.extend(net.leaves());

    let before = NetworkStats::from_network(net);
    let visibility = timed("normalize.visibility", || visibility_below(net, &essential))?;
    let (mut network, mut copy_of) = timed("normalize.closure", || {
        build_closure(net, &visibility, &mut copy)
    });

    let removed_transitive = if options.reduce_transitive {
        timed("normalize.reduce", || reduce_transitive_single_pass(&mut network))
    } else {
        0
    };

    let suppressed = if options.suppress_pass_through {
        timed("normalize.suppress", || {
            suppress_pass_through(&mut network, options.keep_labelled_pass_through)
        })
    } else {
        0
    };
    copy_of.retain(|_, copy| network.contains_node(*copy));

    let lost_labels = lost_labels(net, &network);
    if !lost_labels.is_empty() {
        info!(
            count = lost_labels.len(),
            "normalization dropped labels of non-essential nodes"
        );
    }

    let after = NetworkStats::from_network(&network);
    let elapsed = started.elapsed();
    info!(
        %before,
        %after,
        removed_transitive,
        suppressed,
        elapsed_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX),
        "normalized network"
    );

    Ok(Normalized {
        network,
        copy_of,
        report: NormalizeReport {
            before,
            after,
            elapsed,
            lost_labels,
            removed_transitive,
            suppressed,
        },
    })
}

/// Copy the essential nodes and join each to all its essential descendants.
fn build_closure<F>(
    net: &PhyloNetwork,
    visibility: &VisibilityBelow,
    copy: &mut F,
) -> (PhyloNetwork, HashMap<NodeIndex, NodeIndex>)
where
    F: FnMut(&NodeData) -> NodeData,
{
    let mut out = PhyloNetwork::new();
    let mut copy_of: HashMap<NodeIndex, NodeIndex> =
        HashMap::with_capacity(visibility.essential().len());

    for &v in visibility.essential() {
        let data = net.node_data(v).map(&mut *copy).unwrap_or_default();
        copy_of.insert(v, out.add_node(data));
    }

    for &v in visibility.essential() {
        let source = copy_of[&v];
        for w in visibility.visible_from(v) {
            out.add_edge(source, copy_of[&w]);
        }
    }

    (out, copy_of)
}

fn lost_labels(input: &PhyloNetwork, output: &PhyloNetwork) -> Vec<String> {
    let kept: HashSet<&str> = output.nodes().filter_map(|v| output.label(v)).collect();
    input
        .nodes()
        .filter_map(|v| input.label(v))
        .filter(|label| !kept.contains(label))
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
