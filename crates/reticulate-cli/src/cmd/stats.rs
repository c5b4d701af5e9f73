//! `rnet stats` — shape summary and content hash.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use reticulate_core::network::{NetworkStats, is_dag};
use serde::Serialize;

use crate::input::load_network;
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

/// Arguments for `rnet stats`.
#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Network file (`.json` document or edge list).
    pub file: PathBuf,
}

/// Report payload for `rnet stats`.
#[derive(Debug, Serialize)]
pub struct StatsOutput {
    pub file: String,
    pub content_hash: String,
    pub is_dag: bool,
    pub is_tree: bool,
    #[serde(flatten)]
    pub stats: NetworkStats,
}

/// Execute `rnet stats`. Works on any parsable network, cyclic or not.
pub fn run_stats(args: &StatsArgs, output: OutputMode) -> anyhow::Result<()> {
    let named = load_network(&args.file)?;
    let net = &named.network;
    let stats = NetworkStats::from_network(net);

    let payload = StatsOutput {
        file: args.file.display().to_string(),
        content_hash: net.content_hash(),
        is_dag: is_dag(net),
        is_tree: stats.is_tree(),
        stats,
    };

    render_mode(output, &payload, render_stats_text, render_stats_pretty)
}

fn render_stats_text(payload: &StatsOutput, w: &mut dyn Write) -> std::io::Result<()> {
    let s = &payload.stats;
    writeln!(
        w,
        "{} roots={} leaves={} labelled={} max_in={} max_out={} dag={} tree={} hash={}",
        s,
        s.root_count,
        s.leaf_count,
        s.labelled_count,
        s.max_in_degree,
        s.max_out_degree,
        payload.is_dag,
        payload.is_tree,
        payload.content_hash
    )
}

fn render_stats_pretty(payload: &StatsOutput, w: &mut dyn Write) -> std::io::Result<()> {
    let s = &payload.stats;
    pretty_section(w, &format!("Network {}", payload.file))?;
    pretty_kv(w, "nodes", s.node_count.to_string())?;
    pretty_kv(w, "edges", s.edge_count.to_string())?;
    pretty_kv(w, "roots", s.root_count.to_string())?;
    pretty_kv(w, "leaves", s.leaf_count.to_string())?;
    pretty_kv(w, "reticulations", s.reticulation_count.to_string())?;
    pretty_kv(w, "labelled", s.labelled_count.to_string())?;
    pretty_kv(
        w,
        "max degree",
        format!("in {} / out {}", s.max_in_degree, s.max_out_degree),
    )?;
    pretty_kv(w, "acyclic", if payload.is_dag { "yes" } else { "no" })?;
    pretty_kv(w, "tree", if payload.is_tree { "yes" } else { "no" })?;
    pretty_kv(w, "hash", &payload.content_hash)
}
