//! `rnet check` — verify a network is a single-rooted DAG.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use reticulate_core::network::{NetworkStats, require_rooted_dag};
use serde::Serialize;

use crate::cmd::{name_of, names_by_index};
use crate::input::load_network;
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

/// Arguments for `rnet check`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Network file (`.json` document or edge list).
    pub file: PathBuf,
}

#[derive(Debug, Serialize)]
struct CheckOutput {
    file: String,
    ok: bool,
    root: String,
    stats: NetworkStats,
}

/// Execute `rnet check`.
pub fn run_check(args: &CheckArgs, output: OutputMode) -> anyhow::Result<()> {
    let named = load_network(&args.file)?;
    let root = require_rooted_dag(&named.network).with_context(|| {
        format!("{} is not a single-rooted DAG", args.file.display())
    })?;
    let names = names_by_index(&named);

    let payload = CheckOutput {
        file: args.file.display().to_string(),
        ok: true,
        root: name_of(&names, &named, root),
        stats: NetworkStats::from_network(&named.network),
    };

    render_mode(output, &payload, render_check_text, render_check_pretty)
}

fn render_check_text(payload: &CheckOutput, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(w, "ok root={} {}", payload.root, payload.stats)
}

fn render_check_pretty(payload: &CheckOutput, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, &format!("✓ {} is a single-rooted DAG", payload.file))?;
    pretty_kv(w, "root", &payload.root)?;
    pretty_kv(w, "nodes", payload.stats.node_count.to_string())?;
    pretty_kv(w, "edges", payload.stats.edge_count.to_string())?;
    pretty_kv(w, "reticulations", payload.stats.reticulation_count.to_string())?;
    pretty_kv(w, "leaves", payload.stats.leaf_count.to_string())
}
