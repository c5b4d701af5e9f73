//! `rnet lsa` — lowest stable ancestors and the LSA tree.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use reticulate_core::lsa::LsaTree;
use reticulate_core::network::NodeIndex;
use serde::Serialize;

use crate::cmd::{name_of, names_by_index};
use crate::input::load_network;
use crate::output::{OutputMode, pretty_rule, pretty_section, render_mode};

/// Arguments for `rnet lsa`.
#[derive(Args, Debug)]
pub struct LsaArgs {
    /// Network file (`.json` document or edge list).
    pub file: PathBuf,

    /// Only list reticulations, skip the tree.
    #[arg(long)]
    pub no_tree: bool,
}

#[derive(Debug, Serialize)]
struct LsaEntry {
    reticulation: String,
    lsa: String,
}

#[derive(Debug, Serialize)]
struct TreeRow {
    node: String,
    depth: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent: Option<String>,
}

#[derive(Debug, Serialize)]
struct LsaOutput {
    root: String,
    reticulations: Vec<LsaEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tree: Vec<TreeRow>,
}

/// Execute `rnet lsa`.
pub fn run_lsa(args: &LsaArgs, output: OutputMode) -> anyhow::Result<()> {
    let named = load_network(&args.file)?;
    let tree = LsaTree::build(&named.network)
        .with_context(|| format!("Cannot resolve ancestors in {}", args.file.display()))?;
    let names = names_by_index(&named);
    let name = |v: NodeIndex| name_of(&names, &named, v);

    let reticulations = tree
        .lsa_map()
        .iter()
        .map(|(&r, &a)| LsaEntry {
            reticulation: name(r),
            lsa: name(a),
        })
        .collect();

    let rows = if args.no_tree {
        Vec::new()
    } else {
        tree.preorder()
            .into_iter()
            .map(|v| TreeRow {
                node: name(v),
                depth: tree.depth_of(v).unwrap_or_default(),
                parent: tree.parent_of(v).map(name),
            })
            .collect()
    };

    let payload = LsaOutput {
        root: name(tree.root()),
        reticulations,
        tree: rows,
    };

    render_mode(output, &payload, render_lsa_text, render_lsa_pretty)
}

fn render_lsa_text(payload: &LsaOutput, w: &mut dyn Write) -> std::io::Result<()> {
    for entry in &payload.reticulations {
        writeln!(w, "lsa {} {}", entry.reticulation, entry.lsa)?;
    }
    for row in &payload.tree {
        match &row.parent {
            Some(parent) => writeln!(w, "tree {} {} {}", row.depth, row.node, parent)?,
            None => writeln!(w, "tree {} {}", row.depth, row.node)?,
        }
    }
    Ok(())
}

fn render_lsa_pretty(payload: &LsaOutput, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(
        w,
        &format!("Lowest stable ancestors ({})", payload.reticulations.len()),
    )?;
    if payload.reticulations.is_empty() {
        writeln!(w, "No reticulations: the network is a tree.")?;
    }
    for entry in &payload.reticulations {
        writeln!(w, "  {:<16} → {}", entry.reticulation, entry.lsa)?;
    }

    if payload.tree.is_empty() {
        return Ok(());
    }
    writeln!(w)?;
    pretty_section(w, &format!("LSA tree (root {})", payload.root))?;
    for row in &payload.tree {
        writeln!(w, "{}{}", "  ".repeat(row.depth), row.node)?;
    }
    pretty_rule(w)
}
