//! `rnet normalize` — reduce a network onto its essential nodes.

use std::collections::HashSet;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::Args;
use reticulate_core::config::ProjectConfig;
use reticulate_core::document::{NamedNetwork, NetworkDocument};
use reticulate_core::network::{NetworkStats, NodeData, NodeIndex};
use reticulate_core::normalize::{
    EssentialNodes, ExplicitNodes, LabelledNodes, NormalizeOptions, RootAndLeaves, normalize_with,
};
use serde::Serialize;
use tracing::info;

use crate::input::{load_network, write_network};
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

/// Arguments for `rnet normalize`.
#[derive(Args, Debug, Default)]
pub struct NormalizeArgs {
    /// Network file (`.json` document or edge list).
    pub file: PathBuf,

    /// Also keep the node with this label (repeatable).
    #[arg(long = "keep", value_name = "LABEL")]
    pub keep: Vec<String>,

    /// Keep every labelled node, not just the root and the leaves.
    #[arg(long)]
    pub keep_labelled: bool,

    /// Skip transitive-edge reduction.
    #[arg(long)]
    pub no_reduce: bool,

    /// Skip pass-through node suppression.
    #[arg(long)]
    pub no_suppress: bool,

    /// Write the normalized network here instead of printing it.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

impl NormalizeArgs {
    /// Config defaults overridden by flags.
    fn options(&self, config: &ProjectConfig) -> NormalizeOptions {
        let mut options = NormalizeOptions::from(&config.normalize);
        if self.no_reduce {
            options.reduce_transitive = false;
        }
        if self.no_suppress {
            options.suppress_pass_through = false;
        }
        options
    }

    /// Essential nodes: root and leaves, optionally every labelled node,
    /// plus each `--keep` label.
    fn essential(
        &self,
        named: &NamedNetwork,
        config: &ProjectConfig,
    ) -> anyhow::Result<ExplicitNodes> {
        let net = &named.network;
        let keep_labelled = self.keep_labelled || config.essential.keep_labelled;
        let mut keep: HashSet<NodeIndex> = if keep_labelled {
            LabelledNodes.essential_nodes(net)
        } else {
            RootAndLeaves.essential_nodes(net)
        };

        for label in &self.keep {
            let matches: Vec<NodeIndex> = net
                .nodes()
                .filter(|&v| net.label(v) == Some(label.as_str()))
                .collect();
            if matches.is_empty() {
                bail!("No node is labelled {label:?}");
            }
            keep.extend(matches);
        }
        Ok(ExplicitNodes(keep))
    }
}

#[derive(Debug, Serialize)]
struct ReportView {
    before: NetworkStats,
    after: NetworkStats,
    elapsed_us: u64,
    removed_transitive: usize,
    suppressed: usize,
    lost_labels: Vec<String>,
}

#[derive(Debug, Serialize)]
struct NormalizeOutput {
    input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    written_to: Option<String>,
    report: ReportView,
    #[serde(skip_serializing_if = "Option::is_none")]
    network: Option<NetworkDocument>,
}

/// Execute `rnet normalize`.
pub fn run_normalize(
    args: &NormalizeArgs,
    output: OutputMode,
    config: &ProjectConfig,
) -> anyhow::Result<()> {
    let named = load_network(&args.file)?;
    let oracle = args.essential(&named, config)?;
    let options = args.options(config);

    let normalized = normalize_with(&named.network, &oracle, &options, NodeData::clone)
        .with_context(|| format!("Cannot normalize {}", args.file.display()))?;

    if let Some(path) = &args.output {
        write_network(&normalized.network, path)?;
        info!(path = %path.display(), "wrote normalized network");
    }

    let report = normalized.report;
    let payload = NormalizeOutput {
        input: args.file.display().to_string(),
        written_to: args.output.as_ref().map(|p| p.display().to_string()),
        report: ReportView {
            before: report.before,
            after: report.after,
            elapsed_us: u64::try_from(report.elapsed.as_micros()).unwrap_or(u64::MAX),
            removed_transitive: report.removed_transitive,
            suppressed: report.suppressed,
            lost_labels: report.lost_labels,
        },
        network: args
            .output
            .is_none()
            .then(|| NetworkDocument::from_network(&normalized.network)),
    };

    render_mode(output, &payload, render_normalize_text, render_normalize_pretty)
}

fn render_normalize_text(payload: &NormalizeOutput, w: &mut dyn Write) -> std::io::Result<()> {
    let report = &payload.report;
    writeln!(w, "before {}", report.before)?;
    writeln!(w, "after {}", report.after)?;
    writeln!(
        w,
        "removed_transitive={} suppressed={} lost_labels={}",
        report.removed_transitive,
        report.suppressed,
        report.lost_labels.len()
    )?;
    if let Some(path) = &payload.written_to {
        writeln!(w, "written {path}")?;
    }
    if let Some(doc) = &payload.network {
        write!(w, "{}", doc.to_edge_list())?;
    }
    Ok(())
}

fn render_normalize_pretty(payload: &NormalizeOutput, w: &mut dyn Write) -> std::io::Result<()> {
    let report = &payload.report;
    pretty_section(w, &format!("Normalized {}", payload.input))?;
    pretty_kv(w, "before", report.before.to_string())?;
    pretty_kv(w, "after", report.after.to_string())?;
    pretty_kv(w, "transitive", format!("{} edges removed", report.removed_transitive))?;
    pretty_kv(w, "pass-through", format!("{} nodes suppressed", report.suppressed))?;
    pretty_kv(w, "elapsed", format!("{}µs", report.elapsed_us))?;
    if !report.lost_labels.is_empty() {
        pretty_kv(w, "lost labels", report.lost_labels.join(", "))?;
    }
    if let Some(path) = &payload.written_to {
        pretty_kv(w, "written to", path)?;
    }
    if let Some(doc) = &payload.network {
        writeln!(w)?;
        pretty_section(w, "Network")?;
        write!(w, "{}", doc.to_edge_list())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use reticulate_core::network::PhyloNetwork;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: NormalizeArgs,
    }

    fn named(edges: &[(&str, &str)]) -> NamedNetwork {
        let net = PhyloNetwork::from_edges(edges);
        NetworkDocument::from_network(&net)
            .to_network()
            .expect("valid document")
    }

    #[test]
    fn flags_override_config() {
        let parsed = Wrapper::parse_from([
            "test",
            "net.txt",
            "--no-reduce",
            "--keep",
            "A",
            "--keep",
            "B",
        ]);
        let options = parsed.args.options(&ProjectConfig::default());

        assert!(!options.reduce_transitive);
        assert!(options.suppress_pass_through);
        assert_eq!(parsed.args.keep, vec!["A", "B"]);
    }

    #[test]
    fn keep_adds_labelled_nodes() {
        let net = named(&[("R", "X"), ("X", "L")]);
        let args = NormalizeArgs {
            keep: vec!["X".to_string()],
            ..NormalizeArgs::default()
        };
        let oracle = args
            .essential(&net, &ProjectConfig::default())
            .expect("known label");
        assert_eq!(oracle.0.len(), 3);
    }

    #[test]
    fn unknown_keep_label_is_an_error() {
        let net = named(&[("R", "X")]);
        let args = NormalizeArgs {
            keep: vec!["nope".to_string()],
            ..NormalizeArgs::default()
        };
        let err = args
            .essential(&net, &ProjectConfig::default())
            .expect_err("unknown label");
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn config_can_keep_labelled_nodes() {
        let net = named(&[("R", "X"), ("X", "L")]);
        let mut config = ProjectConfig::default();
        config.essential.keep_labelled = true;

        let oracle = NormalizeArgs::default()
            .essential(&net, &config)
            .expect("oracle");
        assert_eq!(oracle.0.len(), 3);
    }
}
