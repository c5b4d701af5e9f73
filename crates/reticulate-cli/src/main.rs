#![forbid(unsafe_code)]

mod cmd;
mod input;
mod output;

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use output::{OutputMode, cli_error_from, render_error, resolve_output_mode};
use reticulate_core::config::{EffectiveConfig, resolve_config};
use reticulate_core::error::ErrorCode;
use reticulate_core::timing;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "rnet: lowest stable ancestors and normalization for phylogenetic networks",
    long_about = None
)]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit phase timing report to stderr.
    #[arg(long, global = true)]
    timing: bool,

    /// Output format (defaults to pretty on a terminal, text when piped).
    #[arg(long, value_enum, global = true)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    /// Read configuration from this file instead of reticulate.toml.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self, config_format: Option<&str>) -> OutputMode {
        resolve_output_mode(self.format, self.json, config_format)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Check that a network is a single-rooted DAG",
        long_about = "Load a network and verify it has exactly one root and no directed cycle.",
        after_help = "EXAMPLES:\n    # Validate an edge list\n    rnet check net.txt\n\n    \
                      # Emit machine-readable output\n    rnet check net.json --format json"
    )]
    Check(cmd::check::CheckArgs),

    #[command(
        about = "Compute lowest stable ancestors",
        long_about = "Resolve the lowest stable ancestor of every reticulation and print the \
                      LSA tree.",
        after_help = "EXAMPLES:\n    # LSA of each reticulation plus the tree\n    \
                      rnet lsa net.txt\n\n    # Reticulations only, as plain lines\n    \
                      rnet lsa net.txt --no-tree --format text"
    )]
    Lsa(cmd::lsa::LsaArgs),

    #[command(
        about = "Normalize a network onto its essential nodes",
        long_about = "Restrict a network to its essential nodes, drop transitive edges and \
                      suppress pass-through nodes.",
        after_help = "EXAMPLES:\n    # Keep only the root and the leaves\n    \
                      rnet normalize net.txt\n\n    \
                      # Also keep labelled internal nodes, write the result\n    \
                      rnet normalize net.json --keep-labelled -o reduced.json\n\n    \
                      # Keep one extra node, skip suppression\n    \
                      rnet normalize net.txt --keep H1 --no-suppress"
    )]
    Normalize(cmd::normalize::NormalizeArgs),

    #[command(
        about = "Summarize a network",
        long_about = "Print node, edge and degree counts plus a content hash. Works on cyclic \
                      input.",
        after_help = "EXAMPLES:\n    # Summary\n    rnet stats net.txt\n\n    \
                      # Emit machine-readable output\n    rnet stats net.txt --format json"
    )]
    Stats(cmd::stats::StatsArgs),
}

fn init_tracing(verbosity: u8) {
    let filter = EnvFilter::try_from_env("RETICULATE_LOG").unwrap_or_else(|_| {
        EnvFilter::new(match verbosity {
            0 if env::var("DEBUG").is_err() => "reticulate_core=info,rnet=info,warn",
            0 | 1 => "reticulate_core=debug,rnet=debug,info",
            _ => "reticulate_core=trace,rnet=trace,info",
        })
    });

    let format = env::var("RETICULATE_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    // stdout carries command output; logs always go to stderr.
    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<EffectiveConfig> {
    let project_root = env::current_dir().context("Cannot determine the working directory")?;
    let effective = resolve_config(cli.config.as_deref(), &project_root)
        .context(ErrorCode::ConfigParseError)?;
    debug!(source = ?effective.source, "resolved configuration");
    Ok(effective)
}

fn run(cli: &Cli, output: OutputMode, effective: &EffectiveConfig) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Check(args) => {
            timing::timed("cmd.check", || cmd::check::run_check(args, output))
        }
        Commands::Lsa(args) => timing::timed("cmd.lsa", || cmd::lsa::run_lsa(args, output)),
        Commands::Normalize(args) => timing::timed("cmd.normalize", || {
            cmd::normalize::run_normalize(args, output, &effective.config)
        }),
        Commands::Stats(args) => {
            timing::timed("cmd.stats", || cmd::stats::run_stats(args, output))
        }
    }
}

fn report_failure(output: OutputMode, err: &anyhow::Error) {
    if render_error(output, &cli_error_from(err)).is_err() {
        eprintln!("error: {err:#}");
    }
}

fn emit_timing_report() {
    let report = timing::collect_report();
    if report.is_empty() {
        eprintln!("timing report: no samples recorded");
        return;
    }
    eprintln!("timing report:");
    eprintln!("{}", report.display_table());
    if let Ok(json) = serde_json::to_string_pretty(&report.to_json()) {
        eprintln!("timing report (json):");
        eprintln!("{json}");
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let timing_enabled = cli.timing || timing::timing_enabled_from_env();
    timing::set_timing_enabled(timing_enabled);

    let effective = match load_config(&cli) {
        Ok(effective) => effective,
        Err(err) => {
            report_failure(cli.output_mode(None), &err);
            return ExitCode::FAILURE;
        }
    };
    let output = cli.output_mode(effective.config.output.format.as_deref());

    let result = run(&cli, output, &effective);

    if timing_enabled {
        emit_timing_report();
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_failure(output, &err);
            ExitCode::FAILURE
        }
    }
}
