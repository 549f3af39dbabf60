#![warn(missing_docs)]
//! Siftbench CLI Library
//!
//! This module provides the command-line surface of the reporting tools.
//! The `siftbench` binary aggregates previously written run directories
//! and renders them; it does not run benchmarks itself.

mod config;

pub use config::*;

use anyhow::Context;
use clap::{Parser, Subcommand};
use siftbench_core::ReportContext;
use siftbench_report::{RendererRegistry, collect, discover};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Siftbench CLI arguments
#[derive(Parser, Debug)]
#[command(name = "siftbench")]
#[command(author, version, about = "Siftbench - benchmark result reporting")]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Aggregate run directories and render a report
    Report {
        /// Target whose results to report on
        #[arg(long)]
        target: String,

        /// Run directories to aggregate; defaults to every run under the results root
        #[arg(name = "RUN_DIR")]
        run_roots: Vec<PathBuf>,

        /// Only include these instances (repeatable; default: all)
        #[arg(long = "instance")]
        instances: Vec<String>,

        /// Rendering mode; defaults to the configured one
        #[arg(long)]
        mode: Option<String>,

        /// Metadata line prefix; defaults to the configured one
        #[arg(long)]
        prefix: Option<String>,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List the available rendering modes
    Modes,
    /// Write a default sift.toml to the current directory
    Init,
}

/// Run the siftbench CLI with arguments from the environment.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run_with_cli(cli)
}

/// Run the siftbench CLI with pre-parsed arguments.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    // Initialize logging
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("siftbench=debug")
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter("siftbench=info")
            .init();
    }

    // Discover sift.toml configuration (CLI flags override)
    let config = SiftConfig::discover().unwrap_or_default();

    match cli.command {
        Commands::Report {
            target,
            run_roots,
            instances,
            mode,
            prefix,
            output,
        } => {
            let mode = mode.unwrap_or_else(|| config.report.mode.clone());
            let prefix = prefix.unwrap_or_else(|| config.report.prefix.clone());
            report_command(&config, &target, run_roots, &instances, &mode, &prefix, output)
        }
        Commands::Modes => {
            let registry = RendererRegistry::default();
            for name in registry.mode_names() {
                println!("{}", name);
            }
            Ok(())
        }
        Commands::Init => init_command(),
    }
}

fn report_command(
    config: &SiftConfig,
    target: &str,
    run_roots: Vec<PathBuf>,
    instances: &[String],
    mode: &str,
    prefix: &str,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let results_root = PathBuf::from(&config.paths.results_root);
    let run_roots = if run_roots.is_empty() {
        list_run_roots(&results_root)
            .with_context(|| format!("listing runs under {}", results_root.display()))?
    } else {
        run_roots
    };
    anyhow::ensure!(!run_roots.is_empty(), "no run directories to report on");

    let ctx = ReportContext::new(&results_root).with_prefix(prefix);

    let discovery = discover(&run_roots, target, instances)?;
    for warning in &discovery.warnings {
        eprintln!("warning: {}", warning);
    }
    let entries = collect(&ctx, &discovery.instance_dirs)?;
    tracing::debug!(
        "aggregated {} entries from {} instance directories",
        entries.len(),
        discovery.instance_dirs.len()
    );

    let registry = RendererRegistry::default();
    match output {
        Some(path) => {
            let mut file = std::fs::File::create(&path)
                .with_context(|| format!("creating {}", path.display()))?;
            registry.render(mode, &entries, &mut file)?;
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            registry.render(mode, &entries, &mut lock)?;
            lock.flush()?;
        }
    }
    Ok(())
}

/// Name-sorted `run-*` directories directly under the results root.
fn list_run_roots(results_root: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut roots = Vec::new();
    for entry in std::fs::read_dir(results_root)? {
        let entry = entry?;
        let name = entry.file_name();
        if entry.file_type()?.is_dir() && name.to_string_lossy().starts_with("run-") {
            roots.push(entry.path());
        }
    }
    roots.sort();
    Ok(roots)
}

fn init_command() -> anyhow::Result<()> {
    let path = Path::new("sift.toml");
    anyhow::ensure!(!path.exists(), "sift.toml already exists");
    std::fs::write(path, SiftConfig::default_toml()).context("writing sift.toml")?;
    println!("wrote sift.toml");
    Ok(())
}
