//! `propagator` CLI entry-point.
//!
//! Available sub-commands:
//! - `run`: run one propagation pass over a manifest.
//! - `order`: print the order resources would be processed in.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use engine::BlockLevel;
use propagator_cli::{report, Manifest};

#[derive(Parser)]
#[command(
    name = "propagator",
    about = "Incremental build/update propagation over a dependency graph",
    version
)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build or update every resource of a manifest, in dependency order.
    Run {
        /// Path to the manifest JSON file.
        manifest: PathBuf,
        /// 0: never stop early, 1: stop on real failures, 2: stop on any error.
        #[arg(long, env = "PROPAGATOR_BLOCK_LEVEL", default_value_t = BlockLevel::Never)]
        block_level: BlockLevel,
        /// Print the history as JSON instead of a numbered list.
        #[arg(long)]
        json: bool,
    },
    /// Print the topological order of a manifest's resources.
    Order {
        /// Path to the manifest JSON file.
        manifest: PathBuf,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Run {
            manifest,
            block_level,
            json,
        } => {
            let mut propagator = load(&manifest)?;

            info!("Running propagator (block level {block_level})");
            let outcome = propagator.run(block_level);

            let history = propagator.history();
            if json {
                println!("{}", report::render_json(history)?);
            } else if !history.is_empty() {
                println!("History:\n");
                print!("{}", report::render_text(history));
            }

            match outcome {
                Ok(()) => {
                    println!("\n... OK");
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    eprintln!("\n... KO. {e}.");
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Command::Order { manifest } => {
            let propagator = load(&manifest)?;
            match propagator.graph().topological_order() {
                Ok(order) => {
                    println!("Execution order: {order:?}");
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    eprintln!("Invalid graph: {e}");
                    Ok(ExitCode::FAILURE)
                }
            }
        }
    }
}

fn load(path: &Path) -> anyhow::Result<engine::Propagator> {
    let manifest = Manifest::load(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    manifest
        .into_propagator(base_dir)
        .with_context(|| format!("cannot register resources of {}", path.display()))
}
