//! notecrate CLI — reconcile an RO-Crate metadata graph against the notebook
//! collection in a directory.

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use notecrate_core::{CrateSession, SessionConfig};

/// Keep an RO-Crate metadata graph in sync with a notebook collection.
#[derive(Parser, Debug)]
#[command(name = "notecrate", about, long_about = None, disable_version_flag = true)]
struct Cli {
    /// Crate directory to reconcile
    #[arg(short, long, default_value = ".")]
    dir: PathBuf,

    /// New version number; stamps the crate root and records an UpdateAction
    #[arg(long)]
    version: Option<String>,

    /// Abort on the first notebook failure instead of continuing the batch
    #[arg(long)]
    fail_fast: bool,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let mut config = SessionConfig::new(&cli.dir);
    config.version = cli.version;
    config.fail_fast = cli.fail_fast;

    let session = CrateSession::new(config)?;
    let summary = session.run()?;

    if !cli.quiet {
        println!(
            "reconciled {}: {} notebook(s) processed, {} failed, {} node(s) in graph",
            cli.dir.display(),
            summary.notebooks_processed,
            summary.notebooks_failed,
            summary.graph_nodes,
        );
    }
    Ok(())
}
