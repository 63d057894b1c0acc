//! # Travelogue CLI (`travelog`)
//!
//! ## Usage
//!
//! ```bash
//! travelog [--config ./travelog.toml] [-v] <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `travelog build [ROOT]` | Build the travelogue and write one GeoJSON file per day |
//! | `travelog summary [ROOT]` | Print the date range, per-day counts and artifacts |
//! | `travelog classify [ROOT]` | Print each file's sniffed MIME type and kind |
//!
//! Logs go to stderr; `RUST_LOG` overrides the level chosen by `-v`.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use travelogue::builder::build_travelogue;
use travelogue::classify::classify;
use travelogue::config::{self, Config};
use travelogue::export::write_documents;
use travelogue::summary::summarize;
use travelogue::walker::scan_directory;

/// Travelogue: turn a folder of GPX tracks, photos and videos into a
/// day-by-day GeoJSON timeline.
#[derive(Parser)]
#[command(name = "travelog", version, about)]
struct Cli {
    /// Path to a configuration file (TOML). Defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log per-file progress.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the travelogue and write one feature collection per day.
    Build {
        /// Directory to scan. Overrides `[input].root`.
        root: Option<PathBuf>,

        /// Output directory. Overrides `[output].dir`.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Print the date range, per-day counts and one line per artifact.
    Summary {
        /// Directory to scan. Overrides `[input].root`.
        root: Option<PathBuf>,

        /// Emit JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Print the sniffed MIME type and kind of every file.
    Classify {
        /// Directory to scan. Overrides `[input].root`.
        root: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn load(cli_config: Option<&PathBuf>, root: Option<PathBuf>) -> Result<Config> {
    let mut cfg = match cli_config {
        Some(path) => config::load_config(path)?,
        None => Config::minimal(),
    };
    if let Some(root) = root {
        cfg.input.root = root;
    }
    Ok(cfg)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Build { root, out } => {
            let mut cfg = load(cli.config.as_ref(), root)?;
            if let Some(out) = out {
                cfg.output.dir = out;
            }
            let (travelogue, stats) = build_travelogue(&cfg)?;
            let written = write_documents(&travelogue, &cfg.output)?;
            info!(
                "{} artifacts in {} days ({} unsupported, {} failed)",
                stats.inserted,
                travelogue.day_count(),
                stats.unsupported,
                stats.failed
            );

            println!("build {}", cfg.input.root.display());
            println!("  files scanned: {}", stats.scanned);
            println!("  artifacts: {}", stats.inserted);
            println!("  undated: {}", travelogue.undated().len());
            println!("  unsupported: {}", stats.unsupported);
            println!("  failed: {}", stats.failed);
            println!("  documents written: {}", written.len());
            for path in &written {
                println!("    {}", path.display());
            }
            println!("ok");
        }
        Commands::Summary { root, json } => {
            let cfg = load(cli.config.as_ref(), root)?;
            let (travelogue, _) = build_travelogue(&cfg)?;
            let summary = summarize(&travelogue);
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print!("{}", summary);
            }
        }
        Commands::Classify { root } => {
            let cfg = load(cli.config.as_ref(), root)?;
            for record in scan_directory(&cfg.input)? {
                let kind = classify(&record.path, &record.mime_type);
                println!(
                    "{:<12} {:<28} {}",
                    kind.as_str(),
                    record.mime_type,
                    record.path.display()
                );
            }
        }
    }

    Ok(())
}
