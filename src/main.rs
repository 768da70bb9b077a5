//! stacdash CLI
//!
//! Offline inspector over a snapshot artifact:
//! - List targets and target types
//! - Print a target's timeline, optionally windowed
//! - Show one observation
//! - Print the default configuration

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

use stacdash::config::{generate_default_config, Config};
use stacdash::dataset::Dataset;
use stacdash::range::TimeWindow;
use stacdash::stac::CatalogItem;

#[derive(Parser)]
#[command(name = "stacdash")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Inspect a stacdash collection snapshot")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search the standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Snapshot to read instead of `index.snapshot_path`
    #[arg(short, long, global = true)]
    pub snapshot: Option<PathBuf>,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List targets with their representative observation
    Targets {
        /// Only targets of this type
        #[arg(short = 't', long = "type")]
        target_type: Option<String>,
    },

    /// List target types
    Types,

    /// Print a target's observations in chronological order
    Observations {
        /// Target id
        target: String,
        /// Window start, RFC 3339 or YYYY-MM-DD
        #[arg(long)]
        start: Option<String>,
        /// Window end, RFC 3339 or YYYY-MM-DD (whole day)
        #[arg(long)]
        end: Option<String>,
    },

    /// Show one observation by id
    Show {
        observation_id: String,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Commands::Config { output } = &cli.command {
        let content = generate_default_config();
        match output {
            Some(path) => {
                std::fs::write(path, content)
                    .with_context(|| format!("writing {}", path.display()))?;
                println!("Config written to {}", path.display());
            }
            None => print!("{}", content),
        }
        return Ok(());
    }

    let mut config = Config::resolve(cli.config.as_deref())?;
    config.logging.init_subscriber();

    if let Some(snapshot) = &cli.snapshot {
        config.index.snapshot_path = snapshot.to_string_lossy().to_string();
    }

    let dataset = Dataset::load(&config.index)
        .with_context(|| format!("loading {}", config.index.snapshot_path))?;
    tracing::debug!(report = ?dataset.report, "Index built");

    let json = cli.format.eq_ignore_ascii_case("json");

    match cli.command {
        Commands::Targets { target_type } => {
            let targets: Vec<_> = dataset
                .index
                .targets()
                .filter(|t| target_type.as_deref().map_or(true, |kind| t.target_type == kind))
                .collect();

            if json {
                let representatives: Vec<_> =
                    targets.iter().filter_map(|t| t.peek_representative()).collect();
                print_json(&representatives)?;
            } else {
                println!("{:<32} {:<16} {:<24} FIRST OBSERVATION", "TARGET", "TYPE", "NAME");
                for target in targets {
                    let first = target
                        .peek_representative()
                        .map(|item| item.id.as_str())
                        .unwrap_or("-");
                    println!(
                        "{:<32} {:<16} {:<24} {}",
                        target.id, target.target_type, target.display_name, first
                    );
                }
            }
        }

        Commands::Types => {
            let types = dataset.index.target_types();
            if json {
                print_json(&types)?;
            } else {
                for kind in types {
                    let count = dataset
                        .index
                        .group(kind)
                        .map(|g| g.target_ids.len())
                        .unwrap_or(0);
                    println!("{:<24} {} targets", kind, count);
                }
            }
        }

        Commands::Observations { target, start, end } => {
            let target = dataset.index.target(&target)?;

            let observations: Vec<CatalogItem> = if start.is_some() || end.is_some() {
                let window = TimeWindow::parse(start.as_deref(), end.as_deref())?;
                target.in_window(&window)
            } else {
                target.all().into_owned()
            };

            if json {
                print_json(&observations)?;
            } else {
                for item in &observations {
                    let start = item
                        .start_time()
                        .map(|t| t.format("%Y-%m-%dT%H:%M:%SZ").to_string())
                        .unwrap_or_else(|| "-".to_string());
                    println!("{}  {}", start, item.id);
                }
                eprintln!("{} observations", observations.len());
            }
        }

        Commands::Show { observation_id } => {
            let item = dataset.index.find_observation(&observation_id)?;
            print_json(item)?;
        }

        Commands::Config { .. } => {}
    }

    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
