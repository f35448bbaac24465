use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use graph::export;
use graph::pipeline;
use graph::{ExtractMode, FigureBuilder, GitvizConfig, LaneLayout};
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::Level;

#[derive(Parser)]
#[command(name = "gitviz")]
#[command(about = "Lay out a git commit graph for drawing", long_about = None)]
struct Cli {
    /// Config file (defaults to gitviz.toml in the repository or table directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More logging on stderr; repeat for more
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Source {
    /// Path to the repository
    #[arg(default_value = ".")]
    path: PathBuf,
    /// Only take the N most recent commits of the active branch
    #[arg(short, long)]
    recent: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print node and edge positions as JSON
    Layout {
        #[command(flatten)]
        source: Source,
    },
    /// Print a plotly-style figure as JSON
    Figure {
        #[command(flatten)]
        source: Source,
    },
    /// Write commits.csv and edges.csv
    Export {
        #[command(flatten)]
        source: Source,
        /// Output directory
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },
    /// Lay out a previously exported graph
    Import {
        /// Directory holding commits.csv and edges.csv
        dir: PathBuf,
        /// Print the figure instead of the layout
        #[arg(long)]
        figure: bool,
    },
    /// Print graph statistics
    Stats {
        #[command(flatten)]
        source: Source,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
}

fn load_config(explicit: Option<&Path>, dir: &Path) -> Result<GitvizConfig> {
    match explicit {
        Some(path) => GitvizConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display())),
        None => GitvizConfig::discover(dir)
            .with_context(|| format!("Failed to load config from {}", dir.display())),
    }
}

fn mode_for(source: &Source, config: &GitvizConfig) -> ExtractMode {
    match source.recent {
        Some(n) => ExtractMode::Recent(n),
        None => config.extract.mode(),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

fn export_summary(dag: &graph::Dag, out: &Path) -> String {
    format!(
        "Wrote {} commits and {} edges to {}",
        dag.node_count(),
        dag.edge_count(),
        out.display()
    )
}

fn extract(source: &Source, config: &GitvizConfig) -> Result<graph::Dag> {
    pipeline::extract_path(&source.path, mode_for(source, config))
        .with_context(|| format!("Failed to extract history from {}", source.path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let explicit_config = cli.config.as_deref();

    match cli.command {
        Commands::Layout { source } => {
            let config = load_config(explicit_config, &source.path)?;
            let dag = extract(&source, &config)?;
            let layout = LaneLayout::new(config.layout).layout(&dag)?;
            print_json(&layout)?;
        }
        Commands::Figure { source } => {
            let config = load_config(explicit_config, &source.path)?;
            let dag = extract(&source, &config)?;
            let layout = LaneLayout::new(config.layout).layout(&dag)?;
            print_json(&FigureBuilder::new(config.figure).build(&layout))?;
        }
        Commands::Export { source, out } => {
            let config = load_config(explicit_config, &source.path)?;
            let dag = extract(&source, &config)?;
            export::export_dir(&dag, &out)
                .with_context(|| format!("Failed to export to {}", out.display()))?;
            println!("{}", export_summary(&dag, &out));
        }
        Commands::Import { dir, figure } => {
            let config = load_config(explicit_config, &dir)?;
            let dag = export::import_dir(&dir)
                .with_context(|| format!("Failed to import {}", dir.display()))?;
            let layout = LaneLayout::new(config.layout).layout(&dag)?;
            if figure {
                print_json(&FigureBuilder::new(config.figure).build(&layout))?;
            } else {
                print_json(&layout)?;
            }
        }
        Commands::Stats { source } => {
            let config = load_config(explicit_config, &source.path)?;
            let dag = extract(&source, &config)?;
            print_json(&dag.stats())?;
        }
    }

    Ok(())
}
