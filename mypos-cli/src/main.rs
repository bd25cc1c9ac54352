//! my-position CLI - Inventory conversations, notes and documents
//!
//! Usage:
//!   my-position extract <input-dir> [--max-size BYTES] [--ext EXT]... [--follow-symlinks]
//!                                   [--threads N] [--config FILE] [--json]

mod report;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mypos_core::{ScanConfig, Scanner};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "my-position")]
#[command(about = "Synthesize positions from conversations, notes, and documents", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract and categorize files from an input directory
    Extract(ExtractArgs),
}

#[derive(Debug, clap::Args)]
struct ExtractArgs {
    /// Directory containing conversations/, notes/, and documents/ subdirectories
    input_dir: PathBuf,

    /// JSON configuration file (command-line flags override it)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Maximum file size in bytes
    #[arg(long, value_name = "BYTES")]
    max_size: Option<u64>,

    /// Accepted extension (repeatable, replaces the default list)
    #[arg(long = "ext", value_name = "EXT")]
    extensions: Vec<String>,

    /// Descend into symlinked directories
    #[arg(long)]
    follow_symlinks: bool,

    /// Number of worker threads for validation and hashing
    #[arg(short = 'j', long)]
    threads: Option<usize>,

    /// Print the full result as JSON instead of a summary
    #[arg(long)]
    json: bool,
}

impl ExtractArgs {
    /// Build the scan configuration: defaults, then config file, then flags
    fn scan_config(&self) -> Result<ScanConfig> {
        let mut config = match &self.config {
            Some(path) => ScanConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => ScanConfig::default(),
        };

        if let Some(max_size) = self.max_size {
            config = config.with_max_size_bytes(max_size);
        }
        if !self.extensions.is_empty() {
            config = config.with_extensions(self.extensions.clone());
        }
        if self.follow_symlinks {
            config = config.with_follow_symlinks(true);
        }
        if let Some(threads) = self.threads {
            config = config.with_threads(threads);
        }

        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Extract(args) => run_extract(&args),
    }
}

fn run_extract(args: &ExtractArgs) -> Result<()> {
    let config = args.scan_config()?;
    tracing::debug!("Scan config: {:?}", config);

    let start = Instant::now();

    let result = Scanner::new(&args.input_dir, config)
        .context("Invalid scan configuration")?
        .scan()
        .with_context(|| format!("Failed to scan {}", args.input_dir.display()))?;

    if args.json {
        println!("{}", report::to_json(&result)?);
        return Ok(());
    }

    print_header(&args.input_dir);
    report::print_summary(&result);

    println!("Done in {:.2}s", start.elapsed().as_secs_f64());
    println!();

    Ok(())
}

fn print_header(input_dir: &Path) {
    println!();
    println!("Scanning {} ...", input_dir.display());
    println!();
}
