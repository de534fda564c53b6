//! Command-line argument parsing for the heightmap generator.

use std::path::PathBuf;

use clap::Parser;

use crate::{Config, OutputFormat};

/// Ridgeline command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug)]
#[command(name = "ridgeline", about = "Generates heightmaps from JSON layer scripts")]
pub struct CliArgs {
    /// Layer script to evaluate.
    pub script: PathBuf,

    /// Output width in pixels (defaults to the script's native resolution).
    #[arg(long)]
    pub width: Option<u32>,

    /// Output height in pixels (defaults to the script's native resolution).
    #[arg(long)]
    pub height: Option<u32>,

    /// Output file path.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output encoding.
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Worker threads per layer (0 = all hardware threads).
    #[arg(long)]
    pub threads: Option<usize>,

    /// Evaluate every layer on the calling thread.
    #[arg(long)]
    pub sequential: bool,

    /// Keep raw heights instead of rescaling to [0, 1].
    #[arg(long)]
    pub no_normalize: bool,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(w) = args.width {
            self.output.width = w;
        }
        if let Some(h) = args.height {
            self.output.height = h;
        }
        if let Some(ref path) = args.output {
            self.output.path = path.clone();
        }
        if let Some(format) = args.format {
            self.output.format = format;
        }
        if let Some(threads) = args.threads {
            self.generation.threads = threads;
        }
        if args.sequential {
            self.generation.sequential = true;
        }
        if args.no_normalize {
            self.generation.normalize = false;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
