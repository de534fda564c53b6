//! Command-line heightmap generator.
//!
//! Evaluates a JSON layer script and writes the heightmap to disk.
//! Settings come from `config.ron` and can be overridden per run:
//! `ridgeline terrain.json --width 1024 --height 1024 -o terrain.png`.

mod error;
mod export;
mod generate;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use ridgeline_config::{CliArgs, Config, default_config_dir};
use tracing::error;

fn main() -> ExitCode {
    let args = CliArgs::parse();

    // Resolve config directory
    let config_dir = args
        .config
        .clone()
        .or_else(default_config_dir)
        .unwrap_or_else(|| PathBuf::from(".ridgeline"));

    // Load or create config, then apply CLI overrides
    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    ridgeline_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    match generate::run(&args.script, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
