//! Configuration for the ridgeline heightmap generator.
//!
//! Output and generation defaults persist to disk as a RON file next to the
//! user's other settings. Command-line arguments override individual values
//! for a single run.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    Config, DebugConfig, GenerationConfig, OutputConfig, OutputFormat, default_config_dir,
};
pub use error::ConfigError;
