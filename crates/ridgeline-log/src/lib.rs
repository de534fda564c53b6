//! Structured logging for the heightmap generator.
//!
//! Console output carries uptime timestamps and thread names, so events from
//! layer workers can be told apart. Debug builds also write JSON lines to a
//! log file for later inspection.

use std::fs::File;
use std::io;
use std::path::Path;

use ridgeline_config::Config;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when neither `RUST_LOG` nor the config names one.
pub const DEFAULT_FILTER: &str = "info";

/// Name of the JSON log file written in debug builds.
pub const LOG_FILE_NAME: &str = "ridgeline.log";

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the config's `log_level`. With
/// `debug_build` set and a usable `log_dir`, events are also written as JSON
/// to [`LOG_FILE_NAME`] in that directory.
///
/// # Examples
///
/// ```no_run
/// use ridgeline_config::Config;
/// use ridgeline_log::init_logging;
///
/// let config = Config::default();
/// init_logging(Some(std::path::Path::new("./logs")), true, Some(&config));
/// ```
pub fn init_logging(log_dir: Option<&Path>, debug_build: bool, config: Option<&Config>) {
    let filter_str = filter_directive(config);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_str));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_names(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    let log_file = match log_dir {
        Some(dir) if debug_build => Some(create_log_file(dir).map_err(|err| (dir, err))),
        _ => None,
    };

    match log_file {
        Some(Ok(file)) => {
            let file_layer = fmt::layer()
                .with_writer(file)
                .with_ansi(false)
                .with_target(true)
                .with_thread_names(true)
                .with_timer(fmt::time::uptime())
                .json();
            subscriber.with(file_layer).init();
        }
        Some(Err((dir, err))) => {
            subscriber.init();
            tracing::warn!(
                dir = %dir.display(),
                error = %err,
                "cannot create log file, logging to the console only"
            );
        }
        None => subscriber.init(),
    }
}

/// Filter directive from the config, falling back to [`DEFAULT_FILTER`].
pub fn filter_directive(config: Option<&Config>) -> &str {
    match config {
        Some(config) if !config.debug.log_level.trim().is_empty() => &config.debug.log_level,
        _ => DEFAULT_FILTER,
    }
}

/// An `EnvFilter` with the default directive.
pub fn default_env_filter() -> EnvFilter {
    EnvFilter::new(DEFAULT_FILTER)
}

fn create_log_file(log_dir: &Path) -> io::Result<File> {
    std::fs::create_dir_all(log_dir)?;
    File::create(log_dir.join(LOG_FILE_NAME))
}
