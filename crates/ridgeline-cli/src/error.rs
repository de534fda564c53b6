//! Errors surfaced by the command-line front end.

use std::path::PathBuf;

use ridgeline_terrain::ScriptError;

/// Errors that can occur while writing a heightmap file.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Failed to create or write the output file.
    #[error("failed to write output: {0}")]
    WriteError(#[source] std::io::Error),

    /// The PNG encoder rejected the image.
    #[error("failed to encode png: {0}")]
    EncodeError(#[source] png::EncodingError),

    /// The buffer does not hold `width * height` values.
    #[error("buffer holds {len} values, {width}x{height} needs {expected}")]
    SizeMismatch {
        len: usize,
        width: u32,
        height: u32,
        expected: usize,
    },
}

/// Errors that end a generator run.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("failed to load script {}: {source}", path.display())]
    Script {
        path: PathBuf,
        #[source]
        source: ScriptError,
    },

    #[error("failed to export {}: {source}", path.display())]
    Export {
        path: PathBuf,
        #[source]
        source: ExportError,
    },

    /// The requested resolution does not fit a PNG or a buffer.
    #[error("resolution {width}x{height} is out of range")]
    Resolution { width: usize, height: usize },
}
