//! Layer script error types.

/// Errors that can occur when loading a layer script.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    /// Failed to read the script file from disk.
    #[error("failed to read script: {0}")]
    ReadError(#[source] std::io::Error),

    /// The document is not valid JSON or misses a required field.
    #[error("failed to parse script: {0}")]
    ParseError(#[source] serde_json::Error),

    /// The world extent or pixel density is not positive.
    #[error("invalid world: {width}x{height} units at {pixels_per_unit} pixels per unit")]
    InvalidWorld {
        width: f32,
        height: f32,
        pixels_per_unit: f32,
    },

    /// A layer's parameters have the wrong shape.
    #[error("layer {index} ({kind}): {source}")]
    LayerParams {
        index: usize,
        kind: String,
        #[source]
        source: serde_json::Error,
    },

    /// A layer's parameters parse but cannot produce a layer.
    #[error("layer {index} ({kind}): {reason}")]
    InvalidLayer {
        index: usize,
        kind: String,
        reason: String,
    },
}
