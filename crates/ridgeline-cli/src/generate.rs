//! One generator run: script in, heightmap file out.

use std::path::Path;

use ridgeline_config::{Config, GenerationConfig, OutputConfig};
use ridgeline_terrain::{LayerExecutor, Pipeline};
use tracing::info;

use crate::error::CliError;
use crate::export::write_heightmap;

/// Executor described by the generation settings.
pub fn executor_for(config: &GenerationConfig) -> LayerExecutor {
    if config.sequential {
        LayerExecutor::sequential()
    } else if config.threads == 0 {
        LayerExecutor::new()
    } else {
        LayerExecutor::with_threads(config.threads)
    }
}

/// Output resolution; a zero axis falls back to the script's native one.
pub fn resolution(output: &OutputConfig, pipeline: &Pipeline) -> (usize, usize) {
    let (native_x, native_y) = pipeline.native_resolution();
    let pick = |requested: u32, native: usize| {
        if requested == 0 {
            native
        } else {
            requested as usize
        }
    };
    (pick(output.width, native_x), pick(output.height, native_y))
}

/// Loads `script`, evaluates it and writes the result as configured.
pub fn run(script: &Path, config: &Config) -> Result<(), CliError> {
    let pipeline = Pipeline::load_script(script)
        .map_err(|source| CliError::Script {
            path: script.to_path_buf(),
            source,
        })?
        .with_executor(executor_for(&config.generation));

    let (width, height) = resolution(&config.output, &pipeline);
    let (Ok(png_width), Ok(png_height)) = (u32::try_from(width), u32::try_from(height)) else {
        return Err(CliError::Resolution { width, height });
    };
    if width.checked_mul(height).is_none() {
        return Err(CliError::Resolution { width, height });
    }

    info!(
        script = %script.display(),
        layers = pipeline.len(),
        width,
        height,
        "generating heightmap"
    );
    let heights = pipeline.execute(width, height, config.generation.normalize);

    let path = &config.output.path;
    write_heightmap(path, config.output.format, png_width, png_height, &heights).map_err(|source| {
        CliError::Export {
            path: path.clone(),
            source,
        }
    })?;
    info!(path = %path.display(), format = ?config.output.format, "heightmap written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use ridgeline_config::OutputFormat;

    use super::*;

    const SCRIPT: &str = r#"{
        "HeightmapWidth": 32, "HeightmapHeight": 16, "HeightmapPixelPerWorldUnit": 1,
        "Layers": [
            { "Type": "MST Inverse Distance", "Height": 20,
              "PointSet": [[4, 4, 1], [28, 12, 0.5], [16, 8, 0.8]] },
            { "Type": "Value Noise", "Height": 2, "Blending": "ADDITIVE" }
        ]
    }"#;

    #[test]
    fn test_executor_selection() {
        let mut generation = GenerationConfig::default();
        assert_eq!(executor_for(&generation), LayerExecutor::new());
        generation.threads = 3;
        assert_eq!(executor_for(&generation).threads(), 3);
        generation.sequential = true;
        assert_eq!(executor_for(&generation).threads(), 1);
    }

    #[test]
    fn test_resolution_falls_back_per_axis() {
        let pipeline = Pipeline::from_script(SCRIPT).unwrap();
        let mut output = OutputConfig::default();
        assert_eq!(resolution(&output, &pipeline), (32, 16));
        output.width = 100;
        assert_eq!(resolution(&output, &pipeline), (100, 16));
    }

    #[test]
    fn test_run_writes_raw_heightmap() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("terrain.json");
        std::fs::write(&script, SCRIPT).unwrap();

        let mut config = Config::default();
        config.output.path = dir.path().join("out").join("terrain.r32");
        config.output.format = OutputFormat::RawF32;
        config.output.width = 20;
        config.output.height = 10;
        run(&script, &config).unwrap();

        let bytes = std::fs::read(&config.output.path).unwrap();
        assert_eq!(bytes.len(), 20 * 10 * 4);
        let heights: Vec<f32> = bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        assert!(heights.iter().all(|h| (0.0..=1.0 + 1e-6).contains(h)));
    }

    #[test]
    fn test_missing_script_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("missing.json");
        let err = run(&script, &Config::default()).unwrap_err();
        assert!(matches!(err, CliError::Script { .. }));
        assert!(err.to_string().contains("missing.json"));
    }
}
