//! JSON layer scripts.
//!
//! A script names the world extent and an ordered list of layers:
//!
//! ```json
//! {
//!   "HeightmapWidth": 512, "HeightmapHeight": 512, "HeightmapPixelPerWorldUnit": 1,
//!   "Layers": [
//!     { "Type": "MST Inverse Distance", "Height": 50, "QuadraticSpline": 0.3,
//!       "PointSet": [[100, 120, 1.0], [300, 340, 0.7]] },
//!     { "Type": "Value Noise", "Height": 4, "Blending": "ADDITIVE" }
//!   ]
//! }
//! ```
//!
//! Every recognised layer becomes its command followed by its blend command.
//! Layers of an unknown type are skipped with a warning.

use std::path::Path;

use glam::Vec3;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::blend::{BlendCommand, BlendOp};
use crate::command::Command;
use crate::error::ScriptError;
use crate::fbm::{FbmCommand, FbmParams};
use crate::filter::{NormalizeCommand, SmoothCommand};
use crate::generator::{
    MAX_WORLEY_NEIGHBOR, MstDistanceCommand, MstMode, VoronoiCommand, WorleyCommand,
};
use crate::noise::{
    MAX_VORONOISE_OCTAVE, NoiseContext, ValueNoiseCommand, ValueNoiseParams, VoronoiseCommand,
    VoronoiseParams,
};
use crate::pipeline::Pipeline;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ScriptDocument {
    heightmap_width: f32,
    heightmap_height: f32,
    heightmap_pixel_per_world_unit: f32,
    #[serde(default)]
    layers: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct MstLayer {
    height: f32,
    quadratic_spline: f32,
    point_set: Vec<[f32; 3]>,
}

impl Default for MstLayer {
    fn default() -> Self {
        Self {
            height: 50.0,
            quadratic_spline: 0.3,
            point_set: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct ValueNoiseLayer {
    height: f32,
    gradient_dependency: f32,
    height_dependency: f32,
    height_dependency_offset: f32,
    seed: u32,
}

impl Default for ValueNoiseLayer {
    fn default() -> Self {
        Self {
            height: 1.0,
            gradient_dependency: 0.0,
            height_dependency: 0.0,
            height_dependency_offset: 0.0,
            seed: 0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct VoronoiseLayer {
    height: f32,
    min_octave: u32,
    max_octave: u32,
    seed: u32,
}

impl Default for VoronoiseLayer {
    fn default() -> Self {
        Self {
            height: 50.0,
            min_octave: 0,
            max_octave: 0,
            seed: 0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct PointLayer {
    height: f32,
    nth_neighbor: usize,
    point_set: Vec<[f32; 3]>,
}

impl Default for PointLayer {
    fn default() -> Self {
        Self {
            height: 1.0,
            nth_neighbor: 0,
            point_set: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct FbmLayer {
    height: f64,
    octaves: u32,
    frequency: f64,
    lacunarity: f64,
    persistence: f64,
    seed: u32,
}

impl Default for FbmLayer {
    fn default() -> Self {
        let params = FbmParams::default();
        Self {
            height: params.amplitude,
            octaves: params.octaves,
            frequency: params.base_frequency,
            lacunarity: params.lacunarity,
            persistence: params.persistence,
            seed: params.context.seed,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct SmoothLayer {
    radius: usize,
}

impl Default for SmoothLayer {
    fn default() -> Self {
        Self { radius: 1 }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct BlendParams {
    blending: String,
    blend_factor: f32,
}

impl Default for BlendParams {
    fn default() -> Self {
        Self {
            blending: "NONE".to_string(),
            blend_factor: 1.0,
        }
    }
}

/// Reads layer parameters, attributing failures to the layer.
fn params<T: DeserializeOwned>(layer: &Value, index: usize, kind: &str) -> Result<T, ScriptError> {
    T::deserialize(layer).map_err(|source| ScriptError::LayerParams {
        index,
        kind: kind.to_string(),
        source,
    })
}

fn invalid(index: usize, kind: &str, reason: impl Into<String>) -> ScriptError {
    ScriptError::InvalidLayer {
        index,
        kind: kind.to_string(),
        reason: reason.into(),
    }
}

fn points(raw: &[[f32; 3]]) -> Vec<Vec3> {
    raw.iter().map(|&p| Vec3::from_array(p)).collect()
}

/// Builds the layer command, or `None` for an unknown type.
fn layer_command(
    layer: &Value,
    index: usize,
    kind: &str,
) -> Result<Option<Box<dyn Command>>, ScriptError> {
    let command: Box<dyn Command> = match kind {
        "MST Distance" | "MST Inverse Distance" => {
            let p: MstLayer = params(layer, index, kind)?;
            if p.point_set.is_empty() {
                return Err(invalid(index, kind, "point set is empty"));
            }
            let mode = if kind == "MST Distance" {
                MstMode::Valleys
            } else {
                MstMode::Ridges
            };
            Box::new(MstDistanceCommand::new(
                &points(&p.point_set),
                p.height,
                p.quadratic_spline,
                mode,
            ))
        }
        "Value Noise" => {
            let p: ValueNoiseLayer = params(layer, index, kind)?;
            Box::new(ValueNoiseCommand::new(ValueNoiseParams {
                context: NoiseContext::new(p.seed),
                height_scale: p.height,
                gradient_dependency: p.gradient_dependency,
                height_dependency: p.height_dependency,
                height_dependency_offset: p.height_dependency_offset,
            }))
        }
        "Voronoise" => {
            let p: VoronoiseLayer = params(layer, index, kind)?;
            if p.min_octave > p.max_octave || p.max_octave > MAX_VORONOISE_OCTAVE {
                return Err(invalid(
                    index,
                    kind,
                    format!(
                        "octaves {}..={} must be ordered and at most {MAX_VORONOISE_OCTAVE}",
                        p.min_octave, p.max_octave
                    ),
                ));
            }
            Box::new(VoronoiseCommand::new(VoronoiseParams {
                context: NoiseContext::new(p.seed),
                height: p.height,
                min_octave: p.min_octave,
                max_octave: p.max_octave,
            }))
        }
        "Worley Noise" => {
            let p: PointLayer = params(layer, index, kind)?;
            if p.nth_neighbor >= p.point_set.len() {
                return Err(invalid(
                    index,
                    kind,
                    format!(
                        "neighbor index {} needs more than {} points",
                        p.nth_neighbor,
                        p.point_set.len()
                    ),
                ));
            }
            if p.nth_neighbor > MAX_WORLEY_NEIGHBOR {
                return Err(invalid(
                    index,
                    kind,
                    format!("neighbor index {} exceeds {MAX_WORLEY_NEIGHBOR}", p.nth_neighbor),
                ));
            }
            Box::new(WorleyCommand::new(points(&p.point_set), p.nth_neighbor, p.height))
        }
        "Voronoi" => {
            let p: PointLayer = params(layer, index, kind)?;
            if p.point_set.is_empty() {
                return Err(invalid(index, kind, "point set is empty"));
            }
            Box::new(VoronoiCommand::new(points(&p.point_set), p.height))
        }
        "Fbm Noise" => {
            let p: FbmLayer = params(layer, index, kind)?;
            Box::new(FbmCommand::new(FbmParams {
                context: NoiseContext::new(p.seed),
                octaves: p.octaves,
                lacunarity: p.lacunarity,
                persistence: p.persistence,
                base_frequency: p.frequency,
                amplitude: p.height,
            }))
        }
        "Smooth" => {
            let p: SmoothLayer = params(layer, index, kind)?;
            Box::new(SmoothCommand::new(p.radius))
        }
        "Normalize" => Box::new(NormalizeCommand),
        _ => return Ok(None),
    };
    Ok(Some(command))
}

/// Blend command following a layer. `NONE`, and `INTERPOLATE` with a factor
/// of one, leave the layer's own result in place.
fn blend_command(
    layer: &Value,
    index: usize,
    kind: &str,
) -> Result<Option<BlendCommand>, ScriptError> {
    let blend: BlendParams = params(layer, index, kind)?;
    let op = match blend.blending.as_str() {
        "NONE" => return Ok(None),
        "ADDITIVE" => BlendOp::Add,
        "MULTIPLICATIVE" => BlendOp::Multiply,
        "INTERPOLATE" if blend.blend_factor == 1.0 => return Ok(None),
        "INTERPOLATE" => BlendOp::Interpolate(blend.blend_factor),
        "REFRACTIVE" => BlendOp::Refract(blend.blend_factor),
        "OVERWRITE" => BlendOp::Overwrite,
        other => return Err(invalid(index, kind, format!("unknown blending mode {other:?}"))),
    };
    Ok(Some(BlendCommand::new(op)))
}

impl Pipeline {
    /// Parses a layer script into a pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError`] on malformed JSON, a non-positive world size
    /// or a layer whose parameters cannot produce a command.
    pub fn from_script(json: &str) -> Result<Self, ScriptError> {
        let document: ScriptDocument = serde_json::from_str(json).map_err(ScriptError::ParseError)?;
        let (width, height, ppu) = (
            document.heightmap_width,
            document.heightmap_height,
            document.heightmap_pixel_per_world_unit,
        );
        if !(width > 0.0 && height > 0.0 && ppu > 0.0) {
            return Err(ScriptError::InvalidWorld {
                width,
                height,
                pixels_per_unit: ppu,
            });
        }

        let mut pipeline = Pipeline::new(width, height, ppu);
        for (index, layer) in document.layers.iter().enumerate() {
            let kind = layer.get("Type").and_then(Value::as_str).unwrap_or("NONE");
            let Some(command) = layer_command(layer, index, kind)? else {
                warn!(index, kind, "skipping layer of unknown type");
                continue;
            };
            pipeline.push_boxed(command);
            if let Some(blend) = blend_command(layer, index, kind)? {
                pipeline.push(blend);
            }
        }

        debug!(
            layers = document.layers.len(),
            commands = pipeline.len(),
            "loaded layer script"
        );
        Ok(pipeline)
    }

    /// Reads and parses a layer script file.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::ReadError`] if the file cannot be read, and
    /// otherwise the errors of [`Pipeline::from_script`].
    pub fn load_script(path: &Path) -> Result<Self, ScriptError> {
        let json = std::fs::read_to_string(path).map_err(ScriptError::ReadError)?;
        Self::from_script(&json)
    }
}
