//! Layered heightmap synthesis.
//!
//! A [`Pipeline`] evaluates an ordered list of [`Command`]s over a
//! row-major `f32` buffer. Generators build the terrain's base shape from a
//! minimum spanning tree over control points, noise layers add detail, and
//! blend layers combine the two most recent results.

pub mod blend;
pub mod buffer;
pub mod command;
pub mod error;
pub mod executor;
pub mod fbm;
pub mod filter;
pub mod generator;
pub mod kernel;
pub mod noise;
pub mod pipeline;
pub mod ridge;
pub mod script;


pub use blend::{BlendCommand, BlendOp};
pub use buffer::{LayerInputs, MapBufferInfo};
pub use command::Command;
pub use error::ScriptError;
pub use executor::{CommandDesc, LayerExecutor};
pub use fbm::{FbmCommand, FbmParams};
pub use filter::{NormalizeCommand, SmoothCommand, normalize};
pub use generator::{MstDistanceCommand, MstMode, VoronoiCommand, WorleyCommand};
pub use kernel::{Kernel, PixelKernel};
pub use noise::{
    NoiseContext, ValueNoiseCommand, ValueNoiseParams, VoronoiseCommand, VoronoiseParams,
};
pub use pipeline::Pipeline;
pub use ridge::{RidgeField, RidgeProfile};
