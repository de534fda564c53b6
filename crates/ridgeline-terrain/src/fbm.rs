//! Fractal simplex noise layer.
//!
//! Sampled in world units, so a script rendered at a different resolution
//! keeps its features in place.

use noise::{NoiseFn, Simplex};

use crate::buffer::{LayerInputs, MapBufferInfo};
use crate::command::Command;
use crate::kernel::Kernel;
use crate::noise::{NoiseContext, NoiseKernel};

/// Parameters of an fBm layer. Frequencies are per world unit.
#[derive(Clone, Debug, PartialEq)]
pub struct FbmParams {
    pub context: NoiseContext,
    pub octaves: u32,
    /// Frequency growth per octave.
    pub lacunarity: f64,
    /// Amplitude decay per octave.
    pub persistence: f64,
    pub base_frequency: f64,
    /// Height of the first octave.
    pub amplitude: f64,
}

impl Default for FbmParams {
    fn default() -> Self {
        Self {
            context: NoiseContext::default(),
            octaves: 6,
            lacunarity: 2.0,
            persistence: 0.5,
            base_frequency: 0.01,
            amplitude: 1.0,
        }
    }
}

/// Seeded simplex octave stack.
#[derive(Clone, Debug)]
pub struct FbmSampler {
    simplex: Simplex,
    params: FbmParams,
}

impl FbmSampler {
    pub fn new(params: FbmParams) -> Self {
        Self {
            simplex: Simplex::new(params.context.seed),
            params,
        }
    }

    /// Sum of all octaves at a world position. Bounded by
    /// [`FbmSampler::max_amplitude`].
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let FbmParams {
            octaves,
            lacunarity,
            persistence,
            base_frequency,
            amplitude,
            ..
        } = self.params;
        (0..octaves)
            .scan((base_frequency, amplitude), |(freq, amp), _| {
                let value = self.simplex.get([x * *freq, y * *freq]) * *amp;
                *freq *= lacunarity;
                *amp *= persistence;
                Some(value)
            })
            .sum()
    }

    /// Largest magnitude [`FbmSampler::sample`] can return.
    pub fn max_amplitude(&self) -> f64 {
        let persistence = self.params.persistence.abs();
        (0..self.params.octaves)
            .map(|octave| persistence.powi(octave as i32))
            .sum::<f64>()
            * self.params.amplitude.abs()
    }

    pub fn params(&self) -> &FbmParams {
        &self.params
    }
}

/// Layer producing fractal simplex noise. Combine it with earlier layers
/// through a blend layer.
#[derive(Clone, Debug)]
pub struct FbmCommand {
    sampler: FbmSampler,
}

impl FbmCommand {
    pub fn new(params: FbmParams) -> Self {
        Self {
            sampler: FbmSampler::new(params),
        }
    }

    pub fn sampler(&self) -> &FbmSampler {
        &self.sampler
    }
}

impl Command for FbmCommand {
    fn name(&self) -> &'static str {
        "Fbm Noise"
    }

    fn prepare(&self, _info: &MapBufferInfo, _inputs: LayerInputs<'_>) -> Kernel<'_> {
        Kernel::Noise(NoiseKernel::Fbm(&self.sampler))
    }
}
