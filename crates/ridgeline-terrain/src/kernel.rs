//! Per-pixel kernels and their dispatch.
//!
//! Every layer is reduced to one [`Kernel`] value before dispatch. The
//! executor is generic over [`PixelKernel`], so the enum is matched once per
//! pixel instead of going through a boxed closure.

use crate::blend::BlendKernel;
use crate::buffer::{LayerInputs, MapBufferInfo};
use crate::filter::FilterKernel;
use crate::generator::GeneratorKernel;
use crate::noise::NoiseKernel;

/// A pure function of the pixel coordinate and the two read-only inputs.
///
/// Implementations must not depend on evaluation order; the executor may
/// evaluate rows on any thread.
pub trait PixelKernel: Sync {
    fn evaluate(&self, info: &MapBufferInfo, x: usize, y: usize, inputs: &LayerInputs<'_>) -> f32;
}

/// The fixed set of kernel behaviors a layer can produce.
#[derive(Debug)]
pub enum Kernel<'a> {
    /// Ignores its inputs.
    Generator(GeneratorKernel<'a>),
    /// Combines `prev` and `current`.
    Blend(BlendKernel),
    /// Procedural noise, optionally offset by `current`.
    Noise(NoiseKernel<'a>),
    /// Neighborhood or range filters over `current`.
    Filter(FilterKernel),
}

impl PixelKernel for Kernel<'_> {
    #[inline]
    fn evaluate(&self, info: &MapBufferInfo, x: usize, y: usize, inputs: &LayerInputs<'_>) -> f32 {
        match self {
            Self::Generator(kernel) => kernel.evaluate(info, x, y, inputs),
            Self::Blend(kernel) => kernel.evaluate(info, x, y, inputs),
            Self::Noise(kernel) => kernel.evaluate(info, x, y, inputs),
            Self::Filter(kernel) => kernel.evaluate(info, x, y, inputs),
        }
    }
}

impl<K: PixelKernel + ?Sized> PixelKernel for &K {
    #[inline]
    fn evaluate(&self, info: &MapBufferInfo, x: usize, y: usize, inputs: &LayerInputs<'_>) -> f32 {
        (**self).evaluate(info, x, y, inputs)
    }
}
