//! Filters over the current layer: box smoothing and range normalization.

use tracing::debug;

use crate::buffer::{LayerInputs, MapBufferInfo};
use crate::command::Command;
use crate::kernel::{Kernel, PixelKernel};

/// Single-input filter kernels. Without a `current` layer they produce zero.
#[derive(Clone, Copy, Debug)]
pub enum FilterKernel {
    /// Mean over the square window of the given radius, clipped at the
    /// borders.
    Smooth { radius: usize },
    /// `(value - min) * scale`.
    Rescale { min: f32, scale: f32 },
}

impl PixelKernel for FilterKernel {
    fn evaluate(&self, info: &MapBufferInfo, x: usize, y: usize, inputs: &LayerInputs<'_>) -> f32 {
        let Some(current) = inputs.current else {
            return 0.0;
        };
        match *self {
            Self::Smooth { radius } => {
                let x_max = x.saturating_add(radius).min(info.resolution_x - 1);
                let y_max = y.saturating_add(radius).min(info.resolution_y - 1);
                let x_range = x.saturating_sub(radius)..=x_max;
                let y_range = y.saturating_sub(radius)..=y_max;
                let mut sum = 0.0;
                let mut count = 0u32;
                for sy in y_range {
                    let row = &current[info.index(0, sy)..][..info.resolution_x];
                    for &value in &row[x_range.clone()] {
                        sum += value;
                        count += 1;
                    }
                }
                sum / count as f32
            }
            Self::Rescale { min, scale } => (current[info.index(x, y)] - min) * scale,
        }
    }
}

/// Smallest and largest value of `buffer`, ignoring NaNs. `None` when empty
/// or when no value is a number.
pub fn value_range(buffer: &[f32]) -> Option<(f32, f32)> {
    buffer
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .fold(None, |range, v| match range {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Factor mapping `[min, max]` onto `[0, 1]`. Zero for a flat range so the
/// result collapses to zeros instead of dividing by zero.
pub fn rescale_factor(min: f32, max: f32) -> f32 {
    let range = max - min;
    if range > 0.0 && range.is_finite() {
        1.0 / range
    } else {
        0.0
    }
}

/// Rescales `buffer` in place to span `[0, 1]`. A flat buffer becomes all
/// zeros; a buffer already spanning exactly `[0, 1]` is left unchanged.
pub fn normalize(buffer: &mut [f32]) {
    let Some((min, max)) = value_range(buffer) else {
        return;
    };
    let scale = rescale_factor(min, max);
    for value in buffer.iter_mut() {
        *value = (*value - min) * scale;
    }
}

/// Layer smoothing the current result with a box filter.
#[derive(Clone, Copy, Debug)]
pub struct SmoothCommand {
    radius: usize,
}

impl SmoothCommand {
    pub fn new(radius: usize) -> Self {
        Self { radius }
    }

    pub fn radius(&self) -> usize {
        self.radius
    }
}

impl Command for SmoothCommand {
    fn name(&self) -> &'static str {
        "Smooth"
    }

    fn prepare(&self, _info: &MapBufferInfo, _inputs: LayerInputs<'_>) -> Kernel<'_> {
        Kernel::Filter(FilterKernel::Smooth {
            radius: self.radius,
        })
    }
}

/// Layer rescaling the current result to `[0, 1]`.
#[derive(Clone, Copy, Debug, Default)]
pub struct NormalizeCommand;

impl Command for NormalizeCommand {
    fn name(&self) -> &'static str {
        "Normalize"
    }

    fn prepare(&self, _info: &MapBufferInfo, inputs: LayerInputs<'_>) -> Kernel<'_> {
        let (min, max) = inputs.current.and_then(value_range).unwrap_or((0.0, 0.0));
        debug!(min, max, "normalizing layer");
        Kernel::Filter(FilterKernel::Rescale {
            min,
            scale: rescale_factor(min, max),
        })
    }
}
