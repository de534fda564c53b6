//! Two-input blend layers combining the previous result with the current one.

use glam::Vec3;

use crate::buffer::{LayerInputs, MapBufferInfo};
use crate::command::Command;
use crate::kernel::{Kernel, PixelKernel};

/// How `current` is merged onto `prev`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BlendOp {
    Add,
    Multiply,
    /// `prev + (current - prev) * factor`.
    Interpolate(f32),
    /// Samples `prev` displaced along the slope of `current` by the given
    /// distance in pixels.
    Refract(f32),
    Overwrite,
}

/// Blend kernel. Degenerates to a copy of `current` when there is no `prev`.
#[derive(Clone, Copy, Debug)]
pub struct BlendKernel {
    op: BlendOp,
}

impl BlendKernel {
    pub fn new(op: BlendOp) -> Self {
        Self { op }
    }

    pub fn op(&self) -> BlendOp {
        self.op
    }
}

impl PixelKernel for BlendKernel {
    #[inline]
    fn evaluate(&self, info: &MapBufferInfo, x: usize, y: usize, inputs: &LayerInputs<'_>) -> f32 {
        let Some(current) = inputs.current else {
            panic!("blend kernel evaluated without a current layer");
        };
        let index = info.index(x, y);
        let Some(prev) = inputs.prev else {
            return current[index];
        };
        match self.op {
            BlendOp::Add => current[index] + prev[index],
            BlendOp::Multiply => current[index] * prev[index],
            BlendOp::Interpolate(factor) => prev[index] + (current[index] - prev[index]) * factor,
            BlendOp::Refract(distance) => refract(info, x, y, prev, current, distance),
            BlendOp::Overwrite => current[index],
        }
    }
}

/// Bilinear sample of `prev` at the position reached by stepping along the
/// normalized slope of `current`. Both the step target and the taps are
/// clamped to the grid.
fn refract(
    info: &MapBufferInfo,
    x: usize,
    y: usize,
    prev: &[f32],
    current: &[f32],
    distance: f32,
) -> f32 {
    let max_x = info.resolution_x - 1;
    let max_y = info.resolution_y - 1;
    let at = |x: usize, y: usize| current[info.index(x, y)];

    // Central differences; the constant y component keeps the normal finite.
    let slope = Vec3::new(
        at((x + 1).min(max_x), y) - at(x.saturating_sub(1), y),
        2.0,
        at(x, (y + 1).min(max_y)) - at(x, y.saturating_sub(1)),
    )
    .normalize();

    let step = distance / slope.y;
    let sx = (x as f32 + slope.x * step).clamp(0.0, max_x as f32);
    let sy = (y as f32 + slope.z * step).clamp(0.0, max_y as f32);
    let x0 = sx.floor() as usize;
    let y0 = sy.floor() as usize;
    let fx = sx - x0 as f32;
    let fy = sy - y0 as f32;
    let x1 = (x0 + 1).min(max_x);
    let y1 = (y0 + 1).min(max_y);

    let sample = |x: usize, y: usize| prev[info.index(x, y)];
    let top = sample(x0, y0) + (sample(x1, y0) - sample(x0, y0)) * fx;
    let bottom = sample(x0, y1) + (sample(x1, y1) - sample(x0, y1)) * fx;
    top + (bottom - top) * fy
}

/// Layer blending the two preceding results.
#[derive(Clone, Copy, Debug)]
pub struct BlendCommand {
    op: BlendOp,
}

impl BlendCommand {
    pub fn new(op: BlendOp) -> Self {
        Self { op }
    }

    pub fn op(&self) -> BlendOp {
        self.op
    }
}

impl Command for BlendCommand {
    fn name(&self) -> &'static str {
        match self.op {
            BlendOp::Add => "ADDITIVE",
            BlendOp::Multiply => "MULTIPLICATIVE",
            BlendOp::Interpolate(_) => "INTERPOLATE",
            BlendOp::Refract(_) => "REFRACTIVE",
            BlendOp::Overwrite => "OVERWRITE",
        }
    }

    /// # Panics
    ///
    /// Panics if there is no `current` input.
    fn prepare(&self, _info: &MapBufferInfo, inputs: LayerInputs<'_>) -> Kernel<'_> {
        assert!(
            inputs.current.is_some(),
            "{} blend needs a current layer",
            self.name()
        );
        Kernel::Blend(BlendKernel::new(self.op))
    }
}
