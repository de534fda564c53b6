//! Hash-based value noise with analytic gradients, and voronoise.
//!
//! Octave amplitudes react to the height accumulated so far and to the
//! steepness of the running gradient, so rough detail can be confined to
//! peaks or to cliffs. Seeds travel in an explicit [`NoiseContext`], never in
//! process-wide state.

use glam::Vec2;

use crate::buffer::{LayerInputs, MapBufferInfo};
use crate::command::Command;
use crate::fbm::FbmSampler;
use crate::kernel::{Kernel, PixelKernel};

/// Pixel-to-noise-space scale of the value noise layer.
pub const HORIZONTAL_NOISE_SCALE: f32 = 0.01;

/// Cap on the combined height and gradient amplitude factor.
pub const MAX_AMPLITUDE_FACTOR: f32 = 6.0;

/// Seed passed explicitly through every noise evaluation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct NoiseContext {
    pub seed: u32,
}

impl NoiseContext {
    pub fn new(seed: u32) -> Self {
        Self { seed }
    }
}

/// Integer lattice hash mapped to `[0, 1]`.
pub fn sample_1d(i: i64) -> f64 {
    let i = i ^ i.wrapping_shl(13);
    let hashed = i
        .wrapping_mul(i.wrapping_mul(i).wrapping_mul(15_731).wrapping_add(789_221))
        .wrapping_add(1_376_312_589);
    (hashed & 0x7fff_ffff) as f64 / 2_147_483_647.0
}

#[inline]
fn quintic(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn quintic_derivative(t: f32) -> f32 {
    30.0 * t * t * (t * (t - 2.0) + 1.0)
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Value noise at `(x, y) * frequency`, in `[0, 1]`, with its gradient with
/// respect to the scaled coordinates.
pub fn value_noise_2d(context: NoiseContext, x: f32, y: f32, frequency: f32) -> (f32, Vec2) {
    let sx = x * frequency;
    let sy = y * frequency;
    let cell_x = sx.floor();
    let cell_y = sy.floor();
    let fx = sx - cell_x;
    let fy = sy - cell_y;

    let x0 = cell_x as i64 * 57;
    let x1 = x0 + 57;
    let y0 = cell_y as i64 * 101;
    let y1 = y0 + 101;
    let seed = i64::from(context.seed);

    let s00 = sample_1d(x0 + y0 + seed) as f32;
    let s10 = sample_1d(x1 + y0 + seed) as f32;
    let s01 = sample_1d(x0 + y1 - seed) as f32;
    let s11 = sample_1d(x1 + y1 - seed) as f32;

    let u = quintic(fx);
    let v = quintic(fy);
    let du = quintic_derivative(fx);
    let dv = quintic_derivative(fy);

    let k1 = s10 - s00;
    let k2 = s01 - s00;
    let gradient = Vec2::new(
        (k1 + (s11 - s01 - k1) * v) * du,
        (k2 + (s11 - s10 - k2) * u) * dv,
    );
    (lerp(s00 + k1 * u, lerp(s01, s11, u), v), gradient)
}

/// Seeded lattice hash of a 2D cell, in `[0, 1]`.
pub fn sample_2d(context: NoiseContext, x: i64, y: i64) -> f64 {
    let mixed = x
        .wrapping_mul(0x9e37_79b9)
        .wrapping_add(y.wrapping_mul(0x85eb_ca6b))
        ^ i64::from(context.seed).wrapping_mul(0xc2b2_ae35);
    sample_1d(mixed)
}

/// Cells visited in each direction around the sample's own cell.
const VORONOISE_REACH: i64 = 2;

// Offsets decorrelating the two jitter axes from the cell value.
const JITTER_X: (i64, i64) = (0x7a2f_5af8_afd0_d7e0, 0xdbb8_d9f9_d5e3_d6be_u64 as i64);
const JITTER_Y: (i64, i64) = (0xde9d_8b67_ca23_a61d_u64 as i64, 0x172f_fe84_e2e5_a30c);

/// One octave of voronoise at `(x, y)`, in `[0, 1]`.
///
/// Every cell within [`VORONOISE_REACH`] carries a jittered feature point
/// and a random value. The result is the mean of those values weighted by a
/// linear falloff of the distance to each feature point. A small value-noise
/// term eats into the weights so cell borders fray.
pub fn voronoise(context: NoiseContext, x: f32, y: f32) -> f32 {
    let cell_x = x.floor();
    let cell_y = y.floor();
    let frac = Vec2::new(x - cell_x, y - cell_y);
    let (cell_x, cell_y) = (cell_x as i64, cell_y as i64);

    let edge_context = NoiseContext::new(context.seed.wrapping_mul(37));
    let edge = value_noise_2d(edge_context, x * 5.0, y * 5.0, 1.0).0 * 2.0 - 1.0;
    let edge_noise = (0.01 + 0.01 * edge).max(0.0);

    let reach = VORONOISE_REACH as f32;
    let mut value_sum = 0.0;
    let mut weight_sum = 0.0;
    for j in -VORONOISE_REACH..=VORONOISE_REACH {
        for i in -VORONOISE_REACH..=VORONOISE_REACH {
            let (cx, cy) = (cell_x.wrapping_add(i), cell_y.wrapping_add(j));
            let jitter = Vec2::new(
                sample_2d(context, cx ^ JITTER_X.0, cy ^ JITTER_X.1) as f32,
                sample_2d(context, cx ^ JITTER_Y.0, cy ^ JITTER_Y.1) as f32,
            );
            let offset = Vec2::new(i as f32, j as f32) + jitter - frac;
            let falloff = (1.0 - offset.length() / reach).max(0.0);
            let weight = (falloff - edge_noise / (falloff + 0.2)).max(0.0);
            value_sum += weight * sample_2d(context, cx, cy) as f32;
            weight_sum += weight;
        }
    }
    if weight_sum > 0.0 {
        value_sum / weight_sum
    } else {
        0.5
    }
}

/// Parameters of the value noise layer as authored.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ValueNoiseParams {
    pub context: NoiseContext,
    /// Overall height of the noise.
    pub height_scale: f32,
    /// How much steep terrain amplifies finer octaves.
    pub gradient_dependency: f32,
    /// How much high terrain amplifies finer octaves.
    pub height_dependency: f32,
    /// Height (relative to `height_scale`) at which the height term is neutral.
    pub height_dependency_offset: f32,
}

impl Default for ValueNoiseParams {
    fn default() -> Self {
        Self {
            context: NoiseContext::default(),
            height_scale: 1.0,
            gradient_dependency: 0.0,
            height_dependency: 0.0,
            height_dependency_offset: 0.0,
        }
    }
}

impl ValueNoiseParams {
    /// Converts the authored dependencies from relative to absolute heights.
    fn scaled(self) -> Self {
        if self.height_scale == 0.0 {
            return Self {
                gradient_dependency: 0.0,
                height_dependency: 0.0,
                height_dependency_offset: 0.0,
                ..self
            };
        }
        Self {
            gradient_dependency: self.gradient_dependency / self.height_scale,
            height_dependency: self.height_dependency / self.height_scale,
            height_dependency_offset: self.height_dependency_offset * self.height_scale,
            ..self
        }
    }
}

/// Value noise prepared for one buffer resolution.
#[derive(Clone, Copy, Debug)]
pub struct ValueNoiseKernel {
    params: ValueNoiseParams,
    octaves: u32,
}

impl ValueNoiseKernel {
    /// One octave per power of two of the larger resolution.
    pub fn new(params: ValueNoiseParams, info: &MapBufferInfo) -> Self {
        let octaves = info.resolution_x.max(info.resolution_y).max(1).ilog2().min(31);
        Self {
            params: params.scaled(),
            octaves,
        }
    }

    pub fn octaves(&self) -> u32 {
        self.octaves
    }

    #[inline]
    fn amplitude(&self, height: f32, frequency: f32, gradient: Vec2) -> f32 {
        let p = &self.params;
        let height_term = ((height - p.height_dependency_offset) * p.height_dependency).exp();
        let gradient_term = 1.0 + gradient.length() * p.gradient_dependency;
        (height_term * gradient_term).min(MAX_AMPLITUDE_FACTOR) / frequency * p.height_scale
    }

    /// Noise height at pixel `(x, y)` on top of `base`.
    pub fn sample(&self, x: usize, y: usize, base: f32) -> f32 {
        let fx = HORIZONTAL_NOISE_SCALE * x as f32;
        let fy = HORIZONTAL_NOISE_SCALE * y as f32;
        let mut sum = 0.0;
        let mut gradient = Vec2::ZERO;
        for octave in 0..self.octaves {
            let frequency = (1u32 << octave) as f32;
            let amplitude = self.amplitude(sum + base, frequency, gradient);
            let (value, grad) = value_noise_2d(self.params.context, fx, fy, frequency);
            sum += (value * 2.0 - 1.0) * amplitude;
            gradient += grad * frequency * amplitude;
        }
        sum
    }
}

/// Parameters of the voronoise layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VoronoiseParams {
    pub context: NoiseContext,
    pub height: f32,
    /// Coarsest octave; octave `i` runs at frequency `2^i`.
    pub min_octave: u32,
    /// Finest octave, inclusive. Must not be below `min_octave`.
    pub max_octave: u32,
}

/// Largest octave a voronoise layer may request.
pub const MAX_VORONOISE_OCTAVE: u32 = 24;

/// Voronoise prepared for one buffer resolution.
#[derive(Clone, Copy, Debug)]
pub struct VoronoiseKernel {
    params: VoronoiseParams,
    scale: Vec2,
}

impl VoronoiseKernel {
    /// Five base cells span each axis of the buffer.
    pub fn new(params: VoronoiseParams, info: &MapBufferInfo) -> Self {
        assert!(
            params.min_octave <= params.max_octave && params.max_octave <= MAX_VORONOISE_OCTAVE,
            "voronoise octaves {}..={} out of range",
            params.min_octave,
            params.max_octave
        );
        Self {
            params,
            scale: Vec2::new(
                5.0 / info.resolution_x.max(1) as f32,
                5.0 / info.resolution_y.max(1) as f32,
            ),
        }
    }

    /// Sum of the octave amplitudes; `|sample| <= height * amplitude_sum`.
    pub fn amplitude_sum(&self) -> f32 {
        (self.params.min_octave..=self.params.max_octave)
            .map(|octave| octave_amplitude((1u32 << octave) as f32))
            .sum()
    }

    pub fn sample(&self, x: usize, y: usize) -> f32 {
        let p = Vec2::new(x as f32, y as f32) * self.scale;
        let mut sum = 0.0;
        for octave in self.params.min_octave..=self.params.max_octave {
            let frequency = (1u32 << octave) as f32;
            let cell = voronoise(self.params.context, p.x * frequency, p.y * frequency);
            sum += (cell * 2.0 - 1.0) * octave_amplitude(frequency);
        }
        sum * self.params.height
    }
}

#[inline]
fn octave_amplitude(frequency: f32) -> f32 {
    frequency.powf(-1.3)
}

/// Noise kernels. Their output never reads `prev`.
#[derive(Debug)]
pub enum NoiseKernel<'a> {
    /// Uses `current` as height offset for the amplitude terms.
    Value(ValueNoiseKernel),
    Voronoise(VoronoiseKernel),
    Fbm(&'a FbmSampler),
}

impl PixelKernel for NoiseKernel<'_> {
    #[inline]
    fn evaluate(&self, info: &MapBufferInfo, x: usize, y: usize, inputs: &LayerInputs<'_>) -> f32 {
        match self {
            Self::Value(kernel) => kernel.sample(x, y, inputs.current_or_zero(info.index(x, y))),
            Self::Voronoise(kernel) => kernel.sample(x, y),
            Self::Fbm(sampler) => {
                let p = info.world_position(x, y);
                sampler.sample(f64::from(p.x), f64::from(p.y)) as f32
            }
        }
    }
}

/// Layer producing value noise.
#[derive(Clone, Debug)]
pub struct ValueNoiseCommand {
    params: ValueNoiseParams,
}

impl ValueNoiseCommand {
    pub fn new(params: ValueNoiseParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ValueNoiseParams {
        &self.params
    }
}

impl Command for ValueNoiseCommand {
    fn name(&self) -> &'static str {
        "Value Noise"
    }

    fn prepare(&self, info: &MapBufferInfo, _inputs: LayerInputs<'_>) -> Kernel<'_> {
        Kernel::Noise(NoiseKernel::Value(ValueNoiseKernel::new(self.params, info)))
    }
}

/// Layer producing multi-octave voronoise.
#[derive(Clone, Debug)]
pub struct VoronoiseCommand {
    params: VoronoiseParams,
}

impl VoronoiseCommand {
    /// Panics when the octave range is empty or exceeds
    /// [`MAX_VORONOISE_OCTAVE`].
    pub fn new(params: VoronoiseParams) -> Self {
        assert!(
            params.min_octave <= params.max_octave && params.max_octave <= MAX_VORONOISE_OCTAVE,
            "voronoise octaves {}..={} out of range",
            params.min_octave,
            params.max_octave
        );
        Self { params }
    }

    pub fn params(&self) -> &VoronoiseParams {
        &self.params
    }
}

impl Command for VoronoiseCommand {
    fn name(&self) -> &'static str {
        "Voronoise"
    }

    fn prepare(&self, info: &MapBufferInfo, _inputs: LayerInputs<'_>) -> Kernel<'_> {
        Kernel::Noise(NoiseKernel::Voronoise(VoronoiseKernel::new(self.params, info)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_1d_in_unit_range() {
        for i in (-5_000i64..5_000).step_by(7) {
            let v = sample_1d(i);
            assert!((0.0..=1.0).contains(&v), "sample_1d({i}) = {v}");
        }
        assert_eq!(sample_1d(12_345), sample_1d(12_345));
    }

    #[test]
    fn test_value_noise_matches_lattice_at_integers() {
        let ctx = NoiseContext::new(3);
        let (value, gradient) = value_noise_2d(ctx, 4.0, 7.0, 1.0);
        let expected = sample_1d(4 * 57 + 7 * 101 + 3) as f32;
        assert!((value - expected).abs() < 1e-6);
        assert_eq!(gradient, Vec2::ZERO);
    }

    #[test]
    fn test_value_noise_gradient_matches_finite_difference() {
        let ctx = NoiseContext::new(11);
        let h = 1e-3;
        for (x, y) in [(0.3, 0.6), (2.25, -1.4), (-3.7, 5.1)] {
            let (_, gradient) = value_noise_2d(ctx, x, y, 1.0);
            let (xp, _) = value_noise_2d(ctx, x + h, y, 1.0);
            let (xm, _) = value_noise_2d(ctx, x - h, y, 1.0);
            let (yp, _) = value_noise_2d(ctx, x, y + h, 1.0);
            let (ym, _) = value_noise_2d(ctx, x, y - h, 1.0);
            let numeric = Vec2::new((xp - xm) / (2.0 * h), (yp - ym) / (2.0 * h));
            assert!(
                (numeric - gradient).length() < 2e-2,
                "gradient at ({x}, {y}): analytic {gradient}, numeric {numeric}"
            );
        }
    }

    #[test]
    fn test_seed_changes_noise() {
        let a = value_noise_2d(NoiseContext::new(1), 0.5, 0.5, 1.0).0;
        let b = value_noise_2d(NoiseContext::new(2), 0.5, 0.5, 1.0).0;
        assert_ne!(a, b);
    }

    #[test]
    fn test_octaves_follow_resolution() {
        let info = MapBufferInfo::new(10.0, 10.0, 1.0, 512, 200);
        let kernel = ValueNoiseKernel::new(ValueNoiseParams::default(), &info);
        assert_eq!(kernel.octaves(), 9);
    }

    #[test]
    fn test_zero_height_scale_is_flat() {
        let info = MapBufferInfo::new(10.0, 10.0, 1.0, 64, 64);
        let kernel = ValueNoiseKernel::new(
            ValueNoiseParams {
                height_scale: 0.0,
                height_dependency: 2.0,
                ..Default::default()
            },
            &info,
        );
        for (x, y) in [(0, 0), (13, 40), (63, 63)] {
            assert_eq!(kernel.sample(x, y, 5.0), 0.0);
        }
    }

    #[test]
    fn test_sample_2d_depends_on_both_axes_and_seed() {
        let ctx = NoiseContext::new(9);
        let base = sample_2d(ctx, 3, 4);
        assert_eq!(base, sample_2d(ctx, 3, 4));
        assert_ne!(base, sample_2d(ctx, 4, 3));
        assert_ne!(base, sample_2d(ctx, 3, 5));
        assert_ne!(base, sample_2d(NoiseContext::new(10), 3, 4));
        assert!((0.0..=1.0).contains(&sample_2d(ctx, i64::MIN, i64::MAX)));
    }

    #[test]
    fn test_voronoise_stays_in_unit_range() {
        let ctx = NoiseContext::new(5);
        for j in -20..20 {
            for i in -20..20 {
                let (x, y) = (i as f32 * 0.37, j as f32 * 0.29);
                let v = voronoise(ctx, x, y);
                assert!((0.0..=1.0).contains(&v), "voronoise({x}, {y}) = {v}");
            }
        }
    }

    #[test]
    fn test_voronoise_is_continuous() {
        let ctx = NoiseContext::new(21);
        for (x, y) in [(0.5, 0.5), (1.999, 3.2), (-4.1, 0.01)] {
            let a = voronoise(ctx, x, y);
            let b = voronoise(ctx, x + 1e-4, y + 1e-4);
            assert!((a - b).abs() < 1e-2, "jump at ({x}, {y}): {a} vs {b}");
        }
    }

    #[test]
    fn test_voronoise_seed_changes_field() {
        let row = |seed| -> Vec<f32> {
            (0..16)
                .map(|i| voronoise(NoiseContext::new(seed), i as f32 * 0.7, 0.3))
                .collect()
        };
        assert_ne!(row(1), row(2));
    }

    fn voronoise_params(min_octave: u32, max_octave: u32) -> VoronoiseParams {
        VoronoiseParams {
            context: NoiseContext::new(77),
            height: 50.0,
            min_octave,
            max_octave,
        }
    }

    #[test]
    fn test_voronoise_layer_bounded_by_height() {
        let info = MapBufferInfo::new(10.0, 10.0, 1.0, 64, 48);
        let kernel = VoronoiseKernel::new(voronoise_params(0, 3), &info);
        let bound = 50.0 * kernel.amplitude_sum();
        for y in (0..48).step_by(5) {
            for x in (0..64).step_by(3) {
                let h = kernel.sample(x, y);
                assert!(h.is_finite() && h.abs() <= bound, "voronoise {h} at ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_voronoise_layer_ignores_inputs() {
        let info = MapBufferInfo::new(4.0, 4.0, 1.0, 4, 4);
        let command = VoronoiseCommand::new(voronoise_params(1, 2));
        let current = [100.0; 16];
        let with = LayerInputs::new(Some(&current), Some(&current));
        let without = LayerInputs::new(None, None);
        let kernel = command.prepare(&info, without);
        for (x, y) in [(0, 0), (3, 1), (2, 3)] {
            assert_eq!(
                kernel.evaluate(&info, x, y, &with),
                kernel.evaluate(&info, x, y, &without)
            );
        }
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_voronoise_rejects_inverted_octaves() {
        VoronoiseCommand::new(voronoise_params(3, 1));
    }

    #[test]
    fn test_amplitude_is_bounded() {
        let info = MapBufferInfo::new(10.0, 10.0, 1.0, 256, 256);
        let params = ValueNoiseParams {
            height_scale: 2.0,
            height_dependency: 50.0,
            gradient_dependency: 50.0,
            ..Default::default()
        };
        let kernel = ValueNoiseKernel::new(params, &info);
        // Geometric bound: sum over octaves of cap * scale / 2^i.
        let bound = MAX_AMPLITUDE_FACTOR * 2.0 * 2.0;
        for y in (0..256).step_by(17) {
            for x in (0..256).step_by(13) {
                let h = kernel.sample(x, y, 100.0);
                assert!(h.is_finite() && h.abs() <= bound, "noise {h} at ({x}, {y})");
            }
        }
    }
}
