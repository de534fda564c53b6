//! Grid description and read-only layer inputs shared by every kernel.

use glam::Vec2;

/// Resolution and world mapping of one heightmap buffer.
///
/// Buffers are row-major: pixel `(x, y)` lives at `y * resolution_x + x`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MapBufferInfo {
    pub resolution_x: usize,
    pub resolution_y: usize,
    pub world_size_x: f32,
    pub world_size_y: f32,
    pub pixels_per_world_unit: f32,
    /// World units covered by one pixel, `1 / pixels_per_world_unit`.
    pub pixel_size: f32,
}

impl MapBufferInfo {
    /// # Panics
    ///
    /// Panics on a zero resolution or a non-positive pixel density.
    pub fn new(
        world_size_x: f32,
        world_size_y: f32,
        pixels_per_world_unit: f32,
        resolution_x: usize,
        resolution_y: usize,
    ) -> Self {
        assert!(
            resolution_x > 0 && resolution_y > 0,
            "buffer resolution must be non-zero, got {resolution_x}x{resolution_y}"
        );
        assert!(
            pixels_per_world_unit > 0.0,
            "pixels per world unit must be positive, got {pixels_per_world_unit}"
        );
        Self {
            resolution_x,
            resolution_y,
            world_size_x,
            world_size_y,
            pixels_per_world_unit,
            pixel_size: 1.0 / pixels_per_world_unit,
        }
    }

    /// Number of cells in the buffer.
    pub fn len(&self) -> usize {
        self.resolution_x * self.resolution_y
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.resolution_x + x
    }

    /// World-space position of pixel `(x, y)`.
    #[inline]
    pub fn world_position(&self, x: usize, y: usize) -> Vec2 {
        Vec2::new(x as f32 * self.pixel_size, y as f32 * self.pixel_size)
    }
}

/// Results of the two previous layers, if they exist.
#[derive(Clone, Copy, Debug, Default)]
pub struct LayerInputs<'a> {
    pub prev: Option<&'a [f32]>,
    pub current: Option<&'a [f32]>,
}

impl<'a> LayerInputs<'a> {
    pub fn new(prev: Option<&'a [f32]>, current: Option<&'a [f32]>) -> Self {
        Self { prev, current }
    }

    /// Value of `current` at `index`, or `0.0` when there is no current layer.
    #[inline]
    pub fn current_or_zero(&self, index: usize) -> f32 {
        self.current.map_or(0.0, |current| current[index])
    }
}
