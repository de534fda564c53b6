//! Generator layers: ridge and valley networks from a spanning tree, plus
//! cellular distance fields over the same kind of point sets.

use glam::{Vec2, Vec3};
use ridgeline_graph::HEIGHT_CODE_FACTOR;
use tracing::debug;

use crate::buffer::{LayerInputs, MapBufferInfo};
use crate::command::Command;
use crate::kernel::{Kernel, PixelKernel};
use crate::ridge::{RidgeField, RidgeProfile};

/// Largest supported zero-based neighbor index of a Worley layer.
pub const MAX_WORLEY_NEIGHBOR: usize = 15;

/// Generator kernels ignore both inputs.
#[derive(Debug)]
pub enum GeneratorKernel<'a> {
    Ridge {
        field: &'a RidgeField,
        profile: RidgeProfile,
    },
    Valley {
        field: &'a RidgeField,
        profile: RidgeProfile,
    },
    Worley {
        points: &'a [Vec3],
        nth: usize,
        height: f32,
    },
    Voronoi {
        points: &'a [Vec3],
        height: f32,
    },
}

impl PixelKernel for GeneratorKernel<'_> {
    #[inline]
    fn evaluate(&self, info: &MapBufferInfo, x: usize, y: usize, _inputs: &LayerInputs<'_>) -> f32 {
        let p = info.world_position(x, y);
        match *self {
            Self::Ridge { field, profile } => profile.ridge(field, p),
            Self::Valley { field, profile } => profile.valley(field, p),
            Self::Worley { points, nth, height } => nth_neighbor_distance(points, nth, p) * height,
            Self::Voronoi { points, height } => height - offset_cell_distance(points, p) * height,
        }
    }
}

/// Distance to the `nth` closest point (zero based). A point's `z` acts as
/// its offset out of the plane.
pub fn nth_neighbor_distance(points: &[Vec3], nth: usize, p: Vec2) -> f32 {
    let mut nearest = [f32::MAX; MAX_WORLEY_NEIGHBOR + 1];
    let nearest = &mut nearest[..=nth];
    for point in points {
        let mut dist_sq = p.distance_squared(point.truncate()) + point.z * point.z;
        // Sorted insertion, bubbling the displaced value down the list.
        for slot in nearest.iter_mut() {
            if dist_sq < *slot {
                std::mem::swap(&mut dist_sq, slot);
            }
        }
    }
    nearest[nth].sqrt()
}

/// Smallest planar distance minus the point's `z`, so taller points own
/// larger cells.
pub fn offset_cell_distance(points: &[Vec3], p: Vec2) -> f32 {
    points
        .iter()
        .map(|point| p.distance(point.truncate()) - point.z)
        .fold(f32::MAX, f32::min)
}

/// Which side of the ridge profile an MST layer produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MstMode {
    /// Mountain ridges along the tree ("MST Inverse Distance").
    Ridges,
    /// Valleys along the tree ("MST Distance").
    Valleys,
}

/// Layer evaluating a ridge profile against a spanning tree built once at
/// construction.
#[derive(Clone, Debug)]
pub struct MstDistanceCommand {
    field: RidgeField,
    profile: RidgeProfile,
    mode: MstMode,
}

impl MstDistanceCommand {
    /// `points` hold world `x`, `y` and a summit height relative to `height`.
    ///
    /// # Panics
    ///
    /// Panics if `points` is empty.
    pub fn new(points: &[Vec3], height: f32, spline_fraction: f32, mode: MstMode) -> Self {
        let encoded: Vec<Vec3> = points
            .iter()
            .map(|p| Vec3::new(p.x, p.y, p.z * height / HEIGHT_CODE_FACTOR))
            .collect();
        let field = RidgeField::from_points(&encoded);
        debug!(
            points = points.len(),
            edges = field.edge_count(),
            ?mode,
            "built ridge network"
        );
        Self {
            field,
            profile: RidgeProfile::new(height, spline_fraction),
            mode,
        }
    }

    pub fn field(&self) -> &RidgeField {
        &self.field
    }

    pub fn profile(&self) -> RidgeProfile {
        self.profile
    }

    pub fn mode(&self) -> MstMode {
        self.mode
    }
}

impl Command for MstDistanceCommand {
    fn name(&self) -> &'static str {
        match self.mode {
            MstMode::Ridges => "MST Inverse Distance",
            MstMode::Valleys => "MST Distance",
        }
    }

    fn prepare(&self, _info: &MapBufferInfo, _inputs: LayerInputs<'_>) -> Kernel<'_> {
        let field = &self.field;
        let profile = self.profile;
        Kernel::Generator(match self.mode {
            MstMode::Ridges => GeneratorKernel::Ridge { field, profile },
            MstMode::Valleys => GeneratorKernel::Valley { field, profile },
        })
    }
}

/// Layer producing the distance to the n-th nearest feature point.
#[derive(Clone, Debug)]
pub struct WorleyCommand {
    points: Vec<Vec3>,
    nth: usize,
    height: f32,
}

impl WorleyCommand {
    /// # Panics
    ///
    /// Panics unless `nth < points.len()` and `nth <= MAX_WORLEY_NEIGHBOR`.
    pub fn new(points: Vec<Vec3>, nth: usize, height: f32) -> Self {
        assert!(
            nth < points.len(),
            "neighbor index {nth} needs more than {} points",
            points.len()
        );
        assert!(
            nth <= MAX_WORLEY_NEIGHBOR,
            "neighbor index {nth} exceeds {MAX_WORLEY_NEIGHBOR}"
        );
        Self { points, nth, height }
    }
}

impl Command for WorleyCommand {
    fn name(&self) -> &'static str {
        "Worley Noise"
    }

    fn prepare(&self, _info: &MapBufferInfo, _inputs: LayerInputs<'_>) -> Kernel<'_> {
        Kernel::Generator(GeneratorKernel::Worley {
            points: &self.points,
            nth: self.nth,
            height: self.height,
        })
    }
}

/// Layer producing Voronoi cells whose size follows each point's `z`.
#[derive(Clone, Debug)]
pub struct VoronoiCommand {
    points: Vec<Vec3>,
    height: f32,
}

impl VoronoiCommand {
    /// # Panics
    ///
    /// Panics if `points` is empty.
    pub fn new(points: Vec<Vec3>, height: f32) -> Self {
        assert!(!points.is_empty(), "a Voronoi layer needs at least one point");
        Self { points, height }
    }
}

impl Command for VoronoiCommand {
    fn name(&self) -> &'static str {
        "Voronoi"
    }

    fn prepare(&self, _info: &MapBufferInfo, _inputs: LayerInputs<'_>) -> Kernel<'_> {
        Kernel::Generator(GeneratorKernel::Voronoi {
            points: &self.points,
            height: self.height,
        })
    }
}
