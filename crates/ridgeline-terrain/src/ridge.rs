//! Distance-to-ridge and radial-basis height queries over a spanning tree.
//!
//! The tree's edges are the ridgelines; node `z` carries the summit height
//! divided by [`HEIGHT_CODE_FACTOR`]. All queries are read-only, so one field
//! can be shared by every worker of a layer.

use glam::{Vec2, Vec3};
use ridgeline_graph::{EdgeId, Graph, HEIGHT_CODE_FACTOR, compute_mst};

/// Gaussian falloff of the radial basis interpolation, per squared world unit.
pub const RBF_FALLOFF: f32 = 0.0006;

/// Closest point on the ridge network for a query position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RidgeDistance {
    /// Euclidean distance in the xy plane. `+inf` for an edgeless tree.
    pub distance: f32,
    /// Parameter of the foot point along the closest edge, in `[0, 1]`.
    pub t: f32,
    pub edge: Option<EdgeId>,
}

#[derive(Clone, Copy, Debug)]
struct Segment {
    start: Vec3,
    end: Vec3,
    edge: EdgeId,
}

/// Squared distance from `point` to the segment `start..end` together with
/// the clamped parameter of the foot point. A zero-length segment reports
/// `t = 0`.
pub fn point_segment_distance_sq(start: Vec2, end: Vec2, point: Vec2) -> (f32, f32) {
    let dir = end - start;
    let len_sq = dir.length_squared();
    let t = if len_sq > 0.0 {
        ((point - start).dot(dir) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let foot = start + dir * t;
    (point.distance_squared(foot), t)
}

/// Read-only ridge network built from a spanning tree.
#[derive(Clone, Debug)]
pub struct RidgeField {
    segments: Vec<Segment>,
    nodes: Vec<Vec3>,
}

impl RidgeField {
    /// Copies the segments and summits of an already built tree.
    ///
    /// # Panics
    ///
    /// Panics if the tree has no nodes.
    pub fn new(mst: &Graph) -> Self {
        assert!(mst.node_count() > 0, "a ridge field needs at least one node");
        let segments = mst
            .edge_records()
            .map(|(edge, e)| Segment {
                start: mst.position(e.src()),
                end: mst.position(e.dst()),
                edge,
            })
            .collect();
        let nodes = mst.nodes().map(|n| mst.position(n)).collect();
        Self { segments, nodes }
    }

    /// Builds the spanning tree over encoded summit positions.
    ///
    /// # Panics
    ///
    /// Panics if `points` is empty.
    pub fn from_points(points: &[Vec3]) -> Self {
        Self::new(&compute_mst(points))
    }

    pub fn edge_count(&self) -> usize {
        self.segments.len()
    }

    /// Minimum distance from `point` to any ridge segment. Linear in the edge
    /// count.
    pub fn min_distance_to_edges(&self, point: Vec2) -> RidgeDistance {
        let mut best = RidgeDistance {
            distance: f32::INFINITY,
            t: 0.0,
            edge: None,
        };
        let mut best_sq = f32::INFINITY;
        for segment in &self.segments {
            let (dist_sq, t) =
                point_segment_distance_sq(segment.start.truncate(), segment.end.truncate(), point);
            if dist_sq < best_sq {
                best_sq = dist_sq;
                best.t = t;
                best.edge = Some(segment.edge);
            }
        }
        best.distance = best_sq.sqrt();
        best
    }

    /// Gaussian-weighted average of the decoded node heights at `point`.
    ///
    /// Far from every node all weights underflow; the nearest node's height is
    /// returned instead.
    pub fn radial_basis_height(&self, point: Vec2) -> f32 {
        let mut weighted = 0.0f32;
        let mut weight_sum = 0.0f32;
        for node in &self.nodes {
            let weight = (-RBF_FALLOFF * node.truncate().distance_squared(point)).exp();
            weighted += weight * node.z;
            weight_sum += weight;
        }
        if weight_sum > 0.0 && weight_sum.is_finite() {
            weighted * HEIGHT_CODE_FACTOR / weight_sum
        } else {
            self.nearest_node(point).z * HEIGHT_CODE_FACTOR
        }
    }

    fn nearest_node(&self, point: Vec2) -> Vec3 {
        self.nodes
            .iter()
            .copied()
            .min_by(|a, b| {
                a.truncate()
                    .distance_squared(point)
                    .total_cmp(&b.truncate().distance_squared(point))
            })
            .unwrap_or(Vec3::ZERO)
    }
}

/// Cross-section of a ridge: linear flanks that blend into the ground with a
/// quadratic foot.
///
/// With `v = height - distance` and spline height `s`, the profile is `v`
/// while `v >= s`, and `max(0, v + s)^2 / (4 s)` below. The two pieces meet
/// with equal value and slope at `v = s`, and the foot reaches zero at
/// `distance = height + s`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RidgeProfile {
    pub height: f32,
    /// Absolute height of the quadratic foot.
    pub spline: f32,
}

impl RidgeProfile {
    /// Builds a profile whose foot is `spline_fraction` of `height`.
    pub fn new(height: f32, spline_fraction: f32) -> Self {
        Self {
            height,
            spline: spline_fraction.max(0.0) * height.abs(),
        }
    }

    #[inline]
    pub fn evaluate(&self, distance: f32) -> f32 {
        let v = self.height - distance;
        if v >= self.spline {
            v
        } else if self.spline > 0.0 {
            let lifted = v + self.spline;
            // Rounding leaves a residue of up to half an ulp of the foot
            // distance; snap it to zero.
            if lifted <= f32::EPSILON * (self.height.abs() + self.spline) {
                return 0.0;
            }
            lifted * lifted / (4.0 * self.spline)
        } else {
            v.max(0.0)
        }
    }

    /// Ridge height: the profile scaled by the interpolated summit height
    /// relative to the layer height. Zero for a zero layer height.
    #[inline]
    pub fn ridge(&self, field: &RidgeField, point: Vec2) -> f32 {
        if self.height == 0.0 {
            return 0.0;
        }
        let distance = field.min_distance_to_edges(point).distance;
        self.evaluate(distance) * field.radial_basis_height(point) / self.height
    }

    /// Inverse of [`RidgeProfile::ridge`]: valleys carved along the tree.
    #[inline]
    pub fn valley(&self, field: &RidgeField, point: Vec2) -> f32 {
        self.height - self.ridge(field, point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-4;

    fn encoded(x: f32, y: f32, height: f32) -> Vec3 {
        Vec3::new(x, y, height / HEIGHT_CODE_FACTOR)
    }

    /// Closed-form distance from `p` to the segment (0,0)-(10,0).
    fn closed_form(p: Vec2) -> f32 {
        if p.x < 0.0 {
            p.length()
        } else if p.x > 10.0 {
            (p - Vec2::new(10.0, 0.0)).length()
        } else {
            p.y.abs()
        }
    }

    #[test]
    fn test_single_edge_distance_matches_closed_form() {
        let field = RidgeField::from_points(&[encoded(0.0, 0.0, 1.0), encoded(10.0, 0.0, 1.0)]);
        assert_eq!(field.edge_count(), 1);

        let cases = [
            (Vec2::new(-3.0, 4.0), 0.0),
            (Vec2::new(-1.0, 0.0), 0.0),
            (Vec2::new(2.5, 3.0), 0.25),
            (Vec2::new(5.0, -7.0), 0.5),
            (Vec2::new(10.0, 1.0), 1.0),
            (Vec2::new(13.0, -4.0), 1.0),
        ];
        for (p, expected_t) in cases {
            let result = field.min_distance_to_edges(p);
            assert!(
                (result.distance - closed_form(p)).abs() < EPSILON,
                "distance at {p}: {} vs {}",
                result.distance,
                closed_form(p)
            );
            assert!((result.t - expected_t).abs() < EPSILON, "t at {p}: {}", result.t);
            assert!(result.edge.is_some());
        }
    }

    #[test]
    fn test_zero_length_segment_uses_start() {
        let at = Vec2::new(1.0, 1.0);
        let (dist_sq, t) = point_segment_distance_sq(at, at, Vec2::new(4.0, 5.0));
        assert_eq!(t, 0.0);
        assert!((dist_sq - 25.0).abs() < EPSILON);
    }

    #[test]
    fn test_single_point_field() {
        let field = RidgeField::from_points(&[encoded(5.0, 5.0, 40.0)]);
        let near = field.min_distance_to_edges(Vec2::new(5.0, 5.0));
        assert!(near.distance.is_infinite());
        assert_eq!(near.edge, None);

        for p in [Vec2::ZERO, Vec2::new(5.0, 5.0), Vec2::new(1.0e4, -3.0e4)] {
            let h = field.radial_basis_height(p);
            assert!((h - 40.0).abs() < 1e-3, "height at {p}: {h}");
        }
    }

    #[test]
    fn test_radial_basis_is_convex_combination() {
        let field = RidgeField::from_points(&[
            encoded(0.0, 0.0, 10.0),
            encoded(30.0, 0.0, 50.0),
            encoded(0.0, 40.0, 20.0),
        ]);
        for p in [Vec2::new(1.0, 1.0), Vec2::new(20.0, 5.0), Vec2::new(-50.0, 90.0)] {
            let h = field.radial_basis_height(p);
            assert!((10.0 - 1e-3..=50.0 + 1e-3).contains(&h), "height {h} outside summit range");
        }
        let at_tall = field.radial_basis_height(Vec2::new(30.0, 0.0));
        let at_low = field.radial_basis_height(Vec2::new(0.0, 0.0));
        assert!(at_tall > at_low);
    }

    #[test]
    fn test_profile_is_continuous_at_spline_joint() {
        let profile = RidgeProfile::new(50.0, 0.3);
        assert!((profile.spline - 15.0).abs() < EPSILON);
        let joint = profile.height - profile.spline;
        let below = profile.evaluate(joint - 1e-3);
        let above = profile.evaluate(joint + 1e-3);
        assert!((below - above).abs() < 1e-2);
        assert_eq!(profile.evaluate(0.0), 50.0);
        assert_eq!(profile.evaluate(65.0), 0.0);
        assert_eq!(profile.evaluate(500.0), 0.0);
    }

    #[test]
    fn test_profile_foot_is_exactly_zero() {
        for (height, fraction) in [(50.0, 0.3), (7.0, 0.1), (123.4, 0.77)] {
            let profile = RidgeProfile::new(height, fraction);
            let foot = profile.height + profile.spline;
            assert_eq!(profile.evaluate(foot), 0.0, "h = {height}, fraction = {fraction}");
            assert!(profile.evaluate(foot - 1.0) > 0.0);
        }
    }

    #[test]
    fn test_profile_without_spline_clamps_at_zero() {
        let profile = RidgeProfile::new(10.0, 0.0);
        assert_eq!(profile.evaluate(4.0), 6.0);
        assert_eq!(profile.evaluate(12.0), 0.0);
    }

    #[test]
    fn test_ridge_and_valley_are_complementary() {
        let profile = RidgeProfile::new(50.0, 0.3);
        let field = RidgeField::from_points(&[encoded(0.0, 0.0, 50.0), encoded(100.0, 0.0, 50.0)]);
        let on_ridge = Vec2::new(50.0, 0.0);
        assert!((profile.ridge(&field, on_ridge) - 50.0).abs() < 1e-2);
        assert!(profile.valley(&field, on_ridge).abs() < 1e-2);

        let far = Vec2::new(50.0, 500.0);
        assert!(profile.ridge(&field, far).abs() < 1e-3);
        assert!((profile.valley(&field, far) - 50.0).abs() < 1e-3);
    }

    #[test]
    fn test_zero_height_profile_is_flat() {
        let profile = RidgeProfile::new(0.0, 0.3);
        let field = RidgeField::from_points(&[encoded(0.0, 0.0, 0.0)]);
        assert_eq!(profile.ridge(&field, Vec2::ZERO), 0.0);
        assert_eq!(profile.valley(&field, Vec2::ZERO), 0.0);
    }

    #[test]
    #[should_panic(expected = "at least one node")]
    fn test_empty_tree_panics() {
        RidgeField::new(&Graph::new());
    }
}
