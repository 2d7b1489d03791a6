//! Road and water layers queried next to the collision world.

use rapier3d::na::{Vector2, Vector3};
use sampler::closest_point_on_segment;

/// Maximum height difference between a point and the road surface for the point to
/// count as on the road.
pub const ROAD_VERTICAL_TOLERANCE: f32 = 3.0;

/// A road centerline with a uniform half width.
#[derive(Clone, Debug, PartialEq)]
pub struct Road {
    points: Vec<Vector3<f32>>,
    half_width: f32,
}

impl Road {
    pub fn new(points: impl IntoIterator<Item = Vector3<f32>>, half_width: f32) -> Self {
        Self {
            points: points.into_iter().collect(),
            half_width,
        }
    }

    pub fn segments(&self) -> impl Iterator<Item = (Vector3<f32>, Vector3<f32>)> + '_ {
        self.points.windows(2).map(|w| (w[0], w[1]))
    }

    /// Whether `(x, y, z)` lies on the road surface.
    pub fn contains(&self, x: f32, y: f32, z: f32) -> bool {
        let p = Vector2::new(x, y);
        self.segments().any(|(a, b)| {
            let (planar_distance, road_z) = planar_projection(p, a, b);
            planar_distance <= self.half_width && (z - road_z).abs() <= ROAD_VERTICAL_TOLERANCE
        })
    }
}

/// Planar distance from `p` to segment `[a, b]`, and the segment height at the
/// closest point.
fn planar_projection(p: Vector2<f32>, a: Vector3<f32>, b: Vector3<f32>) -> (f32, f32) {
    let (a2, b2) = (a.xy(), b.xy());
    let ab = b2 - a2;
    let len_sq = ab.norm_squared();
    let t = if len_sq <= f32::EPSILON {
        0.0
    } else {
        ((p - a2).dot(&ab) / len_sq).clamp(0.0, 1.0)
    };
    let closest = a2 + ab * t;
    ((p - closest).norm(), a.z + (b.z - a.z) * t)
}

/// Endpoints of the road segment closest to `position`, over all roads.
pub fn nearest_segment(roads: &[Road], position: Vector3<f32>) -> Option<(Vector3<f32>, Vector3<f32>)> {
    roads
        .iter()
        .flat_map(Road::segments)
        .map(|(a, b)| {
            let d = (position - closest_point_on_segment(position, a, b)).norm_squared();
            (d, a, b)
        })
        .min_by(|l, r| l.0.total_cmp(&r.0))
        .map(|(_, a, b)| (a, b))
}

/// Axis-aligned water rectangle with a flat surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WaterBody {
    pub min: Vector2<f32>,
    pub max: Vector2<f32>,
    pub surface: f32,
}

impl WaterBody {
    pub fn new(min: Vector2<f32>, max: Vector2<f32>, surface: f32) -> Self {
        Self { min, max, surface }
    }

    /// Whether ground at height `ground_z` under `(x, y)` is submerged.
    pub fn covers(&self, x: f32, y: f32, ground_z: f32) -> bool {
        x >= self.min.x
            && x <= self.max.x
            && y >= self.min.y
            && y <= self.max.y
            && ground_z < self.surface
    }
}
