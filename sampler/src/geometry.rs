/*!
Stateless geometry helpers shared by the probe, scan and normal modules.

Conventions
- World space is Z-up. Horizontal positions are `(x, y)`, heights are `z`.
- Polygon vertex `i` of an `n`-gon with radius `r` is `(sin(i * 2pi / n) * r, cos(i * 2pi / n) * r)`,
  so vertex 0 points along +Y and the winding is clockwise seen from above.
- Angles are computed in `f64` and narrowed afterwards.
*/

use std::f64::consts::{PI, TAU};

use nalgebra as na;

/// Common math aliases for clarity and consistency.
pub type Vec2 = na::Vector2<f32>;
pub type Vec3 = na::Vector3<f32>;
pub type Quat = na::UnitQuaternion<f32>;

/// Vertex `index` of a regular `sides`-gon of the given circumradius, centered on the origin.
#[inline]
pub fn polygon_vertex(index: usize, sides: usize, radius: f32) -> Vec2 {
    let angle = TAU * index as f64 / sides as f64;
    Vec2::new(
        (angle.sin() as f32) * radius,
        (angle.cos() as f32) * radius,
    )
}

/// All vertices of a regular `sides`-gon of the given circumradius.
pub fn regular_polygon(sides: usize, radius: f32) -> impl Iterator<Item = Vec2> {
    (0..sides).map(move |i| polygon_vertex(i, sides, radius))
}

/// The six unit vectors at 60 degree spacing used by the probe and normal patterns.
pub fn unit_hexagon() -> [Vec2; 6] {
    std::array::from_fn(|i| polygon_vertex(i, 6, 1.0))
}

/// Number of samples on a ring of radius `radius` so that neighbors are at most
/// `resolution` apart.
///
/// Uses the side length of a regular n-gon, `2 * r * sin(pi / n)`. Below a radius of
/// `resolution / sqrt(3)` even a triangle is dense enough, so at least 3 steps are used.
pub fn ring_angle_steps(resolution: f32, radius: f32) -> usize {
    let ratio = f64::from(resolution) / f64::from(radius);
    if !(ratio <= 3f64.sqrt()) {
        // Also catches radius == 0 (ratio is inf or NaN).
        return 3;
    }
    (PI / (ratio / 2.0).asin()).ceil() as usize
}

/// Unit normal of triangle `(a, b, c)`, i.e. `normalize((b - a) x (c - a))`.
///
/// Returns `None` for degenerate (zero-area) triangles.
#[inline]
pub fn triangle_normal(a: Vec3, b: Vec3, c: Vec3) -> Option<Vec3> {
    (b - a).cross(&(c - a)).try_normalize(f32::EPSILON)
}

/// Orthogonal projection of `point` onto the infinite line through `a` and `b`.
///
/// The projection is not clamped to the segment. If `a == b` the line is undefined
/// and `a` is returned.
pub fn closest_point_on_line(point: Vec3, a: Vec3, b: Vec3) -> Vec3 {
    let Some(dir) = (b - a).try_normalize(f32::EPSILON) else {
        return a;
    };
    let t = (point - a).dot(&dir);
    a + dir * t
}

/// Closest point to `point` on the segment `[a, b]`.
pub fn closest_point_on_segment(point: Vec3, a: Vec3, b: Vec3) -> Vec3 {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq <= f32::EPSILON {
        return a;
    }
    let t = ((point - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

/// Axis-aligned box in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub mins: Vec3,
    pub maxs: Vec3,
}

impl Bounds {
    /// Cube of half extent `half_extent` centered on `center`.
    #[inline]
    pub fn around(center: Vec3, half_extent: f32) -> Self {
        let h = Vec3::repeat(half_extent.abs());
        Self {
            mins: center - h,
            maxs: center + h,
        }
    }

    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.mins + self.maxs) * 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1.0e-5;

    #[test]
    fn hexagon_starts_on_plus_y_and_has_unit_length() {
        let hex = unit_hexagon();
        assert!((hex[0] - Vec2::new(0.0, 1.0)).norm() < EPS);
        for v in hex {
            assert!((v.norm() - 1.0).abs() < EPS);
        }
        // 60 degrees between neighbors, so neighbors are exactly one radius apart.
        for i in 0..6 {
            let d = (hex[(i + 1) % 6] - hex[i]).norm();
            assert!((d - 1.0).abs() < EPS);
        }
    }

    #[test]
    fn polygon_has_requested_vertex_count_and_radius() {
        let pts: Vec<Vec2> = regular_polygon(7, 2.5).collect();
        assert_eq!(pts.len(), 7);
        assert!(pts.iter().all(|p| (p.norm() - 2.5).abs() < EPS));
    }

    #[test]
    fn tiny_rings_use_a_triangle() {
        assert_eq!(ring_angle_steps(0.1, 0.01), 3);
        assert_eq!(ring_angle_steps(0.1, 0.0), 3);
    }

    #[test]
    fn ring_steps_keep_neighbors_within_resolution() {
        for &radius in &[0.1_f32, 0.25, 1.0, 5.0, 37.3] {
            let n = ring_angle_steps(0.1, radius);
            let side = 2.0 * radius * (std::f32::consts::PI / n as f32).sin();
            assert!(side <= 0.1 + 1.0e-4, "radius {radius}: n={n} side={side}");
            // One step fewer would exceed the resolution.
            if n > 3 {
                let coarser = 2.0 * radius * (std::f32::consts::PI / (n - 1) as f32).sin();
                assert!(coarser > 0.1 - 1.0e-4);
            }
        }
    }

    #[test]
    fn flat_triangle_in_hexagon_order_points_up() {
        let hex = unit_hexagon();
        let a = Vec3::new(hex[0].x, hex[0].y, 3.0);
        let b = Vec3::new(0.0, 0.0, 3.0);
        let c = Vec3::new(hex[1].x, hex[1].y, 3.0);
        let n = triangle_normal(a, b, c).unwrap();
        assert!((n - Vec3::z()).norm() < EPS);
    }

    #[test]
    fn degenerate_triangle_has_no_normal() {
        let p = Vec3::new(1.0, 2.0, 3.0);
        assert!(triangle_normal(p, p, p).is_none());
    }

    #[test]
    fn line_projection_is_not_clamped() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(1.0, 0.0, 0.0);
        let p = Vec3::new(5.0, 2.0, 0.0);
        let q = closest_point_on_line(p, a, b);
        assert!((q - Vec3::new(5.0, 0.0, 0.0)).norm() < EPS);

        let s = closest_point_on_segment(p, a, b);
        assert!((s - b).norm() < EPS);
    }

    #[test]
    fn line_projection_with_coincident_points_returns_point() {
        let a = Vec3::new(4.0, 4.0, 1.0);
        let q = closest_point_on_line(Vec3::new(0.0, 0.0, 0.0), a, a);
        assert_eq!(q, a);
    }

    #[test]
    fn bounds_around_is_centered_cube() {
        let c = Vec3::new(10.0, -3.0, 50.0);
        let b = Bounds::around(c, -25.0);
        assert!((b.center() - c).norm() < EPS);
        assert_eq!(b.maxs - b.mins, Vec3::repeat(50.0));
    }
}
