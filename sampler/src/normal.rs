use crate::{
    geometry::{Vec3, closest_point_on_line, triangle_normal, unit_hexagon},
    oracle::TerrainOracle,
    probe::probe_height_robust,
    settings::SamplerSettings,
};

/// Surface normal at `(x, y)` averaged over a hexagonal neighborhood of the given radius.
///
/// The six triangles `(hex[i], center, hex[i + 1])` fan around the center. Their unit
/// normals are summed and the sum is normalized. Any height the oracle cannot
/// provide, even through the eps-hexagon fallback, is replaced by `ground_z`.
/// Degenerate neighborhoods (radius 0) yield straight up.
pub fn estimate_normal<O: TerrainOracle + ?Sized>(
    oracle: &O,
    settings: &SamplerSettings,
    x: f32,
    y: f32,
    radius: f32,
    ground_z: f32,
) -> Vec3 {
    let height_at =
        |px: f32, py: f32| probe_height_robust(oracle, settings, px, py).unwrap_or(ground_z);

    let center = Vec3::new(x, y, height_at(x, y));
    let hexagon = unit_hexagon().map(|v| {
        let (hx, hy) = (x + v.x * radius, y + v.y * radius);
        Vec3::new(hx, hy, height_at(hx, hy))
    });

    let sum: Vec3 = (0..hexagon.len())
        .filter_map(|i| triangle_normal(hexagon[i], center, hexagon[(i + 1) % hexagon.len()]))
        .sum();

    sum.try_normalize(f32::EPSILON).unwrap_or_else(Vec3::z)
}

/// Distance from `position` to the road line through the two nearest road-graph points.
///
/// The projection is onto the infinite line, not the segment between the points, so a
/// position beyond either end still measures its perpendicular distance. `None` if
/// the oracle has no road at all.
pub fn distance_to_road<O: TerrainOracle + ?Sized>(oracle: &O, position: Vec3) -> Option<f32> {
    let (a, b) = oracle.nearest_road_points(position)?;
    let nearest = closest_point_on_line(position, a, b);
    Some((position - nearest).norm())
}
