/*!
Height oracle adapter.

The raw oracle reports "no hit" as `0.0`, and it sometimes misses solid ground
when the queried point falls into a seam of the collision mesh. Two layers
compensate:

- [`probe_height`] maps the sentinel to `None`.
- [`probe_height_robust`] retries on an eps-hexagon around the point. Points
  2.5 cm away are treated as the same ground.
*/

use crate::{
    geometry::unit_hexagon,
    oracle::TerrainOracle,
    settings::{ProbePolicy, SamplerSettings},
};

/// Single oracle query. `None` when the oracle returned its `0.0` sentinel.
#[inline]
pub fn probe_height<O: TerrainOracle + ?Sized>(oracle: &O, x: f32, y: f32) -> Option<f32> {
    let z = oracle.ground_height(x, y);
    if z == 0.0 { None } else { Some(z) }
}

/// Probe `(x, y)` and fall back to the eps-hexagon around it.
///
/// Never issues more than 7 oracle queries. With [`ProbePolicy::FirstHit`] it stops at
/// the first hit; with [`ProbePolicy::MaxMerge`] it always queries all 7 points and keeps
/// the highest hit.
pub fn probe_height_robust<O: TerrainOracle + ?Sized>(
    oracle: &O,
    settings: &SamplerSettings,
    x: f32,
    y: f32,
) -> Option<f32> {
    let eps = settings.probe_epsilon;
    let mut around = unit_hexagon()
        .into_iter()
        .map(move |v| (x + v.x * eps, y + v.y * eps));

    match settings.probe_policy {
        ProbePolicy::FirstHit => probe_height(oracle, x, y)
            .or_else(|| around.find_map(|(px, py)| probe_height(oracle, px, py))),
        ProbePolicy::MaxMerge => {
            let center = probe_height(oracle, x, y);
            around
                .filter_map(|(px, py)| probe_height(oracle, px, py))
                .chain(center)
                .reduce(f32::max)
        }
    }
}
