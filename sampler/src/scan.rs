/*!
Radial scan over the disc around a stabilized sample.

The disc is sampled as concentric rings `resolution` apart. Each ring is a
regular polygon with enough vertices to keep neighbors within `resolution`. The
ring points are built in the sample's local XY plane and rotated by the sample
orientation. So a tilted sample scans a tilted disc, and each hit is corrected
by the point's own vertical offset before it is compared.

In the full record shape the last ring overshoots the nominal radius. That ring
is only used to decide whether the footprint touches a road or water. It never
contributes to the minimum height.
*/

use crate::{
    constants::{APPROX_EPSILON, OUTER_RING_MAX_OVERSHOOT, OUTER_RING_MIN_OVERSHOOT},
    geometry::{Quat, Vec3, regular_polygon, ring_angle_steps},
    oracle::TerrainOracle,
    probe::probe_height_robust,
    settings::SamplerSettings,
};

/// One radius level of the scan.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ring {
    pub radius: f32,
    /// The oversized classification ring.
    pub outer: bool,
}

/// Extra radius of the outer classification ring for a disc of radius `radius`.
#[inline]
pub fn outer_ring_overshoot(radius: f32) -> f32 {
    radius
        .max(OUTER_RING_MIN_OVERSHOOT)
        .min(OUTER_RING_MAX_OVERSHOOT)
}

/// Ring radii for a disc: `resolution, 2 * resolution, ...` clamped to the disc radius,
/// optionally followed by the outer classification ring.
#[derive(Clone, Debug)]
pub struct RingSchedule {
    resolution: f32,
    radius: f32,
    next: f32,
    with_outer: bool,
    done: bool,
}

impl RingSchedule {
    pub fn new(resolution: f32, radius: f32, with_outer: bool) -> Self {
        Self {
            resolution,
            radius,
            next: resolution,
            with_outer,
            done: !(radius > 0.0 && radius.is_finite() && resolution > 0.0),
        }
    }

    pub fn for_settings(settings: &SamplerSettings, radius: f32) -> Self {
        Self::new(
            settings.resolution,
            radius,
            settings.shape.classifies_surface(),
        )
    }
}

impl Iterator for RingSchedule {
    type Item = Ring;

    fn next(&mut self) -> Option<Ring> {
        if self.done {
            return None;
        }

        let mut radius = self.next;
        let mut outer = false;
        if radius >= self.radius + self.resolution - APPROX_EPSILON {
            self.done = true;
            if !self.with_outer {
                return None;
            }
            radius = self.radius + outer_ring_overshoot(self.radius);
            outer = true;
        } else if radius >= self.radius - APPROX_EPSILON {
            // Close enough to (or past) the edge: sample exactly on it.
            radius = self.radius;
        }

        self.next = radius + self.resolution;
        Some(Ring { radius, outer })
    }
}

/// Aggregates of one disc scan.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DiscScan {
    /// Lowest ground height under the disc, in absolute world z.
    pub min_z: f32,
    pub on_road: bool,
    pub in_water: bool,
}

/// Scan the disc of radius `radius` around `center`, whose z is the stabilized ground height.
///
/// Misses are skipped. The minimum starts at `center.z`, so a disc without any hit
/// reports the center height.
pub fn scan_disc<O: TerrainOracle + ?Sized>(
    oracle: &O,
    settings: &SamplerSettings,
    center: Vec3,
    orientation: &Quat,
    radius: f32,
) -> DiscScan {
    let classify = settings.shape.classifies_surface();
    let mut scan = DiscScan {
        min_z: center.z,
        on_road: false,
        in_water: false,
    };

    if classify {
        scan.on_road = oracle.is_point_on_road(center.x, center.y, center.z);
        scan.in_water = oracle.is_point_in_water(center.x, center.y, center.z);
    }

    for ring in RingSchedule::for_settings(settings, radius) {
        if ring.outer && scan.on_road && scan.in_water {
            break;
        }

        let steps = ring_angle_steps(settings.resolution, ring.radius);
        for local in regular_polygon(steps, ring.radius) {
            let offset = orientation * Vec3::new(local.x, local.y, 0.0);
            let (x, y) = (center.x + offset.x, center.y + offset.y);

            let Some(z) = probe_height_robust(oracle, settings, x, y) else {
                continue;
            };

            if ring.outer {
                if !scan.on_road {
                    scan.on_road = oracle.is_point_on_road(x, y, z);
                }
                if !scan.in_water {
                    scan.in_water = oracle.is_point_in_water(x, y, z);
                }
                if scan.on_road && scan.in_water {
                    break;
                }
            } else {
                scan.min_z = scan.min_z.min(z - offset.z);
            }
        }
    }

    scan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{settings::RecordShape, testing::ScriptedWorld};

    fn radii(schedule: RingSchedule) -> Vec<(f32, bool)> {
        schedule.map(|r| (r.radius, r.outer)).collect()
    }

    fn assert_rings(actual: &[(f32, bool)], expected: &[(f32, bool)]) {
        assert_eq!(actual.len(), expected.len(), "{actual:?}");
        for (a, e) in actual.iter().zip(expected) {
            assert!((a.0 - e.0).abs() < 1.0e-4, "{actual:?} vs {expected:?}");
            assert_eq!(a.1, e.1);
        }
    }

    #[test]
    fn zero_radius_has_no_rings() {
        assert!(radii(RingSchedule::new(0.1, 0.0, true)).is_empty());
        assert!(radii(RingSchedule::new(0.1, f32::NAN, true)).is_empty());
    }

    #[test]
    fn rings_clamp_to_radius_then_overshoot() {
        let rings = radii(RingSchedule::new(0.1, 0.25, true));
        assert_rings(
            &rings,
            &[(0.1, false), (0.2, false), (0.25, false), (0.75, true)],
        );
    }

    #[test]
    fn minimal_shape_stops_at_radius() {
        let rings = radii(RingSchedule::new(0.1, 0.25, false));
        assert_rings(&rings, &[(0.1, false), (0.2, false), (0.25, false)]);
    }

    #[test]
    fn outer_ring_overshoot_is_clamped() {
        assert_eq!(outer_ring_overshoot(0.1), 0.5);
        assert_eq!(outer_ring_overshoot(0.7), 0.7);
        assert_eq!(outer_ring_overshoot(5.0), 1.0);

        let last = RingSchedule::new(0.1, 5.0, true).last().unwrap();
        assert!(last.outer);
        assert!((last.radius - 6.0).abs() < 1.0e-4);
    }

    #[test]
    fn last_inner_ring_lies_exactly_on_the_radius() {
        let inner: Vec<Ring> = RingSchedule::new(0.1, 1.234, true)
            .filter(|r| !r.outer)
            .collect();
        assert_eq!(inner.last().unwrap().radius, 1.234);
        assert!(inner.windows(2).all(|w| w[1].radius > w[0].radius));
    }

    #[test]
    fn flat_ground_minimum_is_ground_height() {
        let world = ScriptedWorld::flat(50.0);
        let settings = SamplerSettings::default();
        let scan = scan_disc(
            &world,
            &settings,
            Vec3::new(100.0, 200.0, 50.0),
            &Quat::identity(),
            5.0,
        );
        assert!((scan.min_z - 50.0).abs() < 1.0e-4);
        assert!(!scan.on_road);
        assert!(!scan.in_water);
    }

    #[test]
    fn slope_minimum_is_at_the_downhill_edge() {
        let world = ScriptedWorld::terrain(|x, _| 100.0 + x);
        let settings = SamplerSettings::default();
        let scan = scan_disc(
            &world,
            &settings,
            Vec3::new(0.0, 0.0, 100.0),
            &Quat::identity(),
            2.0,
        );
        assert!((scan.min_z - 98.0).abs() < 0.01, "min_z = {}", scan.min_z);
    }

    #[test]
    fn pit_inside_the_disc_is_found() {
        let world =
            ScriptedWorld::terrain(|x, y| if (x - 1.0).hypot(y) < 0.2 { 40.0 } else { 45.0 });
        let settings = SamplerSettings::default();
        let scan = scan_disc(
            &world,
            &settings,
            Vec3::new(0.0, 0.0, 45.0),
            &Quat::identity(),
            1.5,
        );
        assert_eq!(scan.min_z, 40.0);
    }

    #[test]
    fn pit_outside_the_disc_is_ignored() {
        // Only the outer classification ring reaches x = 1.8.
        let world =
            ScriptedWorld::terrain(|x, y| if (x - 1.8).hypot(y) < 0.3 { 40.0 } else { 45.0 });
        let settings = SamplerSettings::default();
        let scan = scan_disc(
            &world,
            &settings,
            Vec3::new(0.0, 0.0, 45.0),
            &Quat::identity(),
            1.0,
        );
        assert_eq!(scan.min_z, 45.0);
    }

    #[test]
    fn tilted_disc_compensates_vertical_offset() {
        let world = ScriptedWorld::flat(10.0);
        let settings = SamplerSettings::default();
        let tilt = Quat::from_axis_angle(&Vec3::x_axis(), 30f32.to_radians());
        let scan = scan_disc(&world, &settings, Vec3::new(0.0, 0.0, 10.0), &tilt, 1.0);
        // The +Y edge of the disc rises by sin(30) * 1.
        assert!((scan.min_z - 9.5).abs() < 1.0e-4, "min_z = {}", scan.min_z);
    }

    #[test]
    fn misses_are_skipped() {
        let world = ScriptedWorld::void();
        let settings = SamplerSettings::default();
        let scan = scan_disc(
            &world,
            &settings,
            Vec3::new(0.0, 0.0, 12.0),
            &Quat::identity(),
            0.5,
        );
        assert_eq!(scan.min_z, 12.0);
    }

    #[test]
    fn road_just_outside_the_radius_is_detected() {
        let settings = SamplerSettings::default();
        let center = Vec3::new(0.0, 0.0, 5.0);

        let near = ScriptedWorld::flat(5.0).with_road(|x, _, _| x > 5.5);
        let scan = scan_disc(&near, &settings, center, &Quat::identity(), 5.0);
        assert!(scan.on_road);
        assert!(!scan.in_water);

        let far = ScriptedWorld::flat(5.0).with_road(|x, _, _| x > 6.5);
        let scan = scan_disc(&far, &settings, center, &Quat::identity(), 5.0);
        assert!(!scan.on_road);
    }

    #[test]
    fn water_at_the_center_is_detected_without_radius() {
        let world = ScriptedWorld::flat(5.0).with_water(|_, _, z| z < 6.0);
        let settings = SamplerSettings::default();
        let scan = scan_disc(&world, &settings, Vec3::new(0.0, 0.0, 5.0), &Quat::identity(), 0.0);
        assert!(scan.in_water);
    }

    #[test]
    fn classification_short_circuits_once_both_flags_are_set() {
        let world = ScriptedWorld::flat(5.0)
            .with_road(|_, _, _| true)
            .with_water(|_, _, _| true);
        let settings = SamplerSettings::default();
        let scan = scan_disc(&world, &settings, Vec3::new(0.0, 0.0, 5.0), &Quat::identity(), 3.0);
        assert!(scan.on_road && scan.in_water);
        // Only the two center queries.
        assert_eq!(world.surface_queries.get(), 2);
    }

    #[test]
    fn minimal_shape_never_classifies() {
        let world = ScriptedWorld::flat(5.0).with_road(|_, _, _| true);
        let settings = SamplerSettings {
            shape: RecordShape::Minimal,
            ..SamplerSettings::default()
        };
        let scan = scan_disc(&world, &settings, Vec3::new(0.0, 0.0, 5.0), &Quat::identity(), 3.0);
        assert!(!scan.on_road);
        assert_eq!(world.surface_queries.get(), 0);
    }
}
