/*!
Streaming world that answers the sampler's oracle queries.

Only colliders near the avatar answer height queries, mimicking a runtime that
streams collision data around the player. Streaming happens on
[`StreamedWorld::advance_frame`], so a freshly placed avatar sees the old stream
set until the next frame.
*/

use std::collections::HashSet;

use rapier3d::{parry::bounding_volume::Aabb, prelude::*};
use sampler::{Avatar, Bounds, TerrainOracle, Vec3};

use crate::{
    layers::{Road, WaterBody, nearest_segment},
    rapier::StaticQueryWorld,
};

/// Default radius around the avatar within which colliders are streamed in.
pub const DEFAULT_STREAM_RADIUS: f32 = 150.0;

/// Height above `max_height` that downward height rays start from.
const RAY_HEADROOM: f32 = 100.0;

pub struct StreamedWorld {
    statics: StaticQueryWorld,
    roads: Vec<Road>,
    water: Vec<WaterBody>,
    stream_radius: f32,
    ray_top: f32,
    avatar: Vec3,
    /// Avatar position the current stream set was built for.
    stream_center: Vec3,
    streamed: HashSet<ColliderHandle>,
    /// The avatar moved since the last frame.
    stale: bool,
    frames: u64,
}

impl StreamedWorld {
    pub fn new(
        statics: StaticQueryWorld,
        roads: Vec<Road>,
        water: Vec<WaterBody>,
        stream_radius: f32,
        max_height: f32,
    ) -> Self {
        let mut world = Self {
            statics,
            roads,
            water,
            stream_radius,
            ray_top: max_height + RAY_HEADROOM,
            avatar: Vec3::zeros(),
            stream_center: Vec3::zeros(),
            streamed: HashSet::new(),
            stale: true,
            frames: 0,
        };
        world.advance_frame();
        world
    }

    pub fn avatar(&self) -> Vec3 {
        self.avatar
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn streamed_count(&self) -> usize {
        self.streamed.len()
    }

    /// Apply the side effects of the last avatar placement.
    pub fn advance_frame(&mut self) {
        self.frames += 1;
        if !self.stale {
            return;
        }

        let center = self.avatar;
        let radius = self.stream_radius;
        self.streamed = self
            .statics
            .colliders()
            .filter(|(_, collider)| {
                collider.shape().as_halfspace().is_some()
                    || aabb_distance(&collider.compute_aabb(), &center) <= radius
            })
            .map(|(handle, _)| handle)
            .collect();
        self.stream_center = center;
        self.stale = false;

        log::debug!(
            "frame {}: streamed {} of {} colliders around ({:.1}, {:.1}, {:.1})",
            self.frames,
            self.streamed_count(),
            self.statics.len(),
            center.x,
            center.y,
            center.z
        );
    }
}

/// Distance from `p` to the closest point of `aabb`, 0 inside.
fn aabb_distance(aabb: &Aabb, p: &Vec3) -> f32 {
    let closest = Vec3::new(
        p.x.max(aabb.mins.x).min(aabb.maxs.x),
        p.y.max(aabb.mins.y).min(aabb.maxs.y),
        p.z.max(aabb.mins.z).min(aabb.maxs.z),
    );
    (p - closest).norm()
}

impl TerrainOracle for StreamedWorld {
    fn ground_height(&self, x: f32, y: f32) -> f32 {
        let streamed = &self.streamed;
        let predicate = |handle: ColliderHandle, _: &Collider| streamed.contains(&handle);
        let filter = QueryFilter::default().predicate(&predicate);

        let ray = Ray::new(point![x, y, self.ray_top], vector![0.0, 0.0, -1.0]);
        self.statics
            .as_query_pipeline(filter)
            .cast_ray(&ray, 2.0 * self.ray_top, true)
            .map_or(0.0, |(_, toi)| self.ray_top - toi)
    }

    fn is_point_on_road(&self, x: f32, y: f32, z: f32) -> bool {
        self.roads.iter().any(|road| road.contains(x, y, z))
    }

    fn is_point_in_water(&self, x: f32, y: f32, ground_z: f32) -> bool {
        self.water.iter().any(|w| w.covers(x, y, ground_z))
    }

    fn nearest_road_points(&self, position: Vec3) -> Option<(Vec3, Vec3)> {
        nearest_segment(&self.roads, position)
    }

    fn is_collision_loaded(&self, bounds: &Bounds) -> bool {
        !self.stale && (bounds.center() - self.stream_center).norm() <= self.stream_radius
    }
}

impl Avatar for StreamedWorld {
    fn place_avatar(&mut self, position: Vec3) {
        self.avatar = position;
        self.stale = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rapier::{ColliderShapeDef, WorldStaticDef, build_static_query_world};
    use rapier3d::na::{UnitQuaternion, Vector2};
    use sampler::{SamplerSettings, Session, TickOutcome};

    fn plane(id: u32, z: f32) -> WorldStaticDef {
        WorldStaticDef {
            id,
            translation: vector![0.0, 0.0, z],
            rotation: UnitQuaternion::identity(),
            shape: ColliderShapeDef::Plane {
                offset_along_normal: 0.0,
            },
        }
    }

    fn slab(id: u32, x: f32, y: f32, top: f32) -> WorldStaticDef {
        WorldStaticDef {
            id,
            translation: vector![x, y, top - 1.0],
            rotation: UnitQuaternion::identity(),
            shape: ColliderShapeDef::Cuboid {
                half_extents: vector![20.0, 20.0, 1.0],
            },
        }
    }

    fn world(statics: Vec<WorldStaticDef>, roads: Vec<Road>, water: Vec<WaterBody>) -> StreamedWorld {
        StreamedWorld::new(
            build_static_query_world(statics),
            roads,
            water,
            DEFAULT_STREAM_RADIUS,
            2048.0,
        )
    }

    fn run(world: &mut StreamedWorld, input: &str) -> String {
        let mut out = Vec::new();
        {
            let mut session = Session::new(SamplerSettings::default());
            session.start(input.as_bytes(), &mut out).unwrap();
            for _ in 0..50_000 {
                match session.tick(world).unwrap() {
                    TickOutcome::Completed => break,
                    _ => world.advance_frame(),
                }
            }
            assert!(!session.is_active());
        }
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn half_spaces_are_always_streamed() {
        let w = world(vec![plane(1, 50.0)], Vec::new(), Vec::new());
        assert_eq!(w.streamed_count(), 1);
        assert!((w.ground_height(5000.0, -5000.0) - 50.0).abs() < 1.0e-3);
    }

    #[test]
    fn far_colliders_are_invisible_until_streamed() {
        let mut w = world(vec![slab(1, 1000.0, 1000.0, 300.0)], Vec::new(), Vec::new());
        assert_eq!(w.ground_height(1000.0, 1000.0), 0.0);

        w.place_avatar(Vec3::new(1000.0, 1000.0, 300.0));
        // Not before the next frame.
        assert_eq!(w.ground_height(1000.0, 1000.0), 0.0);
        assert!(!w.is_collision_loaded(&Bounds::around(Vec3::new(1000.0, 1000.0, 300.0), 25.0)));

        w.advance_frame();
        assert!((w.ground_height(1000.0, 1000.0) - 300.0).abs() < 1.0e-3);
        assert!(w.is_collision_loaded(&Bounds::around(Vec3::new(1000.0, 1000.0, 300.0), 25.0)));
    }

    #[test]
    fn layers_are_forwarded() {
        let w = world(
            Vec::new(),
            vec![Road::new([Vec3::new(0.0, 0.0, 0.0), Vec3::new(10.0, 0.0, 0.0)], 2.0)],
            vec![WaterBody::new(Vector2::new(-5.0, -5.0), Vector2::new(5.0, 5.0), 1.0)],
        );
        assert!(w.is_point_on_road(5.0, 1.0, 0.5));
        assert!(w.is_point_in_water(0.0, 0.0, 0.5));
        assert!(!w.is_point_in_water(0.0, 0.0, 1.5));
        assert!(w.nearest_road_points(Vec3::new(3.0, 3.0, 0.0)).is_some());
    }

    #[test]
    fn session_samples_a_flat_plane() {
        let mut w = world(vec![plane(1, 50.0)], Vec::new(), Vec::new());
        let out = run(&mut w, "100.0,200.0,50.0,0,0,0,1,5.0\n");
        let fields: Vec<&str> = out.trim_end().split(',').collect();
        assert_eq!(fields.len(), 10);
        assert!((fields[2].parse::<f32>().unwrap() - 50.0).abs() < 1.0e-3);
        assert!((fields[3].parse::<f32>().unwrap() - 50.0).abs() < 1.0e-3);
        assert!((fields[6].parse::<f32>().unwrap() - 1.0).abs() < 1.0e-3);
        assert_eq!(&fields[7..], &["-1", "False", "False"]);
    }

    #[test]
    fn session_descends_onto_streamed_ground() {
        let mut w = world(
            vec![slab(1, 1000.0, 1000.0, 300.0)],
            vec![Road::new(
                [Vec3::new(990.0, 990.0, 300.0), Vec3::new(1010.0, 990.0, 300.0)],
                3.0,
            )],
            Vec::new(),
        );
        // The input height is far from the real ground.
        let out = run(&mut w, "1000,1000,2000,0,0,0,1,1\n");
        let fields: Vec<&str> = out.trim_end().split(',').collect();
        assert_eq!(fields.len(), 10, "{out}");
        assert!((fields[2].parse::<f32>().unwrap() - 300.0).abs() < 1.0e-3, "{out}");
        assert!((fields[7].parse::<f32>().unwrap() - 10.0).abs() < 1.0e-3, "{out}");
        assert!(!out.contains("WARNING"));
    }
}
