//! In-memory rapier3d collision world for static terrain geometry.
//!
//! Conventions
//! - Units are meters and the world is Z-up.
//! - Rotation is a unit quaternion.
//! - For planes, the normal is derived from the pose as `normal = rotation * +Z`,
//!   and `dist = dot(normal, translation) + offset_along_normal`.

use rapier3d::{
    na::{Isometry3, Translation3, UnitQuaternion},
    prelude::*,
};

/// Definition of one immutable world collider.
#[derive(Clone, Debug)]
pub struct WorldStaticDef {
    /// Stable identifier. Statics are inserted in `id` order.
    pub id: u32,
    pub translation: Vector<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub shape: ColliderShapeDef,
}

/// Supported static collider shapes.
#[derive(Clone, Debug, PartialEq)]
pub enum ColliderShapeDef {
    /// Infinite ground plane (half-space).
    Plane { offset_along_normal: f32 },

    /// Oriented cuboid with given half-extents.
    Cuboid { half_extents: Vector<f32> },

    Sphere { radius: f32 },

    /// Z-aligned capsule.
    CapsuleZ { radius: f32, half_height: f32 },

    /// Rounded cuboid. `border_radius` rounds all edges and corners.
    RoundCuboid {
        half_extents: Vector<f32>,
        border_radius: f32,
    },
}

/// Build a world-space rapier collider from a `WorldStaticDef`.
pub fn collider_from_def(def: &WorldStaticDef) -> Collider {
    let pose = Isometry3::from_parts(Translation3::from(def.translation), def.rotation);

    match &def.shape {
        ColliderShapeDef::Plane {
            offset_along_normal,
        } => {
            // Plane `n . x = dist` as a half-space placed at `n * dist`.
            let n = def.rotation * Vector::z();
            let dist = n.dot(&def.translation) + *offset_along_normal;
            let unit_n = UnitVector::new_normalize(n);

            ColliderBuilder::new(SharedShape::new(HalfSpace::new(unit_n)))
                .translation(unit_n.into_inner() * dist)
                .build()
        }

        ColliderShapeDef::Cuboid { half_extents } => posed(
            ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z),
            pose,
        ),

        ColliderShapeDef::Sphere { radius } => posed(ColliderBuilder::ball(*radius), pose),

        ColliderShapeDef::CapsuleZ {
            radius,
            half_height,
        } => posed(ColliderBuilder::capsule_z(*half_height, *radius), pose),

        ColliderShapeDef::RoundCuboid {
            half_extents,
            border_radius,
        } => posed(
            ColliderBuilder::round_cuboid(
                half_extents.x,
                half_extents.y,
                half_extents.z,
                *border_radius,
            ),
            pose,
        ),
    }
}

fn posed(builder: ColliderBuilder, pose: Isometry3<f32>) -> Collider {
    let mut collider = builder.build();
    collider.set_position(pose);
    collider
}

/// Static colliders plus the broad/narrow phase needed to run scene queries.
///
/// The world is built once and never stepped.
pub struct StaticQueryWorld {
    bodies: RigidBodySet,
    colliders: ColliderSet,
    broad_phase: BroadPhaseBvh,
    narrow_phase: NarrowPhase,
}

impl StaticQueryWorld {
    /// Borrowed query view. Use `filter` to restrict which colliders answer.
    pub fn as_query_pipeline<'a>(&'a self, filter: QueryFilter<'a>) -> QueryPipeline<'a> {
        self.broad_phase.as_query_pipeline(
            self.narrow_phase.query_dispatcher(),
            &self.bodies,
            &self.colliders,
            filter,
        )
    }

    pub fn colliders(&self) -> impl Iterator<Item = (ColliderHandle, &Collider)> {
        self.colliders.iter()
    }

    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }
}

pub fn build_static_query_world(
    world_statics: impl IntoIterator<Item = WorldStaticDef>,
) -> StaticQueryWorld {
    let mut defs: Vec<WorldStaticDef> = world_statics.into_iter().collect();
    defs.sort_by_key(|d| d.id);

    let bodies = RigidBodySet::new();
    let mut colliders = ColliderSet::new();
    let modified_colliders: Vec<ColliderHandle> = defs
        .iter()
        .map(|def| colliders.insert(collider_from_def(def)))
        .collect();

    let mut broad_phase = BroadPhaseBvh::new();
    let mut events = Vec::new();
    broad_phase.update(
        &IntegrationParameters::default(),
        &colliders,
        &bodies,
        &modified_colliders,
        &[],
        &mut events,
    );

    log::debug!("built static query world with {} colliders", colliders.len());

    StaticQueryWorld {
        bodies,
        colliders,
        broad_phase,
        narrow_phase: NarrowPhase::default(),
    }
}
