//! Scripted oracles for unit tests.

use std::cell::Cell;

use crate::{
    geometry::{Bounds, Vec3},
    oracle::{Avatar, TerrainOracle},
};

type HeightFn = Box<dyn Fn(f32, f32, Vec3) -> f32>;
type SurfaceFn = Box<dyn Fn(f32, f32, f32) -> bool>;

/// A fully scripted world. Heights may depend on the avatar position to emulate streaming.
pub(crate) struct ScriptedWorld {
    height: HeightFn,
    pub road: SurfaceFn,
    pub water: SurfaceFn,
    pub roads: Option<(Vec3, Vec3)>,
    pub loaded: bool,
    pub avatar: Vec3,
    pub placements: Vec<Vec3>,
    pub probes: Cell<usize>,
    pub surface_queries: Cell<usize>,
}

impl ScriptedWorld {
    pub fn new(height: impl Fn(f32, f32, Vec3) -> f32 + 'static) -> Self {
        Self {
            height: Box::new(height),
            road: Box::new(|_, _, _| false),
            water: Box::new(|_, _, _| false),
            roads: None,
            loaded: true,
            avatar: Vec3::zeros(),
            placements: Vec::new(),
            probes: Cell::new(0),
            surface_queries: Cell::new(0),
        }
    }

    /// Constant ground height everywhere.
    pub fn flat(z: f32) -> Self {
        Self::new(move |_, _, _| z)
    }

    /// Ground height as a function of `(x, y)` only.
    pub fn terrain(f: impl Fn(f32, f32) -> f32 + 'static) -> Self {
        Self::new(move |x, y, _| f(x, y))
    }

    /// Never hits anything.
    pub fn void() -> Self {
        Self::flat(0.0)
    }

    pub fn with_road(mut self, f: impl Fn(f32, f32, f32) -> bool + 'static) -> Self {
        self.road = Box::new(f);
        self
    }

    pub fn with_water(mut self, f: impl Fn(f32, f32, f32) -> bool + 'static) -> Self {
        self.water = Box::new(f);
        self
    }

    pub fn with_roads(mut self, a: Vec3, b: Vec3) -> Self {
        self.roads = Some((a, b));
        self
    }
}

impl TerrainOracle for ScriptedWorld {
    fn ground_height(&self, x: f32, y: f32) -> f32 {
        self.probes.set(self.probes.get() + 1);
        (self.height)(x, y, self.avatar)
    }

    fn is_point_on_road(&self, x: f32, y: f32, z: f32) -> bool {
        self.surface_queries.set(self.surface_queries.get() + 1);
        (self.road)(x, y, z)
    }

    fn is_point_in_water(&self, x: f32, y: f32, ground_z: f32) -> bool {
        self.surface_queries.set(self.surface_queries.get() + 1);
        (self.water)(x, y, ground_z)
    }

    fn nearest_road_points(&self, _position: Vec3) -> Option<(Vec3, Vec3)> {
        self.roads
    }

    fn is_collision_loaded(&self, _bounds: &Bounds) -> bool {
        self.loaded
    }
}

impl Avatar for ScriptedWorld {
    fn place_avatar(&mut self, position: Vec3) {
        self.avatar = position;
        self.placements.push(position);
    }
}
