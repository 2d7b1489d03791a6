/*!
Seams to the runtime that owns the sampled world.

The sampler never talks to a physics engine or a game directly. A host implements
[`TerrainOracle`] for queries and [`Avatar`] for moving the observation point, and
hands the combination to [`crate::Session::tick`].

Oracle answers are only meaningful near the avatar, and only after the host has
processed at least one frame since the last [`Avatar::place_avatar`]. The session
accounts for that by suspending after every placement.
*/

use crate::geometry::{Bounds, Vec3};

/// Read-only queries against the host world.
pub trait TerrainOracle {
    /// Height of the ground at `(x, y)`.
    ///
    /// Returns exactly `0.0` when nothing was hit. That value is indistinguishable from
    /// a real sea-level hit; the probe adapter treats it as a miss.
    fn ground_height(&self, x: f32, y: f32) -> f32;

    fn is_point_on_road(&self, x: f32, y: f32, z: f32) -> bool;

    /// Whether a point with ground height `ground_z` lies below a water surface.
    fn is_point_in_water(&self, x: f32, y: f32, ground_z: f32) -> bool;

    /// Two road-graph points nearest to `position`, or `None` if there are no roads.
    fn nearest_road_points(&self, position: Vec3) -> Option<(Vec3, Vec3)>;

    /// Whether collision data covering `bounds` is currently loaded.
    fn is_collision_loaded(&self, bounds: &Bounds) -> bool;
}

/// The single sampling agent.
pub trait Avatar {
    /// Teleport the agent. The host should apply streaming side effects on its next frame.
    fn place_avatar(&mut self, position: Vec3);
}

/// Everything a session needs from its host.
pub trait SamplingWorld: TerrainOracle + Avatar {}

impl<T: TerrainOracle + Avatar> SamplingWorld for T {}
