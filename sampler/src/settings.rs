/*!
Runtime settings for a sampling session.

Every knob defaults to the value in [`crate::constants`], so
`SamplerSettings::default()` reproduces the reference generator. Hosts override
individual fields from their own configuration (CLI flags, scene files, ...).

Notes
- Distances are in world units (meters), heights are absolute world z.
- `max_search_ticks` is the only setting that changes termination behavior. It is
  `None` by default, which keeps the descent search unbounded.
*/

use crate::constants::{
    COLLISION_MARGIN, LEGACY_SCAN_RADIUS, MAX_COORDINATE, MAX_HEIGHT, PROBE_EPSILON, RESOLUTION,
};

/// Which fields each input and output line carries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RecordShape {
    /// Input `x,y`; output `x,y,minZ`.
    Minimal,
    /// Input `x,y,z,qx,qy,qz,qw,r`; output
    /// `x,y,z,minZ,nx,ny,nz,distanceToRoad,onRoad,inWater[,warning]`.
    #[default]
    Full,
}

impl RecordShape {
    /// Number of tokens an input line must split into.
    #[inline]
    pub const fn input_tokens(self) -> usize {
        match self {
            RecordShape::Minimal => 2,
            RecordShape::Full => 8,
        }
    }

    /// Whether the radial scan ends with the oversized road/water ring.
    #[inline]
    pub const fn classifies_surface(self) -> bool {
        matches!(self, RecordShape::Full)
    }
}

/// How the robust probe combines the eps-hexagon fallbacks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ProbePolicy {
    /// Probe the center, then the hexagon points in order, and stop at the first hit.
    #[default]
    FirstHit,
    /// Probe the center and all six hexagon points and keep the highest hit.
    MaxMerge,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SamplerSettings {
    pub shape: RecordShape,
    /// Ring spacing and maximum arc distance between ring samples.
    pub resolution: f32,
    /// Ceiling of the descent search and upper clamp of input z.
    pub max_height: u32,
    /// Exclusive bound on |x| and |y| of input samples.
    pub max_coordinate: f32,
    /// Radius of the fallback eps-hexagon.
    pub probe_epsilon: f32,
    pub probe_policy: ProbePolicy,
    /// Half extent of the box passed to the collision-loaded gate.
    pub collision_margin: f32,
    /// Hold records back until the host reports collision data around the point.
    pub require_collision_loaded: bool,
    /// Give up on a sample after this many avatar repositions. `None` searches forever.
    pub max_search_ticks: Option<u32>,
    /// Scan radius for two-token input lines.
    pub legacy_scan_radius: f32,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            shape: RecordShape::Full,
            resolution: RESOLUTION,
            max_height: MAX_HEIGHT,
            max_coordinate: MAX_COORDINATE,
            probe_epsilon: PROBE_EPSILON,
            probe_policy: ProbePolicy::FirstHit,
            collision_margin: COLLISION_MARGIN,
            require_collision_loaded: true,
            max_search_ticks: None,
            legacy_scan_radius: LEGACY_SCAN_RADIUS,
        }
    }
}

impl SamplerSettings {
    /// Settings for the legacy `x,y` -> `x,y,minZ` generator.
    pub fn minimal() -> Self {
        Self {
            shape: RecordShape::Minimal,
            ..Self::default()
        }
    }

    /// Initial descent step for a freshly dequeued sample.
    #[inline]
    pub fn initial_descent_step(&self) -> u32 {
        self.max_height.saturating_mul(2)
    }

    #[inline]
    pub fn max_height_f32(&self) -> f32 {
        self.max_height as f32
    }
}
