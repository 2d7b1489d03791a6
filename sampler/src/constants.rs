/// Exclusive bound on the absolute value of input x/y coordinates (world units).
///
/// Lines with `x <= -MAX_COORDINATE`, `x >= MAX_COORDINATE` (same for y) are rejected.
pub const MAX_COORDINATE: f32 = 10_000.0;

/// Highest height the sampler will ever search (world units).
///
/// Input z is clamped into `[0, MAX_HEIGHT]` and the descent search starts with a
/// step of `2 * MAX_HEIGHT`.
pub const MAX_HEIGHT: u32 = 2048;

/// Distance between two neighboring samples of the radial scan (meters).
///
/// Consecutive rings are `RESOLUTION` apart, and the angular step count of each ring
/// keeps adjacent points on it no farther apart than this.
pub const RESOLUTION: f32 = 0.1;

/// Radius of the eps-hexagon probed around a point when the point itself misses.
pub const PROBE_EPSILON: f32 = 0.025;

/// Tolerance for "approximately equal" height comparisons.
pub const APPROX_EPSILON: f32 = 0.001;

/// Half extent of the box that must have collision data loaded before a record is written.
pub const COLLISION_MARGIN: f32 = 25.0;

/// Lower bound of the extra overshoot used for the outer classification ring.
pub const OUTER_RING_MIN_OVERSHOOT: f32 = 0.5;

/// Upper bound of the extra overshoot used for the outer classification ring.
pub const OUTER_RING_MAX_OVERSHOOT: f32 = 1.0;

/// Scan radius assumed for legacy `x,y` input lines.
pub const LEGACY_SCAN_RADIUS: f32 = 1.0;

/// Default name of the generated height-map file.
pub const OUTPUT_FILE_NAME: &str = "hmap.txt";

/// Trailing field appended to a full record whose height could not be reconstructed.
pub const FALLBACK_WARNING: &str =
    "WARNING: could not get z coordinate so just used the one from the input file or 0 if NaN was given";

/// Rendered instead of a road distance when the oracle knows no road at all.
pub const NO_ROAD_DISTANCE: f32 = -1.0;
