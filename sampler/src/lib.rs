pub mod constants;
pub mod descent;
pub mod geometry;
pub mod normal;
pub mod oracle;
pub mod probe;
pub mod record;
pub mod scan;
pub mod session;
pub mod settings;

#[cfg(test)]
mod testing;

pub use constants::{
    FALLBACK_WARNING, MAX_COORDINATE, MAX_HEIGHT, NO_ROAD_DISTANCE, OUTPUT_FILE_NAME, RESOLUTION,
};
pub use geometry::{Bounds, Quat, Vec2, Vec3, closest_point_on_segment};
pub use normal::{distance_to_road, estimate_normal};
pub use oracle::{Avatar, SamplingWorld, TerrainOracle};
pub use probe::{probe_height, probe_height_robust};
pub use record::{OutputRecord, RecordError, Sample, SampleReader, parse_sample};
pub use scan::{DiscScan, scan_disc};
pub use session::{Session, SessionError, SessionState, TickOutcome};
pub use settings::{ProbePolicy, RecordShape, SamplerSettings};
