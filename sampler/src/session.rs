/*!
Tick-driven sampling session.

A [`Session`] owns the input and output streams and the state of the sample in
flight. The host calls [`Session::tick`] once per frame. Each call does at most
one unit of work and reports what happened:

- `Idle`: no session is open.
- `Suspended`: the avatar was moved, or collision data is not loaded yet. Call
  again next frame.
- `Advanced`: the previous sample's record was written (if there was one) and
  the next sample is in flight.
- `Completed`: end of input. Both streams are closed.
- `Aborted`: an abort request was honored. Both streams are closed and nothing
  more was written.

```text
Idle --start--> Starting --tick--> Searching --stabilized/exhausted--> (emit) --+
  ^                                   |  ^                                        |
  |                                   +--+ reposition / not loaded                |
  +------------- end of input / abort <-------------------------------------------+
```
*/

use std::io::{self, BufRead, Write};

use crate::{
    descent::{DescentSearch, DescentStep},
    geometry::{Bounds, Vec3},
    normal::{distance_to_road, estimate_normal},
    oracle::{SamplingWorld, TerrainOracle},
    probe::probe_height_robust,
    record::{OutputRecord, Sample, SampleReader},
    scan::scan_disc,
    settings::{RecordShape, SamplerSettings},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    Idle,
    Suspended,
    Advanced,
    Completed,
    Aborted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    /// Streams are open but no sample has been read yet.
    Starting,
    /// A sample is in flight.
    Searching,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("a sampling session is already running")]
    AlreadyActive,
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("ground search at ({x}, {y}) exceeded the limit of {limit} descent steps")]
    SearchExhausted { x: f32, y: f32, limit: u32 },
}

/// Ground height chosen for a sample.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Ground {
    z: f32,
    /// The oracle never confirmed a height; `z` is the input height.
    fallback: bool,
}

/// Mutable state of the sample in flight.
#[derive(Clone, Copy, Debug)]
struct ScanState {
    sample: Sample,
    search: DescentSearch,
    /// Times the avatar was moved for this sample.
    repositions: u32,
    /// Set once the search settles; kept while waiting for collision data.
    ground: Option<Ground>,
}

impl ScanState {
    fn new(settings: &SamplerSettings, sample: Sample) -> Self {
        Self {
            sample,
            search: DescentSearch::new(settings, sample.position.z),
            repositions: 0,
            ground: None,
        }
    }
}

struct ActiveSession<R, W> {
    input: SampleReader<R>,
    output: W,
    scan: Option<ScanState>,
}

pub struct Session<R, W> {
    settings: SamplerSettings,
    active: Option<ActiveSession<R, W>>,
    abort_requested: bool,
    records_written: usize,
    diagnostics: usize,
}

impl<R: BufRead, W: Write> Session<R, W> {
    pub fn new(settings: SamplerSettings) -> Self {
        Self {
            settings,
            active: None,
            abort_requested: false,
            records_written: 0,
            diagnostics: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        match &self.active {
            None => SessionState::Idle,
            Some(ActiveSession { scan: None, .. }) => SessionState::Starting,
            Some(ActiveSession { scan: Some(_), .. }) => SessionState::Searching,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Records written since the session was created.
    pub fn records_written(&self) -> usize {
        self.records_written
    }

    /// Diagnostic lines written since the session was created.
    pub fn diagnostics(&self) -> usize {
        self.diagnostics
            + self
                .active
                .as_ref()
                .map_or(0, |active| active.input.diagnostics())
    }

    /// Open a session over `input`, writing records to `output`.
    ///
    /// The first sample is read on the next tick.
    pub fn start(&mut self, input: R, output: W) -> Result<(), SessionError> {
        if self.active.is_some() {
            return Err(SessionError::AlreadyActive);
        }
        self.abort_requested = false;
        self.active = Some(ActiveSession {
            input: SampleReader::new(input),
            output,
            scan: None,
        });
        log::info!("sampling session started");
        Ok(())
    }

    /// Ask the session to stop. Honored at the start of the next tick.
    pub fn request_abort(&mut self) {
        if self.active.is_some() {
            self.abort_requested = true;
        }
    }

    /// Run one frame of work.
    ///
    /// Any error closes the session before it is returned.
    pub fn tick<O: SamplingWorld + ?Sized>(
        &mut self,
        world: &mut O,
    ) -> Result<TickOutcome, SessionError> {
        if self.active.is_none() {
            return Ok(TickOutcome::Idle);
        }

        if self.abort_requested {
            self.abort_requested = false;
            self.close()?;
            log::info!(
                "sampling session aborted after {} records",
                self.records_written
            );
            return Ok(TickOutcome::Aborted);
        }

        match self.step(world) {
            Ok(TickOutcome::Completed) => {
                self.close()?;
                log::info!(
                    "sampling session completed: {} records, {} diagnostics",
                    self.records_written,
                    self.diagnostics
                );
                Ok(TickOutcome::Completed)
            }
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                log::error!("sampling session failed: {err}");
                if let Err(close_err) = self.close() {
                    log::error!("failed to close session streams: {close_err}");
                }
                Err(err)
            }
        }
    }

    fn step<O: SamplingWorld + ?Sized>(&mut self, world: &mut O) -> Result<TickOutcome, SessionError> {
        let settings = &self.settings;
        let Some(active) = self.active.as_mut() else {
            return Ok(TickOutcome::Idle);
        };

        if let Some(scan) = active.scan.as_mut() {
            let Some(ground) = resolve_ground(settings, scan, world)? else {
                return Ok(TickOutcome::Suspended);
            };

            let position = scan.sample.position;
            if settings.require_collision_loaded {
                let bounds = Bounds::around(
                    Vec3::new(position.x, position.y, ground.z),
                    settings.collision_margin,
                );
                if !world.is_collision_loaded(&bounds) {
                    return Ok(TickOutcome::Suspended);
                }
            }

            if ground.fallback {
                log::warn!(
                    "no ground found at ({}, {}), using input height {}",
                    position.x,
                    position.y,
                    ground.z
                );
            }

            let record = measure(&*world, settings, &scan.sample, ground);
            writeln!(active.output, "{record}")?;
            self.records_written += 1;
            log::debug!("record {}: {record}", self.records_written);
        }

        match active.input.next_sample(&mut active.output, settings)? {
            Some(sample) => {
                log::debug!(
                    "next sample at ({}, {}, {}) radius {}",
                    sample.position.x,
                    sample.position.y,
                    sample.position.z,
                    sample.scan_radius
                );
                world.place_avatar(sample.position);
                active.scan = Some(ScanState::new(settings, sample));
                Ok(TickOutcome::Advanced)
            }
            None => Ok(TickOutcome::Completed),
        }
    }

    /// Flush and release both streams.
    fn close(&mut self) -> io::Result<()> {
        let Some(mut active) = self.active.take() else {
            return Ok(());
        };
        self.diagnostics += active.input.diagnostics();
        active.output.flush()
    }
}

/// One descent tick for the sample in flight, or the settled ground while the gate
/// holds the record. `None` means the avatar moved and the sample has to wait for
/// the next frame.
fn resolve_ground<O: SamplingWorld + ?Sized>(
    settings: &SamplerSettings,
    scan: &mut ScanState,
    world: &mut O,
) -> Result<Option<Ground>, SessionError> {
    if let Some(ground) = scan.ground {
        return Ok(Some(ground));
    }
    let position = scan.sample.position;

    if scan.search.is_exhausted() {
        let ground = Ground {
            z: position.z,
            fallback: true,
        };
        scan.ground = Some(ground);
        return Ok(Some(ground));
    }

    let probed = probe_height_robust(&*world, settings, position.x, position.y);
    match scan.search.advance(settings, probed) {
        DescentStep::Reposition(z) => {
            scan.repositions += 1;
            if let Some(limit) = settings.max_search_ticks {
                if scan.repositions > limit {
                    return Err(SessionError::SearchExhausted {
                        x: position.x,
                        y: position.y,
                        limit,
                    });
                }
            }
            world.place_avatar(Vec3::new(position.x, position.y, z));
            Ok(None)
        }
        DescentStep::Stabilized(z) => {
            let ground = Ground { z, fallback: false };
            scan.ground = Some(ground);
            Ok(Some(ground))
        }
    }
}

/// Everything a record needs beyond the ground height.
fn measure<O: TerrainOracle + ?Sized>(
    oracle: &O,
    settings: &SamplerSettings,
    sample: &Sample,
    ground: Ground,
) -> OutputRecord {
    let center = Vec3::new(sample.position.x, sample.position.y, ground.z);
    let disc = scan_disc(
        oracle,
        settings,
        center,
        &sample.orientation,
        sample.scan_radius,
    );

    let (normal, distance_to_road) = match settings.shape {
        RecordShape::Minimal => (Vec3::z(), None),
        RecordShape::Full => (
            estimate_normal(
                oracle,
                settings,
                center.x,
                center.y,
                sample.scan_radius * 2.0,
                ground.z,
            ),
            distance_to_road(oracle, center),
        ),
    };

    OutputRecord {
        shape: settings.shape,
        x: center.x,
        y: center.y,
        ground_z: ground.z,
        min_z: disc.min_z,
        normal,
        distance_to_road,
        on_road: disc.on_road,
        in_water: disc.in_water,
        warning: ground.fallback,
    }
}
