/*!
Line codec for sample input and height-map output.

Input lines split on `|`, `,` and spaces, and empty tokens are dropped.

- Full shape: `x y z qx qy qz qw r`.
- Minimal shape: `x y`.

A line that cannot become a [`Sample`] is answered with one diagnostic line in
the output stream. The line is then skipped and reading continues. Blank lines
are skipped silently.

Output lines are comma-separated in a fixed field order. Floats use Rust's
shortest round-trip formatting, which never depends on locale. Booleans are
written as `True`/`False`.
*/

use std::{
    fmt,
    io::{self, BufRead, Write},
};

use nalgebra as na;

use crate::{
    constants::{FALLBACK_WARNING, NO_ROAD_DISTANCE},
    geometry::{Quat, Vec3},
    settings::{RecordShape, SamplerSettings},
};

/// A validated input sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    /// `z` is already clamped into `[0, max_height]`.
    pub position: Vec3,
    pub orientation: Quat,
    /// Non-negative radius of the scanned disc.
    pub scan_radius: f32,
}

/// Why a line did not produce a sample. `Display` is the diagnostic written to the output.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("ERROR: malformed line: {0}")]
    MalformedLine(String),
    #[error("ERROR: malformed coordinates: {0}")]
    MalformedCoordinates(String),
    #[error("ERROR: coordinates out of range: {0}")]
    OutOfRange(String),
}

#[inline]
fn tokens(line: &str) -> impl Iterator<Item = &str> {
    line.split(['|', ',', ' ']).filter(|t| !t.is_empty())
}

/// Clamp an input height into `[0, max_height]`; NaN and negatives become 0.
#[inline]
pub fn clamp_height(z: f32, max_height: f32) -> f32 {
    if z.is_nan() || z < 0.0 {
        0.0
    } else if z > max_height {
        max_height
    } else {
        z
    }
}

/// Parse one input line. `Ok(None)` for blank lines.
pub fn parse_sample(line: &str, settings: &SamplerSettings) -> Result<Option<Sample>, RecordError> {
    let tokens: Vec<&str> = tokens(line).collect();
    if tokens.is_empty() {
        return Ok(None);
    }
    if tokens.len() != settings.shape.input_tokens() {
        return Err(RecordError::MalformedLine(line.to_owned()));
    }

    let values = tokens
        .iter()
        .map(|t| t.trim().parse::<f32>())
        .collect::<Result<Vec<f32>, _>>()
        .map_err(|_| RecordError::MalformedCoordinates(line.to_owned()))?;

    let (x, y) = (values[0], values[1]);
    let max = settings.max_coordinate;
    if !(x.abs() < max && y.abs() < max) {
        return Err(RecordError::OutOfRange(line.to_owned()));
    }

    let sample = match settings.shape {
        RecordShape::Minimal => Sample {
            position: Vec3::new(x, y, 0.0),
            orientation: Quat::identity(),
            scan_radius: settings.legacy_scan_radius.abs(),
        },
        RecordShape::Full => {
            if !values[3..].iter().all(|v| v.is_finite()) {
                return Err(RecordError::MalformedCoordinates(line.to_owned()));
            }
            let z = clamp_height(values[2], settings.max_height_f32());
            let (qx, qy, qz, qw) = (values[3], values[4], values[5], values[6]);
            let orientation =
                Quat::try_new(na::Quaternion::new(qw, qx, qy, qz), f32::EPSILON).unwrap_or_else(|| {
                    log::debug!("zero-length orientation in {line:?}, using identity");
                    Quat::identity()
                });
            Sample {
                position: Vec3::new(x, y, z),
                orientation,
                scan_radius: values[7].abs(),
            }
        }
    };

    Ok(Some(sample))
}

/// Pulls samples out of a line stream, reporting bad lines as it goes.
pub struct SampleReader<R> {
    reader: R,
    buf: Vec<u8>,
    lines_read: usize,
    diagnostics: usize,
}

impl<R: BufRead> SampleReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            lines_read: 0,
            diagnostics: 0,
        }
    }

    /// Lines consumed so far, including skipped ones.
    pub fn lines_read(&self) -> usize {
        self.lines_read
    }

    /// Diagnostics written so far.
    pub fn diagnostics(&self) -> usize {
        self.diagnostics
    }

    /// Read lines until one parses into a sample. Diagnostics for skipped lines are
    /// written to `out`. `Ok(None)` at end of input.
    pub fn next_sample<W: Write + ?Sized>(
        &mut self,
        out: &mut W,
        settings: &SamplerSettings,
    ) -> io::Result<Option<Sample>> {
        loop {
            self.buf.clear();
            if self.reader.read_until(b'\n', &mut self.buf)? == 0 {
                return Ok(None);
            }
            self.lines_read += 1;

            let raw = String::from_utf8_lossy(&self.buf);
            let line = raw.trim_end_matches(['\n', '\r']);

            match parse_sample(line, settings) {
                Ok(Some(sample)) => return Ok(Some(sample)),
                Ok(None) => continue,
                Err(err) => {
                    log::warn!("line {}: {err}", self.lines_read);
                    writeln!(out, "{err}")?;
                    self.diagnostics += 1;
                }
            }
        }
    }
}

/// One computed height-map record.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OutputRecord {
    pub shape: RecordShape,
    pub x: f32,
    pub y: f32,
    pub ground_z: f32,
    pub min_z: f32,
    pub normal: Vec3,
    /// `None` when the oracle knows no road.
    pub distance_to_road: Option<f32>,
    pub on_road: bool,
    pub in_water: bool,
    /// The ground height is the input height, not an oracle result.
    pub warning: bool,
}

struct Flag(bool);

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.0 { "True" } else { "False" })
    }
}

impl fmt::Display for OutputRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.shape {
            RecordShape::Minimal => write!(f, "{},{},{}", self.x, self.y, self.min_z),
            RecordShape::Full => {
                write!(
                    f,
                    "{},{},{},{},{},{},{},{},{},{}",
                    self.x,
                    self.y,
                    self.ground_z,
                    self.min_z,
                    self.normal.x,
                    self.normal.y,
                    self.normal.z,
                    self.distance_to_road.unwrap_or(NO_ROAD_DISTANCE),
                    Flag(self.on_road),
                    Flag(self.in_water),
                )?;
                if self.warning {
                    write!(f, ",{FALLBACK_WARNING}")?;
                }
                Ok(())
            }
        }
    }
}
