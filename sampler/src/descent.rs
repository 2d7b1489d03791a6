/*!
Ground-lock descent search.

When the oracle cannot see any ground under `(x, y)`, the avatar is probably too
far from the surface for collision data to be streamed in. The search walks the
avatar downward from its last placement in steps of `step`. Whenever the walk
would go below zero, it wraps back to the top with half the step. Every
placement costs one tick, because the host needs a frame to stream around the
new position.

A search ends in one of two ways:

- Stabilized: a probe (or, after a miss, the next guess) equals the height the
  avatar was last placed at.
- Exhausted: `step` has been halved down to 0. The caller falls back to the
  input height.
*/

use crate::{constants::APPROX_EPSILON, settings::SamplerSettings};

#[inline]
pub fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < APPROX_EPSILON
}

/// Result of one search step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DescentStep {
    /// Place the avatar at this height and try again next tick.
    Reposition(f32),
    /// The probe confirmed the last placement; this is the ground height.
    Stabilized(f32),
}

/// Per-sample search state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DescentSearch {
    /// Current step size. Starts at `2 * max_height` and only ever halves.
    pub step: u32,
    /// Height the avatar was most recently placed at. Not a confirmed ground height.
    pub last_z: f32,
}

impl DescentSearch {
    /// Fresh search for an avatar that has just been placed at `start_z`.
    pub fn new(settings: &SamplerSettings, start_z: f32) -> Self {
        Self {
            step: settings.initial_descent_step(),
            last_z: start_z,
        }
    }

    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.step == 0
    }

    /// Advance the search given this tick's robust probe result.
    ///
    /// On [`DescentStep::Reposition`] the caller must move the avatar; `last_z` has
    /// already been updated to the new height. A miss is replaced by the next guess,
    /// and a guess equal to the last placement stabilizes like a hit would.
    pub fn advance(&mut self, settings: &SamplerSettings, probed: Option<f32>) -> DescentStep {
        let z = match probed {
            Some(z) => z,
            None => self.next_guess(settings),
        };

        if self.step == 0 || !approx_eq(self.last_z, z) {
            return self.reposition(z);
        }

        DescentStep::Stabilized(z)
    }

    fn reposition(&mut self, z: f32) -> DescentStep {
        log::debug!(
            "descent: reposition {:.3} -> {:.3} (step {})",
            self.last_z,
            z,
            self.step
        );
        self.last_z = z;
        DescentStep::Reposition(z)
    }

    fn next_guess(&mut self, settings: &SamplerSettings) -> f32 {
        let step = self.step as f32;
        let mut z = self.last_z - step;

        if z <= 0.0 {
            self.step /= 2;
            z = settings.max_height_f32() - self.step as f32;
        } else if approx_eq(z % (2.0 * step), 0.0) {
            // Step off the boundary of the next coarser grid.
            z -= step;
        }
        z
    }
}
