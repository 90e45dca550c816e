//! Heading-hold controller
//!
//! Runs the closed heading loop: PID correction towards the hold target,
//! shaped to respect the actuator limits (output clamp, rotation-rate clamp,
//! dead-zone compensation near zero output).

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;

// Internal
use super::{DriveMixer, MotorPair, Params, PidController};
use util::maths::{clamp, wrap_degrees};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Closed-loop heading-hold controller.
#[derive(Debug, Default)]
pub struct HeadingHold {
    pid: PidController,

    state: HoldState,

    /// Ticks spent inside the positive dead zone while off target.
    pos_accum: f64,

    /// Ticks spent inside the negative dead zone while off target.
    neg_accum: f64,

    /// The error computed on the most recent tick.
    ///
    /// Units: degrees
    last_error_deg: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Hold-loop state.
#[derive(Debug, Clone, Copy, PartialEq)]
enum HoldState {
    /// No active hold target.
    Idle,

    /// PID loop running against the target.
    Holding {
        target_deg: f64
    },
}

impl Default for HoldState {
    fn default() -> Self {
        HoldState::Idle
    }
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl HeadingHold {

    /// Create a new controller from the parameters.
    pub fn new(params: &Params) -> Self {
        Self {
            pid: PidController::new(params.k_p, params.k_i, params.k_d),
            ..Default::default()
        }
    }

    /// Set the hold target and start holding.
    ///
    /// Clears the controller history and the dead-zone accumulators; a new
    /// hold episode never inherits ramp state from a previous one.
    pub fn set_target(&mut self, target_deg: f64) {
        self.state = HoldState::Holding { target_deg };
        self.pid.reset();
        self.pos_accum = 0.0;
        self.neg_accum = 0.0;
    }

    /// Stop holding and return to idle, clearing all episode state.
    pub fn release(&mut self) {
        self.state = HoldState::Idle;
        self.pid.reset();
        self.pos_accum = 0.0;
        self.neg_accum = 0.0;
    }

    pub fn is_holding(&self) -> bool {
        matches!(self.state, HoldState::Holding { .. })
    }

    /// The error computed on the most recent tick.
    ///
    /// Units: degrees
    pub fn last_error_deg(&self) -> f64 {
        self.last_error_deg
    }

    /// Whether the most recent error lies inside the tolerance band.
    ///
    /// Exposed for callers deciding when to stop an auto-alignment manouvre.
    pub fn error_within_tolerance(&self, params: &Params) -> bool {
        self.last_error_deg.abs() < params.tolerance_deg
    }

    pub(crate) fn accumulators(&self) -> (f64, f64) {
        (self.pos_accum, self.neg_accum)
    }

    /// Compute the correction-only output pair for this cycle.
    ///
    /// Returns `None` while idle. `override_active` indicates the operator is
    /// commanding an independent turn, which suspends dead-zone shaping for
    /// the cycle.
    pub fn tick(
        &mut self,
        heading_deg: f64,
        override_active: bool,
        mixer: &DriveMixer,
        params: &Params
    ) -> Option<MotorPair> {

        let target_deg = match self.state {
            HoldState::Idle => return None,
            HoldState::Holding { target_deg } => target_deg,
        };

        // The heading input is continuous over +/-180 so the error takes the
        // shortest path around the circle.
        let error_deg = wrap_degrees(target_deg - heading_deg);
        self.last_error_deg = error_deg;

        let raw = clamp(
            &self.pid.get(error_deg, params.cycle_period_s),
            &-params.pid_output_limit,
            &params.pid_output_limit
        );

        // Rotation rate clamp
        let mut rate = if raw > params.max_rotation_rate {
            params.max_rotation_rate
        }
        else if raw <= -params.max_rotation_rate {
            -params.max_rotation_rate
        }
        else {
            raw
        };

        // Dead-zone compensation: while off target, a correction sitting
        // inside the dead zone is re-biased a little further out of it each
        // tick it lingers there. Inside the error band the ramp state is
        // cleared.
        if !override_active {
            if error_deg.abs() >= params.dead_zone_error_band_deg {
                if rate > 0.0 && rate <= params.minimal_output {
                    self.pos_accum += 1.0;
                    rate = params.minimal_output
                        - ((1.0 - error_deg) / params.dead_zone_ramp_divisor)
                        + self.pos_accum / params.dead_zone_accum_scale;
                }
                else if rate < 0.0 && rate >= -params.minimal_output {
                    self.neg_accum += 1.0;
                    rate = -params.minimal_output
                        + ((1.0 - error_deg) / params.dead_zone_ramp_divisor)
                        - self.neg_accum / params.dead_zone_accum_scale;
                }
            }
            else {
                self.pos_accum = 0.0;
                self.neg_accum = 0.0;
            }
        }

        trace!(
            "HeadingHold: error {:.3} deg, rate {:.3}",
            error_deg,
            rate
        );

        // Correction only: the coordinator merges this with the forward
        // drive component.
        Some(mixer.arcade_drive(0.0, rate))
    }
}
