//! Parameters structure for DriveCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for drive control.
#[derive(Debug, Deserialize)]
pub struct Params {

    // ---- HEADING HOLD ----

    /// Proportional gain of the heading-hold controller.
    pub k_p: f64,

    /// Integral gain of the heading-hold controller.
    pub k_i: f64,

    /// Derivative gain of the heading-hold controller.
    pub k_d: f64,

    /// Error magnitude below which the heading is considered on target.
    ///
    /// Units: degrees
    pub tolerance_deg: f64,

    /// Clamp applied to the rotation-rate correction.
    ///
    /// Units: normalised output
    pub max_rotation_rate: f64,

    /// Lowest output at which the drivetrain reliably moves (the dead-zone
    /// floor).
    ///
    /// Units: normalised output
    pub minimal_output: f64,

    /// The raw controller output is clamped to +/- this value ahead of the
    /// rotation-rate clamp.
    ///
    /// Units: normalised output
    pub pid_output_limit: f64,

    // ---- DEAD-ZONE COMPENSATION ----

    /// Error band either side of the target inside which the dead-zone
    /// accumulators are cleared.
    ///
    /// Units: degrees
    pub dead_zone_error_band_deg: f64,

    /// Divisor of the error term in the dead-zone ramp.
    pub dead_zone_ramp_divisor: f64,

    /// Scale dividing the tick accumulators in the dead-zone ramp. Larger
    /// values ramp out of the dead zone more slowly.
    pub dead_zone_accum_scale: f64,

    /// Operator turn inputs above this magnitude count as an override and
    /// suspend dead-zone shaping.
    ///
    /// Units: normalised input
    pub override_turn_threshold: f64,

    // ---- MIXING ----

    /// Attenuation applied to both sides while current limiting ("soft
    /// shift") is active.
    pub current_limit_attenuation: f64,

    // ---- CLOSED-LOOP SCALING ----

    /// Sensor ticks per unit of normalised output in position mode.
    pub position_scale: f64,

    /// Sensor ticks per 100 ms per unit of normalised output in velocity
    /// mode.
    pub velocity_scale: f64,

    // ---- CYCLE ----

    /// Target period of one control cycle.
    ///
    /// Units: seconds
    pub cycle_period_s: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Reasons a parameter set is invalid.
///
/// Invalid parameters are a build-time misconfiguration and are fatal at
/// module initialisation, not recovered at runtime.
#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("tolerance_deg must be positive (got {0})")]
    NonPositiveTolerance(f64),

    #[error("max_rotation_rate must be positive (got {0})")]
    NonPositiveRotationRate(f64),

    #[error("minimal_output must lie in [0, max_rotation_rate] (got {0})")]
    InvalidMinimalOutput(f64),

    #[error("pid_output_limit must be positive (got {0})")]
    NonPositiveOutputLimit(f64),

    #[error("current_limit_attenuation must lie in (0, 1] (got {0})")]
    InvalidAttenuation(f64),

    #[error("dead_zone_ramp_divisor must be non-zero")]
    ZeroRampDivisor,

    #[error("dead_zone_accum_scale must be positive (got {0})")]
    NonPositiveAccumScale(f64),

    #[error("cycle_period_s must be positive (got {0})")]
    NonPositiveCyclePeriod(f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Params {
            k_p: 0.025,
            k_i: 0.0,
            k_d: 0.005,
            tolerance_deg: 2.0,
            max_rotation_rate: 0.5,
            minimal_output: 0.2,
            pid_output_limit: 1.0,
            dead_zone_error_band_deg: 2.0,
            dead_zone_ramp_divisor: 65.0,
            dead_zone_accum_scale: 100.0,
            override_turn_threshold: 0.05,
            current_limit_attenuation: 0.6,
            position_scale: 4096.0,
            velocity_scale: 500.0,
            cycle_period_s: 0.02,
        }
    }
}

impl Params {

    /// Determine if the parameters are valid.
    pub fn are_valid(&self) -> Result<(), ParamsError> {
        if self.tolerance_deg <= 0.0 {
            return Err(ParamsError::NonPositiveTolerance(self.tolerance_deg));
        }
        if self.max_rotation_rate <= 0.0 {
            return Err(ParamsError::NonPositiveRotationRate(
                self.max_rotation_rate));
        }
        if self.minimal_output < 0.0
            || self.minimal_output > self.max_rotation_rate
        {
            return Err(ParamsError::InvalidMinimalOutput(self.minimal_output));
        }
        if self.pid_output_limit <= 0.0 {
            return Err(ParamsError::NonPositiveOutputLimit(
                self.pid_output_limit));
        }
        if self.current_limit_attenuation <= 0.0
            || self.current_limit_attenuation > 1.0
        {
            return Err(ParamsError::InvalidAttenuation(
                self.current_limit_attenuation));
        }
        if self.dead_zone_ramp_divisor == 0.0 {
            return Err(ParamsError::ZeroRampDivisor);
        }
        if self.dead_zone_accum_scale <= 0.0 {
            return Err(ParamsError::NonPositiveAccumScale(
                self.dead_zone_accum_scale));
        }
        if self.cycle_period_s <= 0.0 {
            return Err(ParamsError::NonPositiveCyclePeriod(
                self.cycle_period_s));
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Params::default().are_valid().is_ok());
    }

    #[test]
    fn test_invalid_tolerance_rejected() {
        let params = Params {
            tolerance_deg: 0.0,
            ..Params::default()
        };
        assert!(matches!(
            params.are_valid(),
            Err(ParamsError::NonPositiveTolerance(_))
        ));
    }

    #[test]
    fn test_dead_zone_floor_above_clamp_rejected() {
        let params = Params {
            minimal_output: 0.9,
            max_rotation_rate: 0.5,
            ..Params::default()
        };
        assert!(matches!(
            params.are_valid(),
            Err(ParamsError::InvalidMinimalOutput(_))
        ));
    }
}
