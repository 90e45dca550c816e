//! Drive mixing calculations

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Independent per-side outputs in the actuator frame.
///
/// The right side already carries the mounting sign inversion applied by the
/// mixer.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct MotorPair {
    /// Left side output
    pub left: f64,

    /// Right side output
    pub right: f64
}

/// Converts (speed, turn) drive intents into per-side outputs.
///
/// Owns the current-limiting flag; there is no ambient shared configuration.
#[derive(Debug)]
pub struct DriveMixer {
    current_limited: bool,
    attenuation: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MotorPair {

    /// Sum this pair with another, used to merge a base drive with a
    /// correction.
    pub fn combined(&self, other: &MotorPair) -> MotorPair {
        MotorPair {
            left: self.left + other.left,
            right: self.right + other.right
        }
    }
}

impl Default for DriveMixer {
    fn default() -> Self {
        DriveMixer::new(super::Params::default().current_limit_attenuation)
    }
}

impl DriveMixer {

    pub fn new(attenuation: f64) -> Self {
        Self {
            current_limited: false,
            attenuation
        }
    }

    /// Mix independent left/right inputs into the output pair.
    ///
    /// While current limiting is active both sides are attenuated. The right
    /// side is sign-inverted to account for the mirrored motor mounting.
    /// Inputs are not clamped here, the actuator interface saturates
    /// out-of-range values itself.
    pub fn tank_drive(&self, left: f64, right: f64) -> MotorPair {
        let (left, right) = if self.current_limited {
            (left * self.attenuation, right * self.attenuation)
        }
        else {
            (left, right)
        };

        MotorPair {
            left,
            right: -right
        }
    }

    /// Mix a (speed, turn) pair into the output pair.
    ///
    /// Purely algebraic, combined magnitudes above 1 are passed through
    /// unmodified.
    pub fn arcade_drive(&self, speed: f64, turn: f64) -> MotorPair {
        self.tank_drive(speed - turn, speed + turn)
    }

    /// Flip the current-limiting ("soft shift") mode. Takes effect on the
    /// next mix call. Returns the new state.
    pub fn toggle_current_limit(&mut self) -> bool {
        self.current_limited = !self.current_limited;
        self.current_limited
    }

    pub fn current_limited(&self) -> bool {
        self.current_limited
    }
}
