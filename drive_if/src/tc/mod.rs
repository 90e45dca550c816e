//! # Telecommand module
//!
//! This module provides the telecommands accepted by the drive executable,
//! whether they come from an operator station or from a timed script.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Serialize, Deserialize};
use std::str::FromStr;
use thiserror::Error;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An operator drive command for one control cycle.
///
/// Transient: produced by the input collaborator each cycle and consumed
/// immediately, never stored across cycles.
#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize)]
pub struct DriveCmd {
    /// Forward speed demand.
    ///
    /// Units: normalised, -1 to +1
    pub speed: f64,

    /// Turn rate demand.
    ///
    /// Units: normalised, -1 to +1
    pub turn: f64
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A telecommand, i.e. an instruction sent to the drive executable.
#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Tc {
    /// Select a drive mode.
    SetMode {
        mode: DriveMode
    },

    /// An arcade-style drive command.
    Arcade {
        /// Forward speed, normalised -1 to +1
        speed: f64,
        /// Turn rate, normalised -1 to +1
        turn: f64
    },

    /// Set the heading-hold target.
    SetHoldTarget {
        /// The target heading in degrees
        target_deg: f64
    },

    /// Toggle the current-limiting ("soft shift") mode.
    ToggleCurrentLimit,

    /// Stop driving by entering the disabled mode.
    Stop
}

/// Drive control modes.
///
/// The string keys used by the external mode chooser are handled by the
/// `FromStr` implementation and by serde.
#[derive(Debug, Serialize, Deserialize, Copy, Clone, Eq, PartialEq)]
pub enum DriveMode {
    /// Open-loop percent-output driving.
    #[serde(rename = "manual")]
    ManualPercent,

    /// Closed-loop position driving with heading assist.
    #[serde(rename = "position")]
    ClosedLoopPosition,

    /// Closed-loop velocity driving with heading assist.
    #[serde(rename = "velocity")]
    ClosedLoopVelocity,

    /// All outputs forced to zero.
    #[serde(rename = "disabled")]
    Disabled
}

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum TcParseError {
    #[error("TC contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),

    #[error("\"{0}\" is not a recognised drive mode key")]
    InvalidModeKey(String)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Tc {

    /// Parse a new TC from a JSON packet
    pub fn from_json(json_str: &str) -> Result<Self, TcParseError> {
        match serde_json::from_str(json_str) {
            Ok(tc) => Ok(tc),
            Err(e) => Err(TcParseError::InvalidJson(e))
        }
    }
}

impl Default for DriveMode {
    fn default() -> Self {
        DriveMode::Disabled
    }
}

impl FromStr for DriveMode {
    type Err = TcParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(DriveMode::ManualPercent),
            "position" => Ok(DriveMode::ClosedLoopPosition),
            "velocity" => Ok(DriveMode::ClosedLoopVelocity),
            "disabled" => Ok(DriveMode::Disabled),
            _ => Err(TcParseError::InvalidModeKey(s.to_string()))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_tc_from_json() {
        let tc = Tc::from_json(
            r#"{"type": "set_mode", "mode": "position"}"#
        ).unwrap();
        assert_eq!(tc, Tc::SetMode { mode: DriveMode::ClosedLoopPosition });

        let tc = Tc::from_json(
            r#"{"type": "arcade", "speed": 0.5, "turn": -0.25}"#
        ).unwrap();
        assert_eq!(tc, Tc::Arcade { speed: 0.5, turn: -0.25 });

        let tc = Tc::from_json(
            r#"{"type": "set_hold_target", "target_deg": 45.0}"#
        ).unwrap();
        assert_eq!(tc, Tc::SetHoldTarget { target_deg: 45.0 });

        let tc = Tc::from_json(r#"{"type": "toggle_current_limit"}"#).unwrap();
        assert_eq!(tc, Tc::ToggleCurrentLimit);

        assert!(Tc::from_json("not json").is_err());
    }

    #[test]
    fn test_drive_mode_keys() {
        assert_eq!(
            "manual".parse::<DriveMode>().unwrap(),
            DriveMode::ManualPercent
        );
        assert_eq!(
            "position".parse::<DriveMode>().unwrap(),
            DriveMode::ClosedLoopPosition
        );
        assert_eq!(
            "velocity".parse::<DriveMode>().unwrap(),
            DriveMode::ClosedLoopVelocity
        );
        assert_eq!(
            "disabled".parse::<DriveMode>().unwrap(),
            DriveMode::Disabled
        );
        assert!("warp_speed".parse::<DriveMode>().is_err());
    }
}
