//! Drive control module
//!
//! Converts operator drive intents into per-side motor demands. Owns the
//! heading tracker, the drive mixer and the heading-hold controller, and
//! coordinates the drive modes (manual percent output, closed-loop position,
//! closed-loop velocity, disabled).

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod heading;
mod hold;
mod mixer;
mod params;
mod pid;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use heading::*;
pub use hold::*;
pub use mixer::*;
pub use params::*;
pub use pid::*;
pub use state::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during DriveCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum DriveCtrlError {
    #[error("Recieved a non-finite hold target: {0}")]
    NonFiniteHoldTarget(f64),
}
