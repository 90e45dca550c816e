//! # Motor driver module
//!
//! This module interfaces with the drivetrain's motor controllers and
//! enables commands to be sent to them. It takes in the `MotorDems` struct
//! produced by drive control and issues those demands over the `MotorBus`
//! backend it owns.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod state;
pub mod params;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use state::*;
pub use params::*;
