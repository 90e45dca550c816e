//! # Drive interface library
//!
//! This library defines the boundary types shared between the drive control
//! executable and its collaborators: the motor controller bus, the heading
//! sensor, and the operator telecommand sources.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod eqpt;
pub mod tc;
