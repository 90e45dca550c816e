//! # Equipment interfaces
//!
//! Abstract interfaces to the hardware the drive executable commands and
//! senses. Backends (hardware or simulated) implement these traits.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod heading;
pub mod motor;
