//! # Heading sensor equipment interface

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors raised by a heading sensor backend.
#[derive(Debug, Error)]
pub enum HeadingSensorError {
    /// The sensor hardware could not be reached. Raised by acquisition
    /// routines; callers are expected to report it and degrade rather than
    /// crash.
    #[error("Heading sensor is unavailable: {0}")]
    Unavailable(String),

    /// A single reading glitched. The caller should reuse its last known
    /// heading for one cycle; there is no retry within a cycle.
    #[error("Transient heading read glitch")]
    ReadGlitch
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Interface to a continuous heading sensor.
pub trait HeadingSensor {
    /// Read the current heading.
    ///
    /// Units: degrees
    fn read_degrees(&mut self) -> Result<f64, HeadingSensorError>;

    /// Command the sensor to re-zero itself.
    fn reset(&mut self) -> Result<(), HeadingSensorError>;
}

/// A routine which acquires a heading sensor handle.
///
/// Acquisition may fail with [`HeadingSensorError::Unavailable`]; the result
/// must be checked explicitly by the caller, which may retry acquisition
/// later.
pub type SensorSource =
    Box<dyn FnMut() -> Result<Box<dyn HeadingSensor>, HeadingSensorError>>;
