//! Parameters structure for the motor driver

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the motor driver.
#[derive(Debug, Deserialize)]
pub struct Params {

    /// Invert the left primary's output so that positive demands drive both
    /// sides of the platform forwards.
    pub invert_left_primary: bool,

    /// Invert the right primary's output.
    pub invert_right_primary: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Params {
            invert_left_primary: true,
            invert_right_primary: false,
        }
    }
}
