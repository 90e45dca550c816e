//! Library components of the drive control executable.
//!
//! All modules here follow the cyclic module pattern: a state structure
//! implementing `util::module::State`, initialised once and processed every
//! control cycle by the executable's main loop.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod data_store;
pub mod drive_ctrl;
pub mod motor_driver;
#[cfg(feature = "sim")]
pub mod sim;
