//! Host platform utility functions

use std::path::PathBuf;

/// Retrieve the software root directory from the `DRIVE_SW_ROOT` environment
/// variable.
pub fn get_drive_sw_root() -> Result<PathBuf, std::env::VarError> {
    std::env::var("DRIVE_SW_ROOT").map(PathBuf::from)
}
