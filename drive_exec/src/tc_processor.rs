//! # Telecommand processor module
//!
//! The telecommand processor handles various TCs coming from any source.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;

// Internal
use drive_if::tc::{DriveCmd, DriveMode, Tc};
use drive_lib::data_store::DataStore;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Execute a telecommand.
///
/// Mutates the datastore to send commands to different modules.
pub(crate) fn exec(ds: &mut DataStore, tc: &Tc) {

    // Handle different Tcs
    match *tc {
        Tc::SetMode { mode } => {
            debug!("Recieved SetMode({:?}) command", mode);
            ds.drive_ctrl_input.mode_request = Some(mode);
        },
        Tc::Arcade { speed, turn } => {
            ds.drive_ctrl_input.cmd = Some(DriveCmd { speed, turn });
        },
        Tc::SetHoldTarget { target_deg } => {
            debug!("Recieved SetHoldTarget({}) command", target_deg);
            ds.drive_ctrl_input.hold_target_deg = Some(target_deg);
        },
        Tc::ToggleCurrentLimit => {
            debug!("Recieved ToggleCurrentLimit command");
            ds.drive_ctrl_input.toggle_current_limit = true;
        },
        Tc::Stop => {
            debug!("Recieved Stop command");
            ds.drive_ctrl_input.mode_request = Some(DriveMode::Disabled);
        }
    }

}
