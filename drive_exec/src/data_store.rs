//! # Data Store

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use drive_if::eqpt::motor::MotorDems;

use crate::{drive_ctrl, motor_driver};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
#[derive(Default)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u128,

    /// True if this cycle falls on a 1Hz boundary
    pub is_1_hz_cycle: bool,

    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,

    // DriveCtrl
    pub drive_ctrl: drive_ctrl::DriveCtrl,
    pub drive_ctrl_input: drive_ctrl::InputData,
    pub drive_ctrl_output: MotorDems,
    pub drive_ctrl_status_rpt: drive_ctrl::StatusReport,

    // MotorDriver
    pub motor_driver: motor_driver::MotorDriver,
    pub motor_driver_status_rpt: motor_driver::StatusReport,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Perform actions required at the start of a cycle.
    ///
    /// Clears those items that need clearing at the start of a cycle, and
    /// sets the 1Hz cycle flag. Operator commands are not retained between
    /// cycles: a cycle without a new command drives at zero demand.
    pub fn cycle_start(&mut self, cycle_frequency_hz: f64) {
        if self.num_cycles % (cycle_frequency_hz as u128) == 0 {
            self.is_1_hz_cycle = true;
        } else {
            self.is_1_hz_cycle = false;
        }

        self.drive_ctrl_input = drive_ctrl::InputData::default();
        self.drive_ctrl_output = MotorDems::default();
        self.drive_ctrl_status_rpt = drive_ctrl::StatusReport::default();
        self.motor_driver_status_rpt = motor_driver::StatusReport::default();
    }
}
