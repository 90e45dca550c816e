//! Main drive control executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules
//!     - Main loop:
//!         - Telecommand processing and handling
//!         - Drive control processing
//!         - Motor driver execution
//!
//! # Modules
//!
//! All modules (e.g. `drive_ctrl`) shall meet the following requirements:
//!     1. Provide a public struct implementing the `util::module::State`
//!        trait.
//!

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use drive_lib::{data_store::DataStore, drive_ctrl, motor_driver};
use drive_lib::sim::{
    SimDrivetrain, SimMotorBus, SimMotorBusHandle, SimYawHandle};

mod tc_processor;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};
use std::env;
use std::thread;
use std::time::{Duration, Instant};
use color_eyre::{Report, eyre::{WrapErr, eyre}};

// Internal
use util::{
    raise_error,
    module::State,
    logger::{logger_init, LevelFilter},
    session::Session,
    script_interpreter::{ScriptInterpreter, PendingTcs},
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Target period of one cycle.
const CYCLE_PERIOD_S: f64 = 0.02;

/// Number of cycles per second
const CYCLE_FREQUENCY_HZ: f64 = 1.0 / CYCLE_PERIOD_S;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new(
        "drive_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Trace, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Drive Control Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- INITIALISE TC SOURCE ----

    // Collect all arguments
    let args: Vec<String> = env::args().collect();

    debug!("CLI arguments: {:?}", args);

    // A single argument is used as the script path
    let mut tc_source = TcSource::None;

    if args.len() == 2 {
        info!("Loading script from \"{}\"", &args[1]);

        // Load the script interpreter
        let si = ScriptInterpreter::new(
            &args[1]).wrap_err("Failed to load script")?;

        // Display some info
        info!(
            "Loaded script lasts {:.02} s and contains {} TCs\n",
            si.get_duration(),
            si.get_num_tcs()
        );

        // Set the interpreter in the source
        tc_source = TcSource::Script(si);
    }
    else {
        return Err(eyre!(
            "Expected a single script path argument, found {}",
            args.len() - 1)
        );
    }

    // ---- INITIALISE DATASTORE ----

    info!("Initialising modules...");

    let mut ds = DataStore::default();

    // ---- INITIALISE EQUIPMENT BACKENDS ----

    // The simulated backends stand in for the motor controllers and the
    // heading sensor when no hardware is attached
    let bus_handle = SimMotorBusHandle::new(SimMotorBus::drivetrain());
    let yaw_handle = SimYawHandle::new();

    // ---- INITIALISE MODULES ----

    {
        let yaw = yaw_handle.clone();
        ds.drive_ctrl.init(drive_ctrl::InitData {
            params_file: Some("drive_ctrl.toml"),
            sensor_source: Box::new(move || yaw.acquire_sensor()),
        }, &session)
            .wrap_err("Failed to initialise DriveCtrl")?;
    }
    info!("DriveCtrl init complete");

    ds.motor_driver.init(motor_driver::InitData {
        params_file: Some("motor_driver.toml"),
        bus: Box::new(bus_handle.clone()),
    }, &session)
        .wrap_err("Failed to initialise MotorDriver")?;
    info!("MotorDriver init complete");

    let mut sim = SimDrivetrain::new(
        bus_handle.clone(),
        yaw_handle.clone()
    );

    info!("Module initialisation complete\n");

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    loop {

        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // Clear items that need wiping at the start of the cycle
        ds.cycle_start(CYCLE_FREQUENCY_HZ);

        // ---- TELECOMMAND PROCESSING ----

        match tc_source {
            // If no source no point in continuing so break
            TcSource::None => raise_error!("No TC source present"),

            TcSource::Script(ref mut si) =>
                match si.get_pending_tcs() {
                    PendingTcs::None => (),
                    PendingTcs::Some(tc_vec) => {
                        for tc in tc_vec.iter() {
                            tc_processor::exec(&mut ds, tc);
                        }
                    }
                    // Exit if end of script reached
                    PendingTcs::EndOfScript => {
                        info!("End of TC script reached, stopping");
                        break
                    }
                }
        };

        // ---- CONTROL ALGORITHM PROCESSING ----

        // DriveCtrl processing
        match ds.drive_ctrl.proc(&ds.drive_ctrl_input) {
            Ok((o, r)) => {
                ds.drive_ctrl_output = o;
                ds.drive_ctrl_status_rpt = r;
            },
            Err(e) => {
                // DriveCtrl errors usually just mean you sent the wrong TC,
                // so just issue the warning and continue.
                warn!("Error during DriveCtrl processing: {}", e)
            }
        };

        // Send demands to the motors
        let motor_input = motor_driver::InputData {
            halt: false,
            dems: ds.drive_ctrl_output.clone(),
        };
        match ds.motor_driver.proc(&motor_input) {
            Ok((_, r)) => ds.motor_driver_status_rpt = r,
            Err(e) => warn!("Error during MotorDriver processing: {}", e)
        };

        // ---- SIMULATION ----

        sim.step(CYCLE_PERIOD_S);

        if ds.is_1_hz_cycle {
            info!(
                "heading {:+8.3} deg, mode {:?}",
                ds.drive_ctrl_status_rpt.heading_deg,
                ds.drive_ctrl_status_rpt.mode
            );
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match Duration::from_secs_f64(CYCLE_PERIOD_S)
            .checked_sub(cycle_dur)
        {
            Some(d) => {
                ds.num_consec_cycle_overruns = 0;
                thread::sleep(d);
            },
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - CYCLE_PERIOD_S
                );
                ds.num_consec_cycle_overruns += 1;
            }
        }

        // Increment cycle counter
        ds.num_cycles += 1;
    }

    // ---- SHUTDOWN ----

    session.save("final_status.json", &ds.drive_ctrl_status_rpt);

    info!("End of execution");

    Ok(())
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Various sources for the telecommands incoming to the exec.
#[allow(dead_code)]
enum TcSource {
    None,
    Script(ScriptInterpreter)
}
