//! Full-cycle integration tests against the simulated equipment backends.

use drive_if::eqpt::heading::HeadingSensorError;
use drive_if::eqpt::motor::{ClosedLoopMode, MotorChannel};
use drive_if::tc::{DriveCmd, DriveMode};
use drive_lib::data_store::DataStore;
use drive_lib::drive_ctrl;
use drive_lib::motor_driver;
use drive_lib::sim::{
    SimDrivetrain, SimMotorBus, SimMotorBusHandle, SimYawHandle};
use util::module::State;
use util::session::Session;

const CYCLE_PERIOD_S: f64 = 0.02;

/// A session rooted in the temp directory; the modules under test only pass
/// it through.
fn test_session() -> Session {
    Session {
        session_root: std::env::temp_dir(),
        log_file_path: std::env::temp_dir().join("drive_exec_test.log"),
    }
}

/// A fully initialised data store wired onto simulated equipment.
fn init_rig() -> (DataStore, SimMotorBusHandle, SimYawHandle) {
    let session = test_session();

    let bus_handle = SimMotorBusHandle::new(SimMotorBus::drivetrain());
    let yaw_handle = SimYawHandle::new();

    let mut ds = DataStore::default();

    let yaw = yaw_handle.clone();
    ds.drive_ctrl
        .init(
            drive_ctrl::InitData {
                params_file: None,
                sensor_source: Box::new(move || yaw.acquire_sensor()),
            },
            &session,
        )
        .unwrap();

    ds.motor_driver
        .init(
            motor_driver::InitData {
                params_file: None,
                bus: Box::new(bus_handle.clone()),
            },
            &session,
        )
        .unwrap();

    (ds, bus_handle, yaw_handle)
}

/// Run one full control cycle with the given drive control input.
fn run_cycle(ds: &mut DataStore, input: drive_ctrl::InputData) {
    ds.cycle_start(1.0 / CYCLE_PERIOD_S);
    ds.drive_ctrl_input = input;

    let (output, report) = ds.drive_ctrl.proc(&ds.drive_ctrl_input).unwrap();
    ds.drive_ctrl_output = output;
    ds.drive_ctrl_status_rpt = report;

    let motor_input = motor_driver::InputData {
        halt: false,
        dems: ds.drive_ctrl_output.clone(),
    };
    ds.motor_driver.proc(&motor_input).unwrap();
}

#[test]
fn manual_drive_reaches_the_bus() {
    let (mut ds, bus, _yaw) = init_rig();

    run_cycle(
        &mut ds,
        drive_ctrl::InputData {
            mode_request: Some(DriveMode::ManualPercent),
            cmd: Some(DriveCmd { speed: 0.5, turn: 0.2 }),
            ..Default::default()
        },
    );

    bus.with(|b| {
        let left = b.channel(MotorChannel::LeftPrimary).unwrap();
        let right = b.channel(MotorChannel::RightPrimary).unwrap();

        assert_eq!(left.percent_output, 0.3);
        assert_eq!(right.percent_output, -0.7);

        // Followers were wired to their primaries on mode entry
        assert_eq!(
            b.channel(MotorChannel::LeftFollower).unwrap().follows,
            Some(MotorChannel::LeftPrimary)
        );
        assert_eq!(
            b.channel(MotorChannel::RightFollower).unwrap().follows,
            Some(MotorChannel::RightPrimary)
        );

        // The left primary was inverted at motor driver init
        assert!(left.inverted);
        assert!(!right.inverted);
    });
}

#[test]
fn closed_loop_entry_selects_encoder_feedback() {
    let (mut ds, bus, _yaw) = init_rig();

    run_cycle(
        &mut ds,
        drive_ctrl::InputData {
            mode_request: Some(DriveMode::ClosedLoopPosition),
            ..Default::default()
        },
    );

    bus.with(|b| {
        let left = b.channel(MotorChannel::LeftPrimary).unwrap();
        assert!(left.feedback.is_some());
        assert!(!left.sensor_phase);
        assert!(matches!(
            left.closed_loop_target,
            Some((ClosedLoopMode::Position, _))
        ));
    });
}

#[test]
fn heading_hold_converges_in_sim() {
    let (mut ds, bus, yaw) = init_rig();
    let mut sim = SimDrivetrain::new(bus.clone(), yaw.clone());

    run_cycle(
        &mut ds,
        drive_ctrl::InputData {
            mode_request: Some(DriveMode::ClosedLoopPosition),
            ..Default::default()
        },
    );
    sim.step(CYCLE_PERIOD_S);

    run_cycle(
        &mut ds,
        drive_ctrl::InputData {
            hold_target_deg: Some(45.0),
            ..Default::default()
        },
    );
    sim.step(CYCLE_PERIOD_S);

    // Let the loop run for a simulated 12 seconds
    for _ in 0..600 {
        run_cycle(&mut ds, drive_ctrl::InputData::default());
        sim.step(CYCLE_PERIOD_S);
    }

    let report = ds.drive_ctrl_status_rpt;
    assert!(
        (report.heading_deg - 45.0).abs() < 3.0,
        "heading settled at {} deg",
        report.heading_deg
    );
    assert!(report.hold_error_deg.is_some());
    assert!(report.within_tolerance);
    assert!(!report.degraded);
}

#[test]
fn degraded_sensor_drives_open_loop_without_panicking() {
    let session = test_session();

    let bus_handle = SimMotorBusHandle::new(SimMotorBus::drivetrain());
    let mut ds = DataStore::default();

    ds.drive_ctrl
        .init(
            drive_ctrl::InitData {
                params_file: None,
                sensor_source: Box::new(|| {
                    Err(HeadingSensorError::Unavailable(
                        "no hardware on the bench".into(),
                    ))
                }),
            },
            &session,
        )
        .unwrap();

    ds.motor_driver
        .init(
            motor_driver::InitData {
                params_file: None,
                bus: Box::new(bus_handle.clone()),
            },
            &session,
        )
        .unwrap();

    run_cycle(
        &mut ds,
        drive_ctrl::InputData {
            mode_request: Some(DriveMode::ClosedLoopPosition),
            ..Default::default()
        },
    );

    for _ in 0..10 {
        run_cycle(
            &mut ds,
            drive_ctrl::InputData {
                cmd: Some(DriveCmd { speed: 0.4, turn: 0.0 }),
                ..Default::default()
            },
        );
    }

    let report = ds.drive_ctrl_status_rpt;
    assert!(report.degraded);
    assert!(report.hold_error_deg.is_none());

    // The base drive still reaches the bus as a position demand
    bus_handle.with(|b| {
        let left = b.channel(MotorChannel::LeftPrimary).unwrap();
        assert!(matches!(
            left.closed_loop_target,
            Some((ClosedLoopMode::Position, v)) if v != 0.0
        ));
    });
}

#[test]
fn glitched_reads_recover_after_one_cycle() {
    let (mut ds, _bus, yaw) = init_rig();

    run_cycle(
        &mut ds,
        drive_ctrl::InputData {
            mode_request: Some(DriveMode::ClosedLoopPosition),
            ..Default::default()
        },
    );
    assert!(!ds.drive_ctrl_status_rpt.read_glitch);

    yaw.inject_glitches(1);
    run_cycle(&mut ds, drive_ctrl::InputData::default());
    assert!(ds.drive_ctrl_status_rpt.read_glitch);

    run_cycle(&mut ds, drive_ctrl::InputData::default());
    assert!(!ds.drive_ctrl_status_rpt.read_glitch);
}

#[test]
fn current_limit_toggle_attenuates_manual_drive() {
    let (mut ds, bus, _yaw) = init_rig();

    run_cycle(
        &mut ds,
        drive_ctrl::InputData {
            mode_request: Some(DriveMode::ManualPercent),
            toggle_current_limit: true,
            cmd: Some(DriveCmd { speed: 1.0, turn: 0.0 }),
            ..Default::default()
        },
    );

    assert!(ds.drive_ctrl_status_rpt.current_limited);
    bus.with(|b| {
        let left = b.channel(MotorChannel::LeftPrimary).unwrap();
        assert_eq!(left.percent_output, 0.6);
    });
}
