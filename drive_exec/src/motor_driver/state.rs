//! # Motor driver module state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use serde::Serialize;
use thiserror::Error;

// Internal
use super::Params;
use drive_if::eqpt::motor::{
    ClosedLoopMode, MotorBus, MotorBusError, MotorChannel, MotorConfigOp,
    MotorDem, MotorDems};
use util::{
    module::State,
    params,
    session::Session};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Motor driver module state.
#[derive(Default)]
pub struct MotorDriver {
    params: Params,
    report: StatusReport,

    /// The bus backend the demands are executed on.
    bus: Option<Box<dyn MotorBus>>,
}

/// Input data to the motor driver.
#[derive(Default)]
pub struct InputData {
    /// When true all demands are replaced with zero percent output.
    pub halt: bool,

    /// The demands to execute this cycle.
    pub dems: MotorDems,
}

/// Initialisation data for the motor driver.
pub struct InitData {
    /// Parameter file to load, or `None` for the compiled-in defaults.
    pub params_file: Option<&'static str>,

    /// The bus backend to drive.
    pub bus: Box<dyn MotorBus>,
}

/// Status report for motor driver processing.
#[derive(Default, Copy, Clone, Serialize, Debug)]
pub struct StatusReport {
    /// Number of demands executed this cycle
    pub num_dems: usize,

    /// Number of configuration operations applied this cycle
    pub num_config_ops: usize,
}

// ---------------------------------------------------------------------------
// ENUEMRATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum InitError {
    #[error("Failed to load parameters: {0}")]
    ParamLoadError(params::LoadError),

    #[error("Motor bus rejected the initial configuration: {0}")]
    BusConfigError(MotorBusError),
}

#[derive(Debug, Error)]
pub enum ProcError {
    #[error("Motor bus is not initialised")]
    BusNotInitialised,

    #[error("Motor bus error: {0}")]
    BusError(MotorBusError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for MotorDriver {
    type InitData = InitData;
    type InitError = InitError;

    type InputData = InputData;
    type OutputData = ();
    type StatusReport = StatusReport;
    type ProcError = ProcError;

    /// Initialise the motor driver.
    ///
    /// Applies the initial output inversions so that positive demands drive
    /// the platform forwards.
    fn init(&mut self, init_data: Self::InitData, _session: &Session)
        -> Result<(), Self::InitError>
    {
        // Load parameters
        self.params = match params::load_or_default(init_data.params_file) {
            Ok(p) => p,
            Err(e) => return Err(InitError::ParamLoadError(e))
        };

        let mut bus = init_data.bus;

        match bus.set_inverted(
            MotorChannel::LeftPrimary,
            self.params.invert_left_primary
        ) {
            Ok(_) => (),
            Err(e) => return Err(InitError::BusConfigError(e))
        }
        match bus.set_inverted(
            MotorChannel::RightPrimary,
            self.params.invert_right_primary
        ) {
            Ok(_) => (),
            Err(e) => return Err(InitError::BusConfigError(e))
        }

        self.bus = Some(bus);

        Ok(())
    }

    /// Cyclic processing for the motor driver.
    ///
    /// Takes the output data from DriveCtrl and sends the demands to the
    /// motors.
    ///
    /// # Notes
    /// - If `halt` is true the outputs will be zeroed so that no driving is
    ///   performed.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        self.report = StatusReport::default();

        let bus = match self.bus {
            Some(ref mut b) => b,
            None => return Err(ProcError::BusNotInitialised)
        };

        // Wiring changes are applied ahead of the demands
        for op in &input_data.dems.config_ops {
            match *op {
                MotorConfigOp::Follow { follower, leader } =>
                    bus.set_follower(follower, leader),
                MotorConfigOp::Feedback { channel, source } =>
                    bus.select_feedback(channel, source),
                MotorConfigOp::SensorPhase { channel, phase } =>
                    bus.set_sensor_phase(channel, phase),
                MotorConfigOp::Inverted { channel, inverted } =>
                    bus.set_inverted(channel, inverted),
            }.map_err(ProcError::BusError)?;

            self.report.num_config_ops += 1;
        }

        for (&channel, &dem) in &input_data.dems.dems {
            let dem = if input_data.halt {
                MotorDem::PercentOutput(0.0)
            }
            else {
                dem
            };

            match dem {
                MotorDem::PercentOutput(value) =>
                    bus.set_percent_output(channel, value),
                MotorDem::Position(value) =>
                    bus.set_closed_loop_target(
                        channel, ClosedLoopMode::Position, value),
                MotorDem::Velocity(value) =>
                    bus.set_closed_loop_target(
                        channel, ClosedLoopMode::Velocity, value),
            }.map_err(ProcError::BusError)?;

            self.report.num_dems += 1;
        }

        trace!(
            "MotorDriver executed {} config ops and {} demands",
            self.report.num_config_ops,
            self.report.num_dems
        );

        Ok(((), self.report))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use drive_if::eqpt::motor::FeedbackSource;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    /// Everything the recording bus has seen.
    #[derive(Default)]
    struct Recorded {
        percent: HashMap<MotorChannel, f64>,
        targets: HashMap<MotorChannel, (ClosedLoopMode, f64)>,
        followers: HashMap<MotorChannel, MotorChannel>,
        inverted: HashMap<MotorChannel, bool>,
    }

    /// A bus stub recording every call made against it. Cloning shares the
    /// underlying record so tests can inspect it after the driver takes the
    /// bus.
    #[derive(Default, Clone)]
    struct RecordingBus {
        recorded: Rc<RefCell<Recorded>>,
        reject_all: bool,
    }

    impl RecordingBus {
        fn check(&self, channel: MotorChannel) -> Result<(), MotorBusError> {
            if self.reject_all {
                Err(MotorBusError::ChannelNotConfigured(channel))
            } else {
                Ok(())
            }
        }
    }

    impl MotorBus for RecordingBus {
        fn set_percent_output(
            &mut self,
            channel: MotorChannel,
            value: f64
        ) -> Result<(), MotorBusError> {
            self.check(channel)?;
            self.recorded.borrow_mut().percent.insert(channel, value);
            Ok(())
        }

        fn set_closed_loop_target(
            &mut self,
            channel: MotorChannel,
            mode: ClosedLoopMode,
            value: f64
        ) -> Result<(), MotorBusError> {
            self.check(channel)?;
            self.recorded.borrow_mut().targets.insert(channel, (mode, value));
            Ok(())
        }

        fn set_follower(
            &mut self,
            channel: MotorChannel,
            leader: MotorChannel
        ) -> Result<(), MotorBusError> {
            self.check(channel)?;
            self.recorded.borrow_mut().followers.insert(channel, leader);
            Ok(())
        }

        fn set_inverted(
            &mut self,
            channel: MotorChannel,
            inverted: bool
        ) -> Result<(), MotorBusError> {
            self.check(channel)?;
            self.recorded.borrow_mut().inverted.insert(channel, inverted);
            Ok(())
        }

        fn set_sensor_phase(
            &mut self,
            channel: MotorChannel,
            _phase: bool
        ) -> Result<(), MotorBusError> {
            self.check(channel)
        }

        fn select_feedback(
            &mut self,
            channel: MotorChannel,
            _source: FeedbackSource
        ) -> Result<(), MotorBusError> {
            self.check(channel)
        }
    }

    /// Build a driver directly, bypassing parameter file loading.
    fn make_driver(bus: RecordingBus) -> MotorDriver {
        MotorDriver {
            params: Params::default(),
            report: StatusReport::default(),
            bus: Some(Box::new(bus)),
        }
    }

    #[test]
    fn test_config_ops_and_demands_reach_the_bus() {
        let bus = RecordingBus::default();
        let mut driver = make_driver(bus.clone());

        let mut dems = MotorDems::default();
        dems.config_ops.push(MotorConfigOp::Follow {
            follower: MotorChannel::LeftFollower,
            leader: MotorChannel::LeftPrimary
        });
        dems.dems.insert(
            MotorChannel::LeftPrimary,
            MotorDem::PercentOutput(0.25)
        );

        let input = InputData { halt: false, dems };
        let (_, report) = driver.proc(&input).unwrap();

        assert_eq!(report.num_config_ops, 1);
        assert_eq!(report.num_dems, 1);

        let recorded = bus.recorded.borrow();
        assert_eq!(
            recorded.followers.get(&MotorChannel::LeftFollower),
            Some(&MotorChannel::LeftPrimary)
        );
        assert_eq!(
            recorded.percent.get(&MotorChannel::LeftPrimary),
            Some(&0.25)
        );
    }

    #[test]
    fn test_closed_loop_demands_use_the_right_mode() {
        let bus = RecordingBus::default();
        let mut driver = make_driver(bus.clone());

        let mut dems = MotorDems::default();
        dems.dems.insert(
            MotorChannel::LeftPrimary,
            MotorDem::Position(1000.0)
        );
        dems.dems.insert(
            MotorChannel::RightPrimary,
            MotorDem::Velocity(-250.0)
        );

        driver.proc(&InputData { halt: false, dems }).unwrap();

        let recorded = bus.recorded.borrow();
        assert_eq!(
            recorded.targets.get(&MotorChannel::LeftPrimary),
            Some(&(ClosedLoopMode::Position, 1000.0))
        );
        assert_eq!(
            recorded.targets.get(&MotorChannel::RightPrimary),
            Some(&(ClosedLoopMode::Velocity, -250.0))
        );
    }

    #[test]
    fn test_halt_zeroes_outputs() {
        let bus = RecordingBus::default();
        let mut driver = make_driver(bus.clone());

        let mut dems = MotorDems::default();
        dems.dems.insert(
            MotorChannel::LeftPrimary,
            MotorDem::Position(1000.0)
        );

        driver.proc(&InputData { halt: true, dems }).unwrap();

        // The closed-loop target is replaced with zero percent output
        let recorded = bus.recorded.borrow();
        assert!(recorded.targets.is_empty());
        assert_eq!(
            recorded.percent.get(&MotorChannel::LeftPrimary),
            Some(&0.0)
        );
    }

    #[test]
    fn test_unconfigured_channel_fails_fast() {
        let mut driver = make_driver(RecordingBus {
            reject_all: true,
            ..Default::default()
        });

        let mut dems = MotorDems::default();
        dems.dems.insert(
            MotorChannel::LeftPrimary,
            MotorDem::PercentOutput(0.5)
        );

        let input = InputData { halt: false, dems };
        assert!(matches!(
            driver.proc(&input),
            Err(ProcError::BusError(MotorBusError::ChannelNotConfigured(_)))
        ));
    }

    #[test]
    fn test_uninitialised_driver_errors() {
        let mut driver = MotorDriver::default();

        assert!(matches!(
            driver.proc(&InputData::default()),
            Err(ProcError::BusNotInitialised)
        ));
    }
}
