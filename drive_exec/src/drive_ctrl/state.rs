//! Implementations for the DriveCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{error, info, trace, warn};
use serde::Serialize;

// Internal
use super::{
    DriveCtrlError, DriveMixer, HeadingHold, HeadingTracker,
    Params, ParamsError};
use drive_if::{
    eqpt::heading::{HeadingSensor, SensorSource},
    eqpt::motor::{
        FeedbackSource, MotorChannel, MotorConfigOp, MotorDem, MotorDems},
    tc::{DriveCmd, DriveMode}};
use util::{
    params,
    module::State,
    session::Session};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Drive control module state
#[derive(Default)]
pub struct DriveCtrl {

    pub(crate) params: Params,

    pub(crate) report: StatusReport,

    /// The active drive mode.
    mode: DriveMode,

    tracker: HeadingTracker,
    mixer: DriveMixer,
    hold: HeadingHold,

    /// The heading sensor handle, `None` while degraded.
    sensor: Option<Box<dyn HeadingSensor>>,

    /// The acquisition routine, kept so a lost sensor can be re-attempted on
    /// later mode entries.
    sensor_source: Option<SensorSource>,

    /// Sensor failures are reported once, not every cycle.
    sensor_failure_reported: bool,

    /// Configuration operations staged by a mode entry, emitted ahead of the
    /// next cycle's demands.
    pending_config: Vec<MotorConfigOp>,
}

/// Input data to drive control.
#[derive(Default)]
pub struct InputData {
    /// The operator drive command for this cycle, or `None` if there is no
    /// new command on this cycle.
    pub cmd: Option<DriveCmd>,

    /// A requested mode change.
    pub mode_request: Option<DriveMode>,

    /// A requested heading-hold target.
    ///
    /// Units: degrees
    pub hold_target_deg: Option<f64>,

    /// Toggle the current-limiting mode this cycle.
    pub toggle_current_limit: bool,
}

/// Initialisation data for drive control.
pub struct InitData {
    /// Parameter file to load, or `None` for the compiled-in defaults.
    pub params_file: Option<&'static str>,

    /// Routine which acquires the heading sensor.
    pub sensor_source: SensorSource,
}

/// Status report for DriveCtrl processing.
#[derive(Clone, Copy, Default, Serialize, Debug)]
pub struct StatusReport {
    /// Active mode at the end of the cycle
    pub mode: DriveMode,

    /// Latest folded heading estimate
    pub heading_deg: f64,

    /// Heading-hold error, `None` while no hold is active
    pub hold_error_deg: Option<f64>,

    /// True if an active hold's error is inside the tolerance band
    pub within_tolerance: bool,

    /// True if heading hold is degraded (no usable sensor)
    pub degraded: bool,

    /// True if this cycle reused the last heading after a read glitch
    pub read_glitch: bool,

    /// True if current limiting is active
    pub current_limited: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which can occur during DriveCtrl initialisation.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("Failed to load parameters: {0}")]
    ParamLoadError(params::LoadError),

    #[error("Loaded parameters are invalid: {0}")]
    ParamsInvalid(ParamsError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for DriveCtrl {
    type InitData = InitData;
    type InitError = InitError;

    type InputData = InputData;
    type OutputData = MotorDems;
    type StatusReport = StatusReport;
    type ProcError = DriveCtrlError;

    /// Initialise the DriveCtrl module.
    ///
    /// A sensor acquisition failure is recoverable: it is reported once and
    /// the module continues with heading hold disabled until an acquisition
    /// attempt on a later closed-loop mode entry succeeds.
    fn init(&mut self, init_data: Self::InitData, _session: &Session)
        -> Result<(), Self::InitError>
    {

        // Load the parameters
        self.params = match params::load_or_default(init_data.params_file) {
            Ok(p) => p,
            Err(e) => return Err(InitError::ParamLoadError(e))
        };

        // Check parameters are valid
        match self.params.are_valid() {
            Ok(_) => (),
            Err(e) => return Err(InitError::ParamsInvalid(e))
        }

        self.mixer = DriveMixer::new(self.params.current_limit_attenuation);
        self.hold = HeadingHold::new(&self.params);

        // Acquire the heading sensor
        let mut source = init_data.sensor_source;
        match source() {
            Ok(s) => self.sensor = Some(s),
            Err(e) => {
                error!(
                    "Heading sensor unavailable, heading hold disabled: {}",
                    e
                );
                self.sensor_failure_reported = true;
            }
        }
        self.sensor_source = Some(source);

        Ok(())
    }

    /// Perform cyclic processing of drive control.
    ///
    /// Never blocks; a failed sensor read degrades to the last-known heading
    /// and a zero correction for this cycle only.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        // Clear the status report
        self.report = StatusReport::default();

        if input_data.toggle_current_limit {
            let limited = self.mixer.toggle_current_limit();
            info!(
                "Current limiting {}",
                if limited { "enabled" } else { "disabled" }
            );
        }

        // Check to see if there's a mode change
        if let Some(mode) = input_data.mode_request {
            self.enter_mode(mode);
        }

        if let Some(target_deg) = input_data.hold_target_deg {
            if !target_deg.is_finite() {
                return Err(DriveCtrlError::NonFiniteHoldTarget(target_deg));
            }
            self.hold.set_target(target_deg);
        }

        // Consume the heading sensor in the modes which use it. A glitched
        // reading leaves the tracker at its last-known heading and skips the
        // correction for exactly this cycle.
        let mut glitch = false;
        if self.mode_uses_heading() {
            if let Some(ref mut sensor) = self.sensor {
                match sensor.read_degrees() {
                    Ok(raw) if raw.is_finite() =>
                        self.tracker.update(raw),
                    Ok(_) | Err(_) => {
                        glitch = true;
                        trace!(
                            "Heading read glitch, reusing last heading for \
                            one cycle"
                        );
                    }
                }
            }
        }

        let cmd = input_data.cmd.unwrap_or_default();
        let override_active =
            cmd.turn.abs() > self.params.override_turn_threshold;

        let mut output = MotorDems::default();

        // Wiring staged by a mode entry goes out ahead of the demands
        output.config_ops = std::mem::take(&mut self.pending_config);

        match self.mode {
            DriveMode::Disabled => {
                output.dems.insert(
                    MotorChannel::LeftPrimary,
                    MotorDem::PercentOutput(0.0)
                );
                output.dems.insert(
                    MotorChannel::RightPrimary,
                    MotorDem::PercentOutput(0.0)
                );
            }

            DriveMode::ManualPercent => {
                let pair = self.mixer.arcade_drive(cmd.speed, cmd.turn);

                output.dems.insert(
                    MotorChannel::LeftPrimary,
                    MotorDem::PercentOutput(pair.left)
                );
                output.dems.insert(
                    MotorChannel::RightPrimary,
                    MotorDem::PercentOutput(pair.right)
                );
            }

            DriveMode::ClosedLoopPosition | DriveMode::ClosedLoopVelocity => {
                // No correction while degraded or glitched, the base drive
                // still goes out
                let correction = if glitch || self.degraded() {
                    None
                }
                else {
                    self.hold.tick(
                        self.tracker.angle_deg(),
                        override_active,
                        &self.mixer,
                        &self.params
                    )
                };

                let base = self.mixer.tank_drive(cmd.speed, cmd.speed);
                let pair = match correction {
                    Some(c) => base.combined(&c),
                    None => base,
                };

                let (left_dem, right_dem) = match self.mode {
                    DriveMode::ClosedLoopPosition => (
                        MotorDem::Position(
                            pair.left * self.params.position_scale),
                        MotorDem::Position(
                            pair.right * self.params.position_scale)
                    ),
                    _ => (
                        MotorDem::Velocity(
                            pair.left * self.params.velocity_scale),
                        MotorDem::Velocity(
                            pair.right * self.params.velocity_scale)
                    ),
                };

                output.dems.insert(MotorChannel::LeftPrimary, left_dem);
                output.dems.insert(MotorChannel::RightPrimary, right_dem);

                if self.hold.is_holding() {
                    self.report.hold_error_deg =
                        Some(self.hold.last_error_deg());
                }
            }
        }

        self.report.mode = self.mode;
        self.report.heading_deg = self.tracker.angle_deg();
        self.report.within_tolerance = self.hold.is_holding()
            && self.hold.error_within_tolerance(&self.params);
        self.report.degraded = self.degraded();
        self.report.read_glitch = glitch;
        self.report.current_limited = self.mixer.current_limited();

        trace!("DriveCtrl output:\n    dems: {:?}", output.dems);

        Ok((output, self.report))
    }
}

impl DriveCtrl {

    /// Whether the heading-hold corrections are currently unavailable.
    pub fn degraded(&self) -> bool {
        self.sensor.is_none()
    }

    fn mode_uses_heading(&self) -> bool {
        matches!(
            self.mode,
            DriveMode::ClosedLoopPosition | DriveMode::ClosedLoopVelocity
        )
    }

    /// Enter a new drive mode, wiring the actuator interface for it.
    ///
    /// Closed-loop entries select the encoder feedback on the primaries and
    /// re-zero the heading reference. If the sensor cannot be acquired or
    /// reset, the mode is entered degraded: heading hold yields no
    /// corrections rather than trusting a stale reference.
    fn enter_mode(&mut self, mode: DriveMode) {
        info!("Entering drive mode {:?}", mode);

        // Followers mirror the primaries in every driving mode
        match mode {
            DriveMode::ManualPercent
            | DriveMode::ClosedLoopPosition
            | DriveMode::ClosedLoopVelocity => {
                self.pending_config.push(MotorConfigOp::Follow {
                    follower: MotorChannel::LeftFollower,
                    leader: MotorChannel::LeftPrimary
                });
                self.pending_config.push(MotorConfigOp::Follow {
                    follower: MotorChannel::RightFollower,
                    leader: MotorChannel::RightPrimary
                });
            }
            DriveMode::Disabled => ()
        }

        match mode {
            DriveMode::ClosedLoopPosition | DriveMode::ClosedLoopVelocity => {
                // Closed-loop feedback comes from the relative encoders on
                // the primaries, with the phase matching the motor direction
                for channel in
                    [MotorChannel::LeftPrimary, MotorChannel::RightPrimary]
                        .iter()
                        .copied()
                {
                    self.pending_config.push(MotorConfigOp::Feedback {
                        channel,
                        source: FeedbackSource::MagEncoderRelative
                    });
                    self.pending_config.push(MotorConfigOp::SensorPhase {
                        channel,
                        phase: false
                    });
                }

                // A lost sensor is re-attempted on each closed-loop entry
                if self.sensor.is_none() {
                    self.try_acquire_sensor();
                }

                // The hold cannot be trusted without a fresh zero reference
                let reset_ok = match self.sensor {
                    Some(ref mut s) => {
                        match self.tracker.reset(s.as_mut()) {
                            Ok(()) => true,
                            Err(e) => {
                                warn!(
                                    "Heading reset failed, continuing \
                                    degraded: {}",
                                    e
                                );
                                false
                            }
                        }
                    }
                    None => false,
                };

                if reset_ok {
                    self.hold.set_target(0.0);
                }
                else {
                    self.sensor = None;
                    self.hold.release();
                }
            }

            DriveMode::ManualPercent | DriveMode::Disabled => {
                self.hold.release();
            }
        }

        self.mode = mode;
    }

    fn try_acquire_sensor(&mut self) {
        if let Some(ref mut source) = self.sensor_source {
            match source() {
                Ok(s) => {
                    info!("Heading sensor acquired");
                    self.sensor = Some(s);
                    self.sensor_failure_reported = false;
                }
                Err(e) => {
                    if !self.sensor_failure_reported {
                        error!(
                            "Heading sensor unavailable, heading hold \
                            disabled: {}",
                            e
                        );
                        self.sensor_failure_reported = true;
                    }
                }
            }
        }
    }
}
