//! # Simulated equipment backends
//!
//! Stand-ins for the motor controller bus and the heading sensor, used by
//! the executable when no hardware is attached and by the integration tests.
//! The handles are shared-cell based so the executive can inspect and drive
//! the simulation while the modules own the equipment ends.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

// Internal
use drive_if::eqpt::heading::{HeadingSensor, HeadingSensorError};
use drive_if::eqpt::motor::{
    ClosedLoopMode, FeedbackSource, MotorBus, MotorBusError, MotorChannel};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Per-channel state tracked by the simulated bus.
#[derive(Debug, Default, Clone)]
pub struct SimChannel {
    pub percent_output: f64,
    pub closed_loop_target: Option<(ClosedLoopMode, f64)>,
    pub follows: Option<MotorChannel>,
    pub inverted: bool,
    pub sensor_phase: bool,
    pub feedback: Option<FeedbackSource>,
}

/// A simulated motor bus which records the commands sent to it.
///
/// Only the channels named at construction are configured; commanding any
/// other channel fails fast, as a hardware bus would.
#[derive(Debug, Default)]
pub struct SimMotorBus {
    channels: HashMap<MotorChannel, SimChannel>,
}

/// Shared handle onto a simulated bus.
///
/// Clones share the same underlying bus, letting the motor driver own one
/// end as a `MotorBus` while the executive keeps another for inspection.
#[derive(Clone)]
pub struct SimMotorBusHandle(Rc<RefCell<SimMotorBus>>);

/// Shared yaw state backing the simulated heading sensor.
#[derive(Debug, Default)]
struct SimYaw {
    degrees: f64,
    glitches_pending: u32,
}

/// Shared handle onto the simulated yaw state.
#[derive(Clone, Default)]
pub struct SimYawHandle(Rc<RefCell<SimYaw>>);

/// A simulated heading sensor reading from a shared yaw cell.
pub struct SimHeadingSensor {
    yaw: SimYawHandle,
}

/// Minimal yaw dynamics for the simulated drivetrain.
///
/// Integrates the commanded differential output into the simulated yaw each
/// cycle so closed heading loops actually close in simulation.
pub struct SimDrivetrain {
    bus: SimMotorBusHandle,
    yaw: SimYawHandle,

    /// Yaw rate per unit of commanded turn.
    ///
    /// Units: degrees/second
    pub yaw_rate_deg_s: f64,

    /// Scale dividing closed-loop targets back into normalised outputs.
    pub closed_loop_scale: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimMotorBus {

    /// Create a bus with the given channels configured.
    pub fn new(channels: &[MotorChannel]) -> Self {
        Self {
            channels: channels
                .iter()
                .map(|&c| (c, SimChannel::default()))
                .collect()
        }
    }

    /// Create a bus with the standard two-sides-with-followers drivetrain
    /// channel map.
    pub fn drivetrain() -> Self {
        Self::new(&[
            MotorChannel::LeftPrimary,
            MotorChannel::LeftFollower,
            MotorChannel::RightPrimary,
            MotorChannel::RightFollower
        ])
    }

    /// Inspect a channel's recorded state.
    pub fn channel(&self, channel: MotorChannel) -> Option<&SimChannel> {
        self.channels.get(&channel)
    }

    fn channel_mut(
        &mut self,
        channel: MotorChannel
    ) -> Result<&mut SimChannel, MotorBusError> {
        self.channels
            .get_mut(&channel)
            .ok_or(MotorBusError::ChannelNotConfigured(channel))
    }
}

impl SimMotorBusHandle {

    pub fn new(bus: SimMotorBus) -> Self {
        Self(Rc::new(RefCell::new(bus)))
    }

    /// Run a closure against the shared bus state.
    pub fn with<R>(&self, f: impl FnOnce(&SimMotorBus) -> R) -> R {
        f(&self.0.borrow())
    }
}

impl MotorBus for SimMotorBusHandle {
    fn set_percent_output(
        &mut self,
        channel: MotorChannel,
        value: f64
    ) -> Result<(), MotorBusError> {
        let mut bus = self.0.borrow_mut();
        let ch = bus.channel_mut(channel)?;
        ch.percent_output = value;
        ch.closed_loop_target = None;
        Ok(())
    }

    fn set_closed_loop_target(
        &mut self,
        channel: MotorChannel,
        mode: ClosedLoopMode,
        value: f64
    ) -> Result<(), MotorBusError> {
        let mut bus = self.0.borrow_mut();
        let ch = bus.channel_mut(channel)?;
        ch.closed_loop_target = Some((mode, value));
        Ok(())
    }

    fn set_follower(
        &mut self,
        channel: MotorChannel,
        leader: MotorChannel
    ) -> Result<(), MotorBusError> {
        let mut bus = self.0.borrow_mut();

        // The leader must be configured too for followers to make sense
        if bus.channels.get(&leader).is_none() {
            return Err(MotorBusError::ChannelNotConfigured(leader));
        }

        bus.channel_mut(channel)?.follows = Some(leader);
        Ok(())
    }

    fn set_inverted(
        &mut self,
        channel: MotorChannel,
        inverted: bool
    ) -> Result<(), MotorBusError> {
        self.0.borrow_mut().channel_mut(channel)?.inverted = inverted;
        Ok(())
    }

    fn set_sensor_phase(
        &mut self,
        channel: MotorChannel,
        phase: bool
    ) -> Result<(), MotorBusError> {
        self.0.borrow_mut().channel_mut(channel)?.sensor_phase = phase;
        Ok(())
    }

    fn select_feedback(
        &mut self,
        channel: MotorChannel,
        source: FeedbackSource
    ) -> Result<(), MotorBusError> {
        self.0.borrow_mut().channel_mut(channel)?.feedback = Some(source);
        Ok(())
    }
}

impl SimYawHandle {

    pub fn new() -> Self {
        Self::default()
    }

    /// The current simulated yaw in degrees.
    pub fn degrees(&self) -> f64 {
        self.0.borrow().degrees
    }

    /// Force the simulated yaw to a value.
    pub fn set_degrees(&self, degrees: f64) {
        self.0.borrow_mut().degrees = degrees;
    }

    /// Make the next `count` sensor reads fail with a transient glitch.
    pub fn inject_glitches(&self, count: u32) {
        self.0.borrow_mut().glitches_pending = count;
    }

    /// Acquire a sensor end onto this yaw state, as a hardware acquisition
    /// routine would.
    pub fn acquire_sensor(
        &self
    ) -> Result<Box<dyn HeadingSensor>, HeadingSensorError> {
        Ok(Box::new(SimHeadingSensor { yaw: self.clone() }))
    }
}

impl HeadingSensor for SimHeadingSensor {
    fn read_degrees(&mut self) -> Result<f64, HeadingSensorError> {
        let mut yaw = self.yaw.0.borrow_mut();

        if yaw.glitches_pending > 0 {
            yaw.glitches_pending -= 1;
            return Err(HeadingSensorError::ReadGlitch);
        }

        Ok(yaw.degrees)
    }

    fn reset(&mut self) -> Result<(), HeadingSensorError> {
        self.yaw.0.borrow_mut().degrees = 0.0;
        Ok(())
    }
}

impl SimDrivetrain {

    pub fn new(bus: SimMotorBusHandle, yaw: SimYawHandle) -> Self {
        Self {
            bus,
            yaw,
            yaw_rate_deg_s: 30.0,
            closed_loop_scale: 4096.0,
        }
    }

    /// Advance the simulation by one timestep.
    pub fn step(&mut self, dt_s: f64) {
        let (left, right) = self.bus.with(|bus| {
            (
                Self::effective_output(
                    bus.channel(MotorChannel::LeftPrimary),
                    self.closed_loop_scale
                ),
                Self::effective_output(
                    bus.channel(MotorChannel::RightPrimary),
                    self.closed_loop_scale
                )
            )
        });

        // The right channel is commanded in the inverted actuator frame, so
        // the turn component of an arcade mix is -(left + right) / 2
        let turn = -(left + right) / 2.0;

        let delta = turn * self.yaw_rate_deg_s * dt_s;
        self.yaw.set_degrees(self.yaw.degrees() + delta);
    }

    fn effective_output(channel: Option<&SimChannel>, scale: f64) -> f64 {
        match channel {
            Some(ch) => match ch.closed_loop_target {
                Some((_, value)) => value / scale,
                None => ch.percent_output,
            },
            None => 0.0,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_unconfigured_channel_rejected() {
        let mut handle = SimMotorBusHandle::new(SimMotorBus::new(&[
            MotorChannel::LeftPrimary
        ]));

        assert!(handle
            .set_percent_output(MotorChannel::LeftPrimary, 0.5)
            .is_ok());
        assert!(matches!(
            handle.set_percent_output(MotorChannel::RightPrimary, 0.5),
            Err(MotorBusError::ChannelNotConfigured(
                MotorChannel::RightPrimary
            ))
        ));
    }

    #[test]
    fn test_sensor_reads_shared_yaw() {
        let yaw = SimYawHandle::new();
        let mut sensor = yaw.acquire_sensor().unwrap();

        yaw.set_degrees(12.5);
        assert_eq!(sensor.read_degrees().unwrap(), 12.5);

        sensor.reset().unwrap();
        assert_eq!(yaw.degrees(), 0.0);
    }

    #[test]
    fn test_glitches_are_transient() {
        let yaw = SimYawHandle::new();
        let mut sensor = yaw.acquire_sensor().unwrap();

        yaw.inject_glitches(2);
        assert!(sensor.read_degrees().is_err());
        assert!(sensor.read_degrees().is_err());
        assert!(sensor.read_degrees().is_ok());
    }

    #[test]
    fn test_drivetrain_yaw_follows_turn_demand() {
        let bus = SimMotorBusHandle::new(SimMotorBus::drivetrain());
        let yaw = SimYawHandle::new();
        let mut sim = SimDrivetrain::new(bus.clone(), yaw.clone());

        // An arcade turn of +0.5: left = -0.5, right (inverted) = -0.5
        let mut handle = bus.clone();
        handle
            .set_percent_output(MotorChannel::LeftPrimary, -0.5)
            .unwrap();
        handle
            .set_percent_output(MotorChannel::RightPrimary, -0.5)
            .unwrap();

        sim.step(1.0);
        assert!((yaw.degrees() - 15.0).abs() < 1e-9);
    }
}
