//! # Drivetrain motor equipment interface

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Serialize, Deserialize};
use std::collections::HashMap;
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Demands that are sent from drive control to the motor driver each cycle.
///
/// Configuration operations are applied to the bus ahead of the output
/// demands, so that a mode change rewires the controllers before the first
/// demand of the new mode reaches them.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct MotorDems {
    /// Configuration operations to apply before the demands.
    pub config_ops: Vec<MotorConfigOp>,

    /// The demanded output per channel.
    pub dems: HashMap<MotorChannel, MotorDem>
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Channels of the drivetrain motor controllers.
///
/// Each side has a primary controller with feedback and a follower slaved to
/// it.
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Copy, Clone)]
pub enum MotorChannel {
    LeftPrimary,
    LeftFollower,
    RightPrimary,
    RightFollower
}

/// Closed-loop control modes supported by a motor controller channel.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Eq, PartialEq)]
pub enum ClosedLoopMode {
    Position,
    Velocity
}

/// Feedback sensor selection for a channel.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Eq, PartialEq)]
pub enum FeedbackSource {
    /// Relative magnetic encoder on the controller's feedback port.
    MagEncoderRelative
}

/// A demand for a single channel.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub enum MotorDem {
    /// Open-loop output.
    ///
    /// Units: normalised, -1 to +1
    PercentOutput(f64),

    /// Closed-loop position target.
    ///
    /// Units: sensor ticks
    Position(f64),

    /// Closed-loop velocity target.
    ///
    /// Units: sensor ticks per 100 ms
    Velocity(f64)
}

/// A configuration operation applied to the bus.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub enum MotorConfigOp {
    /// Slave a channel to a leader channel's output.
    Follow {
        follower: MotorChannel,
        leader: MotorChannel
    },

    /// Select the feedback sensor wired to a channel.
    Feedback {
        channel: MotorChannel,
        source: FeedbackSource
    },

    /// Set the sensor phase of a channel.
    SensorPhase {
        channel: MotorChannel,
        phase: bool
    },

    /// Invert a channel's output.
    Inverted {
        channel: MotorChannel,
        inverted: bool
    }
}

/// Errors raised by a motor bus backend.
///
/// Commanding an unconfigured channel is fail-fast; there is no retry path.
#[derive(Debug, Error)]
pub enum MotorBusError {
    #[error("Channel {0:?} is not configured on this bus")]
    ChannelNotConfigured(MotorChannel)
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Interface to the drivetrain motor controllers.
///
/// All operations are fast synchronous calls; implementations must not block
/// the control cycle.
pub trait MotorBus {
    /// Command an open-loop output on a channel.
    fn set_percent_output(&mut self, channel: MotorChannel, value: f64)
        -> Result<(), MotorBusError>;

    /// Command a closed-loop target on a channel.
    fn set_closed_loop_target(
        &mut self,
        channel: MotorChannel,
        mode: ClosedLoopMode,
        value: f64
    ) -> Result<(), MotorBusError>;

    /// Slave a channel to a leader channel.
    fn set_follower(&mut self, channel: MotorChannel, leader: MotorChannel)
        -> Result<(), MotorBusError>;

    /// Invert a channel's output.
    fn set_inverted(&mut self, channel: MotorChannel, inverted: bool)
        -> Result<(), MotorBusError>;

    /// Set a channel's sensor phase.
    fn set_sensor_phase(&mut self, channel: MotorChannel, phase: bool)
        -> Result<(), MotorBusError>;

    /// Select the feedback sensor for a channel.
    fn select_feedback(&mut self, channel: MotorChannel, source: FeedbackSource)
        -> Result<(), MotorBusError>;
}
