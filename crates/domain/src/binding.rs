//! Binding — maps controller inputs to one hub port and one command kind.
//!
//! Bindings are immutable for the duration of a run; they are authored and
//! edited elsewhere and only validated here.

use serde::{Deserialize, Serialize};

use crate::command::{MotionProfile, MotorEndState, TaskKind};
use crate::error::{HubDriveError, ValidationError};
use crate::id::{BindingId, InputId, PortKey};
use crate::input::InputGain;
use crate::limits::MotorLimits;

/// Reference to a logical input together with its response curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputBinding {
    pub input: InputId,
    #[serde(default)]
    pub gain: InputGain,
}

impl InputBinding {
    #[must_use]
    pub fn new(input: InputId, gain: InputGain) -> Self {
        Self { input, gain }
    }
}

/// Continuous speed control with optional brake input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedBinding {
    pub accelerate: InputBinding,
    #[serde(default)]
    pub brake: Option<InputBinding>,
    /// Maximum absolute speed, `[0, 100]`.
    pub max_speed: f64,
    /// Maximum power, `[0, 100]`.
    pub power: f64,
    #[serde(default)]
    pub invert: bool,
    #[serde(default)]
    pub profile: MotionProfile,
    /// Flip between stopped and full speed on each press instead of
    /// tracking the input.
    #[serde(default)]
    pub is_toggle: bool,
}

/// Absolute position tracking around a centre.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServoBinding {
    pub input: InputBinding,
    /// Total sweep in degrees; the servo moves `range / 2` each way.
    pub range: u16,
    /// Absolute centre position, in degrees.
    #[serde(default)]
    pub aposition: i32,
    pub speed: u8,
    pub power: u8,
    #[serde(default)]
    pub invert: bool,
    #[serde(default)]
    pub profile: MotionProfile,
}

/// Move to a fixed angle when the input is pressed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetAngleBinding {
    pub input: InputBinding,
    pub angle: i32,
    pub speed: u8,
    pub power: u8,
    #[serde(default)]
    pub end_state: MotorEndState,
    #[serde(default)]
    pub profile: MotionProfile,
}

/// Rotate by a fixed step on each press of either direction input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepperBinding {
    #[serde(default)]
    pub cw: Option<InputBinding>,
    #[serde(default)]
    pub ccw: Option<InputBinding>,
    /// Step size in degrees.
    pub degree: i32,
    pub speed: u8,
    pub power: u8,
    #[serde(default)]
    pub end_state: MotorEndState,
    #[serde(default)]
    pub profile: MotionProfile,
}

/// Per-kind configuration of a binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BindingConfig {
    Speed(SpeedBinding),
    Servo(ServoBinding),
    SetAngle(SetAngleBinding),
    Stepper(StepperBinding),
}

impl BindingConfig {
    /// The command kind this binding produces.
    #[must_use]
    pub fn task_kind(&self) -> TaskKind {
        match self {
            Self::Speed(_) => TaskKind::SetSpeed,
            Self::Servo(_) => TaskKind::Servo,
            Self::SetAngle(_) => TaskKind::SetAngle,
            Self::Stepper(_) => TaskKind::Stepper,
        }
    }
}

/// One mapping from controller inputs to a hub output port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    #[serde(default)]
    pub id: BindingId,
    pub output: PortKey,
    pub config: BindingConfig,
}

impl Binding {
    /// Create a binding and check it against the protocol limits.
    ///
    /// # Errors
    ///
    /// Returns [`HubDriveError::Validation`] when a speed, power, servo
    /// range or stepper degree is out of bounds.
    pub fn new(id: BindingId, output: PortKey, config: BindingConfig) -> Result<Self, HubDriveError> {
        let binding = Self { id, output, config };
        binding.validate(&MotorLimits::PROTOCOL)?;
        Ok(binding)
    }

    /// Check the configuration against `limits`.
    ///
    /// # Errors
    ///
    /// Returns [`HubDriveError::Validation`] describing the first field
    /// found out of bounds.
    pub fn validate(&self, limits: &MotorLimits) -> Result<(), HubDriveError> {
        match &self.config {
            BindingConfig::Speed(speed) => {
                check_speed(speed.max_speed, limits)?;
                check_power(speed.power, limits)?;
            }
            BindingConfig::Servo(servo) => {
                check_speed(f64::from(servo.speed), limits)?;
                check_power(f64::from(servo.power), limits)?;
                if servo.range == 0 || servo.range > limits.max_servo_range {
                    return Err(ValidationError::ServoRangeOutOfRange {
                        value: servo.range,
                        max: limits.max_servo_range,
                    }
                    .into());
                }
            }
            BindingConfig::SetAngle(angle) => {
                check_speed(f64::from(angle.speed), limits)?;
                check_power(f64::from(angle.power), limits)?;
            }
            BindingConfig::Stepper(stepper) => {
                check_speed(f64::from(stepper.speed), limits)?;
                check_power(f64::from(stepper.power), limits)?;
                if stepper.degree == 0 {
                    return Err(ValidationError::ZeroStepperDegree.into());
                }
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn task_kind(&self) -> TaskKind {
        self.config.task_kind()
    }
}

fn check_speed(value: f64, limits: &MotorLimits) -> Result<(), ValidationError> {
    if (0.0..=limits.max_speed).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::SpeedOutOfRange {
            value,
            min: 0.0,
            max: limits.max_speed,
        })
    }
}

fn check_power(value: f64, limits: &MotorLimits) -> Result<(), ValidationError> {
    if (limits.min_power..=limits.max_power).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::PowerOutOfRange {
            value,
            min: limits.min_power,
            max: limits.max_power,
        })
    }
}
