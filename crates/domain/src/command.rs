//! Port command payloads — what a task asks a motor to do.
//!
//! [`PortCommandPayload`] is a closed sum type: every consumer matches it
//! exhaustively, so adding a command kind fails compilation wherever the
//! new kind is not handled.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Discriminant of [`PortCommandPayload`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    SetSpeed,
    Servo,
    SetAngle,
    Stepper,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetSpeed => f.write_str("set_speed"),
            Self::Servo => f.write_str("servo"),
            Self::SetAngle => f.write_str("set_angle"),
            Self::Stepper => f.write_str("stepper"),
        }
    }
}

/// What the motor does once a positional command completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotorEndState {
    Float,
    #[default]
    Hold,
    Brake,
}

/// Acceleration / deceleration profile flags carried by every command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionProfile {
    pub use_acceleration_profile: bool,
    pub use_deceleration_profile: bool,
}

/// Run the motor at a signed speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetSpeedPayload {
    /// Signed speed, `[-100, 100]`.
    pub speed: i8,
    /// Power, `[0, 100]`.
    pub power: u8,
    /// Whether the accelerate input was held when the payload was built.
    pub active_input: bool,
    pub profile: MotionProfile,
}

/// Track an input with an absolute position around a centre.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServoPayload {
    /// Offset from `aposition`, in degrees.
    pub angle: i32,
    /// Absolute centre position, in degrees.
    pub aposition: i32,
    pub speed: u8,
    pub power: u8,
    pub profile: MotionProfile,
}

impl ServoPayload {
    /// Absolute target position.
    #[must_use]
    pub fn target(&self) -> i32 {
        self.aposition.saturating_add(self.angle)
    }
}

/// Go to a fixed absolute angle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetAnglePayload {
    pub angle: i32,
    pub speed: u8,
    pub power: u8,
    pub end_state: MotorEndState,
    pub profile: MotionProfile,
}

/// Rotate by a relative number of degrees, negative for counter-clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepperPayload {
    pub degree: i32,
    pub speed: u8,
    pub power: u8,
    pub end_state: MotorEndState,
    pub profile: MotionProfile,
}

/// One command for one port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PortCommandPayload {
    SetSpeed(SetSpeedPayload),
    Servo(ServoPayload),
    SetAngle(SetAnglePayload),
    Stepper(StepperPayload),
}

impl PortCommandPayload {
    #[must_use]
    pub fn kind(&self) -> TaskKind {
        match self {
            Self::SetSpeed(_) => TaskKind::SetSpeed,
            Self::Servo(_) => TaskKind::Servo,
            Self::SetAngle(_) => TaskKind::SetAngle,
            Self::Stepper(_) => TaskKind::Stepper,
        }
    }

    #[must_use]
    pub fn profile(&self) -> MotionProfile {
        match self {
            Self::SetSpeed(p) => p.profile,
            Self::Servo(p) => p.profile,
            Self::SetAngle(p) => p.profile,
            Self::Stepper(p) => p.profile,
        }
    }
}

impl fmt::Display for PortCommandPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetSpeed(p) => write!(f, "set_speed(speed={}, power={})", p.speed, p.power),
            Self::Servo(p) => write!(f, "servo(target={})", p.target()),
            Self::SetAngle(p) => write!(f, "set_angle(angle={})", p.angle),
            Self::Stepper(p) => write!(f, "stepper(degree={})", p.degree),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_speed(speed: i8) -> PortCommandPayload {
        PortCommandPayload::SetSpeed(SetSpeedPayload {
            speed,
            power: 100,
            active_input: true,
            profile: MotionProfile {
                use_acceleration_profile: true,
                use_deceleration_profile: false,
            },
        })
    }

    #[test]
    fn should_report_kind_of_each_payload() {
        assert_eq!(set_speed(10).kind(), TaskKind::SetSpeed);
        let stepper = PortCommandPayload::Stepper(StepperPayload {
            degree: 90,
            speed: 50,
            power: 50,
            end_state: MotorEndState::Brake,
            profile: MotionProfile::default(),
        });
        assert_eq!(stepper.kind(), TaskKind::Stepper);
    }

    #[test]
    fn should_expose_profile_flags() {
        let profile = set_speed(10).profile();
        assert!(profile.use_acceleration_profile);
        assert!(!profile.use_deceleration_profile);
    }

    #[test]
    fn should_compute_servo_target_from_centre() {
        let servo = ServoPayload {
            angle: -45,
            aposition: 90,
            speed: 100,
            power: 100,
            profile: MotionProfile::default(),
        };
        assert_eq!(servo.target(), 45);
    }

    #[test]
    fn should_display_payload() {
        assert_eq!(set_speed(-40).to_string(), "set_speed(speed=-40, power=100)");
        assert_eq!(TaskKind::SetAngle.to_string(), "set_angle");
    }

    #[test]
    fn should_serialize_payload_with_type_tag() {
        let json = serde_json::to_value(set_speed(20)).unwrap();
        assert_eq!(json["type"], "set_speed");
        assert_eq!(json["speed"], 20);
    }
}
