//! Outbound encoder — typed messages into frames.

use hubdrive_domain::command::{MotionProfile, MotorEndState, PortCommandPayload};
use hubdrive_domain::message::OutboundMessage;
use hubdrive_domain::property::PropertyOperation;

use crate::codec::{i32_to_le_bytes, u32_to_le_bytes};
use crate::error::WireError;
use crate::frame::{MessageType, encode_frame};

/// Execute immediately and report completion.
const STARTUP_AND_COMPLETION: u8 = 0x11;

const START_SPEED: u8 = 0x07;
const START_SPEED_FOR_DEGREES: u8 = 0x0B;
const GOTO_ABSOLUTE_POSITION: u8 = 0x0D;

/// Encode `message` into a complete frame.
///
/// # Errors
///
/// Returns [`WireError::Codec`] when the frame cannot be built.
pub fn encode(message: &OutboundMessage) -> Result<Vec<u8>, WireError> {
    let frame = match message {
        OutboundMessage::Property {
            property,
            operation,
        } => encode_frame(
            MessageType::Properties,
            &[property.code(), operation_code(*operation)],
        )?,
        OutboundMessage::PortOutput { port_id, payload } => {
            encode_frame(MessageType::PortOutputCommand, &port_output(*port_id, payload))?
        }
    };
    Ok(frame)
}

fn operation_code(operation: PropertyOperation) -> u8 {
    match operation {
        PropertyOperation::EnableUpdates => 0x02,
        PropertyOperation::DisableUpdates => 0x03,
        PropertyOperation::RequestUpdate => 0x05,
    }
}

fn end_state_code(end_state: MotorEndState) -> u8 {
    match end_state {
        MotorEndState::Float => 0,
        MotorEndState::Hold => 126,
        MotorEndState::Brake => 127,
    }
}

fn profile_code(profile: MotionProfile) -> u8 {
    u8::from(profile.use_acceleration_profile) | (u8::from(profile.use_deceleration_profile) << 1)
}

fn signed_speed(speed: u8) -> i8 {
    i8::try_from(speed).unwrap_or(i8::MAX)
}

fn port_output(port_id: u8, payload: &PortCommandPayload) -> Vec<u8> {
    let mut bytes = vec![port_id, STARTUP_AND_COMPLETION];
    match payload {
        PortCommandPayload::SetSpeed(payload) => {
            bytes.extend_from_slice(&[
                START_SPEED,
                payload.speed.cast_unsigned(),
                payload.power,
                profile_code(payload.profile),
            ]);
        }
        PortCommandPayload::Servo(payload) => {
            bytes.push(GOTO_ABSOLUTE_POSITION);
            bytes.extend_from_slice(&i32_to_le_bytes(payload.target()));
            bytes.extend_from_slice(&[
                payload.speed,
                payload.power,
                end_state_code(MotorEndState::Hold),
                profile_code(payload.profile),
            ]);
        }
        PortCommandPayload::SetAngle(payload) => {
            bytes.push(GOTO_ABSOLUTE_POSITION);
            bytes.extend_from_slice(&i32_to_le_bytes(payload.angle));
            bytes.extend_from_slice(&[
                payload.speed,
                payload.power,
                end_state_code(payload.end_state),
                profile_code(payload.profile),
            ]);
        }
        PortCommandPayload::Stepper(payload) => {
            // the hub only takes positive degrees, direction rides on speed
            let speed = if payload.degree < 0 {
                -signed_speed(payload.speed)
            } else {
                signed_speed(payload.speed)
            };
            bytes.push(START_SPEED_FOR_DEGREES);
            bytes.extend_from_slice(&u32_to_le_bytes(payload.degree.unsigned_abs()));
            bytes.extend_from_slice(&[
                speed.cast_unsigned(),
                payload.power,
                end_state_code(payload.end_state),
                profile_code(payload.profile),
            ]);
        }
    }
    bytes
}
