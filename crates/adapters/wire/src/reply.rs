//! Reply decoder — typed events out of raw inbound messages.

use hubdrive_domain::property::{HubProperty, HubType, PropertyEvent};

use crate::codec::{bit_at, u8_as_i8};
use crate::error::{ProtocolDecodeError, WireError};
use crate::frame::{MessageType, RawMessage};

/// Property tag plus operation byte.
const PROPERTY_HEADER_LEN: usize = 2;

/// State of one port as reported by a command feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortFeedback {
    pub port_id: u8,
    pub in_progress: bool,
    pub completed: bool,
    pub discarded: bool,
    pub idle: bool,
    /// The port's command buffer is full.
    pub busy: bool,
}

/// Error codes of a generic error reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenericErrorCode {
    Ack,
    Mack,
    BufferOverflow,
    Timeout,
    CommandNotRecognized,
    InvalidUse,
    Overcurrent,
    InternalError,
    Unknown(u8),
}

impl From<u8> for GenericErrorCode {
    fn from(code: u8) -> Self {
        match code {
            0x01 => Self::Ack,
            0x02 => Self::Mack,
            0x03 => Self::BufferOverflow,
            0x04 => Self::Timeout,
            0x05 => Self::CommandNotRecognized,
            0x06 => Self::InvalidUse,
            0x07 => Self::Overcurrent,
            0x08 => Self::InternalError,
            other => Self::Unknown(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenericErrorReply {
    /// Message type of the command that failed.
    pub command_type: u8,
    pub code: GenericErrorCode,
}

/// A decoded inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    Property(PropertyEvent),
    PortFeedback(Vec<PortFeedback>),
    GenericError(GenericErrorReply),
}

/// Decode `raw` according to its message type.
///
/// # Errors
///
/// Returns [`WireError::Decode`] when the payload does not match the
/// message type.
pub fn decode(raw: &RawMessage) -> Result<InboundMessage, WireError> {
    match raw.message_type {
        MessageType::Properties => Ok(InboundMessage::Property(decode_property(&raw.payload)?)),
        MessageType::PortOutputCommandFeedback => {
            Ok(InboundMessage::PortFeedback(decode_feedback(&raw.payload)?))
        }
        MessageType::GenericError => Ok(InboundMessage::GenericError(decode_generic_error(
            &raw.payload,
        )?)),
        MessageType::PortOutputCommand => Err(ProtocolDecodeError::UnknownMessageType(
            MessageType::PortOutputCommand.code(),
        )
        .into()),
    }
}

/// Decode a property reply: `[property, operation, value...]`.
///
/// # Errors
///
/// Returns [`ProtocolDecodeError::UnknownProperty`] for an unknown tag and
/// [`ProtocolDecodeError::PayloadTooShort`] when the value is missing.
pub fn decode_property(payload: &[u8]) -> Result<PropertyEvent, ProtocolDecodeError> {
    let Some(&tag) = payload.first() else {
        return Err(ProtocolDecodeError::PayloadTooShort {
            message: "property",
            expected: PROPERTY_HEADER_LEN + 1,
            actual: 0,
        });
    };
    let property = HubProperty::from_code(tag).ok_or(ProtocolDecodeError::UnknownProperty(tag))?;
    let value = payload
        .get(PROPERTY_HEADER_LEN)
        .copied()
        .ok_or(ProtocolDecodeError::PayloadTooShort {
            message: property_name(property),
            expected: PROPERTY_HEADER_LEN + 1,
            actual: payload.len(),
        })?;

    Ok(match property {
        HubProperty::BatteryVoltage => PropertyEvent::BatteryLevel { level: value },
        HubProperty::Rssi => PropertyEvent::Rssi {
            level: u8_as_i8(value),
        },
        HubProperty::SystemTypeId => PropertyEvent::SystemType {
            hub_type: HubType::from_system_type_id(value),
        },
    })
}

fn property_name(property: HubProperty) -> &'static str {
    match property {
        HubProperty::BatteryVoltage => "battery",
        HubProperty::Rssi => "rssi",
        HubProperty::SystemTypeId => "system type",
    }
}

/// Decode a command feedback: repeated `[port, flags]` pairs.
///
/// # Errors
///
/// Returns [`ProtocolDecodeError::PayloadTooShort`] for an empty or odd
/// length payload.
pub fn decode_feedback(payload: &[u8]) -> Result<Vec<PortFeedback>, WireError> {
    if payload.is_empty() || payload.len() % 2 != 0 {
        return Err(ProtocolDecodeError::PayloadTooShort {
            message: "feedback",
            expected: (payload.len() / 2 + 1) * 2,
            actual: payload.len(),
        }
        .into());
    }

    payload
        .chunks_exact(2)
        .map(|pair| -> Result<PortFeedback, WireError> {
            let flags = pair[1];
            Ok(PortFeedback {
                port_id: pair[0],
                in_progress: bit_at(flags, 0)?,
                completed: bit_at(flags, 1)?,
                discarded: bit_at(flags, 2)?,
                idle: bit_at(flags, 3)?,
                busy: bit_at(flags, 4)?,
            })
        })
        .collect()
}

/// Decode a generic error reply: `[command type, error code]`.
///
/// # Errors
///
/// Returns [`ProtocolDecodeError::PayloadTooShort`] when either byte is
/// missing.
pub fn decode_generic_error(payload: &[u8]) -> Result<GenericErrorReply, ProtocolDecodeError> {
    match payload {
        [command_type, code, ..] => Ok(GenericErrorReply {
            command_type: *command_type,
            code: GenericErrorCode::from(*code),
        }),
        _ => Err(ProtocolDecodeError::PayloadTooShort {
            message: "generic error",
            expected: 2,
            actual: payload.len(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn property_reply(payload: &[u8]) -> RawMessage {
        RawMessage {
            message_type: MessageType::Properties,
            payload: payload.to_vec(),
        }
    }

    // ── Properties ──────────────────────────────────────────────────

    #[test]
    fn should_decode_battery_level() {
        let message = decode(&property_reply(&[0x06, 0x06, 0x5A])).unwrap();
        assert_eq!(
            message,
            InboundMessage::Property(PropertyEvent::BatteryLevel { level: 90 })
        );
    }

    #[test]
    fn should_decode_rssi_as_signed_byte() {
        assert_eq!(
            decode_property(&[0x05, 0x06, 0xFF]).unwrap(),
            PropertyEvent::Rssi { level: -1 }
        );
        assert_eq!(
            decode_property(&[0x05, 0x06, 0x7F]).unwrap(),
            PropertyEvent::Rssi { level: 127 }
        );
    }

    #[test]
    fn should_decode_known_hub_type() {
        assert_eq!(
            decode_property(&[0x0B, 0x06, 0x41]).unwrap(),
            PropertyEvent::SystemType {
                hub_type: HubType::TwoPortHub
            }
        );
    }

    #[test]
    fn should_decode_unmapped_hub_type_as_unknown() {
        assert_eq!(
            decode_property(&[0x0B, 0x06, 0x99]).unwrap(),
            PropertyEvent::SystemType {
                hub_type: HubType::Unknown
            }
        );
    }

    #[test]
    fn should_reject_property_payload_without_value() {
        assert_eq!(
            decode_property(&[0x06, 0x06]),
            Err(ProtocolDecodeError::PayloadTooShort {
                message: "battery",
                expected: 3,
                actual: 2
            })
        );
        assert!(matches!(
            decode_property(&[]),
            Err(ProtocolDecodeError::PayloadTooShort { actual: 0, .. })
        ));
    }

    #[test]
    fn should_reject_unknown_property_tag() {
        assert_eq!(
            decode_property(&[0x42, 0x06, 0x00]),
            Err(ProtocolDecodeError::UnknownProperty(0x42))
        );
    }

    // ── Feedback ────────────────────────────────────────────────────

    #[test]
    fn should_decode_feedback_for_each_port() {
        let raw = RawMessage {
            message_type: MessageType::PortOutputCommandFeedback,
            payload: vec![0x00, 0b0000_1010, 0x01, 0b0000_0001],
        };

        let InboundMessage::PortFeedback(feedback) = decode(&raw).unwrap() else {
            panic!("expected port feedback");
        };

        assert_eq!(feedback.len(), 2);
        assert!(feedback[0].completed && feedback[0].idle);
        assert!(!feedback[0].in_progress && !feedback[0].discarded);
        assert_eq!(feedback[1].port_id, 1);
        assert!(feedback[1].in_progress && !feedback[1].busy);
    }

    #[test]
    fn should_reject_incomplete_feedback_pair() {
        assert!(matches!(
            decode_feedback(&[0x00]),
            Err(WireError::Decode(ProtocolDecodeError::PayloadTooShort { .. }))
        ));
    }

    // ── Generic error ───────────────────────────────────────────────

    #[test]
    fn should_decode_generic_error() {
        let raw = RawMessage {
            message_type: MessageType::GenericError,
            payload: vec![0x81, 0x05],
        };
        assert_eq!(
            decode(&raw).unwrap(),
            InboundMessage::GenericError(GenericErrorReply {
                command_type: 0x81,
                code: GenericErrorCode::CommandNotRecognized,
            })
        );
    }

    #[test]
    fn should_not_decode_outbound_message_type() {
        let raw = RawMessage {
            message_type: MessageType::PortOutputCommand,
            payload: vec![0x00],
        };
        assert!(decode(&raw).is_err());
    }
}
