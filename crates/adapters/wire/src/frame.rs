//! Frame header: `[length, hub id, message type, payload...]`.
//!
//! Frames shorter than 128 bytes carry a one byte length. Longer frames set
//! bit 7 of the first length byte and continue on a second byte, the length
//! being `(b0 & 0x7F) + b1 * 128`. The length always counts the whole frame,
//! header included.

use crate::error::{CodecError, ProtocolDecodeError};

/// Hub id byte, always zero on a direct link.
pub const HUB_ID: u8 = 0x00;

const SHORT_HEADER_LEN: usize = 3;
const LONG_HEADER_LEN: usize = 4;
const LONG_LENGTH_FLAG: u8 = 0x80;
/// Largest length the two-byte header can express.
pub const MAX_FRAME_LEN: usize = 0x7F + 0xFF * 128;

/// Message types exchanged with the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    Properties,
    GenericError,
    PortOutputCommand,
    PortOutputCommandFeedback,
}

impl MessageType {
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Properties => 0x01,
            Self::GenericError => 0x05,
            Self::PortOutputCommand => 0x81,
            Self::PortOutputCommandFeedback => 0x82,
        }
    }

    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        [
            Self::Properties,
            Self::GenericError,
            Self::PortOutputCommand,
            Self::PortOutputCommandFeedback,
        ]
        .into_iter()
        .find(|message_type| message_type.code() == code)
    }
}

/// A frame stripped of its header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    pub message_type: MessageType,
    pub payload: Vec<u8>,
}

/// Split a received frame into its message type and payload.
///
/// # Errors
///
/// Returns a [`ProtocolDecodeError`] when the frame is truncated, its
/// length header disagrees with the bytes received, or its message type is
/// unknown.
pub fn split_frame(bytes: &[u8]) -> Result<RawMessage, ProtocolDecodeError> {
    let (declared, header_len) = match bytes {
        [] => {
            return Err(ProtocolDecodeError::Truncated {
                expected: SHORT_HEADER_LEN,
                actual: 0,
            });
        }
        [first, second, ..] if first & LONG_LENGTH_FLAG != 0 => (
            usize::from(first & !LONG_LENGTH_FLAG) + usize::from(*second) * 128,
            LONG_HEADER_LEN,
        ),
        [first, ..] if first & LONG_LENGTH_FLAG != 0 => {
            return Err(ProtocolDecodeError::Truncated {
                expected: LONG_HEADER_LEN,
                actual: bytes.len(),
            });
        }
        [first, ..] => (usize::from(*first), SHORT_HEADER_LEN),
    };

    if bytes.len() < header_len {
        return Err(ProtocolDecodeError::Truncated {
            expected: header_len,
            actual: bytes.len(),
        });
    }
    if declared != bytes.len() {
        return Err(ProtocolDecodeError::LengthMismatch {
            declared,
            actual: bytes.len(),
        });
    }

    let type_code = bytes[header_len - 1];
    let message_type = MessageType::from_code(type_code)
        .ok_or(ProtocolDecodeError::UnknownMessageType(type_code))?;

    Ok(RawMessage {
        message_type,
        payload: bytes[header_len..].to_vec(),
    })
}

/// Prefix `payload` with a frame header.
///
/// # Errors
///
/// Returns [`CodecError::FrameTooLong`] when the frame exceeds
/// [`MAX_FRAME_LEN`].
#[allow(clippy::cast_possible_truncation)]
pub fn encode_frame(message_type: MessageType, payload: &[u8]) -> Result<Vec<u8>, CodecError> {
    let short_len = payload.len() + SHORT_HEADER_LEN;
    let mut frame = if short_len < usize::from(LONG_LENGTH_FLAG) {
        let mut frame = Vec::with_capacity(short_len);
        // fits in 7 bits
        frame.push(short_len as u8);
        frame
    } else {
        let length = payload.len() + LONG_HEADER_LEN;
        if length > MAX_FRAME_LEN {
            return Err(CodecError::FrameTooLong {
                length,
                max: MAX_FRAME_LEN,
            });
        }
        let mut frame = Vec::with_capacity(length);
        // both halves bounded by MAX_FRAME_LEN
        frame.push((length % 128) as u8 | LONG_LENGTH_FLAG);
        frame.push((length / 128) as u8);
        frame
    };
    frame.push(HUB_ID);
    frame.push(message_type.code());
    frame.extend_from_slice(payload);
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_split_short_frame() {
        let raw = split_frame(&[0x06, 0x00, 0x01, 0x06, 0x06, 0x64]).unwrap();
        assert_eq!(raw.message_type, MessageType::Properties);
        assert_eq!(raw.payload, vec![0x06, 0x06, 0x64]);
    }

    #[test]
    fn should_encode_short_frame() {
        let frame = encode_frame(MessageType::Properties, &[0x06, 0x05]).unwrap();
        assert_eq!(frame, vec![0x05, 0x00, 0x01, 0x06, 0x05]);
    }

    #[test]
    fn should_agree_on_long_frames() {
        let payload = vec![0xAB; 200];
        let frame = encode_frame(MessageType::PortOutputCommand, &payload).unwrap();

        assert_eq!(frame.len(), 204);
        assert_eq!(frame[0], 0x80 | (204 % 128) as u8);
        assert_eq!(frame[1], 1);

        let raw = split_frame(&frame).unwrap();
        assert_eq!(raw.message_type, MessageType::PortOutputCommand);
        assert_eq!(raw.payload, payload);
    }

    #[test]
    fn should_switch_to_long_header_at_128_bytes() {
        let short = encode_frame(MessageType::Properties, &[0; 124]).unwrap();
        assert_eq!(short.len(), 127);
        assert_eq!(short[0], 127);

        let long = encode_frame(MessageType::Properties, &[0; 125]).unwrap();
        assert_eq!(long.len(), 129);
        assert_eq!(&long[..2], &[0x81, 0x01]);
        assert_eq!(split_frame(&long).unwrap().payload.len(), 125);
    }

    #[test]
    fn should_reject_empty_frame() {
        assert!(matches!(
            split_frame(&[]),
            Err(ProtocolDecodeError::Truncated { actual: 0, .. })
        ));
    }

    #[test]
    fn should_reject_truncated_header() {
        assert!(matches!(
            split_frame(&[0x02, 0x00]),
            Err(ProtocolDecodeError::Truncated { expected: 3, actual: 2 })
        ));
        assert!(matches!(
            split_frame(&[0x81]),
            Err(ProtocolDecodeError::Truncated { expected: 4, actual: 1 })
        ));
    }

    #[test]
    fn should_reject_length_mismatch() {
        assert_eq!(
            split_frame(&[0x07, 0x00, 0x01, 0x06]),
            Err(ProtocolDecodeError::LengthMismatch {
                declared: 7,
                actual: 4
            })
        );
    }

    #[test]
    fn should_reject_unknown_message_type() {
        assert_eq!(
            split_frame(&[0x03, 0x00, 0x45]),
            Err(ProtocolDecodeError::UnknownMessageType(0x45))
        );
    }

    #[test]
    fn should_refuse_oversized_frame() {
        let payload = vec![0; MAX_FRAME_LEN];
        assert!(matches!(
            encode_frame(MessageType::Properties, &payload),
            Err(CodecError::FrameTooLong { .. })
        ));
    }
}
