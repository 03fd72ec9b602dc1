//! Wire adapter error types.

use hubdrive_domain::error::HubDriveError;

/// Errors specific to the wire adapter.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// A codec primitive was called outside of its domain.
    #[error("codec error")]
    Codec(#[from] CodecError),

    /// An inbound frame could not be decoded.
    #[error("failed to decode hub message")]
    Decode(#[from] ProtocolDecodeError),

    /// The byte channel was closed by the other side.
    #[error("byte channel closed")]
    ChannelClosed,

    /// A domain-level error.
    #[error("domain error")]
    Domain(#[source] HubDriveError),
}

/// Misuse of a codec primitive.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// Bit positions are numbered 0 to 7.
    #[error("bit position {position} is out of range 0..=7")]
    BitOutOfRange {
        /// Requested position.
        position: u8,
    },

    /// The frame does not fit the two-byte length header.
    #[error("frame of {length} bytes exceeds the maximum of {max}")]
    FrameTooLong {
        /// Length the frame would have.
        length: usize,
        /// Largest encodable length.
        max: usize,
    },
}

/// Details about why an inbound frame could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolDecodeError {
    /// The frame is shorter than its header.
    #[error("frame of {actual} bytes is shorter than its {expected} byte header")]
    Truncated {
        /// Header length.
        expected: usize,
        /// Bytes received.
        actual: usize,
    },

    /// The length header disagrees with the bytes received.
    #[error("frame declares {declared} bytes, got {actual}")]
    LengthMismatch {
        /// Length read from the header.
        declared: usize,
        /// Bytes received.
        actual: usize,
    },

    /// The message type byte is not one we decode.
    #[error("unsupported message type 0x{0:02X}")]
    UnknownMessageType(u8),

    /// The payload is too short for the message it carries.
    #[error("{message} payload must be at least {expected} bytes, got {actual}")]
    PayloadTooShort {
        /// Message being decoded (e.g. "battery", "rssi").
        message: &'static str,
        /// Minimum byte count.
        expected: usize,
        /// Actual byte count.
        actual: usize,
    },

    /// The property tag is not one we know.
    #[error("unknown property 0x{0:02X}")]
    UnknownProperty(u8),
}

impl WireError {
    /// Convert into a [`HubDriveError`] for propagation across port
    /// boundaries.
    #[must_use]
    pub fn into_domain(self) -> HubDriveError {
        match self {
            Self::Domain(err) => err,
            Self::ChannelClosed => HubDriveError::ChannelClosed,
            other => HubDriveError::Transport(Box::new(other)),
        }
    }
}

impl From<WireError> for HubDriveError {
    fn from(err: WireError) -> Self {
        err.into_domain()
    }
}
