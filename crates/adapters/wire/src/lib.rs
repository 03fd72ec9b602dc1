//! # hubdrive-adapter-wire
//!
//! Wire adapter — speaks the hub's binary protocol over an already open
//! byte channel.
//!
//! ## How it works
//!
//! Outbound, [`WireMessenger`] implements the `HubMessenger` port: typed
//! messages are encoded into frames and written to a [`ByteChannel`].
//! Inbound, [`InboundPump`] consumes a stream of received frames, splits
//! and decodes them, and republishes property events to the application's
//! property feature.
//!
//! ## Frames
//!
//! | Message type | Code | Direction |
//! |--------------|------|-----------|
//! | Properties | `0x01` | both |
//! | Generic error | `0x05` | inbound |
//! | Port output command | `0x81` | outbound |
//! | Port output command feedback | `0x82` | inbound |
//!
//! ## Dependency rule
//!
//! Same as other adapters: depends on `hubdrive-app` and `hubdrive-domain`.

pub mod codec;
mod error;
pub mod frame;
mod inbound;
mod messenger;
pub mod outbound;
pub mod reply;

pub use error::{CodecError, ProtocolDecodeError, WireError};
pub use inbound::{InboundPump, InboundStats, decode_frame, select_property};
pub use messenger::{ByteChannel, WireMessenger};
