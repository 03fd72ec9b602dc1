//! Byte channel port and the messenger built on top of it.

use std::future::Future;
use std::sync::Arc;

use hubdrive_app::ports::HubMessenger;
use hubdrive_domain::error::HubDriveError;
use hubdrive_domain::message::OutboundMessage;

use crate::error::WireError;
use crate::outbound::encode;

/// An open, bidirectional link to one hub, outbound half.
///
/// Connecting, discovering and reconnecting are the channel's business.
pub trait ByteChannel {
    /// Write one complete frame.
    fn write(&self, frame: Vec<u8>) -> impl Future<Output = Result<(), WireError>> + Send;
}

impl<T: ByteChannel + Send + Sync> ByteChannel for Arc<T> {
    fn write(&self, frame: Vec<u8>) -> impl Future<Output = Result<(), WireError>> + Send {
        (**self).write(frame)
    }
}

/// [`HubMessenger`] encoding messages onto a [`ByteChannel`].
#[derive(Debug, Clone)]
pub struct WireMessenger<C> {
    channel: C,
}

impl<C> WireMessenger<C> {
    pub fn new(channel: C) -> Self {
        Self { channel }
    }
}

impl<C: ByteChannel + Send + Sync> HubMessenger for WireMessenger<C> {
    fn send(&self, message: OutboundMessage) -> impl Future<Output = Result<(), HubDriveError>> + Send {
        async move {
            let frame = encode(&message)?;
            tracing::trace!(?message, len = frame.len(), "writing frame");
            self.channel.write(frame).await.map_err(WireError::into_domain)
        }
    }
}
