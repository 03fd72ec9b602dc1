//! Messenger port — sends typed messages to one hub.

use std::future::Future;

use hubdrive_domain::error::HubDriveError;
use hubdrive_domain::message::OutboundMessage;

/// Sends [`OutboundMessage`]s to a single, already connected hub.
///
/// Implementations may suspend while the link is busy; callers never
/// assume a reply correlates with a particular send.
pub trait HubMessenger {
    /// Encode and send one message.
    fn send(
        &self,
        message: OutboundMessage,
    ) -> impl Future<Output = Result<(), HubDriveError>> + Send;
}

impl<T: HubMessenger + Send + Sync> HubMessenger for std::sync::Arc<T> {
    fn send(
        &self,
        message: OutboundMessage,
    ) -> impl Future<Output = Result<(), HubDriveError>> + Send {
        (**self).send(message)
    }
}
