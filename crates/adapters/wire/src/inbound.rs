//! Inbound pipeline: split frame, decode, select property events.
//!
//! Each stage is a pure function; [`InboundPump`] composes them over a
//! stream of received frames.

use tokio_stream::{Stream, StreamExt};

use hubdrive_app::property_feature::PropertyEventPublisher;
use hubdrive_domain::property::PropertyEvent;

use crate::error::WireError;
use crate::frame::split_frame;
use crate::reply::{InboundMessage, decode};

/// Split and decode one received frame.
///
/// # Errors
///
/// Returns [`WireError::Decode`] when the frame is malformed.
pub fn decode_frame(bytes: &[u8]) -> Result<InboundMessage, WireError> {
    let raw = split_frame(bytes)?;
    decode(&raw)
}

/// Keep property events, drop everything else.
#[must_use]
pub fn select_property(message: InboundMessage) -> Option<PropertyEvent> {
    match message {
        InboundMessage::Property(event) => Some(event),
        InboundMessage::PortFeedback(_) | InboundMessage::GenericError(_) => None,
    }
}

/// Counters of a finished pump run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InboundStats {
    pub frames: u64,
    pub property_events: u64,
    pub decode_failures: u64,
}

/// Drives received frames into the property feature.
pub struct InboundPump {
    publisher: PropertyEventPublisher,
}

impl InboundPump {
    #[must_use]
    pub fn new(publisher: PropertyEventPublisher) -> Self {
        Self { publisher }
    }

    /// Consume `frames` until the stream ends.
    ///
    /// Malformed frames are logged and skipped.
    pub async fn run<S>(self, frames: S) -> InboundStats
    where
        S: Stream<Item = Vec<u8>>,
    {
        let mut stats = InboundStats::default();
        let mut frames = std::pin::pin!(frames);

        while let Some(frame) = frames.next().await {
            stats.frames += 1;
            let message = match decode_frame(&frame) {
                Ok(message) => message,
                Err(err) => {
                    stats.decode_failures += 1;
                    tracing::warn!(error = %err, frame = ?frame, "failed to decode inbound frame");
                    continue;
                }
            };
            log_non_property(&message);
            if let Some(event) = select_property(message) {
                stats.property_events += 1;
                let listeners = self.publisher.publish(event);
                tracing::trace!(?event, listeners, "property event published");
            }
        }

        tracing::debug!(?stats, "inbound stream ended");
        stats
    }
}

fn log_non_property(message: &InboundMessage) {
    match message {
        InboundMessage::Property(_) => {}
        InboundMessage::PortFeedback(feedback) => {
            for port in feedback {
                tracing::debug!(
                    port_id = port.port_id,
                    completed = port.completed,
                    discarded = port.discarded,
                    idle = port.idle,
                    busy = port.busy,
                    "port command feedback"
                );
            }
        }
        InboundMessage::GenericError(reply) => {
            tracing::warn!(
                command_type = reply.command_type,
                code = ?reply.code,
                "hub reported an error"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hubdrive_app::property_feature::PropertyStreamFeature;
    use hubdrive_app::ports::HubMessenger;
    use hubdrive_domain::error::HubDriveError;
    use hubdrive_domain::message::OutboundMessage;
    use hubdrive_domain::property::SubscribableProperty;
    use std::future::Future;

    struct NullMessenger;

    impl HubMessenger for NullMessenger {
        fn send(
            &self,
            _message: OutboundMessage,
        ) -> impl Future<Output = Result<(), HubDriveError>> + Send {
            async { Ok(()) }
        }
    }

    #[test]
    fn should_select_only_property_events() {
        let battery = decode_frame(&[0x06, 0x00, 0x01, 0x06, 0x06, 0x42]).unwrap();
        assert_eq!(
            select_property(battery),
            Some(PropertyEvent::BatteryLevel { level: 0x42 })
        );

        let feedback = decode_frame(&[0x05, 0x00, 0x82, 0x00, 0x0A]).unwrap();
        assert_eq!(select_property(feedback), None);
    }

    #[tokio::test]
    async fn should_publish_property_events_and_skip_bad_frames() {
        let feature = PropertyStreamFeature::new(NullMessenger, 16);
        let mut rssi = feature.subscribe(SubscribableProperty::Rssi).await.unwrap();
        let pump = InboundPump::new(feature.publisher());

        let frames = tokio_stream::iter(vec![
            vec![0x02, 0x00],
            vec![0x05, 0x00, 0x82, 0x00, 0x0A],
            vec![0x06, 0x00, 0x01, 0x05, 0x06, 0xC4],
            vec![0x05, 0x00, 0x01, 0x06, 0x06],
        ]);
        let stats = pump.run(frames).await;

        assert_eq!(
            stats,
            InboundStats {
                frames: 4,
                property_events: 1,
                decode_failures: 2,
            }
        );
        assert_eq!(rssi.next().await, Some(PropertyEvent::Rssi { level: -60 }));
    }
}
