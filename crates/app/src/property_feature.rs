//! Property stream feature — subscriptions to hub-reported properties.
//!
//! Decoded [`PropertyEvent`]s enter through a [`PropertyEventPublisher`] and
//! are multicast over a tokio [`broadcast`] channel to every open
//! [`PropertyStream`]. The feature keeps one hub-side subscription per
//! property, shared by all of its listeners: the first `subscribe` enables
//! updates and the last `unsubscribe` disables them again.
//!
//! Dropping a [`PropertyStream`] releases its listener without a message;
//! updates for a property left without listeners are disabled on the next
//! [`PropertyStreamFeature::release_idle`] or `shutdown`.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{Mutex, broadcast};

use hubdrive_domain::error::HubDriveError;
use hubdrive_domain::message::OutboundMessage;
use hubdrive_domain::property::{
    HubProperty, PropertyEvent, PropertyOperation, SubscribableProperty,
};

use crate::ports::HubMessenger;

/// Inbound side of the property channel.
///
/// Publishing succeeds even when there are no listeners (the event is
/// simply dropped).
#[derive(Debug, Clone)]
pub struct PropertyEventPublisher {
    sender: broadcast::Sender<PropertyEvent>,
}

impl PropertyEventPublisher {
    /// Deliver `event` to every open stream, returning how many listeners
    /// received it.
    pub fn publish(&self, event: PropertyEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }
}

/// Events of a single property.
///
/// Counts as a listener of its property until dropped.
#[derive(Debug)]
pub struct PropertyStream {
    property: SubscribableProperty,
    receiver: broadcast::Receiver<PropertyEvent>,
    listeners: Arc<AtomicUsize>,
}

impl Drop for PropertyStream {
    fn drop(&mut self) {
        self.listeners.fetch_sub(1, Ordering::AcqRel);
    }
}

impl PropertyStream {
    #[must_use]
    pub fn property(&self) -> SubscribableProperty {
        self.property
    }

    /// Wait for the next event of this stream's property.
    ///
    /// Returns `None` once every publisher is gone. Events missed because
    /// the stream fell behind are skipped.
    pub async fn next(&mut self) -> Option<PropertyEvent> {
        let wanted = HubProperty::from(self.property);
        loop {
            match self.receiver.recv().await {
                Ok(event) if event.property() == wanted => return Some(event),
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(property = %self.property, skipped, "property stream lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[derive(Debug)]
struct Subscription {
    listeners: Arc<AtomicUsize>,
    teardown: OutboundMessage,
}

impl Subscription {
    fn is_idle(&self) -> bool {
        self.listeners.load(Ordering::Acquire) == 0
    }

    fn open(&self, property: SubscribableProperty, receiver: broadcast::Receiver<PropertyEvent>) -> PropertyStream {
        self.listeners.fetch_add(1, Ordering::AcqRel);
        PropertyStream {
            property,
            receiver,
            listeners: Arc::clone(&self.listeners),
        }
    }
}

/// Hub property subscriptions for one hub.
pub struct PropertyStreamFeature<M> {
    messenger: M,
    sender: broadcast::Sender<PropertyEvent>,
    subscriptions: Mutex<HashMap<SubscribableProperty, Subscription>>,
}

impl<M: HubMessenger> PropertyStreamFeature<M> {
    /// Create the feature with a broadcast buffer of `capacity` events.
    pub fn new(messenger: M, capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            messenger,
            sender,
            subscriptions: Mutex::new(HashMap::new()),
        }
    }

    /// Handle for the inbound pipeline to push decoded events.
    pub fn publisher(&self) -> PropertyEventPublisher {
        PropertyEventPublisher {
            sender: self.sender.clone(),
        }
    }

    /// Open a stream of `property` updates.
    ///
    /// The first listener of a property enables updates on the hub and
    /// asks for the current value. A failing value request is logged and
    /// the stream is still returned.
    ///
    /// # Errors
    ///
    /// Returns the messenger's error when enabling updates fails.
    pub async fn subscribe(&self, property: SubscribableProperty) -> Result<PropertyStream, HubDriveError> {
        let mut subscriptions = self.subscriptions.lock().await;
        let receiver = self.sender.subscribe();

        if let Some(subscription) = subscriptions.get(&property) {
            return Ok(subscription.open(property, receiver));
        }

        self.messenger
            .send(OutboundMessage::property(property, PropertyOperation::EnableUpdates))
            .await?;
        let subscription = Subscription {
            listeners: Arc::new(AtomicUsize::new(0)),
            teardown: OutboundMessage::property(property, PropertyOperation::DisableUpdates),
        };
        let stream = subscription.open(property, receiver);
        subscriptions.insert(property, subscription);
        tracing::info!(%property, "property updates enabled");

        if let Err(err) = self
            .messenger
            .send(OutboundMessage::property(property, PropertyOperation::RequestUpdate))
            .await
        {
            tracing::warn!(%err, %property, "failed to request current property value");
        }
        Ok(stream)
    }

    /// Close `stream`, disabling updates once its property has no listener
    /// left.
    ///
    /// # Errors
    ///
    /// Returns the messenger's error when disabling updates fails.
    pub async fn unsubscribe(&self, stream: PropertyStream) -> Result<(), HubDriveError> {
        let property = stream.property;
        drop(stream);

        let mut subscriptions = self.subscriptions.lock().await;
        let Entry::Occupied(entry) = subscriptions.entry(property) else {
            return Ok(());
        };
        if !entry.get().is_idle() {
            return Ok(());
        }

        let subscription = entry.remove();
        self.messenger.send(subscription.teardown).await?;
        tracing::info!(%property, "property updates disabled");
        Ok(())
    }

    /// Disable updates of every property whose streams were all dropped.
    ///
    /// Returns how many properties were released.
    ///
    /// # Errors
    ///
    /// Every teardown is attempted; the first failure is returned.
    pub async fn release_idle(&self) -> Result<usize, HubDriveError> {
        let idle: Vec<_> = {
            let mut subscriptions = self.subscriptions.lock().await;
            let properties: Vec<_> = subscriptions
                .iter()
                .filter(|(_, subscription)| subscription.is_idle())
                .map(|(property, _)| *property)
                .collect();
            properties
                .into_iter()
                .filter_map(|property| subscriptions.remove_entry(&property))
                .collect()
        };
        let released = idle.len();
        self.teardown(idle).await?;
        Ok(released)
    }

    /// Ask the hub for `property` once and wait for the reply.
    ///
    /// Replies are matched by property kind only, so an update already on
    /// its way from an open subscription may resolve the call.
    ///
    /// # Errors
    ///
    /// Returns the messenger's error when the request cannot be sent, or
    /// [`HubDriveError::ChannelClosed`] when the channel closes first.
    pub async fn read_once(&self, property: HubProperty) -> Result<PropertyEvent, HubDriveError> {
        let mut receiver = self.sender.subscribe();
        self.messenger
            .send(OutboundMessage::property(property, PropertyOperation::RequestUpdate))
            .await?;

        loop {
            match receiver.recv().await {
                Ok(event) if event.property() == property => return Ok(event),
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => return Err(HubDriveError::ChannelClosed),
            }
        }
    }

    pub async fn is_subscribed(&self, property: SubscribableProperty) -> bool {
        self.subscriptions.lock().await.contains_key(&property)
    }

    /// Tear every subscription down.
    ///
    /// Every teardown is attempted.
    ///
    /// # Errors
    ///
    /// Returns the first failure.
    pub async fn shutdown(&self) -> Result<(), HubDriveError> {
        let subscriptions: Vec<_> = self.subscriptions.lock().await.drain().collect();
        self.teardown(subscriptions).await
    }

    async fn teardown(
        &self,
        subscriptions: Vec<(SubscribableProperty, Subscription)>,
    ) -> Result<(), HubDriveError> {
        let mut result = Ok(());
        for (property, subscription) in subscriptions {
            match self.messenger.send(subscription.teardown).await {
                Ok(()) => tracing::info!(%property, "property updates disabled"),
                Err(err) => {
                    tracing::warn!(%err, %property, "failed to disable property updates");
                    if result.is_ok() {
                        result = Err(err);
                    }
                }
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hubdrive_domain::property::HubType;
    use std::future::Future;
    use std::sync::Arc;

    // ── In-memory messenger ─────────────────────────────────────────

    /// Records sent messages and answers value requests through the
    /// attached publisher.
    #[derive(Default)]
    struct EchoMessenger {
        sent: std::sync::Mutex<Vec<OutboundMessage>>,
        replies: std::sync::Mutex<Vec<PropertyEvent>>,
        publisher: std::sync::Mutex<Option<PropertyEventPublisher>>,
    }

    impl EchoMessenger {
        fn attach(&self, publisher: PropertyEventPublisher) {
            *self.publisher.lock().unwrap() = Some(publisher);
        }

        fn reply_with(&self, events: Vec<PropertyEvent>) {
            *self.replies.lock().unwrap() = events;
        }

        fn sent(&self) -> Vec<OutboundMessage> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl HubMessenger for EchoMessenger {
        fn send(
            &self,
            message: OutboundMessage,
        ) -> impl Future<Output = Result<(), HubDriveError>> + Send {
            self.sent.lock().unwrap().push(message);
            if let OutboundMessage::Property {
                operation: PropertyOperation::RequestUpdate,
                ..
            } = message
            {
                if let Some(publisher) = self.publisher.lock().unwrap().as_ref() {
                    for event in self.replies.lock().unwrap().drain(..) {
                        publisher.publish(event);
                    }
                }
            }
            async { Ok(()) }
        }
    }

    fn feature() -> (Arc<EchoMessenger>, PropertyStreamFeature<Arc<EchoMessenger>>) {
        let messenger = Arc::new(EchoMessenger::default());
        let feature = PropertyStreamFeature::new(Arc::clone(&messenger), 16);
        messenger.attach(feature.publisher());
        (messenger, feature)
    }

    fn message(property: SubscribableProperty, operation: PropertyOperation) -> OutboundMessage {
        OutboundMessage::property(property, operation)
    }

    // ── Subscribe ───────────────────────────────────────────────────

    #[tokio::test]
    async fn should_enable_then_request_on_first_subscribe() {
        let (messenger, feature) = feature();

        feature.subscribe(SubscribableProperty::BatteryVoltage).await.unwrap();

        assert_eq!(
            messenger.sent(),
            vec![
                message(SubscribableProperty::BatteryVoltage, PropertyOperation::EnableUpdates),
                message(SubscribableProperty::BatteryVoltage, PropertyOperation::RequestUpdate),
            ]
        );
        assert!(feature.is_subscribed(SubscribableProperty::BatteryVoltage).await);
        assert!(!feature.is_subscribed(SubscribableProperty::Rssi).await);
    }

    #[tokio::test]
    async fn should_share_subscription_between_listeners() {
        let (messenger, feature) = feature();

        let mut first = feature.subscribe(SubscribableProperty::Rssi).await.unwrap();
        let mut second = feature.subscribe(SubscribableProperty::Rssi).await.unwrap();
        assert_eq!(messenger.sent().len(), 2);

        feature.publisher().publish(PropertyEvent::Rssi { level: -40 });

        assert_eq!(first.next().await, Some(PropertyEvent::Rssi { level: -40 }));
        assert_eq!(second.next().await, Some(PropertyEvent::Rssi { level: -40 }));
    }

    #[tokio::test]
    async fn should_only_deliver_events_of_stream_property() {
        let (_messenger, feature) = feature();
        let mut battery = feature.subscribe(SubscribableProperty::BatteryVoltage).await.unwrap();

        let publisher = feature.publisher();
        publisher.publish(PropertyEvent::Rssi { level: -60 });
        publisher.publish(PropertyEvent::BatteryLevel { level: 87 });

        assert_eq!(battery.next().await, Some(PropertyEvent::BatteryLevel { level: 87 }));
    }

    #[tokio::test]
    async fn should_deliver_initial_value_to_first_subscriber() {
        let (messenger, feature) = feature();
        messenger.reply_with(vec![PropertyEvent::BatteryLevel { level: 100 }]);

        let mut battery = feature.subscribe(SubscribableProperty::BatteryVoltage).await.unwrap();

        assert_eq!(battery.next().await, Some(PropertyEvent::BatteryLevel { level: 100 }));
    }

    // ── Unsubscribe ─────────────────────────────────────────────────

    #[tokio::test]
    async fn should_disable_updates_when_last_listener_leaves() {
        let (messenger, feature) = feature();
        let first = feature.subscribe(SubscribableProperty::Rssi).await.unwrap();
        let second = feature.subscribe(SubscribableProperty::Rssi).await.unwrap();

        feature.unsubscribe(first).await.unwrap();
        assert_eq!(messenger.sent().len(), 2);
        assert!(feature.is_subscribed(SubscribableProperty::Rssi).await);

        feature.unsubscribe(second).await.unwrap();
        assert_eq!(
            messenger.sent().last(),
            Some(&message(SubscribableProperty::Rssi, PropertyOperation::DisableUpdates))
        );
        assert!(!feature.is_subscribed(SubscribableProperty::Rssi).await);
    }

    #[tokio::test]
    async fn should_not_touch_other_properties_on_unsubscribe() {
        let (messenger, feature) = feature();
        let rssi = feature.subscribe(SubscribableProperty::Rssi).await.unwrap();
        feature.subscribe(SubscribableProperty::BatteryVoltage).await.unwrap();

        feature.unsubscribe(rssi).await.unwrap();

        assert!(feature.is_subscribed(SubscribableProperty::BatteryVoltage).await);
        let disabled: Vec<_> = messenger
            .sent()
            .into_iter()
            .filter(|message| {
                matches!(
                    message,
                    OutboundMessage::Property {
                        operation: PropertyOperation::DisableUpdates,
                        ..
                    }
                )
            })
            .collect();
        assert_eq!(
            disabled,
            vec![message(SubscribableProperty::Rssi, PropertyOperation::DisableUpdates)]
        );
    }

    #[tokio::test]
    async fn should_resubscribe_after_teardown() {
        let (messenger, feature) = feature();
        let stream = feature.subscribe(SubscribableProperty::Rssi).await.unwrap();
        feature.unsubscribe(stream).await.unwrap();

        feature.subscribe(SubscribableProperty::Rssi).await.unwrap();

        assert_eq!(messenger.sent().len(), 5);
        assert_eq!(
            messenger.sent()[3],
            message(SubscribableProperty::Rssi, PropertyOperation::EnableUpdates)
        );
    }

    #[tokio::test]
    async fn should_release_properties_whose_streams_were_dropped() {
        let (messenger, feature) = feature();
        let rssi = feature.subscribe(SubscribableProperty::Rssi).await.unwrap();
        let battery = feature.subscribe(SubscribableProperty::BatteryVoltage).await.unwrap();

        drop(battery);
        assert!(feature.is_subscribed(SubscribableProperty::BatteryVoltage).await);

        assert_eq!(feature.release_idle().await.unwrap(), 1);
        assert_eq!(
            messenger.sent().last(),
            Some(&message(SubscribableProperty::BatteryVoltage, PropertyOperation::DisableUpdates))
        );
        assert!(!feature.is_subscribed(SubscribableProperty::BatteryVoltage).await);
        assert!(feature.is_subscribed(SubscribableProperty::Rssi).await);

        feature.unsubscribe(rssi).await.unwrap();
        assert_eq!(feature.release_idle().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn should_reuse_hub_subscription_after_streams_were_dropped() {
        let (messenger, feature) = feature();
        drop(feature.subscribe(SubscribableProperty::Rssi).await.unwrap());

        let stream = feature.subscribe(SubscribableProperty::Rssi).await.unwrap();
        assert_eq!(messenger.sent().len(), 2);

        feature.unsubscribe(stream).await.unwrap();
        assert_eq!(
            messenger.sent().last(),
            Some(&message(SubscribableProperty::Rssi, PropertyOperation::DisableUpdates))
        );
    }

    // ── Read once ───────────────────────────────────────────────────

    #[tokio::test]
    async fn should_resolve_read_once_with_matching_kind() {
        let (messenger, feature) = feature();
        messenger.reply_with(vec![
            PropertyEvent::Rssi { level: -50 },
            PropertyEvent::SystemType {
                hub_type: HubType::TwoPortHub,
            },
        ]);

        let event = feature.read_once(HubProperty::SystemTypeId).await.unwrap();

        assert_eq!(
            event,
            PropertyEvent::SystemType {
                hub_type: HubType::TwoPortHub
            }
        );
        assert_eq!(
            messenger.sent(),
            vec![OutboundMessage::property(
                HubProperty::SystemTypeId,
                PropertyOperation::RequestUpdate
            )]
        );
    }

    // ── Shutdown ────────────────────────────────────────────────────

    #[tokio::test]
    async fn should_tear_down_every_subscription_on_shutdown() {
        let (messenger, feature) = feature();
        feature.subscribe(SubscribableProperty::Rssi).await.unwrap();
        feature.subscribe(SubscribableProperty::BatteryVoltage).await.unwrap();

        feature.shutdown().await.unwrap();

        let sent = messenger.sent();
        assert!(sent.contains(&message(SubscribableProperty::Rssi, PropertyOperation::DisableUpdates)));
        assert!(sent.contains(&message(
            SubscribableProperty::BatteryVoltage,
            PropertyOperation::DisableUpdates
        )));
        assert!(!feature.is_subscribed(SubscribableProperty::Rssi).await);
    }

    #[tokio::test]
    async fn should_end_stream_when_channel_closes() {
        let (messenger, feature) = feature();
        let mut stream = feature.subscribe(SubscribableProperty::Rssi).await.unwrap();

        // the messenger holds a publisher clone
        *messenger.publisher.lock().unwrap() = None;
        drop(feature);

        assert_eq!(stream.next().await, None);
    }
}
