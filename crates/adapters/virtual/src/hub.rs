//! Virtual hub — answers frames the way a connected hub would.

use std::collections::{BTreeMap, HashSet};
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use hubdrive_adapter_wire::frame::{MessageType, encode_frame, split_frame};
use hubdrive_adapter_wire::{ByteChannel, WireError};
use hubdrive_domain::id::HubId;
use hubdrive_domain::property::HubProperty;

use crate::config::VirtualHubConfig;
use crate::port::{COMPLETED_AND_IDLE, PortCommand, PortState};

const ENABLE_UPDATES: u8 = 0x02;
const DISABLE_UPDATES: u8 = 0x03;
const REQUEST_UPDATE: u8 = 0x05;
const UPDATE: u8 = 0x06;

const COMMAND_NOT_RECOGNIZED: u8 = 0x05;
const INVALID_USE: u8 = 0x06;

#[derive(Debug)]
struct HubState {
    battery_level: u8,
    rssi: i8,
    subscribed: HashSet<HubProperty>,
    ports: BTreeMap<u8, PortState>,
    commands: Vec<(u8, PortCommand)>,
}

/// A simulated hub on the far end of a [`ByteChannel`].
///
/// Frames written to the hub are applied immediately; replies are pushed to
/// the stream returned by [`VirtualHub::new`]. Replies that do not fit the
/// buffer are dropped, as a radio link would.
#[derive(Debug)]
pub struct VirtualHub {
    config: VirtualHubConfig,
    state: Mutex<HubState>,
    replies: mpsc::Sender<Vec<u8>>,
}

impl VirtualHub {
    /// Create the hub together with the stream of frames it sends back.
    #[must_use]
    pub fn new(config: VirtualHubConfig) -> (Self, ReceiverStream<Vec<u8>>) {
        let (replies, receiver) = mpsc::channel(config.reply_capacity.max(1));
        let state = HubState {
            battery_level: config.battery_level,
            rssi: config.rssi,
            subscribed: HashSet::new(),
            ports: BTreeMap::new(),
            commands: Vec::new(),
        };
        let hub = Self {
            config,
            state: Mutex::new(state),
            replies,
        };
        (hub, ReceiverStream::new(receiver))
    }

    #[must_use]
    pub fn hub_id(&self) -> &HubId {
        &self.config.hub_id
    }

    /// Every port output command received so far, with its port.
    #[must_use]
    pub fn commands(&self) -> Vec<(u8, PortCommand)> {
        self.lock_state().commands.clone()
    }

    #[must_use]
    pub fn port(&self, port_id: u8) -> Option<PortState> {
        self.lock_state().ports.get(&port_id).copied()
    }

    #[must_use]
    pub fn is_subscribed(&self, property: HubProperty) -> bool {
        self.lock_state().subscribed.contains(&property)
    }

    /// Change the battery level, notifying subscribers.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::ChannelClosed`] when the reply stream is gone.
    pub fn set_battery_level(&self, level: u8) -> Result<(), WireError> {
        self.lock_state().battery_level = level;
        self.notify(HubProperty::BatteryVoltage)
    }

    /// Change the signal strength, notifying subscribers.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::ChannelClosed`] when the reply stream is gone.
    pub fn set_rssi(&self, level: i8) -> Result<(), WireError> {
        self.lock_state().rssi = level;
        self.notify(HubProperty::Rssi)
    }

    fn lock_state(&self) -> MutexGuard<'_, HubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, property: HubProperty) -> Result<(), WireError> {
        if self.is_subscribed(property) {
            self.send_property(property)?;
        }
        Ok(())
    }

    fn property_value(&self, property: HubProperty) -> u8 {
        let state = self.lock_state();
        match property {
            HubProperty::BatteryVoltage => state.battery_level,
            HubProperty::Rssi => state.rssi.cast_unsigned(),
            HubProperty::SystemTypeId => self.config.system_type_id,
        }
    }

    fn send_property(&self, property: HubProperty) -> Result<(), WireError> {
        let value = self.property_value(property);
        self.reply(MessageType::Properties, &[property.code(), UPDATE, value])
    }

    fn reply(&self, message_type: MessageType, payload: &[u8]) -> Result<(), WireError> {
        let frame = encode_frame(message_type, payload)?;
        match self.replies.try_send(frame) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(hub = %self.config.hub_id, "reply buffer full, dropping reply");
                Ok(())
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(WireError::ChannelClosed),
        }
    }

    fn reject(&self, command_type: u8, code: u8) -> Result<(), WireError> {
        self.reply(MessageType::GenericError, &[command_type, code])
    }

    fn receive(&self, frame: &[u8]) -> Result<(), WireError> {
        let raw = match split_frame(frame) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::debug!(hub = %self.config.hub_id, %err, "rejecting malformed frame");
                let command_type = frame.get(2).copied().unwrap_or_default();
                return self.reject(command_type, COMMAND_NOT_RECOGNIZED);
            }
        };

        match raw.message_type {
            MessageType::Properties => self.handle_property(&raw.payload),
            MessageType::PortOutputCommand => self.handle_port_output(&raw.payload),
            other => self.reject(other.code(), COMMAND_NOT_RECOGNIZED),
        }
    }

    fn handle_property(&self, payload: &[u8]) -> Result<(), WireError> {
        let properties = MessageType::Properties.code();
        let (Some(property), Some(&operation)) = (
            payload.first().copied().and_then(HubProperty::from_code),
            payload.get(1),
        ) else {
            return self.reject(properties, INVALID_USE);
        };

        match operation {
            ENABLE_UPDATES => {
                self.lock_state().subscribed.insert(property);
                Ok(())
            }
            DISABLE_UPDATES => {
                self.lock_state().subscribed.remove(&property);
                Ok(())
            }
            REQUEST_UPDATE => self.send_property(property),
            _ => self.reject(properties, INVALID_USE),
        }
    }

    fn handle_port_output(&self, payload: &[u8]) -> Result<(), WireError> {
        let Some((port_id, command)) = PortCommand::parse(payload) else {
            return self.reject(MessageType::PortOutputCommand.code(), COMMAND_NOT_RECOGNIZED);
        };

        {
            let mut state = self.lock_state();
            state.ports.entry(port_id).or_default().apply(command);
            state.commands.push((port_id, command));
        }
        tracing::debug!(hub = %self.config.hub_id, port_id, ?command, "port command applied");
        self.reply(
            MessageType::PortOutputCommandFeedback,
            &[port_id, COMPLETED_AND_IDLE],
        )
    }
}

impl ByteChannel for VirtualHub {
    fn write(&self, frame: Vec<u8>) -> impl Future<Output = Result<(), WireError>> + Send {
        let result = self.receive(&frame);
        async { result }
    }
}
