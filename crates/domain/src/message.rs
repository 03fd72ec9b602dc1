//! Outbound messages — typed requests the core sends to a hub.
//!
//! Encoding to bytes is the wire adapter's concern.

use crate::command::PortCommandPayload;
use crate::property::{HubProperty, PropertyOperation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutboundMessage {
    /// Enable, disable or request a property value.
    Property {
        property: HubProperty,
        operation: PropertyOperation,
    },
    /// Drive one output port.
    PortOutput {
        port_id: u8,
        payload: PortCommandPayload,
    },
}

impl OutboundMessage {
    #[must_use]
    pub fn property(property: impl Into<HubProperty>, operation: PropertyOperation) -> Self {
        Self::Property {
            property: property.into(),
            operation,
        }
    }
}
