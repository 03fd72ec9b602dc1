//! Hub properties — scalars reported by the hub itself.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Property kinds tracked by the core, with their wire tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HubProperty {
    Rssi,
    BatteryVoltage,
    SystemTypeId,
}

impl HubProperty {
    /// Every property kind, in tag order.
    pub const ALL: [Self; 3] = [Self::Rssi, Self::BatteryVoltage, Self::SystemTypeId];

    /// Wire tag of the property.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Rssi => 0x05,
            Self::BatteryVoltage => 0x06,
            Self::SystemTypeId => 0x0B,
        }
    }

    /// Look a property up by its wire tag.
    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|property| property.code() == code)
    }
}

impl fmt::Display for HubProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rssi => f.write_str("rssi"),
            Self::BatteryVoltage => f.write_str("battery_voltage"),
            Self::SystemTypeId => f.write_str("system_type_id"),
        }
    }
}

/// Properties the hub can push updates for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscribableProperty {
    Rssi,
    BatteryVoltage,
}

impl From<SubscribableProperty> for HubProperty {
    fn from(property: SubscribableProperty) -> Self {
        match property {
            SubscribableProperty::Rssi => Self::Rssi,
            SubscribableProperty::BatteryVoltage => Self::BatteryVoltage,
        }
    }
}

impl fmt::Display for SubscribableProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        HubProperty::from(*self).fmt(f)
    }
}

/// Hardware family reported by the system type id property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HubType {
    WeDoHub,
    DuploTrain,
    BoostHub,
    TwoPortHub,
    TwoPortHandset,
    FourPortHub,
    Unknown,
}

/// Fixed system type id table.
const HUB_TYPE_TABLE: [(u8, HubType); 6] = [
    (0x00, HubType::WeDoHub),
    (0x20, HubType::DuploTrain),
    (0x40, HubType::BoostHub),
    (0x41, HubType::TwoPortHub),
    (0x42, HubType::TwoPortHandset),
    (0x80, HubType::FourPortHub),
];

impl HubType {
    /// Look up a system type id. Ids absent from the table map to
    /// [`HubType::Unknown`] so unknown hardware never aborts decoding.
    #[must_use]
    pub fn from_system_type_id(id: u8) -> Self {
        HUB_TYPE_TABLE
            .iter()
            .find(|(code, _)| *code == id)
            .map_or(Self::Unknown, |(_, hub_type)| *hub_type)
    }

    /// Inverse of [`from_system_type_id`](Self::from_system_type_id);
    /// `None` for [`HubType::Unknown`].
    #[must_use]
    pub fn system_type_id(self) -> Option<u8> {
        HUB_TYPE_TABLE
            .iter()
            .find(|(_, hub_type)| *hub_type == self)
            .map(|(code, _)| *code)
    }
}

/// What a property message asks the hub to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyOperation {
    EnableUpdates,
    DisableUpdates,
    RequestUpdate,
}

/// A decoded property value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "property", rename_all = "snake_case")]
pub enum PropertyEvent {
    BatteryLevel { level: u8 },
    Rssi { level: i8 },
    SystemType { hub_type: HubType },
}

impl PropertyEvent {
    /// The property kind this event carries.
    #[must_use]
    pub fn property(&self) -> HubProperty {
        match self {
            Self::BatteryLevel { .. } => HubProperty::BatteryVoltage,
            Self::Rssi { .. } => HubProperty::Rssi,
            Self::SystemType { .. } => HubProperty::SystemTypeId,
        }
    }
}
