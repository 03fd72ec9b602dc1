//! Virtual hub configuration.

use serde::Deserialize;

use hubdrive_domain::id::HubId;

/// What the simulated hub reports about itself.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct VirtualHubConfig {
    /// Id under which the hub is registered.
    pub hub_id: HubId,
    /// Battery level in percent.
    pub battery_level: u8,
    /// Signal strength in dBm.
    pub rssi: i8,
    /// Raw system type id, e.g. `0x41` for a two port hub.
    pub system_type_id: u8,
    /// Replies buffered before the hub starts dropping them.
    pub reply_capacity: usize,
}

impl Default for VirtualHubConfig {
    fn default() -> Self {
        Self {
            hub_id: HubId::new("virtual"),
            battery_level: 100,
            rssi: -50,
            system_type_id: 0x41,
            reply_capacity: 64,
        }
    }
}
