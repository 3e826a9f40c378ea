//! Configuration of the accessory
//!
//! Every field has a default, so a configuration file only needs to list the fields it changes.
//! The defaults are those of a genuine accessory.

use alloc::string::String;
use alloc::vec::Vec;
use core::time::Duration;
use serde::{Deserialize, Serialize};

/// Disconnection reason for a connection terminated due to a MIC failure
pub const MIC_FAILURE: u8 = 0x3D;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Advertising related configuration
    pub advertising: AdvertisingConfig,
    /// Cadence of the handshake poll in milliseconds
    pub tick_interval_ms: u64,
    /// Disconnection reasons that cause all bonding state to be purged
    pub purge_bonds_on: Vec<u8>,
}

impl Config {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Check if bonding state should be purged for a disconnection with `reason`
    pub fn purges_bonds_on(&self, reason: u8) -> bool {
        self.purge_bonds_on.contains(&reason)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            advertising: AdvertisingConfig::default(),
            tick_interval_ms: 500,
            purge_bonds_on: alloc::vec![MIC_FAILURE],
        }
    }
}

/// Advertising parameters passed to [`Host::start_advertising`](crate::Host::start_advertising)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvertisingConfig {
    /// The complete local name
    pub device_name: String,
    /// Vendor identifier advertised within the advertising data type `0x20`
    pub vendor_id: [u8; 5],
    /// Advertising interval in milliseconds
    pub advertising_interval_ms: u16,
}

impl AdvertisingConfig {
    /// The AD type the vendor identifier is advertised with
    pub const VENDOR_ID_AD_TYPE: u8 = 0x20;

    pub fn advertising_interval(&self) -> Duration {
        Duration::from_millis(self.advertising_interval_ms.into())
    }
}

impl Default for AdvertisingConfig {
    fn default() -> Self {
        AdvertisingConfig {
            device_name: String::from("Pokemon GO Plus"),
            vendor_id: [0x62, 0x04, 0xC5, 0x21, 0x00],
            advertising_interval_ms: 1000,
        }
    }
}
