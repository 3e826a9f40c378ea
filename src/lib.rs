//! Peripheral side of the Sfida pairing handshake
//!
//! A Sfida accessory is only treated as paired by the central once it passes a vendor specific
//! handshake layered on top of three GATT characteristics of the *certificate* service:
//!
//! * the *commands* characteristic (notify) carries the 4 byte command of every frame sent by
//!   this device,
//! * the *central to device* characteristic (write) receives the response of the central,
//! * the *device to central* characteristic (read) mirrors the full frame last sent.
//!
//! The handshake is interlocked with the link layer. The central must connect, finish bonding,
//! and enable notifications of the commands characteristic before this device emits its
//! challenge. The challenge is answered with a 20 byte response that is validated before the
//! accessory is considered paired.
//!
//! The crate is split the way the handshake is layered.
//!
//! * [`handshake`] is the state machine that sequences connection, bonding, subscription, and
//!   response events.
//! * [`channel`] is the byte relay backing the certificate characteristics.
//! * [`payload`] builds the challenge frame with the device address injected into it.
//! * [`gatt`] is the declarative attribute table of the accessory.
//! * [`host`] is the boundary to the platform BLE host.
//! * [`peripheral`] owns all of the above and drives it from a single event queue.
//!
//! Bring up of the BLE stack, advertising payload construction, and the bonding procedure itself
//! belong to the platform and are only seen here through the [`Host`] trait and the
//! [`Event`](handshake::Event)s it delivers.

#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![cfg_attr(not(any(test, feature = "std")), no_std)]

extern crate alloc;

pub mod channel;
pub mod config;
pub mod error;
pub mod gatt;
pub mod handshake;
pub mod host;
pub mod payload;
pub mod peripheral;

pub use config::Config;
pub use error::Error;
pub use handshake::{Event, Handshake, HandshakeState};
pub use host::Host;
pub use peripheral::Peripheral;

/// A Bluetooth device address
///
/// The six bytes are kept in the order the controller reports them, which is least significant
/// byte first. The [`Display`](core::fmt::Display) implementation prints the address in the
/// conventional most significant byte first format (`FF:EE:DD:CC:BB:AA`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct BluetoothDeviceAddress(pub [u8; 6]);

impl BluetoothDeviceAddress {
    /// Create a `BluetoothDeviceAddress` from the bytes reported by the controller
    pub const fn new(address: [u8; 6]) -> Self {
        BluetoothDeviceAddress(address)
    }

    /// Get the address bytes in reversed order
    pub fn reversed(&self) -> [u8; 6] {
        let mut reversed = self.0;

        reversed.reverse();

        reversed
    }
}

impl From<[u8; 6]> for BluetoothDeviceAddress {
    fn from(address: [u8; 6]) -> Self {
        BluetoothDeviceAddress(address)
    }
}

impl core::fmt::Display for BluetoothDeviceAddress {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            self.0[5], self.0[4], self.0[3], self.0[2], self.0[1], self.0[0]
        )
    }
}
