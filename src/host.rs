//! Boundary to the platform BLE host
//!
//! The BLE host is everything below the handshake: the controller, bonding, the GATT server, and
//! advertising. It delivers [`Event`](crate::handshake::Event)s to the
//! [`Peripheral`](crate::Peripheral) and performs the few operations listed here on its behalf.

use crate::config::AdvertisingConfig;
use crate::gatt::{AttributeHandle, ServerLayout};
use crate::BluetoothDeviceAddress;

/// Operations the handshake core requires from the platform BLE host
///
/// Every operation is synchronous and must not block. They are all called from the same context
/// events are processed in.
pub trait Host {
    /// Register the GATT server layout
    ///
    /// This is called once when the [`Peripheral`](crate::Peripheral) is created. The handles
    /// within `layout` are the handles the host must use for the events it delivers.
    fn register_services(&mut self, layout: &ServerLayout);

    /// Set the value of an attribute
    ///
    /// For a characteristic with the notify property this also sends a notification to a
    /// subscribed central.
    fn publish(&mut self, attribute: AttributeHandle, value: &[u8]);

    /// Get the address of this device
    fn local_address(&self) -> BluetoothDeviceAddress;

    /// Purge all bonding information
    fn purge_bonding_state(&mut self);

    /// Start (or restart) advertising
    fn start_advertising(&mut self, config: &AdvertisingConfig);
}

impl<T: Host + ?Sized> Host for &mut T {
    fn register_services(&mut self, layout: &ServerLayout) {
        (**self).register_services(layout)
    }

    fn publish(&mut self, attribute: AttributeHandle, value: &[u8]) {
        (**self).publish(attribute, value)
    }

    fn local_address(&self) -> BluetoothDeviceAddress {
        (**self).local_address()
    }

    fn purge_bonding_state(&mut self) {
        (**self).purge_bonding_state()
    }

    fn start_advertising(&mut self, config: &AdvertisingConfig) {
        (**self).start_advertising(config)
    }
}
