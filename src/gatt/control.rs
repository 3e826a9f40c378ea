//! The control service
//!
//! Holds the LED/vibration pattern written by the central, the button state notified to it, and
//! a few single byte values. None of these take part in the handshake.

use super::{AttributeHandle, CharacteristicDefinition, Properties, Security, ServerBuilder, ServiceDefinition};
use crate::host::Host;
use alloc::vec::Vec;
use uuid::Uuid;

pub const SERVICE_UUID: Uuid = Uuid::from_u128(0x21c50462_67cb_63a3_5c4c_82b5b9939aeb);
pub const LED_VIBRATE_UUID: Uuid = Uuid::from_u128(0x21c50462_67cb_63a3_5c4c_82b5b9939aec);
pub const BUTTON_UUID: Uuid = Uuid::from_u128(0x21c50462_67cb_63a3_5c4c_82b5b9939aed);
pub const UNKNOWN_UUID: Uuid = Uuid::from_u128(0x21c50462_67cb_63a3_5c4c_82b5b9939aee);
pub const UPDATE_REQUEST_UUID: Uuid = Uuid::from_u128(0x21c50462_67cb_63a3_5c4c_82b5b9939aef);
pub const VERSION_UUID: Uuid = Uuid::from_u128(0x21c50462_67cb_63a3_5c4c_82b5b9939af0);

/// Maximum length of a LED/vibration pattern
pub const PATTERN_MAX_LEN: usize = 256;

pub const DEFINITION: ServiceDefinition = ServiceDefinition {
    uuid: SERVICE_UUID,
    characteristics: &[
        CharacteristicDefinition {
            uuid: LED_VIBRATE_UUID,
            properties: &[Properties::Write],
            max_len: PATTERN_MAX_LEN,
            security: Security::None,
        },
        CharacteristicDefinition {
            uuid: BUTTON_UUID,
            properties: &[Properties::Notify],
            max_len: 1,
            security: Security::Unauthenticated,
        },
        CharacteristicDefinition {
            uuid: UNKNOWN_UUID,
            properties: &[Properties::Write],
            max_len: 1,
            security: Security::None,
        },
        CharacteristicDefinition {
            uuid: UPDATE_REQUEST_UUID,
            properties: &[Properties::Write],
            max_len: 1,
            security: Security::None,
        },
        CharacteristicDefinition {
            uuid: VERSION_UUID,
            properties: &[Properties::Read],
            max_len: 1,
            security: Security::None,
        },
    ],
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ControlHandles {
    pub led_vibrate: AttributeHandle,
    pub button: AttributeHandle,
    pub unknown: AttributeHandle,
    pub update_request: AttributeHandle,
    pub version: AttributeHandle,
}

/// Value holders of the control service
#[derive(Debug)]
pub struct ControlService {
    handles: ControlHandles,
    pattern: Vec<u8>,
    button: u8,
    unknown: u8,
    update_request: bool,
    version: u8,
}

impl ControlService {
    /// Add the control service to `builder`
    pub fn register(builder: &mut ServerBuilder) -> Self {
        let handles = builder.add_service(&DEFINITION);

        ControlService {
            handles: ControlHandles {
                led_vibrate: handles[0],
                button: handles[1],
                unknown: handles[2],
                update_request: handles[3],
                version: handles[4],
            },
            pattern: Vec::new(),
            button: 0,
            unknown: 0,
            update_request: false,
            version: 0,
        }
    }

    pub fn handles(&self) -> &ControlHandles {
        &self.handles
    }

    /// Process a write from the central
    ///
    /// Returns false if `handle` is not a writable characteristic of this service.
    pub fn on_write(&mut self, handle: AttributeHandle, data: &[u8]) -> bool {
        let first = data.first().copied().unwrap_or_default();

        if handle == self.handles.led_vibrate {
            let len = data.len().min(PATTERN_MAX_LEN);

            self.pattern.clear();
            self.pattern.extend_from_slice(&data[..len]);

            log::debug!("(control) new LED/vibrate pattern of {} bytes", len);
        } else if handle == self.handles.unknown {
            self.unknown = first;
        } else if handle == self.handles.update_request {
            self.update_request = first != 0;
        } else {
            return false;
        }

        true
    }

    /// Set the button state and notify it to the central
    pub fn set_button<H: Host>(&mut self, host: &mut H, state: u8) {
        self.button = state;

        host.publish(self.handles.button, &[state]);
    }

    /// Set the value of the version characteristic
    pub fn set_version<H: Host>(&mut self, host: &mut H, version: u8) {
        self.version = version;

        host.publish(self.handles.version, &[version]);
    }

    pub fn pattern(&self) -> &[u8] {
        &self.pattern
    }

    pub fn button(&self) -> u8 {
        self.button
    }

    pub fn unknown(&self) -> u8 {
        self.unknown
    }

    pub fn update_requested(&self) -> bool {
        self.update_request
    }

    pub fn version(&self) -> u8 {
        self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_update_value_holders() {
        let mut builder = ServerBuilder::new();

        let mut control = ControlService::register(&mut builder);

        let handles = *control.handles();

        assert!(control.on_write(handles.led_vibrate, &[0x01, 0x02, 0x03]));
        assert!(control.on_write(handles.update_request, &[0x01]));
        assert!(control.on_write(handles.unknown, &[0x7F]));

        assert_eq!(&[0x01, 0x02, 0x03], control.pattern());
        assert!(control.update_requested());
        assert_eq!(0x7F, control.unknown());

        // not writable
        assert!(!control.on_write(handles.version, &[0x02]));
        assert!(!control.on_write(handles.button, &[0x02]));
        assert_eq!(0, control.version());
    }
}
