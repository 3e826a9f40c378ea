//! The battery service

use super::{AttributeHandle, CharacteristicDefinition, Properties, Security, ServerBuilder, ServiceDefinition};
use crate::host::Host;
use uuid::Uuid;

pub const SERVICE_UUID: Uuid = Uuid::from_u128(0x0000180f_0000_1000_8000_00805f9b34fb);
pub const LEVEL_UUID: Uuid = Uuid::from_u128(0x00002a19_0000_1000_8000_00805f9b34fb);

pub const DEFINITION: ServiceDefinition = ServiceDefinition {
    uuid: SERVICE_UUID,
    characteristics: &[CharacteristicDefinition {
        uuid: LEVEL_UUID,
        properties: &[Properties::Read],
        max_len: 1,
        security: Security::None,
    }],
};

/// Battery level value holder
#[derive(Debug)]
pub struct BatteryService {
    level_handle: AttributeHandle,
    level: u8,
}

impl BatteryService {
    /// Add the battery service to `builder`
    pub fn register(builder: &mut ServerBuilder) -> Self {
        let handles = builder.add_service(&DEFINITION);

        BatteryService {
            level_handle: handles[0],
            level: 0,
        }
    }

    pub fn level_handle(&self) -> AttributeHandle {
        self.level_handle
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    /// Set the battery level as a percentage
    ///
    /// Levels above 100 are clamped to 100.
    pub fn set_level<H: Host>(&mut self, host: &mut H, level: u8) {
        self.level = level.min(100);

        host.publish(self.level_handle, &[self.level]);
    }
}
