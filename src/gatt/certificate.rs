//! The certificate service
//!
//! This is the service the handshake runs over. All three characteristic values are backed by the
//! [`CommandChannel`](crate::channel::CommandChannel), so each has the capacity of the channel.

use super::{AttributeHandle, CharacteristicDefinition, Properties, Security, ServerBuilder, ServiceDefinition};
use crate::channel::CAPACITY;
use uuid::Uuid;

pub const SERVICE_UUID: Uuid = Uuid::from_u128(0xbbe87709_5b89_4433_ab7f_8b8eef0d8e37);

/// Commands sent by the device (notify)
pub const COMMANDS_UUID: Uuid = Uuid::from_u128(0xbbe87709_5b89_4433_ab7f_8b8eef0d8e39);

/// Responses written by the central
pub const CENTRAL_TO_DEVICE_UUID: Uuid = Uuid::from_u128(0xbbe87709_5b89_4433_ab7f_8b8eef0d8e38);

/// Mirror of the last frame sent by the device (read)
pub const DEVICE_TO_CENTRAL_UUID: Uuid = Uuid::from_u128(0xbbe87709_5b89_4433_ab7f_8b8eef0d8e3a);

pub const DEFINITION: ServiceDefinition = ServiceDefinition {
    uuid: SERVICE_UUID,
    characteristics: &[
        CharacteristicDefinition {
            uuid: COMMANDS_UUID,
            properties: &[Properties::Notify],
            max_len: CAPACITY,
            security: Security::EncryptionNoMitm,
        },
        CharacteristicDefinition {
            uuid: CENTRAL_TO_DEVICE_UUID,
            properties: &[Properties::Write],
            max_len: CAPACITY,
            security: Security::None,
        },
        CharacteristicDefinition {
            uuid: DEVICE_TO_CENTRAL_UUID,
            properties: &[Properties::Read],
            max_len: CAPACITY,
            security: Security::None,
        },
    ],
};

/// Value handles of the certificate service characteristics
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CertificateHandles {
    /// The notify-only command characteristic
    pub commands: AttributeHandle,
    /// The write-only characteristic the central answers through
    pub central_to_device: AttributeHandle,
    /// The read-only mirror of the last sent frame
    pub device_to_central: AttributeHandle,
}

impl CertificateHandles {
    /// Add the certificate service to `builder`
    pub fn register(builder: &mut ServerBuilder) -> Self {
        let handles = builder.add_service(&DEFINITION);

        CertificateHandles {
            commands: handles[0],
            central_to_device: handles[1],
            device_to_central: handles[2],
        }
    }
}
