//! Declarative attribute table of the accessory
//!
//! The accessory does not run its own attribute protocol server, that is the job of the platform
//! BLE host. What is described here is the *layout* of the server. Services are defined as
//! constant [`ServiceDefinition`]s and added to a [`ServerBuilder`], which allocates the attribute
//! handles in the same order a GATT server does. The finished [`ServerLayout`] is handed to the
//! host to register (see [`Host::register_services`](crate::Host::register_services)) and the
//! handles it assigned are the identities events are delivered with.

use alloc::vec::Vec;
use uuid::Uuid;

pub mod battery;
pub mod certificate;
pub mod control;

/// The handle of an attribute
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AttributeHandle(pub u16);

impl core::fmt::Display for AttributeHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:#06X}", self.0)
    }
}

/// UUID of a primary service declaration
pub const PRIMARY_SERVICE_TYPE: Uuid = Uuid::from_u128(0x00002800_0000_1000_8000_00805f9b34fb);

/// UUID of a characteristic declaration
pub const CHARACTERISTIC_TYPE: Uuid = Uuid::from_u128(0x00002803_0000_1000_8000_00805f9b34fb);

/// UUID of a client characteristic configuration descriptor
pub const CLIENT_CONFIGURATION_TYPE: Uuid = Uuid::from_u128(0x00002902_0000_1000_8000_00805f9b34fb);

/// Characteristic Properties
///
/// These are the properties that are part of the Characteristic Declaration
#[derive(Clone, Copy, PartialEq, PartialOrd, Eq, Ord, Debug)]
pub enum Properties {
    Broadcast,
    Read,
    WriteWithoutResponse,
    Write,
    Notify,
    Indicate,
}

impl Properties {
    fn to_val(&self) -> u8 {
        match *self {
            Properties::Broadcast => 1 << 0,
            Properties::Read => 1 << 1,
            Properties::WriteWithoutResponse => 1 << 2,
            Properties::Write => 1 << 3,
            Properties::Notify => 1 << 4,
            Properties::Indicate => 1 << 5,
        }
    }

    /// Convert a list of properties into the bit field of a characteristic declaration
    pub fn slice_to_bit_field(properties: &[Self]) -> u8 {
        properties.iter().fold(0u8, |u, p| u | p.to_val())
    }
}

/// Security required for accessing a characteristic value
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Security {
    /// Open to any client
    None,
    /// The link must be encrypted, man in the middle protection is not required
    EncryptionNoMitm,
    /// Reads, writes, and subscriptions are allowed on unauthenticated links
    Unauthenticated,
}

/// Definition of a characteristic within a [`ServiceDefinition`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CharacteristicDefinition {
    pub uuid: Uuid,
    pub properties: &'static [Properties],
    /// Maximum length of the characteristic value
    pub max_len: usize,
    pub security: Security,
}

impl CharacteristicDefinition {
    fn has_client_configuration(&self) -> bool {
        self.properties
            .iter()
            .any(|p| matches!(p, Properties::Notify | Properties::Indicate))
    }
}

/// Definition of a primary service
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ServiceDefinition {
    pub uuid: Uuid,
    pub characteristics: &'static [CharacteristicDefinition],
}

/// What an attribute within the layout is
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttributeKind {
    /// A primary service declaration
    PrimaryService(Uuid),
    /// A characteristic declaration
    CharacteristicDeclaration {
        properties: u8,
        value_handle: AttributeHandle,
        uuid: Uuid,
    },
    /// The value of a characteristic
    Value {
        uuid: Uuid,
        max_len: usize,
        security: Security,
    },
    /// The client characteristic configuration descriptor of a characteristic
    ClientConfiguration { value_handle: AttributeHandle },
}

/// An attribute of the server layout
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub handle: AttributeHandle,
    pub kind: AttributeKind,
}

impl Attribute {
    /// Get the attribute type
    pub fn get_type(&self) -> Uuid {
        match self.kind {
            AttributeKind::PrimaryService(_) => PRIMARY_SERVICE_TYPE,
            AttributeKind::CharacteristicDeclaration { .. } => CHARACTERISTIC_TYPE,
            AttributeKind::Value { uuid, .. } => uuid,
            AttributeKind::ClientConfiguration { .. } => CLIENT_CONFIGURATION_TYPE,
        }
    }
}

/// Constructor of a [`ServerLayout`]
///
/// Handles are assigned in the order services and characteristics are added, starting at handle
/// `0x0001`. A characteristic takes up a declaration handle, a value handle, and if it can
/// notify or indicate a client configuration handle.
#[derive(Debug, Default)]
pub struct ServerBuilder {
    attributes: Vec<Attribute>,
}

impl ServerBuilder {
    pub fn new() -> Self {
        ServerBuilder::default()
    }

    fn push(&mut self, kind: AttributeKind) -> AttributeHandle {
        let handle = self.next_handle();

        self.attributes.push(Attribute { handle, kind });

        handle
    }

    fn next_handle(&self) -> AttributeHandle {
        AttributeHandle(self.attributes.len() as u16 + 1)
    }

    /// Add a service to the server
    ///
    /// The returned handles are the value handles of the characteristics of `service`, in the
    /// order they are listed in the definition.
    pub fn add_service(&mut self, service: &ServiceDefinition) -> Vec<AttributeHandle> {
        self.push(AttributeKind::PrimaryService(service.uuid));

        let mut value_handles = Vec::with_capacity(service.characteristics.len());

        for characteristic in service.characteristics {
            let declaration_handle = self.next_handle();

            let value_handle = AttributeHandle(declaration_handle.0 + 1);

            self.push(AttributeKind::CharacteristicDeclaration {
                properties: Properties::slice_to_bit_field(characteristic.properties),
                value_handle,
                uuid: characteristic.uuid,
            });

            self.push(AttributeKind::Value {
                uuid: characteristic.uuid,
                max_len: characteristic.max_len,
                security: characteristic.security,
            });

            if characteristic.has_client_configuration() {
                self.push(AttributeKind::ClientConfiguration { value_handle });
            }

            value_handles.push(value_handle);
        }

        log::debug!(
            "(GATT) added service {} with {} characteristics",
            service.uuid,
            value_handles.len()
        );

        value_handles
    }

    pub fn build(self) -> ServerLayout {
        ServerLayout {
            attributes: self.attributes,
        }
    }
}

/// The attributes of the accessory's GATT server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerLayout {
    attributes: Vec<Attribute>,
}

impl ServerLayout {
    /// Get all attributes, sorted by handle
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Get an attribute by its handle
    pub fn get(&self, handle: AttributeHandle) -> Option<&Attribute> {
        handle
            .0
            .checked_sub(1)
            .and_then(|index| self.attributes.get(index as usize))
    }

    /// Find the value handle of the characteristic with the UUID `uuid`
    pub fn value_handle_of(&self, uuid: Uuid) -> Option<AttributeHandle> {
        self.attributes.iter().find_map(|attribute| match attribute.kind {
            AttributeKind::Value { uuid: value_uuid, .. } if value_uuid == uuid => Some(attribute.handle),
            _ => None,
        })
    }
}
