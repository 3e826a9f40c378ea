//! The payload catalog
//!
//! The challenge is the only frame the device sends during the handshake. Its payload is a
//! constant template made of two opaque data blocks with a six byte hole between them. The hole
//! is filled with the address of this device, in reversed byte order, every time a challenge is
//! built.
//!
//! ```
//! use sfida_peripheral::payload;
//! use sfida_peripheral::BluetoothDeviceAddress;
//!
//! let address = BluetoothDeviceAddress::new([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
//!
//! let frame = payload::build(address);
//!
//! let hole = payload::ADDRESS_OFFSET..payload::ADDRESS_OFFSET + 6;
//!
//! assert_eq!(&[0xFF, 0xEE, 0xDD, 0xCC, 0xBB, 0xAA], &frame.payload()[hole]);
//! ```

use crate::channel::{Command, COMMAND_LEN, MAX_PAYLOAD_LEN};
use crate::BluetoothDeviceAddress;

/// Offset of the device address within the challenge payload
pub const ADDRESS_OFFSET: usize = 112;

/// Length of the device address within the challenge payload
pub const ADDRESS_LEN: usize = 6;

const RANDOM_BLOCK_LEN: usize = ADDRESS_OFFSET;

const DEVICE_BLOCK_LEN: usize = 256;

/// Length of the challenge payload
pub const PAYLOAD_LEN: usize = RANDOM_BLOCK_LEN + ADDRESS_LEN + DEVICE_BLOCK_LEN;

// The challenge must fit within the command channel
const _: () = assert!(PAYLOAD_LEN <= MAX_PAYLOAD_LEN);

const RANDOM_BLOCK: [u8; RANDOM_BLOCK_LEN] = [
    0x18, 0x27, 0x97, 0x7D, 0x8A, 0x72, 0x98, 0x1E, 0x4E, 0xDC, 0x7A, 0x08,
    0x22, 0xA0, 0xFC, 0x6D, 0xAD, 0x87, 0x6C, 0xEE, 0x20, 0x48, 0x9E, 0xA9,
    0xCE, 0xD0, 0x34, 0x92, 0xBC, 0xC5, 0xDD, 0xFA, 0xBB, 0x8A, 0x16, 0x11,
    0xB0, 0xB8, 0xD9, 0xA3, 0x18, 0x19, 0x9B, 0xE0, 0xCC, 0x3D, 0xED, 0x24,
    0x0B, 0xEE, 0xC9, 0xD9, 0x74, 0xF1, 0x44, 0x1A, 0xCD, 0x66, 0xCE, 0x40,
    0xA5, 0x34, 0x52, 0x59, 0x54, 0xCF, 0xBE, 0x11, 0xBB, 0xE7, 0x4A, 0x8C,
    0x70, 0x2E, 0x24, 0x50, 0xD5, 0x1D, 0x72, 0xDD, 0x81, 0x5E, 0x26, 0x8B,
    0x27, 0x2E, 0xC7, 0x7D, 0x03, 0x68, 0xAC, 0xBD, 0x18, 0xBF, 0xF3, 0xC6,
    0x42, 0x35, 0x05, 0x29, 0x20, 0x98, 0x64, 0x4B, 0x55, 0x48, 0x01, 0xB6,
    0x79, 0x1F, 0xA8, 0x54,
];

const DEVICE_BLOCK: [u8; DEVICE_BLOCK_LEN] = [
    0xCA, 0x85, 0xEC, 0xE3, 0x0F, 0xCA, 0xA2, 0xA2, 0x73, 0xFB, 0x4F, 0x74,
    0x7C, 0xA2, 0x59, 0xEB, 0x95, 0x09, 0xAB, 0xB3, 0x74, 0x32, 0xBB, 0x93,
    0x4C, 0x0D, 0x83, 0x1B, 0x98, 0x1D, 0x99, 0x49, 0x5F, 0x0B, 0x00, 0x36,
    0x02, 0x3E, 0x22, 0x31, 0xA6, 0xAA, 0x48, 0xF6, 0xC6, 0x3A, 0xA3, 0x2F,
    0x3B, 0x43, 0x16, 0xB6, 0x78, 0x74, 0xD2, 0x66, 0x8D, 0x76, 0x1D, 0xEC,
    0x35, 0xC8, 0x3C, 0x58, 0xD1, 0xF7, 0x87, 0x32, 0x23, 0x55, 0x8A, 0x5A,
    0x1A, 0xC6, 0x28, 0x60, 0x76, 0xB9, 0xE6, 0x2D, 0xEF, 0x03, 0xA0, 0xAD,
    0x37, 0x88, 0x3B, 0xA1, 0xAD, 0x44, 0x6D, 0x41, 0xD0, 0x6A, 0x7E, 0x07,
    0x1D, 0xBC, 0x6A, 0xB8, 0x7C, 0x92, 0x16, 0x74, 0x20, 0x67, 0x4E, 0xBD,
    0x33, 0x43, 0x70, 0x6D, 0x27, 0xBF, 0x96, 0x4E, 0x4D, 0x10, 0x05, 0x7D,
    0x13, 0x62, 0xF6, 0x7F, 0xB5, 0xFE, 0x5B, 0x1D, 0xBF, 0xB6, 0x44, 0x62,
    0x2C, 0x5E, 0x4B, 0x4E, 0x40, 0x3F, 0x50, 0x0B, 0x46, 0xEF, 0xCC, 0x9B,
    0xFD, 0xE5, 0x9A, 0x1E, 0xE3, 0x2C, 0x1F, 0x9A, 0x66, 0xDF, 0xF0, 0xF8,
    0x0E, 0x74, 0xD8, 0x5C, 0x1D, 0x90, 0xC1, 0x24, 0x59, 0x90, 0x1F, 0x7E,
    0xFA, 0xF2, 0x6D, 0xEC, 0x24, 0xE7, 0xBE, 0xC0, 0xAA, 0x5A, 0x08, 0x5B,
    0x71, 0x89, 0x53, 0x3E, 0xDD, 0x57, 0xE0, 0x4E, 0x8E, 0x67, 0xF0, 0xB3,
    0xD1, 0x21, 0x3A, 0x82, 0x57, 0x9D, 0xD8, 0xA6, 0x50, 0x05, 0x1C, 0x64,
    0xD6, 0x2B, 0xFD, 0x26, 0xDA, 0x33, 0x49, 0x0A, 0x81, 0xB6, 0xEB, 0x99,
    0xE7, 0xFE, 0xC3, 0x2C, 0x3D, 0x24, 0x9E, 0x84, 0xFF, 0x06, 0x02, 0x47,
    0xFD, 0x97, 0xFF, 0xC3, 0x4E, 0x9B, 0xB8, 0x4F, 0x0B, 0xCE, 0xDA, 0xD5,
    0x25, 0x87, 0x66, 0x10, 0x6D, 0xC0, 0xDD, 0x89, 0x50, 0x9C, 0x4A, 0x59,
    0xBB, 0x94, 0x0D, 0xD0,
];

/// A challenge frame
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    command: Command,
    payload: [u8; PAYLOAD_LEN],
}

impl Frame {
    pub fn command(&self) -> Command {
        self.command
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Get the device address embedded within the payload
    ///
    /// The address is returned in the order the controller reports it (the payload holds it
    /// reversed).
    pub fn address(&self) -> BluetoothDeviceAddress {
        let mut address = [0u8; ADDRESS_LEN];

        address.copy_from_slice(&self.payload[ADDRESS_OFFSET..ADDRESS_OFFSET + ADDRESS_LEN]);

        address.reverse();

        BluetoothDeviceAddress(address)
    }

    /// The length of the frame on the wire
    pub fn wire_len(&self) -> usize {
        COMMAND_LEN + PAYLOAD_LEN
    }
}

impl core::fmt::Debug for Frame {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Frame")
            .field("command", &self.command)
            .field("address", &self.address())
            .field("payload_len", &PAYLOAD_LEN)
            .finish()
    }
}

/// Build the challenge for the device with the address `device_address`
pub fn build(device_address: BluetoothDeviceAddress) -> Frame {
    let mut payload = [0u8; PAYLOAD_LEN];

    let (random, rest) = payload.split_at_mut(RANDOM_BLOCK_LEN);

    let (hole, device) = rest.split_at_mut(ADDRESS_LEN);

    random.copy_from_slice(&RANDOM_BLOCK);
    hole.copy_from_slice(&device_address.reversed());
    device.copy_from_slice(&DEVICE_BLOCK);

    Frame {
        command: Command::CHALLENGE,
        payload,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDRESS: BluetoothDeviceAddress = BluetoothDeviceAddress::new([0x01, 0x23, 0x45, 0x67, 0x89, 0xAB]);

    #[test]
    fn build_is_deterministic() {
        assert_eq!(build(ADDRESS), build(ADDRESS));
    }

    #[test]
    fn only_the_hole_depends_on_the_address() {
        let first = build(ADDRESS);

        let second = build(BluetoothDeviceAddress::new([0xFF; 6]));

        let differing = first
            .payload()
            .iter()
            .zip(second.payload())
            .enumerate()
            .filter(|(_, (a, b))| a != b)
            .map(|(index, _)| index)
            .collect::<Vec<_>>();

        assert_eq!((ADDRESS_OFFSET..ADDRESS_OFFSET + ADDRESS_LEN).collect::<Vec<_>>(), differing);
    }

    #[test]
    fn template_blocks_surround_the_address() {
        let frame = build(ADDRESS);

        assert_eq!(Command::CHALLENGE, frame.command());
        assert_eq!(&RANDOM_BLOCK[..], &frame.payload()[..ADDRESS_OFFSET]);
        assert_eq!(&DEVICE_BLOCK[..], &frame.payload()[ADDRESS_OFFSET + ADDRESS_LEN..]);
        assert_eq!(ADDRESS, frame.address());
        assert_eq!(378, frame.wire_len());
    }
}
