//! The command channel
//!
//! The command channel is the byte relay behind the three characteristics of the certificate
//! service. It has three fixed size buffers:
//!
//! * the *command* buffer holds the 4 byte command of the last frame sent, it backs the notify
//!   only commands characteristic.
//! * the *mirror* buffer holds the full last frame sent (command and payload), it backs the read
//!   only device to central characteristic.
//! * the *inbound* buffer holds the last bytes written by the central to the write only central
//!   to device characteristic.
//!
//! There is no queueing. Every send and every inbound write replaces the previous contents of the
//! buffers it touches. The channel performs no validation of what it relays.

use crate::error::CapacityViolation;
use crate::gatt::certificate::CertificateHandles;
use crate::host::Host;

/// The capacity of every buffer of the command channel
pub const CAPACITY: usize = 378;

/// Length of the command that starts every frame
pub const COMMAND_LEN: usize = 4;

/// The maximum length of the payload of a frame
pub const MAX_PAYLOAD_LEN: usize = CAPACITY - COMMAND_LEN;

/// The command of a frame
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Command(pub [u8; COMMAND_LEN]);

impl Command {
    /// The command of the challenge sent by the device
    pub const CHALLENGE: Command = Command([0x00, 0x00, 0x00, 0x00]);

    /// The command the central echoes at the start of its response to the challenge
    pub const CHALLENGE_RESPONSE: Command = Command([0x01, 0x00, 0x00, 0x00]);

    pub fn as_bytes(&self) -> &[u8; COMMAND_LEN] {
        &self.0
    }
}

impl From<[u8; COMMAND_LEN]> for Command {
    fn from(raw: [u8; COMMAND_LEN]) -> Self {
        Command(raw)
    }
}

/// Byte relay backing the certificate service
pub struct CommandChannel {
    handles: CertificateHandles,
    command: [u8; COMMAND_LEN],
    mirror: [u8; CAPACITY],
    mirror_len: usize,
    inbound: [u8; CAPACITY],
    inbound_len: usize,
}

impl CommandChannel {
    /// Create a new `CommandChannel`
    ///
    /// `handles` are the attributes the channel publishes to.
    pub fn new(handles: CertificateHandles) -> Self {
        CommandChannel {
            handles,
            command: [0; COMMAND_LEN],
            mirror: [0; CAPACITY],
            mirror_len: 0,
            inbound: [0; CAPACITY],
            inbound_len: 0,
        }
    }

    pub fn handles(&self) -> &CertificateHandles {
        &self.handles
    }

    /// Send a frame to the central
    ///
    /// `command` is written to the command buffer and `command` followed by `payload` is written to
    /// the mirror buffer. The new values of both are then published through `host`, the command
    /// going out as a notification of the commands characteristic.
    ///
    /// The return is the length of the frame sent.
    ///
    /// # Error
    /// A payload longer than [`MAX_PAYLOAD_LEN`] is a contract violation of the caller. Nothing is
    /// written or published in this case.
    pub fn send<H: Host>(
        &mut self,
        host: &mut H,
        command: Command,
        payload: &[u8],
    ) -> Result<usize, CapacityViolation> {
        let frame_len = COMMAND_LEN + payload.len();

        if frame_len > CAPACITY {
            return Err(CapacityViolation {
                capacity: CAPACITY,
                requested: frame_len,
            });
        }

        self.command = command.0;

        self.mirror[..COMMAND_LEN].copy_from_slice(&command.0);
        self.mirror[COMMAND_LEN..frame_len].copy_from_slice(payload);
        self.mirror_len = frame_len;

        log::trace!("(channel) sending command {:02X?} with {} payload bytes", command.0, payload.len());

        host.publish(self.handles.device_to_central, self.mirror());
        host.publish(self.handles.commands, &self.command);

        Ok(frame_len)
    }

    /// Deliver the bytes of a write by the central
    ///
    /// This is called for every write to the central to device characteristic. The bytes replace
    /// the previous contents of the inbound buffer.
    ///
    /// # Error
    /// Writes larger than the capacity are rejected by a conforming transport (the characteristic
    /// value has a maximum length of [`CAPACITY`]). If one is delivered anyway it is dropped and the
    /// inbound buffer is left unchanged.
    pub fn receive(&mut self, data: &[u8]) -> Result<(), CapacityViolation> {
        if data.len() > CAPACITY {
            return Err(CapacityViolation {
                capacity: CAPACITY,
                requested: data.len(),
            });
        }

        self.inbound[..data.len()].copy_from_slice(data);
        self.inbound_len = data.len();

        Ok(())
    }

    /// Read the last bytes written by the central
    ///
    /// The length of the returned slice is the number of bytes actually received.
    pub fn read(&self) -> &[u8] {
        &self.inbound[..self.inbound_len]
    }

    /// Get the command of the last frame sent
    pub fn command(&self) -> Command {
        Command(self.command)
    }

    /// Get the last frame sent
    pub fn mirror(&self) -> &[u8] {
        &self.mirror[..self.mirror_len]
    }
}

impl core::fmt::Debug for CommandChannel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CommandChannel")
            .field("handles", &self.handles)
            .field("command", &self.command)
            .field("mirror_len", &self.mirror_len)
            .field("inbound_len", &self.inbound_len)
            .finish()
    }
}
