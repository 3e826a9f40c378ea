//! Errors of the handshake core
//!
//! None of these errors are fatal to the peripheral. An illegal transition is ignored, a
//! malformed response leaves the handshake waiting for a corrected write, and a capacity
//! violation only aborts the operation that caused it.

use crate::handshake::{EventKind, HandshakeState};

/// General error of the handshake core
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// An event arrived whose preconditions are not met by the current state
    IllegalTransition(Rejected),
    /// The response written by the central does not have the expected shape
    MalformedResponse(MalformedResponse),
    /// Data does not fit within the buffers of the command channel
    CapacityViolation(CapacityViolation),
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            Error::IllegalTransition(r) => write!(f, "illegal transition, {}", r),
            Error::MalformedResponse(m) => write!(f, "malformed response, {}", m),
            Error::CapacityViolation(c) => core::fmt::Display::fmt(c, f),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

impl From<Rejected> for Error {
    fn from(r: Rejected) -> Self {
        Error::IllegalTransition(r)
    }
}

impl From<MalformedResponse> for Error {
    fn from(m: MalformedResponse) -> Self {
        Error::MalformedResponse(m)
    }
}

impl From<CapacityViolation> for Error {
    fn from(c: CapacityViolation) -> Self {
        Error::CapacityViolation(c)
    }
}

/// The reason an event was rejected by the handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The event is out of order for the current state
    OutOfOrder,
    /// The event is for an attribute that takes no part in the handshake
    UnrelatedAttribute,
    /// Bonding finished with a failure status
    BondingFailed(u8),
}

impl core::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            RejectReason::OutOfOrder => f.write_str("event is out of order"),
            RejectReason::UnrelatedAttribute => f.write_str("attribute is not part of the handshake"),
            RejectReason::BondingFailed(status) => write!(f, "bonding failed with status {:#04X}", status),
        }
    }
}

/// A rejected event
///
/// The event was discarded and the current state of the handshake is unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rejected {
    pub event: EventKind,
    pub current: HandshakeState,
    pub reason: RejectReason,
}

impl core::fmt::Display for Rejected {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "{:?} rejected in state {:?}: {}", self.event, self.current, self.reason)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Rejected {}

/// Shape failure of a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedResponse {
    /// The number of bytes written was not the expected response length
    Length { expected: usize, received: usize },
    /// The response did not start with the expected header
    Header { expected: [u8; 4], received: [u8; 4] },
}

impl core::fmt::Display for MalformedResponse {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            MalformedResponse::Length { expected, received } => {
                write!(f, "expected {} bytes, received {} bytes", expected, received)
            }
            MalformedResponse::Header { expected, received } => {
                write!(f, "expected header {:02X?}, received header {:02X?}", expected, received)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for MalformedResponse {}

/// Data exceeding the capacity of the command channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityViolation {
    pub capacity: usize,
    pub requested: usize,
}

impl core::fmt::Display for CapacityViolation {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "{} bytes exceeds the command channel capacity of {} bytes",
            self.requested, self.capacity
        )
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CapacityViolation {}
