//! The handshake state machine
//!
//! The handshake walks through the states of [`HandshakeState`] strictly in order. Each step is
//! requested by an [`Event`] from the BLE host and is only legal if the requested state directly
//! follows the current state. The single exception is the reset to [`Idle`], requested on every
//! disconnection and legal from any state.
//!
//! Requesting a state and entering it are two separate operations. [`submit`] checks the
//! legality of an event and records the requested state as *pending*. [`poll`] enters the pending
//! state by running the effect bound to it and, if the effect succeeds, commits the transition.
//! Only two states have an effect:
//!
//! * entering [`ChallengeSent`] builds the challenge with the address of this device and sends
//!   it through the [`CommandChannel`],
//! * entering [`ResponseValidated`] validates the response last written by the central. A
//!   malformed response leaves the handshake in `ChallengeSent` so the central can write again.
//!
//! The challenge is not tied to an event. It becomes pending as soon as [`Subscribed`] is
//! committed and is sent on the following poll.
//!
//! There is no timeout. A central that stops part way through leaves the handshake in the state
//! it reached until it disconnects.
//!
//! [`Idle`]: HandshakeState::Idle
//! [`Subscribed`]: HandshakeState::Subscribed
//! [`ChallengeSent`]: HandshakeState::ChallengeSent
//! [`ResponseValidated`]: HandshakeState::ResponseValidated
//! [`submit`]: Handshake::submit
//! [`poll`]: Handshake::poll

use crate::channel::{Command, CommandChannel, COMMAND_LEN};
use crate::error::{Error, MalformedResponse, RejectReason, Rejected};
use crate::gatt::certificate::CertificateHandles;
use crate::gatt::AttributeHandle;
use crate::host::Host;
use crate::payload;
use alloc::vec::Vec;

/// Length of a response to the challenge
pub const RESPONSE_LEN: usize = 20;

/// States of the handshake
///
/// The states are listed in the order the handshake goes through them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HandshakeState {
    /// No connection, or the connection was reset
    Idle,
    /// A central is connected
    Connected,
    /// Bonding with the central completed
    Bonded,
    /// The central enabled notifications of the commands characteristic
    Subscribed,
    /// The challenge was sent to the central
    ChallengeSent,
    /// The response of the central was validated, the accessory is paired
    ResponseValidated,
}

impl HandshakeState {
    /// The state of a paired accessory
    pub const PAIRED: HandshakeState = HandshakeState::ResponseValidated;

    /// Get the state that follows this state
    pub fn next(&self) -> Option<HandshakeState> {
        match self {
            HandshakeState::Idle => Some(HandshakeState::Connected),
            HandshakeState::Connected => Some(HandshakeState::Bonded),
            HandshakeState::Bonded => Some(HandshakeState::Subscribed),
            HandshakeState::Subscribed => Some(HandshakeState::ChallengeSent),
            HandshakeState::ChallengeSent => Some(HandshakeState::ResponseValidated),
            HandshakeState::ResponseValidated => None,
        }
    }

    pub fn is_paired(&self) -> bool {
        *self == HandshakeState::PAIRED
    }

    /// Check if a transition from this state to `requested` is legal
    pub fn can_enter(&self, requested: HandshakeState) -> bool {
        requested == HandshakeState::Idle || self.next() == Some(requested)
    }

    /// A state that is requested as soon as this state is committed
    fn follow_up(&self) -> Option<HandshakeState> {
        match self {
            HandshakeState::Subscribed => Some(HandshakeState::ChallengeSent),
            HandshakeState::Idle
            | HandshakeState::Connected
            | HandshakeState::Bonded
            | HandshakeState::ChallengeSent
            | HandshakeState::ResponseValidated => None,
        }
    }
}

/// Status of a completed bonding procedure
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BondingStatus {
    Success,
    /// Bonding failed with the given status code
    Failure(u8),
}

/// Events delivered by the BLE host
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// A central connected
    Connected,
    /// The central disconnected
    Disconnected { reason: u8 },
    /// The bonding procedure with the central completed
    BondingCompleted { status: BondingStatus },
    /// The central enabled notifications or indications of a characteristic
    SubscriptionEnabled { attribute: AttributeHandle },
    /// The central wrote to a characteristic
    DataWritten { attribute: AttributeHandle, data: Vec<u8> },
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Connected => EventKind::Connected,
            Event::Disconnected { .. } => EventKind::Disconnected,
            Event::BondingCompleted { .. } => EventKind::BondingCompleted,
            Event::SubscriptionEnabled { .. } => EventKind::SubscriptionEnabled,
            Event::DataWritten { .. } => EventKind::DataWritten,
        }
    }
}

/// The kind of an [`Event`], without its data
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    Connected,
    Disconnected,
    BondingCompleted,
    SubscriptionEnabled,
    DataWritten,
}

/// An accepted event
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transitioned {
    /// The current state when the event was accepted
    pub from: HandshakeState,
    /// The state that is now pending
    pub requested: HandshakeState,
}

/// A committed transition
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Applied {
    pub from: HandshakeState,
    pub to: HandshakeState,
}

/// The reason a poll did not change the current state
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NoOp {
    /// There is no pending state to enter
    Settled,
    /// The effect of the pending state failed and the transition was not committed
    EffectFailed(Error),
}

impl core::fmt::Display for NoOp {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            NoOp::Settled => f.write_str("no pending state"),
            NoOp::EffectFailed(e) => write!(f, "transition not committed, {}", e),
        }
    }
}

/// The handshake state machine
///
/// A `Handshake` holds exactly one current state and at most one pending state. It is created
/// once for the lifetime of the device and reset to [`Idle`](HandshakeState::Idle) on every
/// disconnection.
#[derive(Debug)]
pub struct Handshake {
    handles: CertificateHandles,
    current: HandshakeState,
    pending: Option<HandshakeState>,
}

impl Handshake {
    /// Create a new `Handshake`
    ///
    /// `handles` identify the certificate service characteristics subscriptions and writes are
    /// matched against.
    pub fn new(handles: CertificateHandles) -> Self {
        Handshake {
            handles,
            current: HandshakeState::Idle,
            pending: None,
        }
    }

    /// Get the current state
    pub fn state(&self) -> HandshakeState {
        self.current
    }

    /// Get the pending state
    pub fn pending(&self) -> Option<HandshakeState> {
        self.pending
    }

    /// Submit an event
    ///
    /// The event is checked against the current state and, if its preconditions are met, the
    /// state it requests becomes the pending state (replacing any state that was pending). A
    /// pending reset to [`Idle`](HandshakeState::Idle) is only ever replaced by another reset, so
    /// events that arrive after a disconnection but before the next [`poll`](Handshake::poll) are
    /// rejected.
    ///
    /// The bytes of a [`DataWritten`](Event::DataWritten) event are not read here. The transport
    /// must deliver them to the [`CommandChannel`] (with [`CommandChannel::receive`]) before the
    /// event is submitted, as validation reads the response from the channel.
    ///
    /// # Rejection
    /// An event whose preconditions are not met is discarded. The current and pending states are
    /// unchanged. A rejection is not an error of the handshake, it only means the event is ignored.
    pub fn submit(&mut self, event: &Event) -> Result<Transitioned, Rejected> {
        let kind = event.kind();

        let requested = match event {
            Event::Disconnected { .. } => HandshakeState::Idle,
            Event::Connected => HandshakeState::Connected,
            Event::BondingCompleted { status } => {
                if let (HandshakeState::Connected, BondingStatus::Failure(code)) = (self.current, status) {
                    return Err(self.reject(kind, RejectReason::BondingFailed(*code)));
                }

                HandshakeState::Bonded
            }
            Event::SubscriptionEnabled { attribute } => {
                if *attribute != self.handles.commands {
                    return Err(self.reject(kind, RejectReason::UnrelatedAttribute));
                }

                HandshakeState::Subscribed
            }
            Event::DataWritten { attribute, .. } => {
                if *attribute != self.handles.central_to_device {
                    return Err(self.reject(kind, RejectReason::UnrelatedAttribute));
                }

                HandshakeState::ResponseValidated
            }
        };

        // a pending reset must be committed before anything else
        if self.pending == Some(HandshakeState::Idle) && requested != HandshakeState::Idle {
            return Err(self.reject(kind, RejectReason::OutOfOrder));
        }

        if !self.current.can_enter(requested) {
            return Err(self.reject(kind, RejectReason::OutOfOrder));
        }

        self.pending = Some(requested);

        log::debug!("(handshake) {:?} requested {:?} from {:?}", kind, requested, self.current);

        Ok(Transitioned {
            from: self.current,
            requested,
        })
    }

    fn reject(&self, event: EventKind, reason: RejectReason) -> Rejected {
        let rejected = Rejected {
            event,
            current: self.current,
            reason,
        };

        match reason {
            RejectReason::UnrelatedAttribute => log::trace!("(handshake) {}", rejected),
            RejectReason::OutOfOrder | RejectReason::BondingFailed(_) => log::warn!("(handshake) {}", rejected),
        }

        rejected
    }

    /// Enter the pending state
    ///
    /// If there is a pending state that differs from the current state, the effect bound to it is
    /// run and, if the effect succeeds, the pending state becomes the current state. Exactly one
    /// effect is run per call.
    ///
    /// # No-op
    /// `NoOp::Settled` is returned when nothing is pending. `NoOp::EffectFailed` is returned when the
    /// effect failed, in which case the pending state is dropped and the current state is
    /// unchanged.
    pub fn poll<H: Host>(&mut self, channel: &mut CommandChannel, host: &mut H) -> Result<Applied, NoOp> {
        let requested = match self.pending.take() {
            Some(requested) if requested != self.current => requested,
            _ => return Err(NoOp::Settled),
        };

        if let Err(e) = self.enter(requested, channel, host) {
            log::warn!("(handshake) could not enter {:?}: {}", requested, e);

            return Err(NoOp::EffectFailed(e));
        }

        let from = core::mem::replace(&mut self.current, requested);

        self.pending = requested.follow_up();

        log::info!("(handshake) {:?} -> {:?}", from, requested);

        Ok(Applied { from, to: requested })
    }

    /// Run the effect bound to `state`
    fn enter<H: Host>(&self, state: HandshakeState, channel: &mut CommandChannel, host: &mut H) -> Result<(), Error> {
        match state {
            HandshakeState::ChallengeSent => Self::send_challenge(channel, host),
            HandshakeState::ResponseValidated => validate_response(channel.read()).map_err(Error::from),
            HandshakeState::Idle | HandshakeState::Connected | HandshakeState::Bonded | HandshakeState::Subscribed => {
                Ok(())
            }
        }
    }

    fn send_challenge<H: Host>(channel: &mut CommandChannel, host: &mut H) -> Result<(), Error> {
        let address = host.local_address();

        let frame = payload::build(address);

        let len = channel.send(host, frame.command(), frame.payload())?;

        log::debug!("(handshake) sent challenge of {} bytes for device {}", len, address);

        Ok(())
    }
}

/// Validate the shape of a response to the challenge
///
/// A response is exactly [`RESPONSE_LEN`] bytes long and starts with
/// [`Command::CHALLENGE_RESPONSE`]. The remaining 16 bytes are opaque and not checked.
pub fn validate_response(response: &[u8]) -> Result<(), MalformedResponse> {
    if response.len() != RESPONSE_LEN {
        return Err(MalformedResponse::Length {
            expected: RESPONSE_LEN,
            received: response.len(),
        });
    }

    let mut header = [0u8; COMMAND_LEN];

    header.copy_from_slice(&response[..COMMAND_LEN]);

    if Command(header) != Command::CHALLENGE_RESPONSE {
        return Err(MalformedResponse::Header {
            expected: Command::CHALLENGE_RESPONSE.0,
            received: header,
        });
    }

    Ok(())
}
