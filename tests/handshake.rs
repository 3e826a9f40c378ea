//! Handshake scenarios driven through a `Peripheral` with a recording host

use rand::{Rng, SeedableRng};
use sfida_peripheral::channel::{Command, CommandChannel, COMMAND_LEN};
use sfida_peripheral::config::AdvertisingConfig;
use sfida_peripheral::gatt::certificate::CertificateHandles;
use sfida_peripheral::gatt::{AttributeHandle, ServerBuilder, ServerLayout};
use sfida_peripheral::handshake::{Applied, BondingStatus, Handshake, NoOp, RESPONSE_LEN};
use sfida_peripheral::{payload, BluetoothDeviceAddress, Config, Event, HandshakeState, Host, Peripheral};

const ADDRESS: BluetoothDeviceAddress = BluetoothDeviceAddress::new([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);

#[derive(Default)]
struct RecordingHost {
    published: Vec<(AttributeHandle, Vec<u8>)>,
}

impl Host for RecordingHost {
    fn register_services(&mut self, _: &ServerLayout) {}

    fn publish(&mut self, attribute: AttributeHandle, value: &[u8]) {
        self.published.push((attribute, value.to_vec()))
    }

    fn local_address(&self) -> BluetoothDeviceAddress {
        ADDRESS
    }

    fn purge_bonding_state(&mut self) {}

    fn start_advertising(&mut self, _: &AdvertisingConfig) {}
}

fn new_peripheral() -> Peripheral<RecordingHost> {
    Peripheral::new(RecordingHost::default(), Config::default())
}

fn subscribe(peripheral: &Peripheral<RecordingHost>) -> Event {
    Event::SubscriptionEnabled {
        attribute: peripheral.certificate_handles().commands,
    }
}

fn write_response(peripheral: &Peripheral<RecordingHost>, data: Vec<u8>) -> Event {
    Event::DataWritten {
        attribute: peripheral.certificate_handles().central_to_device,
        data,
    }
}

fn bonded() -> Event {
    Event::BondingCompleted {
        status: BondingStatus::Success,
    }
}

fn response(rng: &mut impl Rng) -> Vec<u8> {
    let mut response = Command::CHALLENGE_RESPONSE.0.to_vec();

    response.extend((0..16).map(|_| rng.gen::<u8>()));

    response
}

/// Drive a new peripheral up to the point where the challenge is sent
fn challenged() -> Peripheral<RecordingHost> {
    let mut peripheral = new_peripheral();

    peripheral.process(Event::Connected).unwrap();
    peripheral.process(bonded()).unwrap();
    peripheral.process(subscribe(&peripheral)).unwrap();
    peripheral.tick().unwrap();

    assert_eq!(HandshakeState::ChallengeSent, peripheral.state());

    peripheral
}

#[test]
fn connect_bond_subscribe_then_challenge() {
    let mut peripheral = new_peripheral();

    let mut states = vec![peripheral.state()];

    for event in [Event::Connected, bonded(), subscribe(&peripheral)] {
        let applied = peripheral.process(event).unwrap();

        assert_eq!(*states.last().unwrap(), applied.from);

        states.push(applied.to);
    }

    assert_eq!(
        vec![
            HandshakeState::Idle,
            HandshakeState::Connected,
            HandshakeState::Bonded,
            HandshakeState::Subscribed,
        ],
        states
    );

    assert!(peripheral.host().published.is_empty());

    assert_eq!(
        Ok(Applied {
            from: HandshakeState::Subscribed,
            to: HandshakeState::ChallengeSent,
        }),
        peripheral.tick()
    );

    let commands = peripheral.certificate_handles().commands;

    let device_to_central = peripheral.certificate_handles().device_to_central;

    let published = &peripheral.host().published;

    assert!(published.contains(&(commands, vec![0, 0, 0, 0])));

    let (_, frame) = published
        .iter()
        .find(|(handle, _)| *handle == device_to_central)
        .expect("challenge was not mirrored");

    assert_eq!(&[0, 0, 0, 0], &frame[..COMMAND_LEN]);
    assert_eq!(payload::build(ADDRESS).payload(), &frame[COMMAND_LEN..]);

    let offset = COMMAND_LEN + payload::ADDRESS_OFFSET;

    assert_eq!(&[0xFF, 0xEE, 0xDD, 0xCC, 0xBB, 0xAA], &frame[offset..offset + 6]);
}

#[test]
fn subscription_before_bonding_is_rejected() {
    let mut peripheral = new_peripheral();

    peripheral.process(Event::Connected).unwrap();

    assert_eq!(Err(NoOp::Settled), peripheral.process(subscribe(&peripheral)));

    assert_eq!(HandshakeState::Connected, peripheral.state());

    // no challenge goes out later either
    assert_eq!(Err(NoOp::Settled), peripheral.tick());
    assert!(peripheral.host().published.is_empty());
}

#[test]
fn idle_only_moves_to_connected() {
    let mut peripheral = new_peripheral();

    let events = vec![
        bonded(),
        subscribe(&peripheral),
        write_response(&peripheral, vec![0x01, 0, 0, 0]),
    ];

    for event in events {
        assert_eq!(Err(NoOp::Settled), peripheral.process(event));
        assert_eq!(HandshakeState::Idle, peripheral.state());
    }
}

#[test]
fn valid_response_pairs_until_disconnection() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(0x5F1DA);

    let mut peripheral = challenged();

    let applied = peripheral
        .process(write_response(&peripheral, response(&mut rng)))
        .unwrap();

    assert_eq!(HandshakeState::ResponseValidated, applied.to);

    // nothing moves the handshake out of the paired state but a disconnection
    for event in [Event::Connected, bonded(), subscribe(&peripheral)] {
        assert_eq!(Err(NoOp::Settled), peripheral.process(event));
    }

    assert_eq!(Err(NoOp::Settled), peripheral.process(write_response(&peripheral, response(&mut rng))));

    assert!(peripheral.is_paired());

    peripheral.process(Event::Disconnected { reason: 0x13 }).unwrap();

    assert_eq!(HandshakeState::Idle, peripheral.state());
}

#[test]
fn malformed_responses_keep_the_challenge_pending() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(7);

    let mut peripheral = challenged();

    let too_short = response(&mut rng)[..RESPONSE_LEN - 1].to_vec();

    assert!(matches!(
        peripheral.process(write_response(&peripheral, too_short)),
        Err(NoOp::EffectFailed(_))
    ));
    assert_eq!(HandshakeState::ChallengeSent, peripheral.state());

    let mut wrong_header = response(&mut rng);

    wrong_header[0] = 0x00;

    assert!(matches!(
        peripheral.process(write_response(&peripheral, wrong_header)),
        Err(NoOp::EffectFailed(_))
    ));
    assert_eq!(HandshakeState::ChallengeSent, peripheral.state());

    // ticking does not revalidate the old write
    assert_eq!(Err(NoOp::Settled), peripheral.tick());

    peripheral
        .process(write_response(&peripheral, response(&mut rng)))
        .unwrap();

    assert!(peripheral.is_paired());
}

#[test]
fn reconnecting_sends_a_fresh_challenge() {
    let mut peripheral = challenged();

    peripheral.process(Event::Disconnected { reason: 0x08 }).unwrap();

    peripheral.host_mut().published.clear();

    peripheral.process(Event::Connected).unwrap();
    peripheral.process(bonded()).unwrap();
    peripheral.process(subscribe(&peripheral)).unwrap();
    peripheral.tick().unwrap();

    assert_eq!(HandshakeState::ChallengeSent, peripheral.state());
    assert_eq!(2, peripheral.host().published.len());
}

#[test]
fn random_event_sequences_keep_the_invariants() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(0xC0FFEE);

    let mut peripheral = new_peripheral();

    let unrelated = peripheral.control().handles().led_vibrate;

    for _ in 0..5_000 {
        let before = peripheral.state();

        let event = match rng.gen_range(0..8) {
            0 => Event::Connected,
            1 => Event::Disconnected { reason: 0x13 },
            2 => bonded(),
            3 => Event::BondingCompleted {
                status: BondingStatus::Failure(0x05),
            },
            4 => subscribe(&peripheral),
            5 => Event::SubscriptionEnabled { attribute: unrelated },
            6 => write_response(&peripheral, response(&mut rng)),
            _ => write_response(&peripheral, vec![0x01; rng.gen_range(0..RESPONSE_LEN)]),
        };

        let is_disconnection = matches!(event, Event::Disconnected { .. });

        peripheral.process(event).ok();

        let after = peripheral.state();

        if is_disconnection {
            assert_eq!(HandshakeState::Idle, after);
        } else {
            assert!(after == before || before.next() == Some(after), "{:?} -> {:?}", before, after);
        }

        if rng.gen_bool(0.3) {
            let before = peripheral.state();

            peripheral.tick().ok();

            let after = peripheral.state();

            assert!(after == before || before.next() == Some(after), "{:?} -> {:?}", before, after);
        }
    }
}

/// Several events may arrive between two polls when polling runs on its own cadence
#[test]
fn random_submissions_between_polls_keep_the_invariants() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(0x7E57);

    let handles = CertificateHandles::register(&mut ServerBuilder::new());

    let mut handshake = Handshake::new(handles);

    let mut channel = CommandChannel::new(handles);

    let mut host = RecordingHost::default();

    for _ in 0..2_000 {
        let before = handshake.state();

        let mut reset_requested = false;

        for _ in 0..rng.gen_range(1..=4) {
            let event = match rng.gen_range(0..7) {
                0 => Event::Connected,
                1 => Event::Disconnected { reason: 0x13 },
                2 => bonded(),
                3 => Event::SubscriptionEnabled {
                    attribute: handles.commands,
                },
                4 | 5 => Event::DataWritten {
                    attribute: handles.central_to_device,
                    data: response(&mut rng),
                },
                _ => Event::DataWritten {
                    attribute: handles.central_to_device,
                    data: vec![0x01; rng.gen_range(0..RESPONSE_LEN)],
                },
            };

            if let Event::DataWritten { data, .. } = &event {
                channel.receive(data).unwrap();
            }

            let is_disconnection = matches!(event, Event::Disconnected { .. });

            let submitted = handshake.submit(&event);

            if is_disconnection {
                assert!(submitted.is_ok());

                reset_requested = true;
            } else if reset_requested {
                assert!(submitted.is_err(), "{:?} overrode a pending reset", event);
            }
        }

        handshake.poll(&mut channel, &mut host).ok();

        let after = handshake.state();

        if reset_requested {
            assert_eq!(HandshakeState::Idle, after);
        } else {
            assert!(after == before || before.next() == Some(after), "{:?} -> {:?}", before, after);
        }

        match handshake.pending() {
            None => (),
            Some(pending) => {
                assert_eq!(HandshakeState::Subscribed, after);
                assert_eq!(HandshakeState::ChallengeSent, pending);
            }
        }
    }
}
