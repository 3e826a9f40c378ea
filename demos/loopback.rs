//! Handshake against a simulated central
//!
//! This runs the accessory on top of a simulated BLE host. A scripted central connects, bonds,
//! subscribes to the commands characteristic, and answers the challenge (first with a malformed
//! response, then with a correct one) before disconnecting.
//!
//! ```text
//! cargo run --example loopback -- --log-level debug
//! cargo run --example loopback -- --config accessory.yaml
//! ```

use clap::Parser;
use sfida_peripheral::channel::{Command, COMMAND_LEN};
use sfida_peripheral::config::AdvertisingConfig;
use sfida_peripheral::gatt::certificate::CertificateHandles;
use sfida_peripheral::gatt::{AttributeHandle, ServerLayout};
use sfida_peripheral::handshake::BondingStatus;
use sfida_peripheral::{payload, BluetoothDeviceAddress, Config, Event, Host, Peripheral};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Parser, Debug)]
#[command(about = "Run the Sfida handshake against a simulated central")]
struct Args {
    /// YAML configuration of the accessory
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, default_value = "info")]
    log_level: simplelog::LevelFilter,

    /// Address of the simulated accessory, least significant byte first
    #[arg(short, long, value_parser = parse_address, default_value = "01:23:45:67:89:ab")]
    address: BluetoothDeviceAddress,
}

fn parse_address(s: &str) -> Result<BluetoothDeviceAddress, String> {
    let mut address = [0u8; 6];

    let mut parts = s.split(':');

    for byte in address.iter_mut() {
        let part = parts.next().ok_or_else(|| format!("'{}' has less than six bytes", s))?;

        *byte = u8::from_str_radix(part, 16).map_err(|e| format!("invalid byte '{}': {}", part, e))?;
    }

    if parts.next().is_some() {
        return Err(format!("'{}' has more than six bytes", s));
    }

    Ok(BluetoothDeviceAddress(address))
}

/// A BLE host that forwards every published value to the simulated central
struct SimulatedHost {
    address: BluetoothDeviceAddress,
    to_central: mpsc::UnboundedSender<(AttributeHandle, Vec<u8>)>,
}

impl Host for SimulatedHost {
    fn register_services(&mut self, layout: &ServerLayout) {
        log::info!("registered {} attributes", layout.attributes().len());
    }

    fn publish(&mut self, attribute: AttributeHandle, value: &[u8]) {
        self.to_central.send((attribute, value.to_vec())).ok();
    }

    fn local_address(&self) -> BluetoothDeviceAddress {
        self.address
    }

    fn purge_bonding_state(&mut self) {
        log::info!("bonding state purged");
    }

    fn start_advertising(&mut self, config: &AdvertisingConfig) {
        log::info!(
            "advertising '{}' every {:?}, vendor id {:02X?}",
            config.device_name,
            config.advertising_interval(),
            config.vendor_id
        );
    }
}

async fn central(
    handles: CertificateHandles,
    events: mpsc::Sender<Event>,
    mut from_peripheral: mpsc::UnboundedReceiver<(AttributeHandle, Vec<u8>)>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    events.send(Event::Connected).await?;

    events
        .send(Event::BondingCompleted {
            status: BondingStatus::Success,
        })
        .await?;

    events
        .send(Event::SubscriptionEnabled {
            attribute: handles.commands,
        })
        .await?;

    let mut frame = Vec::new();

    while let Some((handle, value)) = from_peripheral.recv().await {
        if handle == handles.device_to_central {
            frame = value;
        } else if handle == handles.commands && value[..] == Command::CHALLENGE.0 {
            break;
        }
    }

    let offset = COMMAND_LEN + payload::ADDRESS_OFFSET;

    if frame.len() < offset + 6 {
        return Err("the peripheral stopped before sending a challenge".into());
    }

    let mut address = [0u8; 6];

    address.copy_from_slice(&frame[offset..offset + 6]);
    address.reverse();

    println!(
        "central: received a challenge of {} bytes from {}",
        frame.len(),
        BluetoothDeviceAddress(address)
    );

    events
        .send(Event::DataWritten {
            attribute: handles.central_to_device,
            data: vec![0x01; 19],
        })
        .await?;

    tokio::time::sleep(Duration::from_millis(200)).await;

    let mut response = Command::CHALLENGE_RESPONSE.0.to_vec();

    response.extend_from_slice(&[0x3C; 16]);

    events
        .send(Event::DataWritten {
            attribute: handles.central_to_device,
            data: response,
        })
        .await?;

    tokio::time::sleep(Duration::from_millis(200)).await;

    events.send(Event::Disconnected { reason: 0x13 }).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use simplelog::{ColorChoice, TermLogger, TerminalMode};

    let args = Args::parse();

    TermLogger::init(
        args.log_level,
        simplelog::Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )?;

    let config: Config = match args.config {
        Some(path) => serde_yaml::from_reader(std::fs::File::open(path)?)?,
        None => Config::default(),
    };

    let (to_central, from_peripheral) = mpsc::unbounded_channel();

    let host = SimulatedHost {
        address: args.address,
        to_central,
    };

    let peripheral = Peripheral::new(host, config);

    let handles = *peripheral.certificate_handles();

    let (event_sender, event_receiver) = mpsc::channel(16);

    let central_task = tokio::spawn(central(handles, event_sender, from_peripheral));

    // the peripheral stops once the central drops its event sender
    let peripheral = peripheral.run(event_receiver).await;

    central_task.await?.map_err(|e| e.to_string())?;

    println!("accessory finished in state {:?}", peripheral.state());

    Ok(())
}
