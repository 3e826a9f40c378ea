//! The accessory
//!
//! A [`Peripheral`] owns everything the accessory consists of: the handle to the platform
//! [`Host`], the GATT layout and its value holders, the [`CommandChannel`], and the
//! [`Handshake`]. Events from the host are fed to it one at a time through [`process`], which
//! routes the event, submits it to the handshake, and then polls the handshake. The handshake is
//! also polled on a fixed cadence through [`tick`].
//!
//! With the `tokio` feature [`run`] does both from a single task, taking events from a queue and
//! ticking with an interval of [`Config::tick_interval`].
//!
//! [`process`]: Peripheral::process
//! [`tick`]: Peripheral::tick
//! [`run`]: Peripheral::run

use crate::channel::CommandChannel;
use crate::config::Config;
use crate::gatt::battery::BatteryService;
use crate::gatt::certificate::CertificateHandles;
use crate::gatt::control::ControlService;
use crate::gatt::{ServerBuilder, ServerLayout};
use crate::handshake::{Applied, Event, Handshake, HandshakeState, NoOp};
use crate::host::Host;

/// The accessory, driven by the events of the BLE host `H`
pub struct Peripheral<H> {
    host: H,
    config: Config,
    layout: ServerLayout,
    certificate: CertificateHandles,
    control: ControlService,
    battery: BatteryService,
    channel: CommandChannel,
    handshake: Handshake,
}

impl<H: Host> Peripheral<H> {
    /// Create a new `Peripheral`
    ///
    /// This builds the GATT layout, registers it with `host`, and starts advertising.
    pub fn new(mut host: H, config: Config) -> Self {
        let mut builder = ServerBuilder::new();

        let certificate = CertificateHandles::register(&mut builder);

        let control = ControlService::register(&mut builder);

        let battery = BatteryService::register(&mut builder);

        let layout = builder.build();

        host.register_services(&layout);

        host.start_advertising(&config.advertising);

        log::info!(
            "advertising as '{}' with device address {}",
            config.advertising.device_name,
            host.local_address()
        );

        Peripheral {
            host,
            config,
            layout,
            certificate,
            control,
            battery,
            channel: CommandChannel::new(certificate),
            handshake: Handshake::new(certificate),
        }
    }

    /// Process an event from the host
    ///
    /// The event is first applied to the attribute values and the link housekeeping, then
    /// submitted to the handshake, and finally the handshake is polled. The return is the result
    /// of the poll.
    pub fn process(&mut self, event: Event) -> Result<Applied, NoOp> {
        match &event {
            Event::Connected => log::info!("connected"),
            Event::Disconnected { reason } => self.on_disconnection(*reason),
            Event::DataWritten { attribute, data } if *attribute == self.certificate.central_to_device => {
                if let Err(e) = self.channel.receive(data) {
                    log::error!("dropped write to {}: {}", attribute, e);

                    return self.tick();
                }
            }
            Event::DataWritten { attribute, data } => {
                if !self.control.on_write(*attribute, data) {
                    log::debug!("ignored write to {}", attribute);
                }
            }
            Event::BondingCompleted { .. } | Event::SubscriptionEnabled { .. } => (),
        }

        // a rejection is logged by the handshake and otherwise ignored
        self.handshake.submit(&event).ok();

        self.tick()
    }

    fn on_disconnection(&mut self, reason: u8) {
        log::info!("disconnected, reason: {:#04X}", reason);

        if self.config.purges_bonds_on(reason) {
            log::warn!("purging all bonding state");

            self.host.purge_bonding_state();
        }

        self.host.start_advertising(&self.config.advertising);
    }

    /// Poll the handshake
    pub fn tick(&mut self) -> Result<Applied, NoOp> {
        self.handshake.poll(&mut self.channel, &mut self.host)
    }

    /// Get the current state of the handshake
    pub fn state(&self) -> HandshakeState {
        self.handshake.state()
    }

    pub fn is_paired(&self) -> bool {
        self.handshake.state().is_paired()
    }

    /// Set the button state notified to the central
    pub fn set_button(&mut self, state: u8) {
        self.control.set_button(&mut self.host, state)
    }

    /// Set the battery level (percent)
    pub fn set_battery_level(&mut self, level: u8) {
        self.battery.set_level(&mut self.host, level)
    }

    /// Set the firmware version value
    pub fn set_version(&mut self, version: u8) {
        self.control.set_version(&mut self.host, version)
    }

    pub fn handshake(&self) -> &Handshake {
        &self.handshake
    }

    pub fn channel(&self) -> &CommandChannel {
        &self.channel
    }

    pub fn layout(&self) -> &ServerLayout {
        &self.layout
    }

    pub fn certificate_handles(&self) -> &CertificateHandles {
        &self.certificate
    }

    pub fn control(&self) -> &ControlService {
        &self.control
    }

    pub fn battery(&self) -> &BatteryService {
        &self.battery
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }
}

#[cfg(feature = "tokio")]
impl<H: Host> Peripheral<H> {
    /// Run the peripheral
    ///
    /// Events are taken from `events` and processed in the order they are received. In between,
    /// the handshake is polled every [`Config::tick_interval`]. The peripheral is returned once
    /// every sender of `events` is dropped.
    pub async fn run(mut self, mut events: tokio::sync::mpsc::Receiver<Event>) -> Self {
        use tokio::time::{interval, MissedTickBehavior};

        let period = self.config.tick_interval().max(core::time::Duration::from_millis(1));

        let mut ticker = interval(period);

        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => {
                        self.process(event).ok();
                    }
                    None => break,
                },

                _ = ticker.tick() => {
                    self.tick().ok();
                }
            }
        }

        log::debug!("event queue closed");

        self
    }
}

impl<H> core::fmt::Debug for Peripheral<H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Peripheral")
            .field("handshake", &self.handshake)
            .field("channel", &self.channel)
            .finish()
    }
}
