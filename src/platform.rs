//! Collaborator interfaces.
//!
//! The control core never touches the radio, the sensor bus or the board
//! directly. Each of those is reached through one of the traits below; a board
//! support crate implements them on top of its HAL and LoRaWAN stack.

use core::fmt::Debug;

use embassy_time::Duration;
use heapless::Vec;

use crate::config::{NetworkServer, MAX_DOWNLINK_LEN};
use crate::drivers::telemetry::BatteryCalibration;
use crate::state::{Confirm, DeviceClass, SensorSnapshot, UplinkFrame};

// ── Capabilities used by the downlink dispatcher ──────────────────────────────

/// Application actuator driven by downlinks (the user LED on the reference board).
pub trait Actuator {
    fn set_actuator(&mut self, on: bool);
}

/// Device class switching, provided by the protocol engine.
pub trait ClassControl {
    /// Ask for a class change; completion arrives as
    /// [`StackEvent::ClassConfirmed`].
    fn request_class(&mut self, class: DeviceClass);
}

// ── Protocol engine ───────────────────────────────────────────────────────────

/// A frame received by the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Downlink {
    pub port: u8,
    pub payload: Vec<u8, MAX_DOWNLINK_LEN>,
}

impl Downlink {
    /// Returns `None` if `bytes` exceeds the LoRaWAN payload limit.
    pub fn new(port: u8, bytes: &[u8]) -> Option<Self> {
        Vec::from_slice(bytes)
            .ok()
            .map(|payload| Self { port, payload })
    }
}

/// Notifications the engine raises while doing housekeeping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StackEvent {
    /// Join accepted.
    Joined,
    /// A requested class change took effect.
    ClassConfirmed(DeviceClass),
    /// The network wants an uplink (pending MAC answers, frame pending bit).
    TxNeeded,
    Received(Downlink),
}

/// Start-up parameters for the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StackParams {
    pub adr: bool,
    pub data_rate: u8,
    pub public_network: bool,
    pub network_server: NetworkServer,
    pub dev_eui: [u8; 8],
    pub random_seed: u32,
}

/// Callbacks the engine uses from inside [`ProtocolEngine::process`].
pub trait StackHost {
    /// Battery level on the LoRaWAN 0..=254 scale.
    fn battery_level(&mut self) -> u8;
    fn temperature_level(&mut self) -> u16;
    /// Queue an event for handling once `process` returns. Bounded; see
    /// [`ProtocolEngine::process`].
    fn notify(&mut self, event: StackEvent);
}

/// LoRaWAN protocol engine: joining, session state, ADR, retransmissions.
pub trait ProtocolEngine: ClassControl {
    type Error: Debug;

    fn configure(&mut self, params: &StackParams);
    fn is_joined(&self) -> bool;
    fn request_join(&mut self);
    /// Queue `frame` for transmission. The engine must not keep a reference to
    /// the frame past this call.
    fn send(&mut self, frame: &UplinkFrame, confirm: Confirm) -> Result<(), Self::Error>;
    /// Housekeeping entry point; run whenever the engine has signalled work.
    ///
    /// At most [`EVENT_QUEUE_LEN`] calls to [`StackHost::notify`] are accepted
    /// per call; further events, received frames included, are dropped. An
    /// engine with more to report must hold it back and signal again, so the
    /// rest is delivered on the next pass.
    ///
    /// [`EVENT_QUEUE_LEN`]: crate::node::EVENT_QUEUE_LEN
    fn process(&mut self, host: &mut dyn StackHost);
    fn set_data_rate(&mut self, data_rate: u8);

    // Diagnostics only

    fn data_rate(&self) -> Option<u8>;
    fn tx_power(&self) -> Option<i8>;
    fn channel_mask(&self) -> Option<[u16; 6]>;
}

// ── Sensors and board ─────────────────────────────────────────────────────────

/// Environmental and motion sensor shield.
pub trait SensorBus {
    type Error: Debug;

    fn read_snapshot(&mut self) -> Result<SensorSnapshot, Self::Error>;
}

/// Board services.
pub trait Platform: Actuator {
    fn battery_millivolts(&mut self) -> u16;
    fn battery_calibration(&self) -> BatteryCalibration;
    fn unique_id(&self) -> [u8; 8];
    fn random_seed(&mut self) -> u32;
    fn temperature_level(&mut self) -> u16;
    /// Light the TX indicator and switch it off again after `duration`.
    fn flash_tx_indicator(&mut self, duration: Duration);
}

/// Single-shot timer; `start` (re)arms it.
pub trait OneShotTimer {
    fn start(&mut self, after: Duration);
}
