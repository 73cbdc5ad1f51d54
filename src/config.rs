//! Node configuration.
//!
//! Everything is fixed at build time; nothing here survives a reset except
//! through the firmware image itself.

use embassy_time::Duration;

use crate::state::{Confirm, DeviceClass};

// ── Constants ─────────────────────────────────────────────────────────────────

/// Application data buffer size.
pub const APP_DATA_BUFF_SIZE: usize = 64;
/// Largest LoRaWAN downlink application payload.
pub const MAX_DOWNLINK_LEN: usize = 242;
/// Battery level reported at (or above) full charge.
pub const MAX_BATTERY_LEVEL: u8 = 254;

/// Magnetometer low-pass factor.
pub const MAG_LPF_FACTOR: f32 = 0.4;
/// Accelerometer low-pass factor.
pub const ACC_LPF_FACTOR: f32 = 0.1;

/// Application uplink port. 224 is reserved for certification.
pub const APP_PORT: u8 = 2;
/// Downlink port that switches the device class.
pub const CLASS_SWITCH_PORT: u8 = 3;
/// Downlink port carrying the Cayenne LPP style actuator command.
pub const LPP_APP_PORT: u8 = 99;

pub const DEFAULT_DUTY_CYCLE: Duration = Duration::from_millis(10_000);
pub const DEFAULT_TX_INDICATOR: Duration = Duration::from_millis(200);
pub const DEFAULT_DATA_RATE: u8 = 3;

// ── Types ─────────────────────────────────────────────────────────────────────

/// What starts an uplink.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TxTrigger {
    /// Periodic duty-cycle timer.
    #[default]
    Timer,
    /// User button interrupt.
    Button,
}

/// Network server profile handed to the engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NetworkServer {
    #[default]
    Everynet,
    Ttn,
}

/// Downlink port assignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PortMap {
    pub class_switch: u8,
    /// Shared by uplinks and the single-byte actuator downlink.
    pub application: u8,
    pub alternate: u8,
}

impl Default for PortMap {
    fn default() -> Self {
        Self {
            class_switch: CLASS_SWITCH_PORT,
            application: APP_PORT,
            alternate: LPP_APP_PORT,
        }
    }
}

/// Low-pass factors of the heading filter.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HeadingConfig {
    pub mag_alpha: f32,
    pub acc_alpha: f32,
}

impl Default for HeadingConfig {
    fn default() -> Self {
        Self {
            mag_alpha: MAG_LPF_FACTOR,
            acc_alpha: ACC_LPF_FACTOR,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeConfig {
    pub duty_cycle: Duration,
    pub tx_trigger: TxTrigger,
    /// How long the TX indicator stays lit after a send.
    pub tx_indicator: Duration,
    pub ports: PortMap,
    pub confirm: Confirm,
    /// Class requested once the node has joined.
    pub default_class: DeviceClass,
    /// Only used by the engine while ADR is off.
    pub default_data_rate: u8,
    pub adr: bool,
    pub public_network: bool,
    pub network_server: NetworkServer,
    pub heading: HeadingConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            duty_cycle: DEFAULT_DUTY_CYCLE,
            tx_trigger: TxTrigger::Timer,
            tx_indicator: DEFAULT_TX_INDICATOR,
            ports: PortMap::default(),
            confirm: Confirm::Unconfirmed,
            default_class: DeviceClass::A,
            default_data_rate: DEFAULT_DATA_RATE,
            adr: true,
            public_network: true,
            network_server: NetworkServer::Everynet,
            heading: HeadingConfig::default(),
        }
    }
}
