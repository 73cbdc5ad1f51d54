//! Shared data types passed between the sensor bus, the tasks and the engine.
//!
//! Sample types are `Copy`; frames own a fixed-capacity buffer.

use heapless::Vec;

use crate::config::APP_DATA_BUFF_SIZE;
use crate::drivers::telemetry::FRAME_LEN;

const _: () = assert!(FRAME_LEN <= APP_DATA_BUFF_SIZE);

// ── Sensor data ───────────────────────────────────────────────────────────────

/// Three-axis sample.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Axes<T> {
    pub x: T,
    pub y: T,
    pub z: T,
}

impl<T> Axes<T> {
    pub const fn new(x: T, y: T, z: T) -> Self {
        Self { x, y, z }
    }
}

impl<T: Copy> Axes<T> {
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Axes<U> {
        Axes {
            x: f(self.x),
            y: f(self.y),
            z: f(self.z),
        }
    }

    /// Pairwise combination with another sample.
    pub fn zip_with<U: Copy, V>(self, other: Axes<U>, mut f: impl FnMut(T, U) -> V) -> Axes<V> {
        Axes {
            x: f(self.x, other.x),
            y: f(self.y, other.y),
            z: f(self.z, other.z),
        }
    }
}

/// One reading of every sensor on the shield, taken fresh for each uplink.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorSnapshot {
    /// %RH
    pub humidity: f32,
    /// °C
    pub temperature: f32,
    /// hPa
    pub pressure: f32,
    /// mGauss
    pub magneto: Axes<i32>,
    /// mg
    pub accelero: Axes<f32>,
    /// Raw accelerometer output, LSB
    pub accelero_raw: Axes<i16>,
    /// mdps
    pub gyro: Axes<i32>,
}

// ── LoRaWAN ───────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceClass {
    A,
    B,
    C,
}

impl DeviceClass {
    /// Class selector as carried by the class-switch downlink.
    pub fn from_selector(selector: u8) -> Option<Self> {
        match selector {
            0 => Some(Self::A),
            1 => Some(Self::B),
            2 => Some(Self::C),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Self::A => 'A',
            Self::B => 'B',
            Self::C => 'C',
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Confirm {
    #[default]
    Unconfirmed,
    Confirmed,
}

/// Application payload plus the port it is sent on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UplinkFrame {
    pub port: u8,
    pub payload: Vec<u8, APP_DATA_BUFF_SIZE>,
}

impl UplinkFrame {
    /// Zero-length frame, used to give the server a chance to answer.
    pub fn empty(port: u8) -> Self {
        Self {
            port,
            payload: Vec::new(),
        }
    }

    pub fn telemetry(port: u8, bytes: &[u8; FRAME_LEN]) -> Self {
        let payload = bytes.iter().copied().collect();
        Self { port, payload }
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}
