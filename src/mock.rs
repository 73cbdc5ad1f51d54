//! Recording collaborators for unit tests.
//!
//! Every mock appends to one shared [`CallLog`] so tests can assert on the
//! order of effects across engine, sensors and board.

use std::cell::RefCell;
use std::rc::Rc;
use std::vec::Vec;

use embassy_time::Duration;

use crate::drivers::telemetry::BatteryCalibration;
use crate::platform::{
    Actuator, ClassControl, OneShotTimer, Platform, ProtocolEngine, SensorBus, StackEvent,
    StackHost, StackParams,
};
use crate::state::{Axes, Confirm, DeviceClass, SensorSnapshot, UplinkFrame};

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Configure(StackParams),
    Join,
    RequestClass(DeviceClass),
    SetDataRate(u8),
    Send {
        port: u8,
        payload: Vec<u8>,
        confirm: Confirm,
    },
    Process,
    ReadSnapshot,
    Flash(Duration),
    Actuator(bool),
    TimerStart(Duration),
}

#[derive(Clone, Default)]
pub struct CallLog(Rc<RefCell<Vec<Call>>>);

impl CallLog {
    pub fn push(&self, call: Call) {
        self.0.borrow_mut().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.borrow().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.0.borrow().iter().filter(|c| pred(*c)).count()
    }

    pub fn sent(&self) -> Vec<(u8, Vec<u8>, Confirm)> {
        self.0
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Call::Send {
                    port,
                    payload,
                    confirm,
                } => Some((*port, payload.clone(), *confirm)),
                _ => None,
            })
            .collect()
    }
}

// ── Engine ────────────────────────────────────────────────────────────────────

pub struct MockEngine {
    pub log: CallLog,
    pub joined: bool,
    pub reject_sends: bool,
    /// Delivered to the host on the next `process`.
    pub pending: Vec<StackEvent>,
    /// Battery level the host reported during the last `process`.
    pub host_battery: Option<u8>,
    pub host_temperature: Option<u16>,
}

impl MockEngine {
    pub fn new(log: &CallLog) -> Self {
        Self {
            log: log.clone(),
            joined: true,
            reject_sends: false,
            pending: Vec::new(),
            host_battery: None,
            host_temperature: None,
        }
    }
}

impl ClassControl for MockEngine {
    fn request_class(&mut self, class: DeviceClass) {
        self.log.push(Call::RequestClass(class));
    }
}

impl ProtocolEngine for MockEngine {
    type Error = &'static str;

    fn configure(&mut self, params: &StackParams) {
        self.log.push(Call::Configure(*params));
    }

    fn is_joined(&self) -> bool {
        self.joined
    }

    fn request_join(&mut self) {
        self.log.push(Call::Join);
    }

    fn send(&mut self, frame: &UplinkFrame, confirm: Confirm) -> Result<(), Self::Error> {
        self.log.push(Call::Send {
            port: frame.port,
            payload: frame.payload.to_vec(),
            confirm,
        });
        if self.reject_sends {
            Err("duty cycle restricted")
        } else {
            Ok(())
        }
    }

    fn process(&mut self, host: &mut dyn StackHost) {
        self.log.push(Call::Process);
        self.host_battery = Some(host.battery_level());
        self.host_temperature = Some(host.temperature_level());
        for event in self.pending.drain(..) {
            host.notify(event);
        }
    }

    fn set_data_rate(&mut self, data_rate: u8) {
        self.log.push(Call::SetDataRate(data_rate));
    }

    fn data_rate(&self) -> Option<u8> {
        Some(3)
    }

    fn tx_power(&self) -> Option<i8> {
        Some(14)
    }

    fn channel_mask(&self) -> Option<[u16; 6]> {
        Some([0, 0, 0, 0, 0x00FF, 0])
    }
}

// ── Sensors ───────────────────────────────────────────────────────────────────

pub struct MockSensors {
    pub log: CallLog,
    pub snapshot: SensorSnapshot,
    pub fail: bool,
}

impl MockSensors {
    pub fn new(log: &CallLog) -> Self {
        Self {
            log: log.clone(),
            snapshot: level_snapshot(),
            fail: false,
        }
    }
}

impl SensorBus for MockSensors {
    type Error = &'static str;

    fn read_snapshot(&mut self) -> Result<SensorSnapshot, Self::Error> {
        self.log.push(Call::ReadSnapshot);
        if self.fail {
            Err("i2c nack")
        } else {
            Ok(self.snapshot)
        }
    }
}

/// Board lying flat, sensors at room conditions.
pub fn level_snapshot() -> SensorSnapshot {
    SensorSnapshot {
        humidity: 40.0,
        temperature: 21.5,
        pressure: 1013.2,
        magneto: Axes::new(3061, -3354, 3108),
        accelero: Axes::new(0.0, 0.0, 1000.0),
        accelero_raw: Axes::new(0, 0, 16384),
        gyro: Axes::new(0, 0, 0),
    }
}

// ── Board ─────────────────────────────────────────────────────────────────────

pub struct MockPlatform {
    pub log: CallLog,
    pub millivolts: u16,
    pub calibration: BatteryCalibration,
    pub temperature: u16,
}

impl MockPlatform {
    pub fn new(log: &CallLog) -> Self {
        Self {
            log: log.clone(),
            millivolts: 2400,
            calibration: BatteryCalibration {
                full_charge_mv: 3000,
                min_charge_mv: 1800,
            },
            temperature: 21,
        }
    }
}

impl Actuator for MockPlatform {
    fn set_actuator(&mut self, on: bool) {
        self.log.push(Call::Actuator(on));
    }
}

impl Platform for MockPlatform {
    fn battery_millivolts(&mut self) -> u16 {
        self.millivolts
    }

    fn battery_calibration(&self) -> BatteryCalibration {
        self.calibration
    }

    fn unique_id(&self) -> [u8; 8] {
        [0x00, 0x80, 0xE1, 0x15, 0x00, 0x0A, 0x2B, 0x3C]
    }

    fn random_seed(&mut self) -> u32 {
        0xDEAD_BEEF
    }

    fn temperature_level(&mut self) -> u16 {
        self.temperature
    }

    fn flash_tx_indicator(&mut self, duration: Duration) {
        self.log.push(Call::Flash(duration));
    }
}

pub struct MockTimer {
    pub log: CallLog,
}

impl OneShotTimer for MockTimer {
    fn start(&mut self, after: Duration) {
        self.log.push(Call::TimerStart(after));
    }
}
