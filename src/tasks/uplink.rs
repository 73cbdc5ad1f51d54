//! Uplink task: one telemetry frame per trigger.
//!
//! Join guard, fresh sensor snapshot, heading filter step, battery level,
//! encode, send. The task never retries; a failed cycle is simply followed by
//! the next trigger.

use embassy_time::Duration;

use crate::config::NodeConfig;
use crate::drivers::heading::{self, HeadingFilterState};
use crate::drivers::telemetry::{self, battery_level};
use crate::error::UplinkError;
use crate::platform::{Platform, ProtocolEngine, SensorBus};
use crate::state::{Confirm, UplinkFrame};

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UplinkOutcome {
    /// Not joined; a join request was issued instead of a send.
    JoinRequested,
    Sent(UplinkReport),
}

/// Summary of a frame handed to the engine.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UplinkReport {
    pub heading: f32,
    pub battery_level: u8,
    pub len: usize,
}

pub struct UplinkTask {
    heading: HeadingFilterState,
    port: u8,
    confirm: Confirm,
    tx_indicator: Duration,
}

impl UplinkTask {
    pub fn new(config: &NodeConfig) -> Self {
        Self {
            heading: HeadingFilterState::new(config.heading),
            port: config.ports.application,
            confirm: config.confirm,
            tx_indicator: config.tx_indicator,
        }
    }

    pub fn heading_state(&self) -> &HeadingFilterState {
        &self.heading
    }

    pub fn run<E, S, P>(
        &mut self,
        engine: &mut E,
        sensors: &mut S,
        platform: &mut P,
    ) -> Result<UplinkOutcome, UplinkError<S::Error, E::Error>>
    where
        E: ProtocolEngine,
        S: SensorBus,
        P: Platform,
    {
        if !engine.is_joined() {
            info!("not joined, requesting join");
            engine.request_join();
            return Ok(UplinkOutcome::JoinRequested);
        }

        let snapshot = sensors.read_snapshot().map_err(UplinkError::Sensor)?;
        debug!(
            "T={}C H={}% P={}hPa",
            snapshot.temperature, snapshot.humidity, snapshot.pressure
        );

        let heading = heading::update(&mut self.heading, &snapshot);
        let battery = battery_level(platform.battery_millivolts(), platform.battery_calibration());
        debug!("heading {} battery {}", heading, battery);

        let payload = telemetry::encode(&snapshot, heading, battery);
        let frame = UplinkFrame::telemetry(self.port, &payload);

        log_link_state(engine);
        debug!("payload {=[u8]:x}", frame.payload.as_slice());

        platform.flash_tx_indicator(self.tx_indicator);
        engine.send(&frame, self.confirm).map_err(UplinkError::Send)?;
        info!("uplink {} bytes on port {}", frame.len(), frame.port);

        Ok(UplinkOutcome::Sent(UplinkReport {
            heading,
            battery_level: battery,
            len: frame.len(),
        }))
    }
}

fn log_link_state<E: ProtocolEngine>(engine: &E) {
    let data_rate = engine.data_rate();
    let tx_power = engine.tx_power();
    // Word 4 holds the enabled sub-band on US915-style plans
    let sub_band = engine.channel_mask().map(|mask| mask[4]);
    info!(
        "DR {} txpower {} sub-band {:?}",
        data_rate, tx_power, sub_band
    );
}
