//! The sensor node: collaborators, uplink state and stack event handling.
//!
//! [`Node`] is what the scheduler drives. It owns the protocol engine, the
//! sensor bus and the board, and turns the engine's events into downlink
//! actions and the small protocol-level uplinks LoRaWAN expects.

use heapless::Deque;

use crate::config::NodeConfig;
use crate::drivers::downlink::{self, DownlinkCommand};
use crate::drivers::telemetry;
use crate::error::UplinkError;
use crate::platform::{Platform, ProtocolEngine, SensorBus, StackEvent, StackHost, StackParams};
use crate::state::{Confirm, UplinkFrame};
use crate::tasks::scheduler::NodeTasks;
use crate::tasks::uplink::{UplinkOutcome, UplinkTask};

/// Events buffered during one housekeeping pass.
pub const EVENT_QUEUE_LEN: usize = 4;

pub struct Node<E, S, P> {
    config: NodeConfig,
    engine: E,
    sensors: S,
    platform: P,
    uplink: UplinkTask,
    events: Deque<StackEvent, EVENT_QUEUE_LEN>,
}

impl<E, S, P> Node<E, S, P>
where
    E: ProtocolEngine,
    S: SensorBus,
    P: Platform,
{
    pub fn new(config: NodeConfig, engine: E, sensors: S, platform: P) -> Self {
        Self {
            uplink: UplinkTask::new(&config),
            config,
            engine,
            sensors,
            platform,
            events: Deque::new(),
        }
    }

    /// Configure the engine and issue the first join request.
    pub fn start(&mut self) {
        let params = StackParams {
            adr: self.config.adr,
            data_rate: self.config.default_data_rate,
            public_network: self.config.public_network,
            network_server: self.config.network_server,
            dev_eui: self.platform.unique_id(),
            random_seed: self.platform.random_seed(),
        };
        info!("starting, DevEui {=[u8]:x}", params.dev_eui.as_slice());
        self.engine.configure(&params);
        self.engine.request_join();
    }

    /// One uplink cycle.
    pub fn uplink(&mut self) -> Result<UplinkOutcome, UplinkError<S::Error, E::Error>> {
        self.uplink
            .run(&mut self.engine, &mut self.sensors, &mut self.platform)
    }

    /// Let the engine do its housekeeping, then act on what it reported.
    pub fn housekeeping(&mut self) {
        let mut host = Host {
            platform: &mut self.platform,
            events: &mut self.events,
        };
        self.engine.process(&mut host);

        while let Some(event) = self.events.pop_front() {
            self.handle_event(event);
        }
    }

    pub fn on_frame_received(&mut self, port: u8, payload: &[u8]) -> Option<DownlinkCommand> {
        downlink::dispatch(
            &self.config.ports,
            port,
            payload,
            &mut self.engine,
            &mut self.platform,
        )
    }

    pub fn battery_level(&mut self) -> u8 {
        read_battery_level(&mut self.platform)
    }

    fn handle_event(&mut self, event: StackEvent) {
        match event {
            StackEvent::Joined => {
                info!("joined");
                self.engine.request_class(self.config.default_class);
                self.engine.set_data_rate(self.config.default_data_rate);
            }
            StackEvent::ClassConfirmed(class) => {
                info!("switched to class {=char}", class.as_char());
                // Tell the server the switch is done
                self.send_empty();
            }
            StackEvent::TxNeeded => {
                debug!("server requested an uplink");
                self.send_empty();
            }
            StackEvent::Received(frame) => {
                self.on_frame_received(frame.port, &frame.payload);
            }
        }
    }

    fn send_empty(&mut self) {
        let frame = UplinkFrame::empty(self.config.ports.application);
        if self.engine.send(&frame, Confirm::Unconfirmed).is_err() {
            warn!("empty uplink rejected");
        }
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn sensors_mut(&mut self) -> &mut S {
        &mut self.sensors
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    pub fn uplink_task(&self) -> &UplinkTask {
        &self.uplink
    }
}

impl<E, S, P> NodeTasks for Node<E, S, P>
where
    E: ProtocolEngine,
    S: SensorBus,
    P: Platform,
{
    fn run_uplink(&mut self) {
        match self.uplink() {
            Ok(UplinkOutcome::JoinRequested) => {}
            Ok(UplinkOutcome::Sent(report)) => {
                debug!("sent, heading {} battery {}", report.heading, report.battery_level);
            }
            Err(UplinkError::Sensor(_)) => warn!("uplink aborted: sensor read failed"),
            Err(UplinkError::Send(_)) => warn!("uplink aborted: send rejected"),
        }
    }

    fn run_housekeeping(&mut self) {
        self.housekeeping();
    }
}

fn read_battery_level<P: Platform>(platform: &mut P) -> u8 {
    telemetry::battery_level(platform.battery_millivolts(), platform.battery_calibration())
}

/// The engine's view of the node during `process`.
struct Host<'a, P> {
    platform: &'a mut P,
    events: &'a mut Deque<StackEvent, EVENT_QUEUE_LEN>,
}

impl<P: Platform> StackHost for Host<'_, P> {
    fn battery_level(&mut self) -> u8 {
        read_battery_level(&mut *self.platform)
    }

    fn temperature_level(&mut self) -> u16 {
        self.platform.temperature_level()
    }

    fn notify(&mut self, event: StackEvent) {
        if self.events.push_back(event).is_err() {
            warn!("stack event queue full, event dropped");
        }
    }
}
