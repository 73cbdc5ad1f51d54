//! Downlink command decoding.
//!
//! Three ports carry commands; everything else, and any frame whose length
//! does not fit its port, is dropped without complaint.

use crate::config::PortMap;
use crate::platform::{Actuator, ClassControl};
use crate::state::DeviceClass;

/// Alternate-format byte that switches the actuator on.
pub const LPP_ACTUATOR_ON: u8 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DownlinkPort {
    ClassSwitch,
    /// Same port as the telemetry uplink.
    Application,
    /// Cayenne LPP style digital output.
    Alternate,
    Unrecognized(u8),
}

impl DownlinkPort {
    pub fn classify(port: u8, ports: &PortMap) -> Self {
        match port {
            p if p == ports.class_switch => Self::ClassSwitch,
            p if p == ports.application => Self::Application,
            p if p == ports.alternate => Self::Alternate,
            p => Self::Unrecognized(p),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DownlinkCommand {
    RequestClass(DeviceClass),
    SetActuator(bool),
}

impl DownlinkCommand {
    pub fn parse(ports: &PortMap, port: u8, payload: &[u8]) -> Option<Self> {
        match (DownlinkPort::classify(port, ports), payload) {
            (DownlinkPort::ClassSwitch, &[selector]) => {
                DeviceClass::from_selector(selector).map(Self::RequestClass)
            }
            (DownlinkPort::Application, &[state]) => Some(Self::SetActuator(state & 0x01 != 0)),
            (DownlinkPort::Alternate, &[_, _, value, ..]) => {
                Some(Self::SetActuator(value == LPP_ACTUATOR_ON))
            }
            _ => None,
        }
    }
}

/// Decode one received frame and apply it. Returns the command that was
/// applied, if any.
pub fn dispatch(
    ports: &PortMap,
    port: u8,
    payload: &[u8],
    class_control: &mut impl ClassControl,
    actuator: &mut impl Actuator,
) -> Option<DownlinkCommand> {
    let Some(command) = DownlinkCommand::parse(ports, port, payload) else {
        debug!("downlink on port {} ({} bytes) ignored", port, payload.len());
        return None;
    };

    match command {
        DownlinkCommand::RequestClass(class) => {
            info!("class {:?} requested", class);
            class_control.request_class(class);
        }
        DownlinkCommand::SetActuator(on) => {
            info!("actuator {}", if on { "on" } else { "off" });
            actuator.set_actuator(on);
        }
    }
    Some(command)
}
