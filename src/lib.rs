#![cfg_attr(not(test), no_std)]

//! Application control core of a LoRaWAN sensor node.
//!
//! The node wakes on a duty-cycle timer, samples its environmental and motion
//! sensors, derives a tilt-compensated compass heading, packs everything into a
//! 21-byte uplink and hands it to the protocol engine. Downlinks switch the
//! device class or drive the application actuator.
//!
//! Radio protocol, sensor bus and board bring-up live behind the traits in
//! [`platform`].

#[macro_use]
mod fmt;

pub mod config;
pub mod drivers;
pub mod error;
pub mod node;
pub mod platform;
pub mod state;
pub mod tasks;

#[cfg(test)]
mod mock;

pub use config::NodeConfig;
pub use node::Node;
pub use tasks::scheduler::{EventFlags, Scheduler};
