//! Interrupt-context producers.
//!
//! Each one only raises a flag; the work itself happens on the next scheduler
//! pass. Boards call these from their timer, EXTI and radio interrupt handlers.

use embassy_time::Duration;

use crate::config::{NodeConfig, TxTrigger};
use crate::platform::OneShotTimer;
use crate::tasks::scheduler::EventFlags;

/// Periodic uplink trigger on top of a one-shot timer.
pub struct DutyCycleTimer<'f, T> {
    flags: &'f EventFlags,
    timer: T,
    period: Duration,
}

impl<'f, T: OneShotTimer> DutyCycleTimer<'f, T> {
    pub fn new(flags: &'f EventFlags, timer: T, period: Duration) -> Self {
        Self {
            flags,
            timer,
            period,
        }
    }

    /// `None` when the configuration wants button-triggered uplinks.
    pub fn from_config(flags: &'f EventFlags, timer: T, config: &NodeConfig) -> Option<Self> {
        match config.tx_trigger {
            TxTrigger::Timer => Some(Self::new(flags, timer, config.duty_cycle)),
            TxTrigger::Button => None,
        }
    }

    /// Arm the timer and request the first uplink right away.
    pub fn start(&mut self) {
        self.timer.start(self.period);
        self.flags.uplink_due.raise();
    }

    /// Timer interrupt: re-arm for the next period and request an uplink.
    pub fn on_expired(&mut self) {
        self.timer.start(self.period);
        self.flags.uplink_due.raise();
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

/// User button uplink trigger.
pub struct ButtonTrigger<'f> {
    flags: &'f EventFlags,
}

impl<'f> ButtonTrigger<'f> {
    pub const fn new(flags: &'f EventFlags) -> Self {
        Self { flags }
    }

    pub fn on_press(&self) {
        self.flags.uplink_due.raise();
    }
}

/// Hook for the protocol engine's "housekeeping needed" signal.
pub struct StackNotifier<'f> {
    flags: &'f EventFlags,
}

impl<'f> StackNotifier<'f> {
    pub const fn new(flags: &'f EventFlags) -> Self {
        Self { flags }
    }

    pub fn notify(&self) {
        self.flags.housekeeping_due.raise();
    }
}
