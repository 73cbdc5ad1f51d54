//! Cooperative event scheduler.
//!
//! Interrupt-context producers (duty-cycle timer, user button, the protocol
//! engine) only raise a [`PendingFlag`]. The main loop takes the flags, runs
//! the matching task to completion and, when nothing is pending, sleeps.
//!
//! The pending check before sleeping and the sleep itself happen inside one
//! critical section. On Cortex-M an interrupt that fires in that window stays
//! pending, the check still sees the flag raised before it, and `wfi` returns
//! immediately for anything raised after it, so no wakeup is lost.

use core::cell::Cell;

use critical_section::{CriticalSection, Mutex};

// ── Flags ─────────────────────────────────────────────────────────────────────

/// Single-slot "work pending" signal.
///
/// Raised by exactly one producer, taken by the scheduler right before it
/// dispatches the work. Both sides are indivisible, also on cores without
/// atomic read-modify-write.
pub struct PendingFlag {
    raised: Mutex<Cell<bool>>,
}

impl PendingFlag {
    pub const fn new() -> Self {
        Self {
            raised: Mutex::new(Cell::new(false)),
        }
    }

    pub fn raise(&self) {
        critical_section::with(|cs| self.raised.borrow(cs).set(true));
    }

    /// Clear the flag, returning whether it was raised.
    pub fn take(&self) -> bool {
        critical_section::with(|cs| self.raised.borrow(cs).replace(false))
    }

    pub fn is_raised(&self) -> bool {
        critical_section::with(|cs| self.is_raised_in(cs))
    }

    pub fn is_raised_in(&self, cs: CriticalSection<'_>) -> bool {
        self.raised.borrow(cs).get()
    }
}

impl Default for PendingFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// The two kinds of pending work.
pub struct EventFlags {
    /// Raised by the duty-cycle timer or the user button.
    pub uplink_due: PendingFlag,
    /// Raised by the protocol engine when it needs [`process`] to run.
    ///
    /// [`process`]: crate::platform::ProtocolEngine::process
    pub housekeeping_due: PendingFlag,
}

impl EventFlags {
    pub const fn new() -> Self {
        Self {
            uplink_due: PendingFlag::new(),
            housekeeping_due: PendingFlag::new(),
        }
    }

    pub fn any_raised_in(&self, cs: CriticalSection<'_>) -> bool {
        self.uplink_due.is_raised_in(cs) || self.housekeeping_due.is_raised_in(cs)
    }
}

impl Default for EventFlags {
    fn default() -> Self {
        Self::new()
    }
}

// ── Hooks ─────────────────────────────────────────────────────────────────────

/// Work bodies the scheduler dispatches. Both run to completion.
pub trait NodeTasks {
    fn run_uplink(&mut self);
    fn run_housekeeping(&mut self);
}

/// Low-power idle entry.
///
/// Called with producers masked; implementations must return once any
/// interrupt is pending, even though it cannot be serviced yet.
pub trait LowPower {
    fn sleep(&mut self, cs: CriticalSection<'_>);
}

/// Sleep-on-`wfi`. Needs the single-core critical section from `cortex-m`.
#[cfg(feature = "cortex-m")]
pub struct WaitForInterrupt;

#[cfg(feature = "cortex-m")]
impl LowPower for WaitForInterrupt {
    fn sleep(&mut self, _cs: CriticalSection<'_>) {
        cortex_m::asm::wfi();
    }
}

// ── Scheduler ─────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Work {
    Uplink,
    Housekeeping,
}

/// What one scheduler iteration did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Poll {
    pub ran: Option<Work>,
    pub slept: bool,
}

pub struct Scheduler<'f, P> {
    flags: &'f EventFlags,
    power: P,
}

impl<'f, P: LowPower> Scheduler<'f, P> {
    pub fn new(flags: &'f EventFlags, power: P) -> Self {
        Self { flags, power }
    }

    /// Main loop. Never returns.
    pub fn run<T: NodeTasks>(&mut self, tasks: &mut T) -> ! {
        loop {
            self.poll(tasks);
        }
    }

    /// One iteration: dispatch at most one task, then sleep if nothing is
    /// pending.
    pub fn poll<T: NodeTasks>(&mut self, tasks: &mut T) -> Poll {
        let ran = self.dispatch(tasks);
        let slept = self.idle();
        Poll { ran, slept }
    }

    /// Run the highest-priority pending task. Uplinks go first.
    pub fn dispatch<T: NodeTasks>(&mut self, tasks: &mut T) -> Option<Work> {
        if self.flags.uplink_due.take() {
            tasks.run_uplink();
            Some(Work::Uplink)
        } else if self.flags.housekeeping_due.take() {
            tasks.run_housekeeping();
            Some(Work::Housekeeping)
        } else {
            None
        }
    }

    /// Sleep unless work is pending. Returns whether the core slept.
    pub fn idle(&mut self) -> bool {
        let flags = self.flags;
        let power = &mut self.power;
        critical_section::with(|cs| {
            if flags.any_raised_in(cs) {
                return false;
            }
            trace!("idle");
            power.sleep(cs);
            true
        })
    }

    pub fn flags(&self) -> &'f EventFlags {
        self.flags
    }

    pub fn power(&self) -> &P {
        &self.power
    }
}
