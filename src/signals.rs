//! State shared between interrupt handlers and the main cycle.
//!
//! Three event sources feed the firmware:
//!
//! | Event          | Handler                          | Touches                                  |
//! |----------------|----------------------------------|------------------------------------------|
//! | timer overflow | [`Signals::on_tick`]             | press/idle counters, relay countdown     |
//! | bus byte done  | [`Signals::on_bus_complete`]     | [`BusCompletion`]                        |
//! | pin change     | [`Signals::on_pin_change`]       | [`AlarmLatch`]                           |
//!
//! Handlers only store flags and bump counters; bus transactions always run
//! in the main cycle. Every shared value is a single atomic so neither side
//! needs to mask interrupts. `portable-atomic` keeps this working on cores
//! without native compare-and-swap.

use portable_atomic::{AtomicBool, AtomicU16, Ordering};

use crate::button::ButtonTimers;
use crate::Config;

/// "Waiting for the current byte" flag of the bus transport.
#[derive(Debug)]
pub struct BusCompletion {
    waiting: AtomicBool,
}

impl BusCompletion {
    pub const fn new() -> Self {
        Self {
            waiting: AtomicBool::new(false),
        }
    }

    /// Marks a byte transfer as outstanding. Called before loading the buffer.
    pub fn arm(&self) {
        self.waiting.store(true, Ordering::Release);
    }

    /// Called from the bus interrupt once the byte and its acknowledge are done.
    pub fn complete(&self) {
        self.waiting.store(false, Ordering::Release);
    }

    /// Drops an outstanding transfer after a timeout.
    pub fn cancel(&self) {
        self.waiting.store(false, Ordering::Release);
    }

    pub fn is_waiting(&self) -> bool {
        self.waiting.load(Ordering::Acquire)
    }
}

impl Default for BusCompletion {
    fn default() -> Self {
        Self::new()
    }
}

/// The "alarm pending" bit raised by the RTC interrupt line.
#[derive(Debug)]
pub struct AlarmLatch {
    pending: AtomicBool,
}

impl AlarmLatch {
    pub const fn new() -> Self {
        Self {
            pending: AtomicBool::new(false),
        }
    }

    pub fn raise(&self) {
        self.pending.store(true, Ordering::Release);
    }

    /// Returns whether an alarm was pending and clears it.
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }
}

impl Default for AlarmLatch {
    fn default() -> Self {
        Self::new()
    }
}

/// Remaining ticks the relay stays energized.
#[derive(Debug)]
pub struct RelayCountdown {
    remaining: AtomicU16,
}

impl RelayCountdown {
    pub const fn new() -> Self {
        Self {
            remaining: AtomicU16::new(0),
        }
    }

    pub fn arm(&self, ticks: u16) {
        self.remaining.store(ticks, Ordering::Release);
    }

    pub fn cancel(&self) {
        self.remaining.store(0, Ordering::Release);
    }

    /// Counts one tick down. Returns `true` on the tick that reaches zero.
    pub fn tick(&self) -> bool {
        self.remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |v| v.checked_sub(1))
            .map(|previous| previous == 1)
            .unwrap_or(false)
    }

    pub fn remaining(&self) -> u16 {
        self.remaining.load(Ordering::Acquire)
    }

    pub fn is_running(&self) -> bool {
        self.remaining() != 0
    }
}

impl Default for RelayCountdown {
    fn default() -> Self {
        Self::new()
    }
}

/// One flag or counter per event source, meant to live in a `static`.
#[derive(Debug, Default)]
pub struct Signals {
    pub bus: BusCompletion,
    pub buttons: ButtonTimers,
    pub alarm: AlarmLatch,
    pub relay: RelayCountdown,
}

impl Signals {
    pub const fn new() -> Self {
        Self {
            bus: BusCompletion::new(),
            buttons: ButtonTimers::new(),
            alarm: AlarmLatch::new(),
            relay: RelayCountdown::new(),
        }
    }

    /// Timer interrupt. Returns `true` when the relay countdown just expired
    /// so a handler owning the relay pin can switch it off immediately.
    pub fn on_tick(&self) -> bool {
        self.buttons.on_tick();
        self.relay.tick()
    }

    /// Bus interrupt.
    pub fn on_bus_complete(&self) {
        self.bus.complete();
    }

    /// Pin-change interrupt. `changed` holds the port bits that saw an edge;
    /// button edges only wake the core, the alarm line latches an alarm.
    pub fn on_pin_change(&self, changed: u8, config: &Config) {
        if changed & config.alarm_line != 0 {
            self.alarm.raise();
        }
    }
}
