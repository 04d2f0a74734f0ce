//! # autowater
//!
//! Firmware core for an automatic watering appliance: an RTC-8564NB real-time
//! clock raises an alarm once a day, the alarm energizes a relay (the pump) for
//! a configurable number of seconds, and two buttons plus an 8x2 character
//! display let the user browse and edit the clock, the alarm and the power-on
//! duration.
//!
//! The crate is `no_std` and hardware agnostic. Board support provides:
//!
//! - a [`bus::MsspRegisters`] implementation for the two-wire master peripheral
//!   (or any other [`bus::Transport`]),
//! - a [`display::CharacterDisplay`],
//! - a [`controller::Board`] that reads the button port and enters low power,
//! - an `embedded_hal::digital::OutputPin` driving the relay,
//! - an `embedded_hal::delay::DelayNs`,
//!
//! and forwards its interrupts to a `static` [`signals::Signals`].
//!
//! # Example
//!
//! ```rust,ignore
//! use autowater::{controller::Controller, signals::Signals, Config};
//!
//! static SIGNALS: Signals = Signals::new();
//!
//! // interrupt handlers
//! fn on_timer() { SIGNALS.on_tick(); }
//! fn on_mssp() { SIGNALS.on_bus_complete(); }
//! fn on_change(flags: u8) { SIGNALS.on_pin_change(flags, &Config::DEFAULT); }
//!
//! let transport = MasterTransport::new(mssp, &SIGNALS.bus, Config::DEFAULT.bus_spin_limit);
//! let mut app = Controller::new(Rtc8564::new(transport), lcd, relay, board, &SIGNALS, Config::DEFAULT);
//! app.start(&mut delay);
//! app.run(&mut delay);
//! ```
//!
//! # Features
//!
//! - `log`: emit diagnostics through the `log` facade
//! - `defmt`: emit diagnostics through `defmt` and derive `defmt::Format`

#![no_std]

#[macro_use]
mod fmt;

pub mod alarm;
pub mod bus;
pub mod button;
pub mod controller;
pub mod datetime;
pub mod display;
pub mod menu;
pub mod registers;
pub mod rtc;
pub mod signals;

#[cfg(test)]
mod mock;

pub use crate::alarm::{AlarmError, AlarmTime};
pub use crate::bus::{Ack, BusError, Direction, MasterTransport, Transport};
pub use crate::button::{ButtonEngine, ButtonMask, ButtonSnapshot, ButtonTimers};
pub use crate::controller::{Board, Controller};
pub use crate::datetime::{decode_bcd, encode_bcd, DateTimeError, RtcDateTime};
pub use crate::display::CharacterDisplay;
pub use crate::menu::MenuMode;
pub use crate::rtc::{ClockState, Rtc8564, RtcError};
pub use crate::signals::Signals;

/// Build-time configuration of the appliance.
///
/// All durations are converted to tick counts of the periodic timer with the
/// `*_ticks` helpers, so changing the timer period only means changing
/// `tick_period_us`.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Period of the timer interrupt in microseconds
    pub tick_period_us: u32,
    /// Hold time that reports a long press
    pub long_press_ms: u32,
    /// Hold time that reports a very long press, `None` disables the signal
    pub very_long_press_ms: Option<u32>,
    /// Time without button activity before entering low power
    pub idle_timeout_ms: u32,
    /// Relay on-time used until the user edits it (1-99)
    pub power_on_seconds: u8,
    /// Polls of a busy-wait before the transport gives up with a timeout
    pub bus_spin_limit: u32,
    /// Button that advances views and increments values
    pub advance_button: ButtonMask,
    /// Button that enters edit modes and confirms values
    pub select_button: ButtonMask,
    /// Port bit wired to the RTC interrupt output
    pub alarm_line: u8,
    /// Date and time written when the RTC reports its value as lost
    pub default_datetime: RtcDateTime,
}

impl Config {
    pub const DEFAULT: Config = Config {
        tick_period_us: 32_256,
        long_press_ms: 1_000,
        very_long_press_ms: None,
        idle_timeout_ms: 60_000,
        power_on_seconds: 10,
        bus_spin_limit: 100_000,
        advance_button: ButtonMask::from_bits(1 << 4),
        select_button: ButtonMask::from_bits(1 << 3),
        alarm_line: 1 << 5,
        default_datetime: RtcDateTime::DEFAULT,
    };

    /// Number of ticks covering `ms`, clamped to the range of a `u8` counter.
    pub const fn ticks_u8(&self, ms: u32) -> u8 {
        let ticks = self.ticks(ms);
        if ticks > u8::MAX as u32 {
            u8::MAX
        } else {
            ticks as u8
        }
    }

    /// Number of ticks covering `ms`, clamped to the range of a `u16` counter.
    pub const fn ticks_u16(&self, ms: u32) -> u16 {
        let ticks = self.ticks(ms);
        if ticks > u16::MAX as u32 {
            u16::MAX
        } else {
            ticks as u16
        }
    }

    const fn ticks(&self, ms: u32) -> u32 {
        if self.tick_period_us == 0 {
            return u32::MAX;
        }
        ((ms as u64 * 1_000) / self.tick_period_us as u64) as u32
    }

    pub const fn long_press_ticks(&self) -> u8 {
        self.ticks_u8(self.long_press_ms)
    }

    pub const fn very_long_press_ticks(&self) -> Option<u8> {
        match self.very_long_press_ms {
            Some(ms) => Some(self.ticks_u8(ms)),
            None => None,
        }
    }

    pub const fn idle_timeout_ticks(&self) -> u16 {
        self.ticks_u16(self.idle_timeout_ms)
    }

    pub const fn one_second_ticks(&self) -> u16 {
        self.ticks_u16(1_000)
    }

    /// Both menu buttons.
    pub const fn button_mask(&self) -> ButtonMask {
        ButtonMask::from_bits(self.advance_button.bits() | self.select_button.bits())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::DEFAULT
    }
}
