//! Button press, release and long-press detection.
//!
//! The engine is split in two halves:
//!
//! - [`ButtonTimers`] is advanced by the timer interrupt. It counts how long
//!   the current press has lasted (saturating at 255 ticks) and how long the
//!   buttons have been idle (wrapping at 16 bits).
//! - [`ButtonEngine`] runs in the main cycle. It samples the raw port once per
//!   cycle, derives edges and long presses, and clears the timers on release.
//!
//! Inputs are active low; a sample is inverted and masked before use, so a set
//! bit always means "pressed".

use core::ops::{BitAnd, BitOr, Not};

use portable_atomic::{AtomicU16, AtomicU8, Ordering};

use crate::Config;

/// A set of button bits on the input port.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonMask(u8);

impl ButtonMask {
    pub const NONE: ButtonMask = ButtonMask(0);

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True when any bit of `other` is set in `self`.
    pub const fn intersects(self, other: ButtonMask) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitAnd for ButtonMask {
    type Output = ButtonMask;

    fn bitand(self, rhs: Self) -> Self::Output {
        ButtonMask(self.0 & rhs.0)
    }
}

impl BitOr for ButtonMask {
    type Output = ButtonMask;

    fn bitor(self, rhs: Self) -> Self::Output {
        ButtonMask(self.0 | rhs.0)
    }
}

impl Not for ButtonMask {
    type Output = ButtonMask;

    fn not(self) -> Self::Output {
        ButtonMask(!self.0)
    }
}

/// Button state derived for one main cycle.
///
/// `pressed` and `released` are edges relative to the previous cycle and can
/// never share a bit. `long_pressed` and `very_long_pressed` are asserted for
/// a single cycle per hold; the `keep_*` latches stay set until release.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonSnapshot {
    /// Buttons currently held
    pub raw: ButtonMask,
    /// Buttons that went down this cycle
    pub pressed: ButtonMask,
    /// Buttons that came up this cycle
    pub released: ButtonMask,
    pub long_pressed: ButtonMask,
    pub keep_long_pressed: ButtonMask,
    pub very_long_pressed: ButtonMask,
    pub keep_very_long_pressed: ButtonMask,
}

/// Tick-driven counters shared with the timer interrupt.
#[derive(Debug)]
pub struct ButtonTimers {
    press: AtomicU8,
    idle: AtomicU16,
}

impl ButtonTimers {
    pub const fn new() -> Self {
        Self {
            press: AtomicU8::new(0),
            idle: AtomicU16::new(0),
        }
    }

    /// Advances both counters by one tick.
    pub fn on_tick(&self) {
        // saturate so a button held for minutes still reads as long pressed
        let _ = self
            .press
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |v| v.checked_add(1));
        self.idle.fetch_add(1, Ordering::AcqRel);
    }

    pub fn press_ticks(&self) -> u8 {
        self.press.load(Ordering::Acquire)
    }

    pub fn idle_ticks(&self) -> u16 {
        self.idle.load(Ordering::Acquire)
    }

    pub fn reset_press(&self) {
        self.press.store(0, Ordering::Release);
    }

    pub fn reset_idle(&self) {
        self.idle.store(0, Ordering::Release);
    }
}

impl Default for ButtonTimers {
    fn default() -> Self {
        Self::new()
    }
}

/// Main-cycle half of the button engine.
pub struct ButtonEngine<'a> {
    timers: &'a ButtonTimers,
    mask: ButtonMask,
    long_press: u8,
    very_long_press: Option<u8>,
    state: ButtonSnapshot,
}

impl<'a> ButtonEngine<'a> {
    /// Creates an engine watching the buttons in `mask`.
    ///
    /// # Arguments
    /// * `timers` - Counters advanced by the timer interrupt
    /// * `mask` - Port bits wired to buttons; fixed for the engine's lifetime
    /// * `config` - Source of the long and very long press thresholds
    pub fn new(timers: &'a ButtonTimers, mask: ButtonMask, config: &Config) -> Self {
        timers.reset_press();
        Self {
            timers,
            mask,
            long_press: config.long_press_ticks(),
            very_long_press: config.very_long_press_ticks(),
            state: ButtonSnapshot::default(),
        }
    }

    /// Samples the raw (active-low) port value and returns the new snapshot.
    pub fn sample(&mut self, port: u8) -> ButtonSnapshot {
        let last = self.state.raw;
        let raw = !ButtonMask(port) & self.mask;
        let changed = ButtonMask(raw.0 ^ last.0);
        let mut next = ButtonSnapshot {
            raw,
            pressed: changed & raw,
            released: changed & !raw,
            ..self.state
        };

        let held = self.timers.press_ticks();
        if raw.is_empty() {
            if !next.released.is_empty() {
                self.timers.reset_idle();
            }
            self.timers.reset_press();
            next.long_pressed = ButtonMask::NONE;
            next.keep_long_pressed = ButtonMask::NONE;
            next.very_long_pressed = ButtonMask::NONE;
            next.keep_very_long_pressed = ButtonMask::NONE;
        } else if matches!(self.very_long_press, Some(threshold) if held >= threshold) {
            if next.keep_very_long_pressed.is_empty() {
                next.keep_very_long_pressed = raw;
                next.very_long_pressed = raw;
            } else {
                next.very_long_pressed = ButtonMask::NONE;
            }
            next.long_pressed = ButtonMask::NONE;
        } else if held >= self.long_press {
            if next.keep_long_pressed.is_empty() {
                next.keep_long_pressed = raw;
                next.long_pressed = raw;
            } else {
                next.long_pressed = ButtonMask::NONE;
            }
        } else {
            next.long_pressed = ButtonMask::NONE;
            next.keep_long_pressed = ButtonMask::NONE;
            next.very_long_pressed = ButtonMask::NONE;
            next.keep_very_long_pressed = ButtonMask::NONE;
        }

        self.state = next;
        next
    }

    /// The snapshot computed by the last [`sample`](Self::sample).
    pub fn snapshot(&self) -> ButtonSnapshot {
        self.state
    }

    pub fn idle_ticks(&self) -> u16 {
        self.timers.idle_ticks()
    }

    pub fn reset_idle(&self) {
        self.timers.reset_idle();
    }

    pub fn mask(&self) -> ButtonMask {
        self.mask
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SW1: u8 = 1 << 4;
    const SW2: u8 = 1 << 3;
    const RELEASED: u8 = 0xFF;

    fn config() -> Config {
        Config::DEFAULT
    }

    fn ticks(timers: &ButtonTimers, n: u32) {
        for _ in 0..n {
            timers.on_tick();
        }
    }

    #[test]
    fn test_press_and_release_edges() {
        let timers = ButtonTimers::new();
        let mut engine = ButtonEngine::new(&timers, ButtonMask(SW1 | SW2), &config());

        let s = engine.sample(RELEASED);
        assert!(s.raw.is_empty() && s.pressed.is_empty() && s.released.is_empty());

        let s = engine.sample(!SW1);
        assert_eq!(s.raw.bits(), SW1);
        assert_eq!(s.pressed.bits(), SW1);
        assert!(s.released.is_empty());

        let s = engine.sample(!SW1);
        assert!(s.pressed.is_empty(), "edge lasts one cycle");

        let s = engine.sample(RELEASED);
        assert_eq!(s.released.bits(), SW1);
        assert!(s.pressed.is_empty());
    }

    #[test]
    fn test_unmasked_inputs_ignored() {
        let timers = ButtonTimers::new();
        let mut engine = ButtonEngine::new(&timers, ButtonMask(SW1), &config());
        let s = engine.sample(!(SW2 | 0x01));
        assert!(s.raw.is_empty());
        assert!(s.pressed.is_empty());
    }

    #[test]
    fn test_edges_never_overlap() {
        let timers = ButtonTimers::new();
        let mut engine = ButtonEngine::new(&timers, ButtonMask(0xFF), &config());
        // a pseudo random walk over all port values
        let mut port: u8 = 0x5A;
        for i in 0..2000u32 {
            port = port.wrapping_mul(31).wrapping_add((i % 251) as u8) ^ (port >> 3);
            let s = engine.sample(port);
            assert!((s.pressed & s.released).is_empty());
            assert_eq!(s.raw.bits(), !port);
            if i % 7 == 0 {
                timers.on_tick();
            }
        }
    }

    #[test]
    fn test_long_press_fires_once_per_hold() {
        let timers = ButtonTimers::new();
        let config = config();
        let mut engine = ButtonEngine::new(&timers, ButtonMask(SW1 | SW2), &config);
        let threshold = u32::from(config.long_press_ticks());

        engine.sample(!SW2);
        ticks(&timers, threshold - 1);
        let s = engine.sample(!SW2);
        assert!(s.long_pressed.is_empty());

        ticks(&timers, 1);
        let s = engine.sample(!SW2);
        assert_eq!(s.long_pressed.bits(), SW2);
        assert_eq!(s.keep_long_pressed.bits(), SW2);

        let mut fired = 0;
        for _ in 0..50 {
            ticks(&timers, 3);
            let s = engine.sample(!SW2);
            if !s.long_pressed.is_empty() {
                fired += 1;
            }
            assert_eq!(s.keep_long_pressed.bits(), SW2);
        }
        assert_eq!(fired, 0, "no repeat while still held");

        let s = engine.sample(RELEASED);
        assert!(s.keep_long_pressed.is_empty());
        assert_eq!(timers.press_ticks(), 0);

        // a fresh hold fires again
        engine.sample(!SW2);
        ticks(&timers, threshold);
        let s = engine.sample(!SW2);
        assert_eq!(s.long_pressed.bits(), SW2);
    }

    #[test]
    fn test_press_counter_saturates() {
        let timers = ButtonTimers::new();
        ticks(&timers, 300);
        assert_eq!(timers.press_ticks(), u8::MAX);
        assert_eq!(timers.idle_ticks(), 300);
    }

    #[test]
    fn test_idle_counter_wraps() {
        let timers = ButtonTimers::new();
        ticks(&timers, 65_536 + 5);
        assert_eq!(timers.idle_ticks(), 5);
    }

    #[test]
    fn test_idle_reset_on_release_only() {
        let timers = ButtonTimers::new();
        let mut engine = ButtonEngine::new(&timers, ButtonMask(SW1 | SW2), &config());

        ticks(&timers, 10);
        engine.sample(RELEASED);
        assert_eq!(engine.idle_ticks(), 10, "no release edge, no reset");

        engine.sample(!SW1);
        ticks(&timers, 4);
        assert_eq!(engine.idle_ticks(), 14, "pressing does not reset");

        engine.sample(RELEASED);
        assert_eq!(engine.idle_ticks(), 0);
        ticks(&timers, 1);
        assert_eq!(engine.idle_ticks(), 1);
    }

    #[test]
    fn test_very_long_press() {
        let timers = ButtonTimers::new();
        let config = Config {
            very_long_press_ms: Some(3_000),
            ..Config::DEFAULT
        };
        let mut engine = ButtonEngine::new(&timers, ButtonMask(SW1 | SW2), &config);
        let long = u32::from(config.long_press_ticks());
        let very_long = u32::from(config.very_long_press_ticks().unwrap());

        engine.sample(!SW1);
        ticks(&timers, long);
        let s = engine.sample(!SW1);
        assert_eq!(s.long_pressed.bits(), SW1);
        assert!(s.very_long_pressed.is_empty());

        ticks(&timers, very_long - long);
        let s = engine.sample(!SW1);
        assert_eq!(s.very_long_pressed.bits(), SW1);
        assert!(s.long_pressed.is_empty());

        ticks(&timers, 10);
        let s = engine.sample(!SW1);
        assert!(s.very_long_pressed.is_empty());
        assert_eq!(s.keep_very_long_pressed.bits(), SW1);

        let s = engine.sample(RELEASED);
        assert!(s.keep_very_long_pressed.is_empty());
        assert!(s.keep_long_pressed.is_empty());
    }

    #[test]
    fn test_very_long_press_disabled_by_default() {
        let timers = ButtonTimers::new();
        let mut engine = ButtonEngine::new(&timers, ButtonMask(SW1), &config());
        engine.sample(!SW1);
        ticks(&timers, 255);
        engine.sample(!SW1);
        let s = engine.sample(!SW1);
        assert!(s.very_long_pressed.is_empty());
        assert!(s.keep_very_long_pressed.is_empty());
    }
}
