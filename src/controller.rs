//! The main control cycle.
//!
//! Each cycle samples the buttons, refreshes the clock when the clock view is
//! showing, runs one step of the menu and applies what it committed. It then
//! handles the relay: a pending alarm energizes it for the configured
//! power-on time, and it is switched off once the tick-driven countdown runs
//! out. Finally, after a long enough idle period the board is put to sleep.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::bus::Transport;
use crate::button::ButtonEngine;
use crate::display::CharacterDisplay;
use crate::menu::{Commit, Menu, MenuMode};
use crate::rtc::{ClockState, Rtc8564, RtcError};
use crate::signals::Signals;
use crate::Config;

/// Pause between two control cycles.
const CYCLE_MS: u32 = 50;

/// Board services the controller needs besides the bus, display and relay.
pub trait Board {
    /// Raw level of the button port; buttons are active low.
    fn read_buttons(&mut self) -> u8;

    /// Enters low power until an enabled interrupt wakes the core.
    fn sleep(&mut self);
}

/// Ties the RTC, menu, buttons and relay together.
pub struct Controller<'a, T, D, R, B>
where
    T: Transport,
    D: CharacterDisplay,
    R: OutputPin,
    B: Board,
{
    rtc: Rtc8564<T>,
    display: D,
    relay: R,
    board: B,
    signals: &'a Signals,
    buttons: ButtonEngine<'a>,
    menu: Menu,
    config: Config,
    relay_on: bool,
}

impl<'a, T, D, R, B> Controller<'a, T, D, R, B>
where
    T: Transport,
    D: CharacterDisplay,
    R: OutputPin,
    B: Board,
{
    pub fn new(
        rtc: Rtc8564<T>,
        display: D,
        relay: R,
        board: B,
        signals: &'a Signals,
        config: Config,
    ) -> Self {
        Self {
            rtc,
            display,
            relay,
            board,
            signals,
            buttons: ButtonEngine::new(&signals.buttons, config.button_mask(), &config),
            menu: Menu::new(&config),
            config,
            relay_on: false,
        }
    }

    /// Releases the peripherals.
    pub fn release(self) -> (Rtc8564<T>, D, R, B) {
        (self.rtc, self.display, self.relay, self.board)
    }

    pub fn mode(&self) -> MenuMode {
        self.menu.mode()
    }

    pub fn menu(&self) -> &Menu {
        &self.menu
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn board(&self) -> &B {
        &self.board
    }

    pub fn relay_on(&self) -> bool {
        self.relay_on
    }

    /// Switches the relay off, greets the user and brings up the RTC.
    ///
    /// A failed RTC initialization is logged and returned; the controller is
    /// still usable and keeps retrying reads every cycle.
    pub fn start(&mut self, delay: &mut impl DelayNs) -> Result<ClockState, RtcError> {
        self.set_relay(false);
        self.display.clear();
        self.display.set_cursor(0, 0);
        self.display.write_str("Hello");

        let state = self.rtc.initialize(delay, &self.config.default_datetime);
        match &state {
            Ok(state) => info!("rtc ready: {:?}", state),
            Err(e) => error!("rtc initialization failed: {:?}", e),
        }
        state
    }

    /// Runs the control cycle forever.
    pub fn run(&mut self, delay: &mut impl DelayNs) -> ! {
        loop {
            self.cycle(delay);
            delay.delay_ms(CYCLE_MS);
        }
    }

    /// One pass of the control cycle.
    pub fn cycle(&mut self, delay: &mut impl DelayNs) {
        let buttons = self.buttons.sample(self.board.read_buttons());

        if self.menu.wants_time() {
            match self.rtc.read_time() {
                Ok(now) => self.menu.update_time(now),
                Err(e) => warn!("clock read failed, showing last time: {:?}", e),
            }
        }

        if let Some(commit) = self.menu.step(&buttons, &mut self.display) {
            self.apply(commit, delay);
        }

        if self.signals.alarm.take() {
            self.start_watering();
        }

        if self.relay_on && !self.signals.relay.is_running() {
            info!("watering done");
            self.set_relay(false);
        }

        if self.buttons.idle_ticks() > self.config.idle_timeout_ticks() {
            self.sleep();
        }

        if self.relay_on {
            self.buttons.reset_idle();
        }
    }

    fn apply(&mut self, commit: Commit, delay: &mut impl DelayNs) {
        let result = match commit {
            Commit::Time(time) => self.rtc.write_time(delay, &time),
            Commit::Alarm(alarm) => self.rtc.set_alarm(&alarm),
            Commit::AlarmOff => self.rtc.stop_alarm(),
        };
        if let Err(e) = result {
            error!("failed to apply {:?}: {:?}", commit, e);
        }
    }

    fn start_watering(&mut self) {
        let seconds = self.menu.settings().power_on_seconds;
        let ticks = self
            .config
            .one_second_ticks()
            .saturating_mul(u16::from(seconds));
        info!("alarm: watering for {}s", seconds);
        self.signals.relay.arm(ticks);
        self.set_relay(true);
        if let Err(e) = self.rtc.start_alarm() {
            error!("failed to re-arm alarm: {:?}", e);
        }
    }

    fn set_relay(&mut self, on: bool) {
        let result = if on {
            self.relay.set_high()
        } else {
            self.relay.set_low()
        };
        match result {
            Ok(()) => self.relay_on = on,
            Err(_) => error!("relay: failed to switch"),
        }
    }

    fn sleep(&mut self) {
        debug!("idle, entering low power");
        self.signals.relay.cancel();
        self.set_relay(false);
        self.display.clear();
        self.board.sleep();

        // swallow the press that woke us
        self.buttons.sample(self.board.read_buttons());
        self.buttons.reset_idle();
        self.menu.reset();
    }
}
