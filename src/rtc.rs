//! RTC-8564NB clock transactor.
//!
//! Every public operation is one bus transaction (start ... stop) built from
//! the [`Transport`] primitives. A transaction always ends with `stop`, even
//! when a byte was not acknowledged, so a failed operation never leaves the
//! bus held.
//!
//! Control register 2 holds both the interrupt enables and the alarm/timer
//! flags. The driver keeps a cached copy and flips individual bits of that
//! copy instead of reading the register back, which would pick up a pending
//! flag and write it straight back.

use embedded_hal::delay::DelayNs;

use crate::alarm::{AlarmError, AlarmRegisters, AlarmTime};
use crate::bus::{Ack, BusError, Direction, Transport};
use crate::datetime::{DateTimeError, RawDateTime, RtcDateTime};
use crate::registers::{
    ClockOutput, Control1, Control2, RegAddr, Seconds, Timer, TimerClock, TimerControl,
    RTC_ADDRESS,
};

/// Oscillator settle time after power-up or a clock restart.
const SETTLE_MS: u32 = 1_000;

/// Errors reported by [`Rtc8564`].
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RtcError {
    /// A bus primitive failed
    Bus(BusError),
    /// A date/time value was rejected before any bus traffic
    DateTime(DateTimeError),
    /// An alarm value was rejected before any bus traffic
    Alarm(AlarmError),
}

impl From<BusError> for RtcError {
    fn from(e: BusError) -> Self {
        RtcError::Bus(e)
    }
}

impl From<DateTimeError> for RtcError {
    fn from(e: DateTimeError) -> Self {
        RtcError::DateTime(e)
    }
}

impl From<AlarmError> for RtcError {
    fn from(e: AlarmError) -> Self {
        RtcError::Alarm(e)
    }
}

/// Outcome of [`Rtc8564::initialize`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockState {
    /// The clock kept its time; only the control register was cached
    Retained,
    /// The value-lost flag was set and every register was reprogrammed
    Reprogrammed,
}

fn send_all<B: Transport>(bus: &mut B, data: &[u8]) -> Result<(), BusError> {
    data.iter().try_for_each(|byte| bus.send(*byte))
}

/// Switches to reading and fills `buffer`, acknowledging every byte but the
/// last.
fn receive_into<B: Transport>(bus: &mut B, buffer: &mut [u8]) -> Result<(), BusError> {
    bus.repeated_start(RTC_ADDRESS, Direction::Read)?;
    let last = buffer.len().saturating_sub(1);
    for (i, byte) in buffer.iter_mut().enumerate() {
        let ack = if i == last { Ack::Nack } else { Ack::Ack };
        *byte = bus.receive(ack)?;
    }
    Ok(())
}

// Generates a getter and a `set_` function for single-register access.
macro_rules! register_accessors {
    ($(($name:ident, $regaddr:expr, $typ:ty)),+ $(,)?) => {
        $(
            paste::paste! {
                pub fn [< set_ $name >](&mut self, value: $typ) -> Result<(), RtcError> {
                    self.write_register($regaddr, value.into())
                }
            }

            pub fn $name(&mut self) -> Result<$typ, RtcError> {
                Ok(<$typ>::from(self.read_register($regaddr)?))
            }
        )+
    };
}

/// Driver for the RTC-8564NB real-time clock.
pub struct Rtc8564<T: Transport> {
    transport: T,
    control2: Control2,
}

impl<T: Transport> Rtc8564<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            control2: Control2::default(),
        }
    }

    /// Releases the transport.
    pub fn release(self) -> T {
        self.transport
    }

    /// The cached control register 2 value.
    pub fn cached_control2(&self) -> Control2 {
        self.control2
    }

    /// Runs `body` after which `stop` is always issued. The first error wins.
    fn transaction<R>(
        &mut self,
        body: impl FnOnce(&mut T) -> Result<R, BusError>,
    ) -> Result<R, BusError> {
        let result = body(&mut self.transport);
        let stopped = self.transport.stop();
        let value = result?;
        stopped?;
        Ok(value)
    }

    fn write_register(&mut self, register: RegAddr, value: u8) -> Result<(), RtcError> {
        self.transaction(|bus| {
            bus.start(RTC_ADDRESS, Direction::Write)?;
            bus.send(register as u8)?;
            bus.send(value)
        })?;
        Ok(())
    }

    fn read_register(&mut self, register: RegAddr) -> Result<u8, RtcError> {
        let mut data = [0];
        self.transaction(|bus| {
            bus.start(RTC_ADDRESS, Direction::Write)?;
            bus.send(register as u8)?;
            receive_into(bus, &mut data)
        })?;
        Ok(data[0])
    }

    register_accessors!(
        (control1, RegAddr::Control1, Control1),
        (clock_output, RegAddr::ClockOutput, ClockOutput),
        (timer_control, RegAddr::TimerControl, TimerControl),
        (timer, RegAddr::Timer, Timer),
    );

    /// Reads control register 2 from the device. The cache is left alone.
    pub fn control2(&mut self) -> Result<Control2, RtcError> {
        Ok(Control2::from(self.read_register(RegAddr::Control2)?))
    }

    /// Writes control register 2 and caches the written value.
    pub fn set_control2(&mut self, value: Control2) -> Result<(), RtcError> {
        self.write_register(RegAddr::Control2, value.into())?;
        self.control2 = value;
        Ok(())
    }

    /// Brings the clock up after power-on.
    ///
    /// Waits for the oscillator, then reads control register 2 and the seconds
    /// register. If the seconds register reports its value as lost, every
    /// register is rewritten: clock halted, `default` as the date and time,
    /// all alarm fields disabled, timer off, then the clock is restarted.
    /// Otherwise only control register 2 is cached.
    ///
    /// # Errors
    ///
    /// Fails on any bus error, or when `default` is not a valid date and time.
    pub fn initialize(
        &mut self,
        delay: &mut impl DelayNs,
        default: &RtcDateTime,
    ) -> Result<ClockState, RtcError> {
        let time: [u8; 7] = (&RawDateTime::from_datetime(default)?).into();
        let alarm: [u8; 4] = (&AlarmRegisters::disabled()).into();
        delay.delay_ms(SETTLE_MS);

        let mut status = [0; 2];
        let mut lost = false;
        let result = self.transaction(|bus| {
            bus.start(RTC_ADDRESS, Direction::Write)?;
            bus.send(RegAddr::Control2 as u8)?;
            receive_into(bus, &mut status)?;
            if !Seconds::from(status[1]).value_lost() {
                return Ok(());
            }
            lost = true;
            bus.repeated_start(RTC_ADDRESS, Direction::Write)?;
            bus.send(RegAddr::Control1 as u8)?;
            bus.send(Control1::HALTED.into())?;
            bus.send(Control2::RESET.into())?;
            send_all(bus, &time)?;
            send_all(bus, &alarm)?;
            bus.send(ClockOutput::RESET.into())?;
            bus.send(TimerControl::default().into())?;
            bus.send(Timer::default().into())?;
            bus.repeated_start(RTC_ADDRESS, Direction::Write)?;
            bus.send(RegAddr::Control1 as u8)?;
            bus.send(Control1::RUNNING.into())
        });

        if let Err(e) = result {
            error!("rtc: initialization failed: {:?}", e);
            if lost {
                self.resume_clock();
            }
            return Err(e.into());
        }

        if lost {
            warn!("rtc: value lost, clock reset to {:?}", default);
            self.control2 = Control2::RESET;
            delay.delay_ms(SETTLE_MS);
            Ok(ClockState::Reprogrammed)
        } else {
            self.control2 = Control2::from(status[0]);
            debug!("rtc: clock retained, control2 {:?}", self.control2);
            Ok(ClockState::Retained)
        }
    }

    /// Reads the current date and time in one burst.
    ///
    /// The value-lost and century flags are masked away; the fields are not
    /// range checked.
    pub fn read_time(&mut self) -> Result<RtcDateTime, RtcError> {
        let mut data = [0; 7];
        self.transaction(|bus| {
            bus.start(RTC_ADDRESS, Direction::Write)?;
            bus.send(RegAddr::Seconds as u8)?;
            receive_into(bus, &mut data)
        })?;
        let raw = RawDateTime::from(data);
        if raw.value_lost() {
            warn!("rtc: value lost flag set");
        }
        Ok(raw.into_datetime())
    }

    /// Writes a new date and time.
    ///
    /// The clock is halted while the seven registers are written and
    /// restarted afterwards, all in one transaction. On success this waits
    /// one second for the restarted clock to settle. If the write fails after
    /// the clock was halted, a separate transaction tries to restart it.
    ///
    /// # Errors
    ///
    /// Invalid fields are rejected before any bus traffic.
    pub fn write_time(
        &mut self,
        delay: &mut impl DelayNs,
        datetime: &RtcDateTime,
    ) -> Result<(), RtcError> {
        let data: [u8; 7] = (&RawDateTime::from_datetime(datetime)?).into();

        let mut halted = false;
        let result = self.transaction(|bus| {
            bus.start(RTC_ADDRESS, Direction::Write)?;
            bus.send(RegAddr::Control1 as u8)?;
            bus.send(Control1::HALTED.into())?;
            halted = true;
            bus.repeated_start(RTC_ADDRESS, Direction::Write)?;
            bus.send(RegAddr::Seconds as u8)?;
            send_all(bus, &data)?;
            bus.repeated_start(RTC_ADDRESS, Direction::Write)?;
            bus.send(RegAddr::Control1 as u8)?;
            bus.send(Control1::RUNNING.into())
        });

        match result {
            Ok(()) => {
                info!("rtc: time set to {:?}", datetime);
                delay.delay_ms(SETTLE_MS);
                Ok(())
            }
            Err(e) => {
                error!("rtc: time write failed: {:?}", e);
                if halted {
                    self.resume_clock();
                }
                Err(e.into())
            }
        }
    }

    // Best effort: a failed write must not leave the clock stopped.
    fn resume_clock(&mut self) {
        if let Err(e) = self.set_control1(Control1::RUNNING) {
            error!("rtc: clock may be halted: {:?}", e);
        }
    }

    /// Programs the alarm registers and enables the alarm interrupt with the
    /// alarm flag cleared.
    pub fn set_alarm(&mut self, alarm: &AlarmTime) -> Result<(), RtcError> {
        let fields: [u8; 4] = (&AlarmRegisters::from_alarm(alarm)?).into();
        let mut control2 = self.control2;
        control2.set_alarm_interrupt_enable(true);
        control2.set_alarm_flag(false);

        self.transaction(|bus| {
            bus.start(RTC_ADDRESS, Direction::Write)?;
            bus.send(RegAddr::MinuteAlarm as u8)?;
            send_all(bus, &fields)?;
            bus.repeated_start(RTC_ADDRESS, Direction::Write)?;
            bus.send(RegAddr::Control2 as u8)?;
            bus.send(control2.into())
        })?;
        self.control2 = control2;
        info!("rtc: alarm set to {:?}", alarm);
        Ok(())
    }

    fn update_control2(&mut self, apply: impl FnOnce(&mut Control2)) -> Result<(), RtcError> {
        let mut control2 = self.control2;
        apply(&mut control2);
        self.set_control2(control2)
    }

    /// Enables the alarm interrupt and clears the alarm flag, re-arming an
    /// alarm that just fired.
    pub fn start_alarm(&mut self) -> Result<(), RtcError> {
        self.update_control2(|c| {
            c.set_alarm_interrupt_enable(true);
            c.set_alarm_flag(false);
        })
    }

    /// Disables the alarm interrupt and clears the alarm flag.
    pub fn stop_alarm(&mut self) -> Result<(), RtcError> {
        self.update_control2(|c| {
            c.set_alarm_interrupt_enable(false);
            c.set_alarm_flag(false);
        })
    }

    /// Clears the alarm flag; the alarm stays enabled.
    pub fn clear_alarm_flag(&mut self) -> Result<(), RtcError> {
        self.update_control2(|c| c.set_alarm_flag(false))
    }

    /// Whether the device has raised its alarm flag.
    pub fn alarm_triggered(&mut self) -> Result<bool, RtcError> {
        Ok(self.control2()?.alarm_flag())
    }

    /// Starts the countdown timer, reloading `count` every period of `clock`.
    pub fn start_repeated_timer(&mut self, clock: TimerClock, count: u8) -> Result<(), RtcError> {
        let mut control = TimerControl::default();
        control.set_enable(true);
        control.set_clock(clock);
        self.transaction(|bus| {
            bus.start(RTC_ADDRESS, Direction::Write)?;
            bus.send(RegAddr::Timer as u8)?;
            bus.send(count)?;
            bus.repeated_start(RTC_ADDRESS, Direction::Write)?;
            bus.send(RegAddr::TimerControl as u8)?;
            bus.send(control.into())
        })?;
        Ok(())
    }

    /// Stops the countdown timer and clears the timer flag.
    pub fn stop_repeated_timer(&mut self) -> Result<(), RtcError> {
        let mut control2 = self.control2;
        control2.set_timer_flag(false);
        self.transaction(|bus| {
            bus.start(RTC_ADDRESS, Direction::Write)?;
            bus.send(RegAddr::TimerControl as u8)?;
            bus.send(TimerControl::default().into())?;
            bus.repeated_start(RTC_ADDRESS, Direction::Write)?;
            bus.send(RegAddr::Control2 as u8)?;
            bus.send(control2.into())
        })?;
        self.control2 = control2;
        Ok(())
    }
}
