//! Register definitions and bitfield structures for the RTC-8564NB.
//!
//! The RTC-8564NB (register compatible with the PCF8563) exposes sixteen
//! 8-bit registers. Date, time and alarm values are packed BCD; the unused
//! high bits of several registers carry flags (value lost, century, alarm
//! disable) that must be masked away before decoding.

use bitfield::bitfield;

/// 7-bit bus address of the RTC-8564NB.
pub const RTC_ADDRESS: u8 = 0b101_0001;

/// Register addresses for the RTC-8564NB.
#[allow(unused)]
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegAddr {
    /// Control 1 (TEST, STOP)
    Control1 = 0x00,
    /// Control 2 (TI/TP, AF, TF, AIE, TIE)
    Control2 = 0x01,
    /// Seconds (0-59) and the VL flag
    Seconds = 0x02,
    /// Minutes (0-59)
    Minutes = 0x03,
    /// Hours (0-23)
    Hours = 0x04,
    /// Day of month (1-31)
    Days = 0x05,
    /// Day of week (0-6)
    Weekdays = 0x06,
    /// Month (1-12) and the century flag
    Months = 0x07,
    /// Year (0-99)
    Years = 0x08,
    /// Minute alarm
    MinuteAlarm = 0x09,
    /// Hour alarm
    HourAlarm = 0x0A,
    /// Day alarm
    DayAlarm = 0x0B,
    /// Weekday alarm
    WeekdayAlarm = 0x0C,
    /// CLKOUT frequency control
    ClockOutput = 0x0D,
    /// Timer control
    TimerControl = 0x0E,
    /// Timer countdown value
    Timer = 0x0F,
}

/// Source clock of the countdown timer.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerClock {
    /// 4096 Hz (244.14 µs per count)
    Hz4096 = 0b00,
    /// 64 Hz (15.625 ms per count)
    Hz64 = 0b01,
    /// 1 Hz (one second per count)
    Second = 0b10,
    /// 1/60 Hz (one minute per count)
    Minute = 0b11,
}
impl From<u8> for TimerClock {
    /// Creates a `TimerClock` from the two TD bits.
    ///
    /// # Panics
    /// Panics if the value does not fit in two bits.
    fn from(v: u8) -> Self {
        match v {
            0b00 => TimerClock::Hz4096,
            0b01 => TimerClock::Hz64,
            0b10 => TimerClock::Second,
            0b11 => TimerClock::Minute,
            _ => panic!("Invalid value for TimerClock: {}", v),
        }
    }
}
impl From<TimerClock> for u8 {
    fn from(v: TimerClock) -> Self {
        v as u8
    }
}

/// CLKOUT pin frequency selection.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockOutFrequency {
    Hz32768 = 0b00,
    Hz1024 = 0b01,
    Hz32 = 0b10,
    Hz1 = 0b11,
}
impl From<u8> for ClockOutFrequency {
    /// Creates a `ClockOutFrequency` from the two FD bits.
    ///
    /// # Panics
    /// Panics if the value does not fit in two bits.
    fn from(v: u8) -> Self {
        match v {
            0b00 => ClockOutFrequency::Hz32768,
            0b01 => ClockOutFrequency::Hz1024,
            0b10 => ClockOutFrequency::Hz32,
            0b11 => ClockOutFrequency::Hz1,
            _ => panic!("Invalid value for ClockOutFrequency: {}", v),
        }
    }
}
impl From<ClockOutFrequency> for u8 {
    fn from(v: ClockOutFrequency) -> Self {
        v as u8
    }
}

// This macro generates the From<u8> and Into<u8> implementations for the
// register type
macro_rules! from_register_u8 {
    ($typ:ty) => {
        impl From<u8> for $typ {
            fn from(v: u8) -> Self {
                paste::paste!([< $typ >](v))
            }
        }
        impl From<$typ> for u8 {
            fn from(v: $typ) -> Self {
                v.0
            }
        }
    };
}

bitfield! {
    /// Control 1 register.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Control1(u8);
    impl Debug;
    /// Test mode, must stay cleared
    pub test, set_test: 7;
    /// Halts the clock divider chain while set
    pub stop, set_stop: 5;
}
from_register_u8!(Control1);

impl Control1 {
    /// Normal operation, clock running.
    pub const RUNNING: Control1 = Control1(0x00);
    /// Clock halted, used while the date and time are rewritten.
    pub const HALTED: Control1 = Control1(0x20);
}

bitfield! {
    /// Control 2 register: interrupt enables and flags.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Control2(u8);
    impl Debug;
    /// INT output pulses for the timer instead of following TF
    pub timer_pulse, set_timer_pulse: 4;
    /// Alarm flag, set by the device when the alarm matches
    pub alarm_flag, set_alarm_flag: 3;
    /// Timer flag, set by the device when the countdown expires
    pub timer_flag, set_timer_flag: 2;
    /// Alarm interrupt enable
    pub alarm_interrupt_enable, set_alarm_interrupt_enable: 1;
    /// Timer interrupt enable
    pub timer_interrupt_enable, set_timer_interrupt_enable: 0;
}
from_register_u8!(Control2);

impl Control2 {
    /// Value programmed when the clock is reinitialized: pulse mode with the
    /// timer interrupt enabled, alarm disabled and both flags cleared.
    pub const RESET: Control2 = Control2(0x11);
}

#[cfg(feature = "defmt")]
impl defmt::Format for Control2 {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "Control2(AIE={} AF={} TIE={} TF={})",
            self.alarm_interrupt_enable(),
            self.alarm_flag(),
            self.timer_interrupt_enable(),
            self.timer_flag()
        );
    }
}

bitfield! {
    /// Seconds register (0-59) with BCD encoding and the value-lost flag.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Seconds(u8);
    impl Debug;
    /// Set by the device when the oscillator stopped and the time is unreliable
    pub value_lost, set_value_lost: 7;
    /// Tens place of seconds (0-5)
    pub ten_seconds, set_ten_seconds: 6, 4;
    /// Ones place of seconds (0-9)
    pub seconds, set_seconds: 3, 0;
}
from_register_u8!(Seconds);

bitfield! {
    /// Minutes register (0-59) with BCD encoding.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Minutes(u8);
    impl Debug;
    pub ten_minutes, set_ten_minutes: 6, 4;
    pub minutes, set_minutes: 3, 0;
}
from_register_u8!(Minutes);

bitfield! {
    /// Hours register (0-23) with BCD encoding.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Hours(u8);
    impl Debug;
    pub ten_hours, set_ten_hours: 5, 4;
    pub hours, set_hours: 3, 0;
}
from_register_u8!(Hours);

bitfield! {
    /// Day of month register (1-31) with BCD encoding.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Days(u8);
    impl Debug;
    pub ten_days, set_ten_days: 5, 4;
    pub days, set_days: 3, 0;
}
from_register_u8!(Days);

bitfield! {
    /// Day of week register (0-6).
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Weekdays(u8);
    impl Debug;
    pub weekday, set_weekday: 2, 0;
}
from_register_u8!(Weekdays);

bitfield! {
    /// Month register (1-12) with century flag and BCD encoding.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Months(u8);
    impl Debug;
    /// Century flag, toggled by the device when the year wraps from 99 to 00
    pub century, set_century: 7;
    pub ten_months, set_ten_months: 4, 4;
    pub months, set_months: 3, 0;
}
from_register_u8!(Months);

bitfield! {
    /// Year register (0-99) with BCD encoding.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Years(u8);
    impl Debug;
    pub ten_years, set_ten_years: 7, 4;
    pub years, set_years: 3, 0;
}
from_register_u8!(Years);

bitfield! {
    /// One of the four alarm registers.
    ///
    /// Bit 7 (AE) excludes the field from the alarm comparison.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct AlarmField(u8);
    impl Debug;
    /// Field ignored by the alarm comparison
    pub disabled, set_disabled: 7;
    pub tens, set_tens: 6, 4;
    pub ones, set_ones: 3, 0;
}
from_register_u8!(AlarmField);

impl AlarmField {
    /// A field that never constrains the alarm.
    pub const DISABLED: AlarmField = AlarmField(0x80);
}

bitfield! {
    /// CLKOUT control register.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct ClockOutput(u8);
    impl Debug;
    pub frequency_enable, set_frequency_enable: 7;
    pub from into ClockOutFrequency, frequency, set_frequency: 1, 0;
}
from_register_u8!(ClockOutput);

impl ClockOutput {
    /// Value written during recovery: FE set with the 1 Hz source selected.
    pub const RESET: ClockOutput = ClockOutput(0x83);
}

bitfield! {
    /// Timer control register.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct TimerControl(u8);
    impl Debug;
    /// Countdown running
    pub enable, set_enable: 7;
    pub from into TimerClock, clock, set_clock: 1, 0;
}
from_register_u8!(TimerControl);

bitfield! {
    /// Timer countdown register.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Timer(u8);
    impl Debug;
    pub count, set_count: 7, 0;
}
from_register_u8!(Timer);
