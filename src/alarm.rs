//! Alarm configuration for the RTC-8564NB.
//!
//! The device compares up to four fields (minute, hour, day, weekday) against
//! the running clock and raises its alarm flag when every enabled field
//! matches. This firmware only uses the minute and hour fields; the day and
//! weekday registers are always written as disabled, which turns the alarm
//! into a daily one.
//!
//! A field set to `None` is excluded from the comparison. That is distinct
//! from `Some(0)`, which matches minute 0 or midnight.

use crate::datetime::encode_bcd;
use crate::registers::AlarmField;

/// Error type for alarm configuration.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AlarmError {
    /// Invalid time component value
    InvalidTime(&'static str),
}

/// Minute and hour an alarm fires at.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AlarmTime {
    /// Minute to match (0-59), `None` matches every minute
    pub minute: Option<u8>,
    /// Hour to match (0-23), `None` matches every hour
    pub hour: Option<u8>,
}

impl AlarmTime {
    /// A daily alarm at `hour:minute`.
    #[must_use]
    pub const fn daily(hour: u8, minute: u8) -> Self {
        Self {
            minute: Some(minute),
            hour: Some(hour),
        }
    }

    /// Validates the alarm configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any enabled component is out of range.
    pub fn validate(&self) -> Result<(), AlarmError> {
        if matches!(self.minute, Some(m) if m > 59) {
            return Err(AlarmError::InvalidTime("minutes must be 0-59"));
        }
        if matches!(self.hour, Some(h) if h > 23) {
            return Err(AlarmError::InvalidTime("hours must be 0-23"));
        }
        Ok(())
    }
}

/// The four alarm registers (0x09-0x0C) in transfer order.
#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) struct AlarmRegisters {
    minute: AlarmField,
    hour: AlarmField,
    day: AlarmField,
    weekday: AlarmField,
}

impl AlarmRegisters {
    pub(crate) fn from_alarm(alarm: &AlarmTime) -> Result<Self, AlarmError> {
        alarm.validate()?;
        Ok(Self {
            minute: Self::field(alarm.minute),
            hour: Self::field(alarm.hour),
            day: AlarmField::DISABLED,
            weekday: AlarmField::DISABLED,
        })
    }

    fn field(value: Option<u8>) -> AlarmField {
        match value {
            Some(v) => AlarmField::from(encode_bcd(v)),
            None => AlarmField::DISABLED,
        }
    }

    /// Every field disabled, as written during recovery.
    pub(crate) const fn disabled() -> Self {
        Self {
            minute: AlarmField::DISABLED,
            hour: AlarmField::DISABLED,
            day: AlarmField::DISABLED,
            weekday: AlarmField::DISABLED,
        }
    }
}

impl From<&AlarmRegisters> for [u8; 4] {
    fn from(alarm: &AlarmRegisters) -> [u8; 4] {
        [
            alarm.minute.into(),
            alarm.hour.into(),
            alarm.day.into(),
            alarm.weekday.into(),
        ]
    }
}
