//! Date and time values and their BCD register encoding.
//!
//! [`RtcDateTime`] is the plain-binary view used by the rest of the firmware.
//! The RTC stores the same seven fields as packed BCD in consecutive registers
//! starting at 0x02; [`RawDateTime`] models that block with one bitfield
//! wrapper per register and converts between the two views.
//!
//! # Register Model
//!
//! - Seconds (with the value-lost flag in bit 7)
//! - Minutes, Hours, Days, Weekdays
//! - Months (with the century flag in bit 7)
//! - Years (0-99, the firmware always assumes the 2000s)

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

use crate::registers::{Days, Hours, Minutes, Months, Seconds, Weekdays, Years};

/// Decodes a packed BCD byte into its binary value.
///
/// `decode_bcd(0x59) == 59`. Nibbles above 9 are not rejected; callers mask
/// away flag bits first.
#[must_use]
pub const fn decode_bcd(bcd: u8) -> u8 {
    let tens = bcd >> 4;
    // tens * 10 == tens * 8 + tens * 2
    (tens << 3) + (tens << 1) + (bcd & 0x0F)
}

/// Encodes a value in `0..=99` as packed BCD.
///
/// The tens digit is computed as `(value * 205) >> 11`, which equals
/// `value / 10` over the whole `0..=99` range and needs no divide instruction.
#[must_use]
pub const fn encode_bcd(value: u8) -> u8 {
    let tens = ((value as u16 * 205) >> 11) as u8;
    let ones = value - ((tens << 3) + (tens << 1));
    (tens << 4) | ones
}

/// Errors that can occur during date/time conversion or validation.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DateTimeError {
    /// A field is outside its documented range
    InvalidDateTime,
    /// The year is outside 2000-2099
    YearOutOfRange,
}

/// A calendar date and time of day as kept by the RTC.
///
/// `year` counts from 2000. `weekday` is carried through unchanged; nothing
/// in the firmware interprets it.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RtcDateTime {
    /// 0-59
    pub second: u8,
    /// 0-59
    pub minute: u8,
    /// 0-23
    pub hour: u8,
    /// 1-31
    pub day: u8,
    /// 0-6, 0 is Sunday
    pub weekday: u8,
    /// 1-12
    pub month: u8,
    /// 0-99, offset from 2000
    pub year: u8,
}

impl RtcDateTime {
    /// 2014-03-17 00:00:00, written when the RTC lost its time.
    pub const DEFAULT: RtcDateTime = RtcDateTime {
        second: 0,
        minute: 0,
        hour: 0,
        day: 17,
        weekday: 0,
        month: 3,
        year: 14,
    };

    /// Checks every field against its documented range.
    ///
    /// # Errors
    ///
    /// Returns [`DateTimeError::InvalidDateTime`] naming no field in
    /// particular; the day is only checked against 1-31, not the month.
    pub fn validate(&self) -> Result<(), DateTimeError> {
        let valid = self.second <= 59
            && self.minute <= 59
            && self.hour <= 23
            && (1..=31).contains(&self.day)
            && self.weekday <= 6
            && (1..=12).contains(&self.month)
            && self.year <= 99;
        if valid {
            Ok(())
        } else {
            Err(DateTimeError::InvalidDateTime)
        }
    }

    /// Returns a copy whose day does not run past the end of its month.
    ///
    /// The menu lets the user pick any day from 1 to 31 independently of the
    /// month, so 02-31 becomes 02-28 (or 02-29 in a leap year).
    #[must_use]
    pub fn clamp_day_to_month(&self) -> Self {
        let mut clamped = *self;
        let year = 2000 + i32::from(self.year);
        while clamped.day > 28
            && NaiveDate::from_ymd_opt(year, u32::from(clamped.month), u32::from(clamped.day))
                .is_none()
        {
            clamped.day -= 1;
        }
        clamped
    }

    /// Converts to a chrono `NaiveDateTime`.
    ///
    /// # Errors
    ///
    /// Returns [`DateTimeError::InvalidDateTime`] when the fields do not form
    /// a real calendar date.
    pub fn to_naive(&self) -> Result<NaiveDateTime, DateTimeError> {
        self.validate()?;
        NaiveDate::from_ymd_opt(
            2000 + i32::from(self.year),
            u32::from(self.month),
            u32::from(self.day),
        )
        .and_then(|d| {
            d.and_hms_opt(
                u32::from(self.hour),
                u32::from(self.minute),
                u32::from(self.second),
            )
        })
        .ok_or(DateTimeError::InvalidDateTime)
    }

    /// Builds an `RtcDateTime` from a chrono `NaiveDateTime`.
    ///
    /// # Errors
    ///
    /// Returns [`DateTimeError::YearOutOfRange`] outside 2000-2099.
    pub fn from_naive(datetime: &NaiveDateTime) -> Result<Self, DateTimeError> {
        let year = datetime.year();
        if !(2000..=2099).contains(&year) {
            error!("Year {} is out of range, must be 2000-2099", year);
            return Err(DateTimeError::YearOutOfRange);
        }
        let narrow = |v: u32| u8::try_from(v).map_err(|_| DateTimeError::InvalidDateTime);
        Ok(RtcDateTime {
            second: narrow(datetime.second())?,
            minute: narrow(datetime.minute())?,
            hour: narrow(datetime.hour())?,
            day: narrow(datetime.day())?,
            weekday: narrow(datetime.weekday().num_days_from_sunday())?,
            month: narrow(datetime.month())?,
            year: u8::try_from(year - 2000).map_err(|_| DateTimeError::YearOutOfRange)?,
        })
    }
}

/// The seven date/time registers exactly as transferred on the bus.
#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) struct RawDateTime {
    seconds: Seconds,
    minutes: Minutes,
    hours: Hours,
    days: Days,
    weekdays: Weekdays,
    months: Months,
    years: Years,
}

impl RawDateTime {
    /// Encodes validated fields into BCD registers.
    pub(crate) fn from_datetime(datetime: &RtcDateTime) -> Result<Self, DateTimeError> {
        datetime.validate()?;
        debug!("encoding {:?}", datetime);
        Ok(RawDateTime {
            seconds: Seconds::from(encode_bcd(datetime.second)),
            minutes: Minutes::from(encode_bcd(datetime.minute)),
            hours: Hours::from(encode_bcd(datetime.hour)),
            days: Days::from(encode_bcd(datetime.day)),
            weekdays: Weekdays::from(datetime.weekday),
            months: Months::from(encode_bcd(datetime.month)),
            years: Years::from(encode_bcd(datetime.year)),
        })
    }

    /// Decodes the registers, ignoring the value-lost and century flags.
    ///
    /// No range check is applied: a failed or partial bus read still yields
    /// something displayable.
    pub(crate) fn into_datetime(self) -> RtcDateTime {
        RtcDateTime {
            second: decode_bcd(u8::from(self.seconds) & 0x7F),
            minute: decode_bcd(u8::from(self.minutes) & 0x7F),
            hour: decode_bcd(u8::from(self.hours) & 0x3F),
            day: decode_bcd(u8::from(self.days) & 0x3F),
            weekday: self.weekdays.weekday(),
            month: decode_bcd(u8::from(self.months) & 0x1F),
            year: decode_bcd(self.years.into()),
        }
    }

    pub(crate) fn value_lost(&self) -> bool {
        self.seconds.value_lost()
    }
}

impl From<[u8; 7]> for RawDateTime {
    fn from(data: [u8; 7]) -> Self {
        RawDateTime {
            seconds: Seconds::from(data[0]),
            minutes: Minutes::from(data[1]),
            hours: Hours::from(data[2]),
            days: Days::from(data[3]),
            weekdays: Weekdays::from(data[4]),
            months: Months::from(data[5]),
            years: Years::from(data[6]),
        }
    }
}

impl From<&RawDateTime> for [u8; 7] {
    fn from(dt: &RawDateTime) -> [u8; 7] {
        [
            dt.seconds.into(),
            dt.minutes.into(),
            dt.hours.into(),
            dt.days.into(),
            dt.weekdays.into(),
            dt.months.into(),
            dt.years.into(),
        ]
    }
}
