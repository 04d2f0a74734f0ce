//! Character display collaborator and the fixed text formats shown on it.
//!
//! The appliance uses an 8x2 character LCD. Its command protocol is left to
//! board support; the controller only needs [`CharacterDisplay`].

use heapless::String;

use crate::alarm::AlarmTime;
use crate::datetime::{encode_bcd, RtcDateTime};

/// Text of one display line.
pub type Line = String<8>;

/// A small character display addressed by column and row.
pub trait CharacterDisplay {
    /// Blanks the display and homes the write position.
    fn clear(&mut self);

    /// Moves the write position.
    fn set_cursor(&mut self, col: u8, row: u8);

    /// Writes `text` at the write position.
    fn write_str(&mut self, text: &str);

    /// Shows a blinking cursor at the given cell.
    fn show_cursor(&mut self, col: u8, row: u8);

    fn hide_cursor(&mut self);
}

impl<D: CharacterDisplay + ?Sized> CharacterDisplay for &mut D {
    fn clear(&mut self) {
        D::clear(self)
    }

    fn set_cursor(&mut self, col: u8, row: u8) {
        D::set_cursor(self, col, row)
    }

    fn write_str(&mut self, text: &str) {
        D::write_str(self, text)
    }

    fn show_cursor(&mut self, col: u8, row: u8) {
        D::show_cursor(self, col, row)
    }

    fn hide_cursor(&mut self) {
        D::hide_cursor(self)
    }
}

/// Writes two lines and hides the cursor.
pub fn show_lines<D: CharacterDisplay + ?Sized>(display: &mut D, first: &str, second: &str) {
    display.set_cursor(0, 0);
    display.write_str(first);
    display.set_cursor(0, 1);
    display.write_str(second);
    display.hide_cursor();
}

// Appends the two decimal digits of `value` (0-99).
fn push_two_digits(line: &mut Line, value: u8) {
    let bcd = encode_bcd(value % 100);
    for digit in [bcd >> 4, bcd & 0x0F] {
        // capacity is checked by the callers' fixed formats
        let _ = line.push(char::from(b'0' + digit));
    }
}

fn push_separator(line: &mut Line, separator: char) {
    let _ = line.push(separator);
}

/// `"yyyymmdd"` with a fixed `"20"` century, e.g. `"20140317"`.
pub fn date_line(datetime: &RtcDateTime) -> Line {
    let mut line = Line::new();
    let _ = line.push_str("20");
    push_two_digits(&mut line, datetime.year);
    push_two_digits(&mut line, datetime.month);
    push_two_digits(&mut line, datetime.day);
    line
}

/// `"hh:mm:ss"`, e.g. `"07:30:00"`.
pub fn time_line(datetime: &RtcDateTime) -> Line {
    let mut line = Line::new();
    push_two_digits(&mut line, datetime.hour);
    push_separator(&mut line, ':');
    push_two_digits(&mut line, datetime.minute);
    push_separator(&mut line, ':');
    push_two_digits(&mut line, datetime.second);
    line
}

/// `"hh:mm"` of an alarm; a field that is not compared shows as `"--"`.
pub fn alarm_line(alarm: &AlarmTime) -> Line {
    let mut line = Line::new();
    push_alarm_field(&mut line, alarm.hour);
    push_separator(&mut line, ':');
    push_alarm_field(&mut line, alarm.minute);
    line
}

fn push_alarm_field(line: &mut Line, field: Option<u8>) {
    match field {
        Some(v) => push_two_digits(line, v),
        None => {
            let _ = line.push_str("--");
        }
    }
}

/// Relay on-time, e.g. `"10sec"`.
pub fn duration_line(seconds: u8) -> Line {
    let mut line = Line::new();
    push_two_digits(&mut line, seconds);
    let _ = line.push_str("sec");
    line
}

/// `"ON "` or `"OFF"`; both are three cells so one overwrites the other.
pub const fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "ON "
    } else {
        "OFF"
    }
}
