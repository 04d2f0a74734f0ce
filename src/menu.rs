//! The configuration menu.
//!
//! Three view screens (clock, alarm, power-on time) cycle on a short press of
//! the advance button; a long press of the select button enters the matching
//! edit sequence. Within an edit screen the advance button increments the
//! value (repeating while held past the long-press threshold) and the select
//! button confirms it.
//!
//! The edit screens for the clock and the alarm are rows of two tables.
//! [`MenuMode::screen`] maps every mode to its screen with an exhaustive
//! match, and the tables are checked for consistency at compile time.
//!
//! A value being edited lives in the menu's draft until the last field of the
//! sequence is confirmed; only then is a [`Commit`] handed to the caller.

use crate::alarm::AlarmTime;
use crate::button::{ButtonMask, ButtonSnapshot};
use crate::datetime::RtcDateTime;
use crate::display::{self, CharacterDisplay};
use crate::Config;

/// Every screen of the menu.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MenuMode {
    ShowClock,
    SetYear,
    SetMonth,
    SetDay,
    SetHour,
    SetMinute,
    SetSecond,
    ShowAlarm,
    SetAlarmEnabled,
    SetAlarmHour,
    SetAlarmMinute,
    ShowPowerOn,
    SetPowerOn,
}

impl MenuMode {
    pub const ALL: [MenuMode; 13] = [
        MenuMode::ShowClock,
        MenuMode::SetYear,
        MenuMode::SetMonth,
        MenuMode::SetDay,
        MenuMode::SetHour,
        MenuMode::SetMinute,
        MenuMode::SetSecond,
        MenuMode::ShowAlarm,
        MenuMode::SetAlarmEnabled,
        MenuMode::SetAlarmHour,
        MenuMode::SetAlarmMinute,
        MenuMode::ShowPowerOn,
        MenuMode::SetPowerOn,
    ];

    /// The screen shown in this mode.
    pub const fn screen(self) -> Screen {
        match self {
            MenuMode::ShowClock => Screen::View(View::Clock),
            MenuMode::SetYear => Screen::EditClock(CLOCK_ROWS[0]),
            MenuMode::SetMonth => Screen::EditClock(CLOCK_ROWS[1]),
            MenuMode::SetDay => Screen::EditClock(CLOCK_ROWS[2]),
            MenuMode::SetHour => Screen::EditClock(CLOCK_ROWS[3]),
            MenuMode::SetMinute => Screen::EditClock(CLOCK_ROWS[4]),
            MenuMode::SetSecond => Screen::EditClock(CLOCK_ROWS[5]),
            MenuMode::ShowAlarm => Screen::View(View::Alarm),
            MenuMode::SetAlarmEnabled => Screen::EditAlarmEnabled,
            MenuMode::SetAlarmHour => Screen::EditAlarm(ALARM_ROWS[0]),
            MenuMode::SetAlarmMinute => Screen::EditAlarm(ALARM_ROWS[1]),
            MenuMode::ShowPowerOn => Screen::View(View::PowerOn),
            MenuMode::SetPowerOn => Screen::EditPowerOn,
        }
    }

    pub const fn is_view(self) -> bool {
        matches!(self.screen(), Screen::View(_))
    }
}

/// What a [`MenuMode`] shows and edits.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Screen {
    View(View),
    EditClock(ClockFieldRow),
    EditAlarmEnabled,
    EditAlarm(AlarmRow),
    EditPowerOn,
}

/// The three view screens.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum View {
    Clock,
    Alarm,
    PowerOn,
}

impl View {
    pub const fn mode(self) -> MenuMode {
        match self {
            View::Clock => MenuMode::ShowClock,
            View::Alarm => MenuMode::ShowAlarm,
            View::PowerOn => MenuMode::ShowPowerOn,
        }
    }

    /// Clock, alarm, power-on, back to clock.
    pub const fn next(self) -> View {
        match self {
            View::Clock => View::Alarm,
            View::Alarm => View::PowerOn,
            View::PowerOn => View::Clock,
        }
    }

    /// First edit mode entered from this view.
    pub const fn edit(self) -> MenuMode {
        match self {
            View::Clock => MenuMode::SetYear,
            View::Alarm => MenuMode::SetAlarmEnabled,
            View::PowerOn => MenuMode::SetPowerOn,
        }
    }
}

/// A field of [`RtcDateTime`] editable from the menu.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ClockField {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
}

impl ClockField {
    pub fn get(self, datetime: &RtcDateTime) -> u8 {
        match self {
            ClockField::Year => datetime.year,
            ClockField::Month => datetime.month,
            ClockField::Day => datetime.day,
            ClockField::Hour => datetime.hour,
            ClockField::Minute => datetime.minute,
            ClockField::Second => datetime.second,
        }
    }

    pub fn set(self, datetime: &mut RtcDateTime, value: u8) {
        let field = match self {
            ClockField::Year => &mut datetime.year,
            ClockField::Month => &mut datetime.month,
            ClockField::Day => &mut datetime.day,
            ClockField::Hour => &mut datetime.hour,
            ClockField::Minute => &mut datetime.minute,
            ClockField::Second => &mut datetime.second,
        };
        *field = value;
    }
}

/// Which text line an edited clock field appears in.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ClockLine {
    /// `yyyymmdd`
    Date,
    /// `hh:mm:ss`
    Time,
}

/// One row of the clock field table.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ClockFieldRow {
    pub title: &'static str,
    pub min: u8,
    pub max: u8,
    pub field: ClockField,
    pub line: ClockLine,
    /// Column of the field's last digit in `line`
    pub cursor: u8,
    /// Mode entered on confirm
    pub next: MenuMode,
    /// Field the next mode starts editing, `None` when `next` is a view
    pub seed: Option<ClockField>,
}

const CLOCK_ROWS: [ClockFieldRow; 6] = [
    ClockFieldRow {
        title: "DATE?",
        min: 0,
        max: 99,
        field: ClockField::Year,
        line: ClockLine::Date,
        cursor: 3,
        next: MenuMode::SetMonth,
        seed: Some(ClockField::Month),
    },
    ClockFieldRow {
        title: "DATE?",
        min: 1,
        max: 12,
        field: ClockField::Month,
        line: ClockLine::Date,
        cursor: 5,
        next: MenuMode::SetDay,
        seed: Some(ClockField::Day),
    },
    ClockFieldRow {
        title: "DATE?",
        min: 1,
        max: 31,
        field: ClockField::Day,
        line: ClockLine::Date,
        cursor: 7,
        next: MenuMode::SetHour,
        seed: Some(ClockField::Hour),
    },
    ClockFieldRow {
        title: "TIME?",
        min: 0,
        max: 23,
        field: ClockField::Hour,
        line: ClockLine::Time,
        cursor: 1,
        next: MenuMode::SetMinute,
        seed: Some(ClockField::Minute),
    },
    ClockFieldRow {
        title: "TIME?",
        min: 0,
        max: 59,
        field: ClockField::Minute,
        line: ClockLine::Time,
        cursor: 4,
        next: MenuMode::SetSecond,
        seed: Some(ClockField::Second),
    },
    ClockFieldRow {
        title: "TIME?",
        min: 0,
        max: 59,
        field: ClockField::Second,
        line: ClockLine::Time,
        cursor: 7,
        next: MenuMode::ShowClock,
        seed: None,
    },
];

/// An alarm field editable from the menu.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AlarmPart {
    Hour,
    Minute,
}

impl AlarmPart {
    fn get(self, alarm: &AlarmTime) -> Option<u8> {
        match self {
            AlarmPart::Hour => alarm.hour,
            AlarmPart::Minute => alarm.minute,
        }
    }

    fn set(self, alarm: &mut AlarmTime, value: u8) {
        match self {
            AlarmPart::Hour => alarm.hour = Some(value),
            AlarmPart::Minute => alarm.minute = Some(value),
        }
    }
}

/// One row of the alarm field table. Every alarm field starts at 0.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AlarmRow {
    pub part: AlarmPart,
    pub max: u8,
    /// Column of the field's last digit in `hh:mm`
    pub cursor: u8,
    pub next: MenuMode,
    pub seed: Option<AlarmPart>,
}

const ALARM_ROWS: [AlarmRow; 2] = [
    AlarmRow {
        part: AlarmPart::Hour,
        max: 23,
        cursor: 1,
        next: MenuMode::SetAlarmMinute,
        seed: Some(AlarmPart::Minute),
    },
    AlarmRow {
        part: AlarmPart::Minute,
        max: 59,
        cursor: 4,
        next: MenuMode::ShowAlarm,
        seed: None,
    },
];

/// Bounds of the relay on-time in seconds.
pub const POWER_ON_MIN: u8 = 1;
pub const POWER_ON_MAX: u8 = 99;

const DISPLAY_COLUMNS: u8 = 8;

const fn clock_seed_matches(next: MenuMode, seed: Option<ClockField>) -> bool {
    match (next.screen(), seed) {
        (Screen::EditClock(row), Some(field)) => row.field as u8 == field as u8,
        (Screen::View(_), None) => true,
        _ => false,
    }
}

const fn alarm_seed_matches(next: MenuMode, seed: Option<AlarmPart>) -> bool {
    match (next.screen(), seed) {
        (Screen::EditAlarm(row), Some(part)) => row.part as u8 == part as u8,
        (Screen::View(_), None) => true,
        _ => false,
    }
}

const fn tables_are_consistent() -> bool {
    let mut i = 0;
    while i < MenuMode::ALL.len() {
        let mode = MenuMode::ALL[i];
        if mode as usize != i {
            return false;
        }
        let ok = match mode.screen() {
            Screen::EditClock(row) => {
                row.min <= row.max
                    && row.cursor < DISPLAY_COLUMNS
                    && clock_seed_matches(row.next, row.seed)
            }
            Screen::EditAlarm(row) => {
                row.cursor < DISPLAY_COLUMNS && alarm_seed_matches(row.next, row.seed)
            }
            Screen::View(view) => view.mode() as u8 == mode as u8 && !view.edit().is_view(),
            Screen::EditAlarmEnabled | Screen::EditPowerOn => true,
        };
        if !ok {
            return false;
        }
        i += 1;
    }
    true
}

const _: () = assert!(tables_are_consistent(), "menu tables are inconsistent");

/// Increments `value` when `increment` is set and wraps anything outside
/// `min..=max` to `min`.
pub const fn choose_value(value: u8, min: u8, max: u8, increment: bool) -> u8 {
    let value = if increment { value.wrapping_add(1) } else { value };
    if value > max || value < min {
        min
    } else {
        value
    }
}

/// User preferences edited from the menu.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Settings {
    pub alarm: AlarmTime,
    pub alarm_enabled: bool,
    /// Relay on-time in seconds (1-99)
    pub power_on_seconds: u8,
}

/// A confirmed edit that must reach the RTC.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Commit {
    Time(RtcDateTime),
    Alarm(AlarmTime),
    AlarmOff,
}

/// Menu state machine.
pub struct Menu {
    mode: MenuMode,
    advance: ButtonMask,
    select: ButtonMask,
    /// Value under edit in the current mode
    setting: u8,
    time: RtcDateTime,
    draft_time: RtcDateTime,
    draft_alarm: AlarmTime,
    settings: Settings,
}

impl Menu {
    pub fn new(config: &Config) -> Self {
        Self {
            mode: MenuMode::ShowClock,
            advance: config.advance_button,
            select: config.select_button,
            setting: 0,
            time: config.default_datetime,
            draft_time: config.default_datetime,
            draft_alarm: AlarmTime::daily(0, 0),
            settings: Settings {
                alarm: AlarmTime::daily(0, 0),
                alarm_enabled: false,
                power_on_seconds: choose_value(
                    config.power_on_seconds,
                    POWER_ON_MIN,
                    POWER_ON_MAX,
                    false,
                ),
            },
        }
    }

    pub fn mode(&self) -> MenuMode {
        self.mode
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The last date and time read from the clock.
    pub fn time(&self) -> &RtcDateTime {
        &self.time
    }

    /// Whether the current screen shows the live clock.
    pub fn wants_time(&self) -> bool {
        self.mode == MenuMode::ShowClock
    }

    pub fn update_time(&mut self, now: RtcDateTime) {
        self.time = now;
    }

    /// Returns to the clock view without committing anything.
    pub fn reset(&mut self) {
        self.mode = MenuMode::ShowClock;
    }

    fn enter<D: CharacterDisplay + ?Sized>(&mut self, mode: MenuMode, setting: u8, display: &mut D) {
        debug!("menu: {:?} -> {:?}", self.mode, mode);
        self.mode = mode;
        self.setting = setting;
        display.clear();
    }

    fn choose(&mut self, buttons: &ButtonSnapshot, min: u8, max: u8) -> u8 {
        let increment = (buttons.pressed | buttons.keep_long_pressed).intersects(self.advance);
        self.setting = choose_value(self.setting, min, max, increment);
        self.setting
    }

    fn confirmed(&self, buttons: &ButtonSnapshot) -> bool {
        buttons.pressed.intersects(self.select)
    }

    /// Runs one cycle of the current screen: applies button input, renders
    /// and performs at most one transition.
    pub fn step<D: CharacterDisplay + ?Sized>(
        &mut self,
        buttons: &ButtonSnapshot,
        display: &mut D,
    ) -> Option<Commit> {
        match self.mode.screen() {
            Screen::View(view) => {
                self.view(view, buttons, display);
                None
            }
            Screen::EditClock(row) => self.edit_clock(&row, buttons, display),
            Screen::EditAlarmEnabled => self.edit_alarm_enabled(buttons, display),
            Screen::EditAlarm(row) => self.edit_alarm(&row, buttons, display),
            Screen::EditPowerOn => {
                self.edit_power_on(buttons, display);
                None
            }
        }
    }

    fn view<D: CharacterDisplay + ?Sized>(
        &mut self,
        view: View,
        buttons: &ButtonSnapshot,
        display: &mut D,
    ) {
        let seed = match view {
            View::Clock => {
                display::show_lines(
                    display,
                    &display::date_line(&self.time),
                    &display::time_line(&self.time),
                );
                self.time.year
            }
            View::Alarm => {
                if self.settings.alarm_enabled {
                    display::show_lines(display, "ALARM", &display::alarm_line(&self.settings.alarm));
                } else {
                    display::show_lines(display, "ALARM", display::on_off(false));
                }
                u8::from(self.settings.alarm_enabled)
            }
            View::PowerOn => {
                display::show_lines(
                    display,
                    "PON",
                    &display::duration_line(self.settings.power_on_seconds),
                );
                self.settings.power_on_seconds
            }
        };

        if buttons.pressed.intersects(self.advance) {
            self.enter(view.next().mode(), 0, display);
        } else if buttons.long_pressed.intersects(self.select) {
            match view {
                View::Clock => self.draft_time = self.time,
                View::Alarm => self.draft_alarm = self.settings.alarm,
                View::PowerOn => {}
            }
            self.enter(view.edit(), seed, display);
        }
    }

    fn edit_clock<D: CharacterDisplay + ?Sized>(
        &mut self,
        row: &ClockFieldRow,
        buttons: &ButtonSnapshot,
        display: &mut D,
    ) -> Option<Commit> {
        let value = self.choose(buttons, row.min, row.max);
        row.field.set(&mut self.draft_time, value);
        let line = match row.line {
            ClockLine::Date => display::date_line(&self.draft_time),
            ClockLine::Time => display::time_line(&self.draft_time),
        };
        display::show_lines(display, row.title, &line);
        display.show_cursor(row.cursor, 1);

        if !self.confirmed(buttons) {
            return None;
        }
        let seed = row.seed.map_or(0, |field| field.get(&self.draft_time));
        self.enter(row.next, seed, display);
        if row.seed.is_some() {
            return None;
        }
        let committed = self.draft_time.clamp_day_to_month();
        self.time = committed;
        Some(Commit::Time(committed))
    }

    fn edit_alarm_enabled<D: CharacterDisplay + ?Sized>(
        &mut self,
        buttons: &ButtonSnapshot,
        display: &mut D,
    ) -> Option<Commit> {
        let enabled = self.choose(buttons, 0, 1) == 1;
        display::show_lines(display, "ALARM?", display::on_off(enabled));
        display.show_cursor(0, 1);

        if !self.confirmed(buttons) {
            return None;
        }
        if enabled {
            let hour = AlarmPart::Hour.get(&self.draft_alarm).unwrap_or(0);
            self.enter(MenuMode::SetAlarmHour, hour, display);
            None
        } else {
            self.settings.alarm_enabled = false;
            self.enter(MenuMode::ShowAlarm, 0, display);
            Some(Commit::AlarmOff)
        }
    }

    fn edit_alarm<D: CharacterDisplay + ?Sized>(
        &mut self,
        row: &AlarmRow,
        buttons: &ButtonSnapshot,
        display: &mut D,
    ) -> Option<Commit> {
        let value = self.choose(buttons, 0, row.max);
        row.part.set(&mut self.draft_alarm, value);
        display::show_lines(display, "ALARM?", &display::alarm_line(&self.draft_alarm));
        display.show_cursor(row.cursor, 1);

        if !self.confirmed(buttons) {
            return None;
        }
        let seed = row
            .seed
            .and_then(|part| part.get(&self.draft_alarm))
            .unwrap_or(0);
        self.enter(row.next, seed, display);
        if row.seed.is_some() {
            return None;
        }
        self.settings.alarm = self.draft_alarm;
        self.settings.alarm_enabled = true;
        Some(Commit::Alarm(self.draft_alarm))
    }

    fn edit_power_on<D: CharacterDisplay + ?Sized>(
        &mut self,
        buttons: &ButtonSnapshot,
        display: &mut D,
    ) {
        let seconds = self.choose(buttons, POWER_ON_MIN, POWER_ON_MAX);
        display::show_lines(display, "PON?", &display::duration_line(seconds));
        display.show_cursor(1, 1);

        if self.confirmed(buttons) {
            self.settings.power_on_seconds = seconds;
            self.enter(MenuMode::ShowPowerOn, 0, display);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::RecordingDisplay;

    const ADVANCE: ButtonMask = Config::DEFAULT.advance_button;
    const SELECT: ButtonMask = Config::DEFAULT.select_button;

    fn idle() -> ButtonSnapshot {
        ButtonSnapshot::default()
    }

    fn press(mask: ButtonMask) -> ButtonSnapshot {
        ButtonSnapshot {
            raw: mask,
            pressed: mask,
            ..ButtonSnapshot::default()
        }
    }

    fn long_press(mask: ButtonMask) -> ButtonSnapshot {
        ButtonSnapshot {
            raw: mask,
            long_pressed: mask,
            keep_long_pressed: mask,
            ..ButtonSnapshot::default()
        }
    }

    fn held_long(mask: ButtonMask) -> ButtonSnapshot {
        ButtonSnapshot {
            raw: mask,
            keep_long_pressed: mask,
            ..ButtonSnapshot::default()
        }
    }

    /// A menu in `mode` reached through the buttons, starting from `time`.
    fn menu_at(time: RtcDateTime, mode: MenuMode, display: &mut RecordingDisplay) -> Menu {
        let mut menu = Menu::new(&Config::DEFAULT);
        menu.update_time(time);
        assert_eq!(menu.step(&long_press(SELECT), display), None);
        while menu.mode() != mode {
            assert_eq!(menu.step(&press(SELECT), display), None, "walking to {:?}", mode);
        }
        menu
    }

    #[test]
    fn test_choose_value_wraps() {
        assert_eq!(choose_value(59, 0, 59, true), 0);
        assert_eq!(choose_value(23, 0, 23, true), 0);
        assert_eq!(choose_value(12, 1, 12, true), 1);
        assert_eq!(choose_value(5, 1, 12, true), 6);
        assert_eq!(choose_value(5, 1, 12, false), 5);
        assert_eq!(choose_value(0, 1, 12, false), 1);
        assert_eq!(choose_value(255, 0, 99, true), 0);
    }

    #[test]
    fn test_every_mode_has_a_screen() {
        let views = MenuMode::ALL.iter().filter(|m| m.is_view()).count();
        assert_eq!(views, 3);
        assert!(tables_are_consistent());
    }

    #[test]
    fn test_view_cycle() {
        let mut display = RecordingDisplay::new();
        let mut menu = Menu::new(&Config::DEFAULT);
        menu.step(&press(ADVANCE), &mut display);
        assert_eq!(menu.mode(), MenuMode::ShowAlarm);
        menu.step(&press(ADVANCE), &mut display);
        assert_eq!(menu.mode(), MenuMode::ShowPowerOn);
        menu.step(&press(ADVANCE), &mut display);
        assert_eq!(menu.mode(), MenuMode::ShowClock);
        assert_eq!(display.clears, 3);

        // select only acts on a long press
        menu.step(&press(SELECT), &mut display);
        assert_eq!(menu.mode(), MenuMode::ShowClock);
    }

    #[test]
    fn test_show_clock_renders_default_time() {
        let mut display = RecordingDisplay::new();
        let mut menu = Menu::new(&Config::DEFAULT);
        menu.update_time(RtcDateTime::DEFAULT);
        assert_eq!(menu.step(&idle(), &mut display), None);
        assert_eq!(display.row(0), "20140317");
        assert_eq!(display.row(1), "00:00:00");
        assert_eq!(display.cursor, None);
    }

    #[test]
    fn test_edit_clock_renders_field_with_cursor() {
        let mut display = RecordingDisplay::new();
        let mut menu = menu_at(RtcDateTime::DEFAULT, MenuMode::SetYear, &mut display);
        menu.step(&press(ADVANCE), &mut display);
        assert_eq!(display.row(0), "DATE?");
        assert_eq!(display.row(1), "20150317");
        assert_eq!(display.cursor, Some((3, 1)));
    }

    #[test]
    fn test_seconds_wrap_to_zero() {
        let mut display = RecordingDisplay::new();
        let time = RtcDateTime {
            second: 59,
            ..RtcDateTime::DEFAULT
        };
        let mut menu = menu_at(time, MenuMode::SetSecond, &mut display);
        menu.step(&press(ADVANCE), &mut display);
        assert_eq!(display.row(1), "00:00:00");
    }

    #[test]
    fn test_hour_wraps_to_zero() {
        let mut display = RecordingDisplay::new();
        let time = RtcDateTime {
            hour: 23,
            minute: 45,
            ..RtcDateTime::DEFAULT
        };
        let mut menu = menu_at(time, MenuMode::SetHour, &mut display);
        menu.step(&press(ADVANCE), &mut display);
        assert_eq!(display.row(1), "00:45:00");
    }

    #[test]
    fn test_month_wraps_without_touching_day() {
        let mut display = RecordingDisplay::new();
        let time = RtcDateTime {
            month: 12,
            day: 24,
            ..RtcDateTime::DEFAULT
        };
        let mut menu = menu_at(time, MenuMode::SetMonth, &mut display);
        menu.step(&press(ADVANCE), &mut display);
        assert_eq!(display.row(1), "20140124");
        assert_eq!(display.cursor, Some((5, 1)));
    }

    #[test]
    fn test_held_advance_repeats() {
        let mut display = RecordingDisplay::new();
        let mut menu = menu_at(RtcDateTime::DEFAULT, MenuMode::SetMinute, &mut display);
        for _ in 0..5 {
            menu.step(&held_long(ADVANCE), &mut display);
        }
        assert_eq!(display.row(1), "00:05:00");
    }

    #[test]
    fn test_commit_seconds_writes_time_once() {
        let mut display = RecordingDisplay::new();
        let mut menu = Menu::new(&Config::DEFAULT);
        menu.update_time(RtcDateTime::DEFAULT);

        let mut commits = heapless::Vec::<Commit, 4>::new();
        let mut record = |commit: Option<Commit>| {
            if let Some(c) = commit {
                commits.push(c).unwrap();
            }
        };

        record(menu.step(&long_press(SELECT), &mut display));
        assert_eq!(menu.mode(), MenuMode::SetYear);
        // year 14 -> 15, confirm
        record(menu.step(&press(ADVANCE), &mut display));
        record(menu.step(&press(SELECT), &mut display));
        // month, day, hour unchanged
        record(menu.step(&press(SELECT), &mut display));
        record(menu.step(&press(SELECT), &mut display));
        record(menu.step(&press(SELECT), &mut display));
        assert_eq!(menu.mode(), MenuMode::SetMinute);
        // minute 0 -> 1
        record(menu.step(&press(ADVANCE), &mut display));
        record(menu.step(&press(SELECT), &mut display));
        assert_eq!(menu.mode(), MenuMode::SetSecond);
        record(menu.step(&idle(), &mut display));
        record(menu.step(&press(SELECT), &mut display));

        assert_eq!(menu.mode(), MenuMode::ShowClock);
        let expected = RtcDateTime {
            minute: 1,
            year: 15,
            ..RtcDateTime::DEFAULT
        };
        assert_eq!(commits.as_slice(), &[Commit::Time(expected)]);
        assert_eq!(menu.time(), &expected);
    }

    #[test]
    fn test_commit_clamps_day() {
        let mut display = RecordingDisplay::new();
        let time = RtcDateTime {
            day: 31,
            month: 1,
            year: 23,
            ..RtcDateTime::DEFAULT
        };
        let mut menu = menu_at(time, MenuMode::SetMonth, &mut display);
        // January -> February
        menu.step(&press(ADVANCE), &mut display);
        let mut commit = None;
        while commit.is_none() {
            commit = menu.step(&press(SELECT), &mut display);
        }
        match commit {
            Some(Commit::Time(t)) => assert_eq!((t.month, t.day), (2, 28)),
            other => panic!("unexpected commit {:?}", other),
        }
    }

    #[test]
    fn test_alarm_edit_sequence() {
        let mut display = RecordingDisplay::new();
        let mut menu = Menu::new(&Config::DEFAULT);
        menu.step(&press(ADVANCE), &mut display);
        menu.step(&idle(), &mut display);
        assert_eq!(display.row(0), "ALARM");
        assert_eq!(display.row(1), "OFF");

        menu.step(&long_press(SELECT), &mut display);
        assert_eq!(menu.mode(), MenuMode::SetAlarmEnabled);
        menu.step(&press(ADVANCE), &mut display);
        assert_eq!(display.row(1), "ON");
        assert_eq!(menu.step(&press(SELECT), &mut display), None);
        assert_eq!(menu.mode(), MenuMode::SetAlarmHour);

        for _ in 0..7 {
            menu.step(&press(ADVANCE), &mut display);
        }
        assert_eq!(display.row(1), "07:00");
        assert_eq!(display.cursor, Some((1, 1)));
        menu.step(&press(SELECT), &mut display);
        assert_eq!(menu.mode(), MenuMode::SetAlarmMinute);

        for _ in 0..30 {
            menu.step(&press(ADVANCE), &mut display);
        }
        assert_eq!(display.cursor, Some((4, 1)));
        let commit = menu.step(&press(SELECT), &mut display);
        assert_eq!(commit, Some(Commit::Alarm(AlarmTime::daily(7, 30))));
        assert_eq!(menu.mode(), MenuMode::ShowAlarm);
        assert!(menu.settings().alarm_enabled);

        menu.step(&idle(), &mut display);
        assert_eq!(display.row(1), "07:30");
    }

    #[test]
    fn test_alarm_disable() {
        let mut display = RecordingDisplay::new();
        let mut menu = Menu::new(&Config::DEFAULT);
        menu.step(&press(ADVANCE), &mut display);
        menu.step(&long_press(SELECT), &mut display);
        // seeded from the disabled setting
        menu.step(&idle(), &mut display);
        assert_eq!(display.row(1), "OFF");
        assert_eq!(menu.step(&press(SELECT), &mut display), Some(Commit::AlarmOff));
        assert_eq!(menu.mode(), MenuMode::ShowAlarm);
        assert!(!menu.settings().alarm_enabled);
    }

    #[test]
    fn test_power_on_edit() {
        let mut display = RecordingDisplay::new();
        let mut menu = Menu::new(&Config::DEFAULT);
        menu.step(&press(ADVANCE), &mut display);
        menu.step(&press(ADVANCE), &mut display);
        menu.step(&idle(), &mut display);
        assert_eq!(display.row(0), "PON");
        assert_eq!(display.row(1), "10sec");

        menu.step(&long_press(SELECT), &mut display);
        assert_eq!(menu.mode(), MenuMode::SetPowerOn);
        menu.step(&press(ADVANCE), &mut display);
        assert_eq!(display.row(1), "11sec");
        // not committed before confirm
        assert_eq!(menu.settings().power_on_seconds, 10);
        assert_eq!(menu.step(&press(SELECT), &mut display), None);
        assert_eq!(menu.mode(), MenuMode::ShowPowerOn);
        assert_eq!(menu.settings().power_on_seconds, 11);
    }

    #[test]
    fn test_power_on_wraps_to_one() {
        let config = Config {
            power_on_seconds: 99,
            ..Config::DEFAULT
        };
        let mut display = RecordingDisplay::new();
        let mut menu = Menu::new(&config);
        menu.step(&press(ADVANCE), &mut display);
        menu.step(&press(ADVANCE), &mut display);
        menu.step(&long_press(SELECT), &mut display);
        menu.step(&press(ADVANCE), &mut display);
        assert_eq!(display.row(1), "01sec");
    }

    #[test]
    fn test_reset_returns_to_clock() {
        let mut display = RecordingDisplay::new();
        let mut menu = menu_at(RtcDateTime::DEFAULT, MenuMode::SetDay, &mut display);
        menu.reset();
        assert_eq!(menu.mode(), MenuMode::ShowClock);
        assert!(menu.wants_time());
    }
}
