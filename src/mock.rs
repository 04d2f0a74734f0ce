//! Test doubles for the collaborators of the RTC driver and the controller.
//!
//! [`TransportMock`] follows the `embedded-hal-mock` pattern: it is built from
//! the exact list of expected bus operations, panics on the first mismatch,
//! and [`TransportMock::done`] checks that nothing was left unconsumed.

extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;
use core::cell::Cell;

use embedded_hal::delay::DelayNs;

use crate::bus::{Ack, BusError, Direction, Transport};
use crate::controller::Board;
use crate::display::CharacterDisplay;
use crate::registers::{RegAddr, RTC_ADDRESS};

/// One expected bus operation and the response to give.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Transaction {
    Start {
        address: u8,
        direction: Direction,
        error: Option<BusError>,
    },
    RepeatedStart {
        address: u8,
        direction: Direction,
        error: Option<BusError>,
    },
    Stop {
        error: Option<BusError>,
    },
    Send {
        byte: u8,
        error: Option<BusError>,
    },
    Receive {
        ack: Ack,
        byte: u8,
        error: Option<BusError>,
    },
}

impl Transaction {
    pub fn start(direction: Direction) -> Self {
        Transaction::Start {
            address: RTC_ADDRESS,
            direction,
            error: None,
        }
    }

    pub fn repeated_start(direction: Direction) -> Self {
        Transaction::RepeatedStart {
            address: RTC_ADDRESS,
            direction,
            error: None,
        }
    }

    pub fn stop() -> Self {
        Transaction::Stop { error: None }
    }

    pub fn send(byte: u8) -> Self {
        Transaction::Send { byte, error: None }
    }

    pub fn receive(ack: Ack, byte: u8) -> Self {
        Transaction::Receive {
            ack,
            byte,
            error: None,
        }
    }

    /// Makes the operation fail with `error`.
    pub fn with_error(self, error: BusError) -> Self {
        match self {
            Transaction::Start {
                address, direction, ..
            } => Transaction::Start {
                address,
                direction,
                error: Some(error),
            },
            Transaction::RepeatedStart {
                address, direction, ..
            } => Transaction::RepeatedStart {
                address,
                direction,
                error: Some(error),
            },
            Transaction::Stop { .. } => Transaction::Stop { error: Some(error) },
            Transaction::Send { byte, .. } => Transaction::Send {
                byte,
                error: Some(error),
            },
            Transaction::Receive { ack, byte, .. } => Transaction::Receive {
                ack,
                byte,
                error: Some(error),
            },
        }
    }
}

/// Expectations for writing `data` starting at `register`, as one transaction.
pub fn write_registers(register: RegAddr, data: &[u8]) -> Vec<Transaction> {
    let mut expected = alloc::vec![Transaction::start(Direction::Write)];
    expected.push(Transaction::send(register as u8));
    expected.extend(data.iter().map(|b| Transaction::send(*b)));
    expected.push(Transaction::stop());
    expected
}

/// Expectations for a burst read of `data` starting at `register`.
pub fn read_registers(register: RegAddr, data: &[u8]) -> Vec<Transaction> {
    let mut expected = alloc::vec![
        Transaction::start(Direction::Write),
        Transaction::send(register as u8),
        Transaction::repeated_start(Direction::Read),
    ];
    let last = data.len().saturating_sub(1);
    expected.extend(data.iter().enumerate().map(|(i, b)| {
        let ack = if i == last { Ack::Nack } else { Ack::Ack };
        Transaction::receive(ack, *b)
    }));
    expected.push(Transaction::stop());
    expected
}

/// Scripted [`Transport`].
#[derive(Debug)]
pub struct TransportMock {
    expected: Vec<Transaction>,
    next: usize,
}

impl TransportMock {
    pub fn new(expected: &[Transaction]) -> Self {
        Self {
            expected: expected.to_vec(),
            next: 0,
        }
    }

    /// Asserts every expectation was consumed.
    pub fn done(&mut self) {
        assert_eq!(
            self.next,
            self.expected.len(),
            "unconsumed bus operations: {:?}",
            &self.expected[self.next..]
        );
    }

    fn take(&mut self, got: &dyn core::fmt::Debug) -> Transaction {
        let Some(expected) = self.expected.get(self.next).copied() else {
            panic!("unexpected bus operation {:?}, script exhausted", got);
        };
        self.next += 1;
        expected
    }
}

fn respond(error: Option<BusError>) -> Result<(), BusError> {
    match error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

impl Transport for TransportMock {
    fn start(&mut self, address: u8, direction: Direction) -> Result<(), BusError> {
        match self.take(&("start", address, direction)) {
            Transaction::Start {
                address: a,
                direction: d,
                error,
            } if a == address && d == direction => respond(error),
            other => panic!("expected {:?}, got start({:#x}, {:?})", other, address, direction),
        }
    }

    fn repeated_start(&mut self, address: u8, direction: Direction) -> Result<(), BusError> {
        match self.take(&("repeated_start", address, direction)) {
            Transaction::RepeatedStart {
                address: a,
                direction: d,
                error,
            } if a == address && d == direction => respond(error),
            other => panic!(
                "expected {:?}, got repeated_start({:#x}, {:?})",
                other, address, direction
            ),
        }
    }

    fn stop(&mut self) -> Result<(), BusError> {
        match self.take(&"stop") {
            Transaction::Stop { error } => respond(error),
            other => panic!("expected {:?}, got stop", other),
        }
    }

    fn send(&mut self, byte: u8) -> Result<(), BusError> {
        match self.take(&("send", byte)) {
            Transaction::Send { byte: b, error } if b == byte => respond(error),
            other => panic!("expected {:?}, got send({:#04x})", other, byte),
        }
    }

    fn receive(&mut self, ack: Ack) -> Result<u8, BusError> {
        match self.take(&("receive", ack)) {
            Transaction::Receive { ack: a, byte, error } if a == ack => {
                respond(error).map(|()| byte)
            }
            other => panic!("expected {:?}, got receive({:?})", other, ack),
        }
    }
}

/// 8x2 character display that keeps the visible text.
#[derive(Debug)]
pub struct RecordingDisplay {
    rows: [[u8; 8]; 2],
    position: (u8, u8),
    pub cursor: Option<(u8, u8)>,
    pub clears: usize,
}

impl RecordingDisplay {
    pub fn new() -> Self {
        Self {
            rows: [[b' '; 8]; 2],
            position: (0, 0),
            cursor: None,
            clears: 0,
        }
    }

    /// Visible text of `row` with trailing blanks removed.
    pub fn row(&self, row: usize) -> String {
        let text: String = self.rows[row].iter().map(|b| char::from(*b)).collect();
        String::from(text.trim_end())
    }
}

impl CharacterDisplay for RecordingDisplay {
    fn clear(&mut self) {
        self.rows = [[b' '; 8]; 2];
        self.position = (0, 0);
        self.clears += 1;
    }

    fn set_cursor(&mut self, col: u8, row: u8) {
        self.position = (col, row);
    }

    fn write_str(&mut self, text: &str) {
        let (mut col, row) = self.position;
        for b in text.bytes() {
            if let Some(cell) = self
                .rows
                .get_mut(usize::from(row))
                .and_then(|r| r.get_mut(usize::from(col)))
            {
                *cell = b;
            }
            col = col.saturating_add(1);
        }
        self.position = (col, row);
    }

    fn show_cursor(&mut self, col: u8, row: u8) {
        self.cursor = Some((col, row));
    }

    fn hide_cursor(&mut self) {
        self.cursor = None;
    }
}

/// Board whose button port is set by the test. Entering low power counts
/// the sleep and applies `wake_port`, the buttons as seen after wake-up.
#[derive(Debug)]
pub struct FakeBoard {
    pub port: Cell<u8>,
    pub wake_port: u8,
    pub sleeps: usize,
}

impl FakeBoard {
    pub const RELEASED: u8 = 0xFF;

    pub fn new() -> Self {
        Self {
            port: Cell::new(Self::RELEASED),
            wake_port: Self::RELEASED,
            sleeps: 0,
        }
    }
}

impl Board for FakeBoard {
    fn read_buttons(&mut self) -> u8 {
        self.port.get()
    }

    fn sleep(&mut self) {
        self.sleeps += 1;
        self.port.set(self.wake_port);
    }
}

/// [`DelayNs`] that only adds up the requested time.
#[derive(Debug, Default)]
pub struct RecordingDelay {
    pub total_ns: u64,
}

impl RecordingDelay {
    pub fn total_ms(&self) -> u64 {
        self.total_ns / 1_000_000
    }
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }
}
