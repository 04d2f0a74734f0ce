//! Master-side two-wire bus transactions.
//!
//! [`Transport`] is the set of primitives the RTC driver is written against:
//! start, repeated start, stop, send and receive. [`MasterTransport`] provides
//! them on top of an MSSP-style peripheral (the synchronous serial port found
//! on small 8-bit microcontrollers) described by [`MsspRegisters`].
//!
//! Byte completion is reported by the peripheral's interrupt. The handler calls
//! [`BusCompletion::complete`](crate::signals::BusCompletion::complete); the
//! transport arms the flag before loading the buffer and spins until it clears.
//! Every spin is bounded by a poll limit so a wedged peripheral surfaces as
//! [`BusError::Timeout`] instead of hanging the main cycle.

use bitfield::bitfield;

use crate::signals::BusCompletion;

/// Transfer direction encoded in the address byte.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Write = 0,
    Read = 1,
}

/// Acknowledge bit sent or received after each byte.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Ack {
    /// Receiver wants more bytes
    Ack = 0,
    /// Receiver is done, or the addressed device is absent
    Nack = 1,
}

/// Errors reported by a [`Transport`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// The peripheral did not acknowledge an address or data byte
    Nack,
    /// The bus never returned to idle or the completion event never arrived
    Timeout,
}

/// Packs a 7-bit address and the direction bit into an address byte.
#[must_use]
pub const fn address_byte(address: u8, direction: Direction) -> u8 {
    (address << 1) | direction as u8
}

/// Bus master primitives.
///
/// A transaction is `start`, any mix of `send`/`receive`/`repeated_start`,
/// then `stop`. Callers must issue `stop` even after an error so the bus is
/// released.
pub trait Transport {
    /// Issues a start condition followed by the address byte.
    fn start(&mut self, address: u8, direction: Direction) -> Result<(), BusError>;

    /// Issues a repeated start condition followed by the address byte.
    fn repeated_start(&mut self, address: u8, direction: Direction) -> Result<(), BusError>;

    /// Issues a stop condition.
    fn stop(&mut self) -> Result<(), BusError>;

    /// Sends one byte and checks the acknowledge bit.
    fn send(&mut self, byte: u8) -> Result<(), BusError>;

    /// Receives one byte and answers with `ack`: [`Ack::Ack`] to continue the
    /// burst, [`Ack::Nack`] after the final byte.
    fn receive(&mut self, ack: Ack) -> Result<u8, BusError>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn start(&mut self, address: u8, direction: Direction) -> Result<(), BusError> {
        T::start(self, address, direction)
    }

    fn repeated_start(&mut self, address: u8, direction: Direction) -> Result<(), BusError> {
        T::repeated_start(self, address, direction)
    }

    fn stop(&mut self) -> Result<(), BusError> {
        T::stop(self)
    }

    fn send(&mut self, byte: u8) -> Result<(), BusError> {
        T::send(self, byte)
    }

    fn receive(&mut self, ack: Ack) -> Result<u8, BusError> {
        T::receive(self, ack)
    }
}

bitfield! {
    /// MSSP control register 2 (SSPxCON2).
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct MsspControl2(u8);
    impl Debug;
    /// Acknowledge received from the slave, set on NACK
    pub ack_status, set_ack_status: 6;
    /// Acknowledge value to send after a received byte, set for NACK
    pub ack_data, set_ack_data: 5;
    /// Starts the acknowledge sequence
    pub ack_enable, set_ack_enable: 4;
    /// Starts receiving one byte
    pub receive_enable, set_receive_enable: 3;
    /// Starts a stop condition
    pub stop_enable, set_stop_enable: 2;
    /// Starts a repeated start condition
    pub restart_enable, set_restart_enable: 1;
    /// Starts a start condition
    pub start_enable, set_start_enable: 0;
    /// The five sequence bits, non-zero while any sequence is in progress
    pub sequence, _: 4, 0;
}

bitfield! {
    /// MSSP status register (SSPxSTAT).
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct MsspStatus(u8);
    impl Debug;
    /// Master transmit in progress
    pub transmitting, _: 2;
    /// Receive buffer holds unread data
    pub buffer_full, _: 0;
}

/// Register-level access to an MSSP peripheral in master mode.
///
/// Board support implements this over the device's memory-mapped registers.
pub trait MsspRegisters {
    fn control2(&mut self) -> MsspControl2;
    fn set_control2(&mut self, value: MsspControl2);
    fn status(&mut self) -> MsspStatus;
    /// Reads SSPxBUF.
    fn buffer(&mut self) -> u8;
    /// Writes SSPxBUF, starting a byte transmission.
    fn set_buffer(&mut self, value: u8);
}

/// What [`MasterTransport::wait_idle`] waits on besides the sequence bits.
#[derive(Copy, Clone, Debug, PartialEq)]
enum Idle {
    /// No transmission and no unread data
    Full,
    /// No transmission; unread data is expected
    AllowData,
}

/// [`Transport`] over an MSSP peripheral with interrupt-signalled completion.
pub struct MasterTransport<'a, R: MsspRegisters> {
    registers: R,
    completion: &'a BusCompletion,
    spin_limit: u32,
}

impl<'a, R: MsspRegisters> MasterTransport<'a, R> {
    /// Creates a transport.
    ///
    /// # Arguments
    /// * `registers` - The peripheral, already configured as bus master
    /// * `completion` - Flag cleared by the peripheral's interrupt handler
    /// * `spin_limit` - Polls of any busy-wait before giving up
    pub fn new(registers: R, completion: &'a BusCompletion, spin_limit: u32) -> Self {
        Self {
            registers,
            completion,
            spin_limit,
        }
    }

    /// Releases the peripheral.
    pub fn release(self) -> R {
        self.registers
    }

    fn wait_idle(&mut self, idle: Idle) -> Result<(), BusError> {
        for _ in 0..self.spin_limit {
            let status = self.registers.status();
            let busy = self.registers.control2().sequence() != 0
                || status.transmitting()
                || (idle == Idle::Full && status.buffer_full());
            if !busy {
                return Ok(());
            }
            core::hint::spin_loop();
        }
        warn!("bus: idle wait timed out");
        Err(BusError::Timeout)
    }

    fn wait_completion(&mut self) -> Result<(), BusError> {
        for _ in 0..self.spin_limit {
            if !self.completion.is_waiting() {
                return Ok(());
            }
            core::hint::spin_loop();
        }
        warn!("bus: completion timed out");
        Err(BusError::Timeout)
    }

    /// Loads one byte, waits for the completion event and reads the
    /// acknowledge bit.
    fn transmit(&mut self, byte: u8) -> Result<(), BusError> {
        self.wait_idle(Idle::Full)?;
        self.completion.arm();
        self.registers.set_buffer(byte);
        if let Err(e) = self.wait_completion() {
            self.completion.cancel();
            return Err(e);
        }
        if self.registers.control2().ack_status() {
            debug!("bus: nack after {:#x}", byte);
            Err(BusError::Nack)
        } else {
            Ok(())
        }
    }

    fn condition(&mut self, apply: impl FnOnce(&mut MsspControl2)) -> Result<(), BusError> {
        self.wait_idle(Idle::Full)?;
        let mut control = self.registers.control2();
        apply(&mut control);
        self.registers.set_control2(control);
        Ok(())
    }
}

impl<R: MsspRegisters> Transport for MasterTransport<'_, R> {
    fn start(&mut self, address: u8, direction: Direction) -> Result<(), BusError> {
        self.condition(|c| c.set_start_enable(true))?;
        self.transmit(address_byte(address, direction))
    }

    fn repeated_start(&mut self, address: u8, direction: Direction) -> Result<(), BusError> {
        self.condition(|c| c.set_restart_enable(true))?;
        self.transmit(address_byte(address, direction))
    }

    fn stop(&mut self) -> Result<(), BusError> {
        self.condition(|c| c.set_stop_enable(true))
    }

    fn send(&mut self, byte: u8) -> Result<(), BusError> {
        self.transmit(byte)
    }

    fn receive(&mut self, ack: Ack) -> Result<u8, BusError> {
        self.condition(|c| c.set_receive_enable(true))?;
        self.wait_idle(Idle::AllowData)?;
        let byte = self.registers.buffer();
        self.condition(|c| {
            c.set_ack_data(ack == Ack::Nack);
            c.set_ack_enable(true);
        })?;
        Ok(byte)
    }
}
