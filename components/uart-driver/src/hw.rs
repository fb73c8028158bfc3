//! Hardware collaborator interface
//!
//! The driver never touches registers directly; it goes through this trait.
//! Backends: [`crate::mock::MockUsart`] for host testing and
//! `crate::stm32f1::Usart1` for the real peripheral.
//!
//! All methods take `&self`. Registers are volatile state shared between the
//! interrupt vector and foreground code, so an implementation must not cache
//! anything across calls.

use crate::baud::BaudDivisor;
use crate::regs::{Control1, Status};

/// Register-level operations the driver core relies on
pub trait UsartHw {
    /// Read the status register
    fn status(&self) -> Status;

    /// Read the received byte
    ///
    /// Exactly one read per call; on this peripheral the read also clears
    /// RXNE and, after a status read, any pending error flags.
    fn read_data(&self) -> u8;

    /// Load the next byte into the transmit data register
    fn write_data(&self, byte: u8);

    /// Enable the port and peripheral clocks and route the TX/RX pins
    fn enable_clocks_and_pins(&self);

    /// Read control register 1
    fn control(&self) -> Control1;

    /// Write control register 1
    fn write_control(&self, control: Control1);

    /// Zero control registers 2 and 3
    fn clear_aux_control(&self);

    /// Write the baud rate register
    fn write_baud_divisor(&self, divisor: BaudDivisor);

    /// Set the interrupt's priority, clear it if pending, and unmask it
    fn configure_interrupt(&self, priority: u8);
}

impl<T: UsartHw + ?Sized> UsartHw for &T {
    fn status(&self) -> Status {
        (**self).status()
    }

    fn read_data(&self) -> u8 {
        (**self).read_data()
    }

    fn write_data(&self, byte: u8) {
        (**self).write_data(byte)
    }

    fn enable_clocks_and_pins(&self) {
        (**self).enable_clocks_and_pins()
    }

    fn control(&self) -> Control1 {
        (**self).control()
    }

    fn write_control(&self, control: Control1) {
        (**self).write_control(control)
    }

    fn clear_aux_control(&self) {
        (**self).clear_aux_control()
    }

    fn write_baud_divisor(&self, divisor: BaudDivisor) {
        (**self).write_baud_divisor(divisor)
    }

    fn configure_interrupt(&self, priority: u8) {
        (**self).configure_interrupt(priority)
    }
}
