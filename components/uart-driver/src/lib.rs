//! UART Driver - Interrupt-driven receive, polled transmit
//!
//! # Purpose
//! Bridges the USART receive interrupt to a byte queue that application
//! code drains at its own pace, and provides blocking byte/string output.
//!
//! # Integration Points
//! - Depends on: `uart-byte-queue` (receive buffer), a [`UsartHw`] backend
//! - Provides to: application code (consumer), the USART vector (producer)
//! - Hardware: STM32F1 USART1 on PA9/PA10, NVIC line 37
//!
//! # Architecture
//! ```text
//! USART1 IRQ ──> on_receive_interrupt ──push──> ByteQueue ──pop──> read_available
//!                  (error check, 1 byte)                           (foreground)
//!
//! send_byte / send_string ──> poll TXE ──> DR ──> poll TC   (no queue)
//! ```
//!
//! # Usage
//! ```ignore
//! use uart_driver::{stm32f1::Usart1, UartConfig, UartDriver};
//!
//! static UART: UartDriver<Usart1> = UartDriver::new(unsafe { Usart1::new() });
//!
//! #[interrupt]
//! fn USART1() {
//!     UART.on_receive_interrupt();
//! }
//!
//! fn main() -> ! {
//!     UART.init(&UartConfig::new(9600, 8_000_000)).unwrap();
//!     loop {
//!         while let Some(byte) = UART.read_available() {
//!             let _ = UART.send_byte(byte);
//!         }
//!     }
//! }
//! ```
//!
//! # Backends
//! - `mock` (default): scriptable [`mock::MockUsart`] for host tests
//! - `stm32f1`: real registers via volatile MMIO and `cortex-m`

#![no_std]

#[cfg(test)]
#[macro_use]
extern crate std;

#[cfg(feature = "mock")]
extern crate alloc;

pub mod baud;
pub mod config;
pub mod driver;
pub mod hw;
pub mod irq;
pub mod regs;

#[cfg(feature = "mock")]
pub mod mock;

#[cfg(feature = "stm32f1")]
pub mod stm32f1;

pub use baud::BaudDivisor;
pub use byte_queue::ByteQueue;
pub use config::UartConfig;
pub use driver::{TxWriter, UartDriver, DEFAULT_RX_CAPACITY};
pub use hw::UsartHw;
pub use irq::{RxEvent, RxStats};
pub use regs::{Control1, Status};

use thiserror::Error;

/// Transmit wait that can time out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStage {
    /// Waiting for TXE before loading DR
    DataRegisterEmpty,
    /// Waiting for TC after loading DR
    TransmissionComplete,
}

/// Error types for driver operations
///
/// Only foreground calls return these; the interrupt path resolves every
/// condition locally.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum UartError {
    #[error("Invalid baud rate: {baud}")]
    InvalidBaudRate { baud: u32 },

    #[error("Baud divisor mantissa {mantissa} out of range (1..=4095)")]
    DivisorOutOfRange { mantissa: u32 },

    #[error("Interrupt priority {priority} out of range (0..=15)")]
    InvalidPriority { priority: u8 },

    #[error("UART already initialized")]
    AlreadyInitialized,

    #[error("UART not initialized")]
    NotInitialized,

    #[error("Transmit timed out waiting for {stage:?}")]
    TxTimeout { stage: TxStage },
}

pub type Result<T> = core::result::Result<T, UartError>;

static_assertions::assert_impl_all!(UartError: core::error::Error, Send, Sync);
static_assertions::const_assert!(DEFAULT_RX_CAPACITY > 0);

#[cfg(test)]
mod tests {
    use super::*;
    use std::string::ToString;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            UartError::InvalidBaudRate { baud: 0 }.to_string(),
            "Invalid baud rate: 0"
        );
        assert_eq!(
            UartError::TxTimeout {
                stage: TxStage::TransmissionComplete
            }
            .to_string(),
            "Transmit timed out waiting for TransmissionComplete"
        );
    }
}
