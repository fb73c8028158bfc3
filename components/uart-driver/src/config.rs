//! Driver configuration
//!
//! Everything `UartDriver::init` needs, consumed once at startup.

use crate::baud::BaudDivisor;
use crate::regs::MAX_IRQ_PRIORITY;
use crate::{Result, UartError};

/// Default line rate
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Default APB2 clock (HSI, no PLL)
pub const DEFAULT_CLOCK_HZ: u32 = 8_000_000;

/// Default NVIC priority of the receive interrupt
pub const DEFAULT_IRQ_PRIORITY: u8 = 1;

/// UART setup parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UartConfig {
    /// Desired line rate in bits per second
    pub baud_rate: u32,

    /// Peripheral clock feeding the USART in Hz
    pub clock_hz: u32,

    /// NVIC priority of the receive interrupt (0 = most urgent)
    pub irq_priority: u8,

    /// Upper bound on polls per transmit wait
    ///
    /// `None` waits forever for the transmitter, which hangs if the
    /// hardware never raises TXE/TC. `Some(n)` gives up after `n` polls.
    pub tx_spin_limit: Option<u32>,
}

impl UartConfig {
    /// Configuration for a baud rate and clock, other fields defaulted
    pub const fn new(baud_rate: u32, clock_hz: u32) -> Self {
        Self {
            baud_rate,
            clock_hz,
            irq_priority: DEFAULT_IRQ_PRIORITY,
            tx_spin_limit: None,
        }
    }

    pub const fn with_irq_priority(mut self, priority: u8) -> Self {
        self.irq_priority = priority;
        self
    }

    pub const fn with_tx_spin_limit(mut self, limit: u32) -> Self {
        self.tx_spin_limit = Some(limit);
        self
    }

    /// Check the configuration and compute the baud divisor
    ///
    /// # Errors
    /// Divisor errors from [`BaudDivisor::compute`], or `InvalidPriority`
    /// if the priority doesn't fit the implemented NVIC bits.
    pub fn validate(&self) -> Result<BaudDivisor> {
        if self.irq_priority > MAX_IRQ_PRIORITY {
            return Err(UartError::InvalidPriority {
                priority: self.irq_priority,
            });
        }
        BaudDivisor::compute(self.clock_hz, self.baud_rate)
    }
}

impl Default for UartConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BAUD_RATE, DEFAULT_CLOCK_HZ)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = UartConfig::default();
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.clock_hz, 8_000_000);
        assert_eq!(config.irq_priority, 1);
        assert_eq!(config.tx_spin_limit, None);
        assert_eq!(config.validate().unwrap().bits(), 0x34C);
    }

    #[test]
    fn test_builder() {
        let config = UartConfig::new(115_200, 72_000_000)
            .with_irq_priority(3)
            .with_tx_spin_limit(1000);
        assert_eq!(config.irq_priority, 3);
        assert_eq!(config.tx_spin_limit, Some(1000));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_priority_out_of_range() {
        let config = UartConfig::default().with_irq_priority(16);
        assert!(matches!(
            config.validate(),
            Err(UartError::InvalidPriority { priority: 16 })
        ));
    }
}
