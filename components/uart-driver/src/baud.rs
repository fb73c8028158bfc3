//! Baud rate divisor arithmetic
//!
//! BRR holds USARTDIV as a 12-bit mantissa and a 4-bit fraction. The
//! mantissa is `clock / (16 * baud)` truncated, and the fraction is a fixed
//! nibble (0xC) rather than a computed one, which is what deployed boards
//! were calibrated against:
//!
//! ```text
//! 8 MHz / (16 * 9600) = 52.08  ->  mantissa 52, fraction 0xC  ->  BRR 0x34C
//! ```

use crate::regs::{BRR_FRACTION, BRR_MANTISSA_BITS};
use crate::{Result, UartError};

/// Largest mantissa the BRR field can hold
const MAX_MANTISSA: u32 = (1 << BRR_MANTISSA_BITS) - 1;

/// Encoded BRR value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaudDivisor(u32);

impl BaudDivisor {
    /// Compute the divisor for a clock and baud rate
    ///
    /// # Errors
    /// - `InvalidBaudRate` if `baud` is zero or `16 * baud` overflows
    /// - `DivisorOutOfRange` if the mantissa is zero (baud too high for the
    ///   clock) or doesn't fit in 12 bits (baud too low)
    pub fn compute(clock_hz: u32, baud: u32) -> Result<Self> {
        let oversampled = baud
            .checked_mul(16)
            .filter(|&v| v != 0)
            .ok_or(UartError::InvalidBaudRate { baud })?;

        let mantissa = clock_hz / oversampled;
        if mantissa == 0 || mantissa > MAX_MANTISSA {
            return Err(UartError::DivisorOutOfRange { mantissa });
        }

        Ok(Self((mantissa << 4) | BRR_FRACTION))
    }

    /// Raw BRR register value
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Integer part of USARTDIV
    pub const fn mantissa(self) -> u32 {
        self.0 >> 4
    }

    /// Fractional part of USARTDIV in sixteenths
    pub const fn fraction(self) -> u32 {
        self.0 & 0xF
    }

    /// Baud rate the peripheral will actually run at
    ///
    /// BRR is USARTDIV in 1/16 units, so the rate is simply `clock / BRR`.
    pub const fn effective_baud(self, clock_hz: u32) -> u32 {
        clock_hz / self.0
    }
}
