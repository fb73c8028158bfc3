//! STM32F1 USART Register Model
//!
//! Register offsets, base addresses and bit definitions for USART1 and the
//! few RCC/GPIO registers its setup touches.
//! Reference: RM0008 (STM32F101xx/102xx/103xx/105xx/107xx) sections 7, 9, 27

use bitflags::bitflags;

/// USART1 register block base address
pub const USART1_BASE: usize = 0x4001_3800;

/// USART register offsets
pub const USART_SR: usize = 0x00;   // Status Register
pub const USART_DR: usize = 0x04;   // Data Register
pub const USART_BRR: usize = 0x08;  // Baud Rate Register
pub const USART_CR1: usize = 0x0C;  // Control Register 1
pub const USART_CR2: usize = 0x10;  // Control Register 2
pub const USART_CR3: usize = 0x14;  // Control Register 3

/// RCC APB2 peripheral clock enable register
pub const RCC_APB2ENR: usize = 0x4002_1018;
pub const RCC_APB2ENR_IOPAEN: u32 = 1 << 2;
pub const RCC_APB2ENR_USART1EN: u32 = 1 << 14;

/// GPIOA port configuration register high (pins 8..15)
pub const GPIOA_CRH: usize = 0x4001_0804;

/// CRH fields for PA9 and PA10
pub const GPIOA_CRH_USART1_MASK: u32 = 0x0000_0FF0;

/// PA9: alternate function push-pull, 50 MHz. PA10: input floating.
pub const GPIOA_CRH_USART1_PINS: u32 = 0x0000_04B0;

/// USART1 global interrupt position in the vector table
pub const USART1_IRQ: u16 = 37;

/// Implemented NVIC priority bits on STM32F1
pub const NVIC_PRIO_BITS: u8 = 4;

/// Highest usable (numerically largest) interrupt priority
pub const MAX_IRQ_PRIORITY: u8 = (1 << NVIC_PRIO_BITS) - 1;

/// Fixed fractional part of the baud divisor (BRR[3:0])
pub const BRR_FRACTION: u32 = 0xC;

/// Width of the BRR mantissa field (BRR[15:4])
pub const BRR_MANTISSA_BITS: u32 = 12;

bitflags! {
    /// Status Register (SR) bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Status: u32 {
        /// Parity error
        const PE = 1 << 0;
        /// Framing error
        const FE = 1 << 1;
        /// Noise detected
        const NE = 1 << 2;
        /// Overrun error
        const ORE = 1 << 3;
        /// Idle line detected
        const IDLE = 1 << 4;
        /// Read data register not empty
        const RXNE = 1 << 5;
        /// Transmission complete
        const TC = 1 << 6;
        /// Transmit data register empty
        const TXE = 1 << 7;

        /// Any reception error
        const ERRORS = Self::ORE.bits() | Self::NE.bits() | Self::FE.bits() | Self::PE.bits();
    }
}

impl Status {
    /// Overrun, noise, framing or parity error flagged
    pub fn has_error(self) -> bool {
        self.intersects(Self::ERRORS)
    }

    /// A received byte is waiting in DR
    pub fn rx_ready(self) -> bool {
        self.contains(Self::RXNE)
    }

    /// DR can accept the next byte to send
    pub fn tx_empty(self) -> bool {
        self.contains(Self::TXE)
    }

    /// Last frame has left the shift register
    pub fn tx_complete(self) -> bool {
        self.contains(Self::TC)
    }
}

bitflags! {
    /// Control Register 1 (CR1) bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Control1: u32 {
        /// Receiver enable
        const RE = 1 << 2;
        /// Transmitter enable
        const TE = 1 << 3;
        /// RXNE interrupt enable
        const RXNEIE = 1 << 5;
        /// USART enable
        const UE = 1 << 13;

        /// Receive interrupt, transmitter and receiver on; unit still off
        const RX_INTERRUPT_MODE = Self::RXNEIE.bits() | Self::TE.bits() | Self::RE.bits();
    }
}

/// NVIC IPR byte for a priority level (upper bits are implemented)
pub const fn nvic_priority_byte(priority: u8) -> u8 {
    priority << (8 - NVIC_PRIO_BITS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_flags() {
        assert!(!Status::empty().has_error());
        assert!(!(Status::RXNE | Status::TXE | Status::TC).has_error());
        for flag in [Status::ORE, Status::NE, Status::FE, Status::PE] {
            assert!((flag | Status::RXNE).has_error());
        }
        assert!(!Status::IDLE.has_error());
    }

    #[test]
    fn test_receive_mode_bits() {
        assert_eq!(Control1::RX_INTERRUPT_MODE.bits(), 0x002C);
        assert!(!Control1::RX_INTERRUPT_MODE.contains(Control1::UE));
        assert_eq!((Control1::RX_INTERRUPT_MODE | Control1::UE).bits(), 0x202C);
    }

    #[test]
    fn test_nvic_priority_encoding() {
        assert_eq!(nvic_priority_byte(1), 0x10);
        assert_eq!(nvic_priority_byte(MAX_IRQ_PRIORITY), 0xF0);
    }
}
