//! STM32F1 USART1 Hardware Interface
//!
//! Low-level access to USART1 and the RCC/GPIOA/NVIC bits its setup needs.
//! Pins: PA9 (TX), PA10 (RX).
//! Reference: RM0008 STM32F10xxx Reference Manual, section 27

use core::ptr::{read_volatile, write_volatile};

use cortex_m::interrupt::InterruptNumber;
use cortex_m::peripheral::NVIC;

use crate::baud::BaudDivisor;
use crate::hw::UsartHw;
use crate::regs::*;

/// USART1 global interrupt line
#[derive(Debug, Clone, Copy)]
struct Usart1Interrupt;

// SAFETY: 37 is the USART1 position in the STM32F1 vector table
unsafe impl InterruptNumber for Usart1Interrupt {
    fn number(self) -> u16 {
        USART1_IRQ
    }
}

/// USART1 register block
pub struct Usart1 {
    base: usize,
}

impl Usart1 {
    /// Create a handle to USART1
    ///
    /// # Safety
    /// The caller must be running on an STM32F1 and must not create a
    /// second handle that configures the peripheral concurrently.
    pub const unsafe fn new() -> Self {
        Self { base: USART1_BASE }
    }

    /// Read a USART register
    #[inline]
    fn read_reg(&self, offset: usize) -> u32 {
        // SAFETY: base + offset is inside the USART1 register block
        unsafe { read_volatile((self.base + offset) as *const u32) }
    }

    /// Write a USART register
    #[inline]
    fn write_reg(&self, offset: usize, value: u32) {
        // SAFETY: base + offset is inside the USART1 register block
        unsafe { write_volatile((self.base + offset) as *mut u32, value) }
    }
}

impl UsartHw for Usart1 {
    fn status(&self) -> Status {
        Status::from_bits_truncate(self.read_reg(USART_SR))
    }

    fn read_data(&self) -> u8 {
        // DR is 9 bits wide; 8N1 framing only uses the low byte
        self.read_reg(USART_DR) as u8
    }

    fn write_data(&self, byte: u8) {
        self.write_reg(USART_DR, byte as u32);
    }

    fn enable_clocks_and_pins(&self) {
        // SAFETY: fixed RCC and GPIOA addresses on every STM32F1 part
        unsafe {
            let apb2enr = RCC_APB2ENR as *mut u32;
            write_volatile(
                apb2enr,
                read_volatile(apb2enr) | RCC_APB2ENR_IOPAEN | RCC_APB2ENR_USART1EN,
            );

            let crh = GPIOA_CRH as *mut u32;
            write_volatile(
                crh,
                (read_volatile(crh) & !GPIOA_CRH_USART1_MASK) | GPIOA_CRH_USART1_PINS,
            );
        }
    }

    fn control(&self) -> Control1 {
        Control1::from_bits_retain(self.read_reg(USART_CR1))
    }

    fn write_control(&self, control: Control1) {
        self.write_reg(USART_CR1, control.bits());
    }

    fn clear_aux_control(&self) {
        self.write_reg(USART_CR2, 0);
        self.write_reg(USART_CR3, 0);
    }

    fn write_baud_divisor(&self, divisor: BaudDivisor) {
        self.write_reg(USART_BRR, divisor.bits());
    }

    fn configure_interrupt(&self, priority: u8) {
        // SAFETY: only this driver touches the USART1 NVIC line, and the
        // receive queue has been reset before the line is unmasked.
        unsafe {
            let mut peripherals = cortex_m::Peripherals::steal();
            peripherals
                .NVIC
                .set_priority(Usart1Interrupt, nvic_priority_byte(priority));
            NVIC::unpend(Usart1Interrupt);
            NVIC::unmask(Usart1Interrupt);
        }
    }
}
