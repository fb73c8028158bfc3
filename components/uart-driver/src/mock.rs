//! Mock USART backend
//!
//! Stands in for the peripheral during host testing:
//! - received frames are scripted with [`MockUsart::inject`] and
//!   [`MockUsart::inject_with_error`]
//! - every setup write and transmitted byte is recorded as a [`MockEvent`]
//! - the transmitter can be slowed down or stalled outright
//!
//! Not `Sync`; drive it from a single test thread.

use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::cell::RefCell;

use crate::baud::BaudDivisor;
use crate::hw::UsartHw;
use crate::regs::{Control1, Status};
use crate::TxStage;

/// One frame waiting in the receiver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RxFrame {
    byte: u8,
    errors: Status,
}

/// Externally visible effect of a register access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockEvent {
    ClocksEnabled,
    Control(Control1),
    AuxControlCleared,
    BaudDivisor(u32),
    InterruptEnabled { priority: u8 },
    DataWritten(u8),
}

#[derive(Debug, Default)]
struct MockState {
    rx: VecDeque<RxFrame>,
    control: Option<Control1>,
    events: Vec<MockEvent>,
    tx_latency: u32,
    tc_countdown: u32,
    stalled: Option<TxStage>,
    status_reads: usize,
    data_reads: usize,
}

/// Scriptable USART
#[derive(Debug, Default)]
pub struct MockUsart {
    state: RefCell<MockState>,
}

impl MockUsart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a cleanly received byte
    pub fn inject(&self, byte: u8) {
        self.inject_with_error(byte, Status::empty());
    }

    /// Queue a received byte that the line flagged with errors
    pub fn inject_with_error(&self, byte: u8, errors: Status) {
        self.state.borrow_mut().rx.push_back(RxFrame {
            byte,
            errors: errors & Status::ERRORS,
        });
    }

    /// Frames not yet read out of the data register
    pub fn pending_rx(&self) -> usize {
        self.state.borrow().rx.len()
    }

    /// Hold TC low for `polls` status reads after each transmitted byte
    pub fn set_tx_latency(&self, polls: u32) {
        self.state.borrow_mut().tx_latency = polls;
    }

    /// Make one transmit flag never assert
    pub fn stall_transmitter(&self, stage: TxStage) {
        self.state.borrow_mut().stalled = Some(stage);
    }

    /// Everything recorded so far, in order
    pub fn events(&self) -> Vec<MockEvent> {
        self.state.borrow().events.clone()
    }

    /// Bytes written to the data register, in order
    pub fn transmitted(&self) -> Vec<u8> {
        self.state
            .borrow()
            .events
            .iter()
            .filter_map(|event| match event {
                MockEvent::DataWritten(byte) => Some(*byte),
                _ => None,
            })
            .collect()
    }

    /// Number of data register reads
    pub fn data_reads(&self) -> usize {
        self.state.borrow().data_reads
    }

    /// Number of status register reads
    pub fn status_reads(&self) -> usize {
        self.state.borrow().status_reads
    }

    fn record(&self, event: MockEvent) {
        self.state.borrow_mut().events.push(event);
    }
}

impl UsartHw for MockUsart {
    fn status(&self) -> Status {
        let mut state = self.state.borrow_mut();
        state.status_reads += 1;

        let mut status = Status::empty();
        if let Some(frame) = state.rx.front() {
            status |= Status::RXNE | frame.errors;
        }

        if state.stalled != Some(TxStage::DataRegisterEmpty) {
            status |= Status::TXE;
        }
        if state.tc_countdown > 0 {
            state.tc_countdown -= 1;
        } else if state.stalled != Some(TxStage::TransmissionComplete) {
            status |= Status::TC;
        }

        status
    }

    fn read_data(&self) -> u8 {
        let mut state = self.state.borrow_mut();
        state.data_reads += 1;
        // Reading an empty DR returns whatever was latched last; zero here
        state.rx.pop_front().map(|frame| frame.byte).unwrap_or(0)
    }

    fn write_data(&self, byte: u8) {
        let mut state = self.state.borrow_mut();
        state.tc_countdown = state.tx_latency;
        state.events.push(MockEvent::DataWritten(byte));
    }

    fn enable_clocks_and_pins(&self) {
        self.record(MockEvent::ClocksEnabled);
    }

    fn control(&self) -> Control1 {
        self.state.borrow().control.unwrap_or(Control1::empty())
    }

    fn write_control(&self, control: Control1) {
        let mut state = self.state.borrow_mut();
        state.control = Some(control);
        state.events.push(MockEvent::Control(control));
    }

    fn clear_aux_control(&self) {
        self.record(MockEvent::AuxControlCleared);
    }

    fn write_baud_divisor(&self, divisor: BaudDivisor) {
        self.record(MockEvent::BaudDivisor(divisor.bits()));
    }

    fn configure_interrupt(&self, priority: u8) {
        self.record(MockEvent::InterruptEnabled { priority });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_transmitter_ready() {
        let usart = MockUsart::new();
        let status = usart.status();
        assert!(status.tx_empty());
        assert!(status.tx_complete());
        assert!(!status.rx_ready());
    }

    #[test]
    fn test_injected_frames_surface_in_order() {
        let usart = MockUsart::new();
        usart.inject(b'a');
        usart.inject_with_error(b'b', Status::FE | Status::TXE);

        assert!(usart.status().rx_ready());
        assert!(!usart.status().has_error());
        assert_eq!(usart.read_data(), b'a');

        let status = usart.status();
        assert!(status.rx_ready());
        // Only error bits are scripted per frame
        assert_eq!(status & Status::ERRORS, Status::FE);
        assert_eq!(usart.read_data(), b'b');

        assert!(!usart.status().rx_ready());
        assert_eq!(usart.data_reads(), 2);
    }

    #[test]
    fn test_tx_latency_delays_complete() {
        let usart = MockUsart::new();
        usart.set_tx_latency(2);
        usart.write_data(b'x');

        assert!(!usart.status().tx_complete());
        assert!(!usart.status().tx_complete());
        assert!(usart.status().tx_complete());
        assert_eq!(usart.transmitted(), vec![b'x']);
    }

    #[test]
    fn test_stalled_transmitter() {
        let usart = MockUsart::new();
        usart.stall_transmitter(TxStage::DataRegisterEmpty);
        for _ in 0..3 {
            assert!(!usart.status().tx_empty());
        }
    }
}
