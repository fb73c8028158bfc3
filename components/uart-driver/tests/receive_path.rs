//! End-to-end tests for the UART driver against the mock backend
//!
//! These tests walk through complete workflows:
//! - init register sequence
//! - interrupt-fed receive, overflow and error discard
//! - echo loop mixing receive and transmit

#![cfg(feature = "mock")]

use uart_driver::mock::{MockEvent, MockUsart};
use uart_driver::*;

fn interrupt_each(driver: &UartDriver<&MockUsart, 4>, usart: &MockUsart) {
    while usart.pending_rx() > 0 {
        driver.on_receive_interrupt();
    }
}

/// Capacity-4 walkthrough: A B C in, A out, D E in, F dropped, rest drained
#[test]
fn test_capacity_four_walkthrough() {
    let usart = MockUsart::new();
    let driver: UartDriver<_, 4> = UartDriver::new(&usart);
    driver.init(&UartConfig::default()).expect("init failed");

    for &byte in b"ABC" {
        usart.inject(byte);
    }
    interrupt_each(&driver, &usart);
    assert_eq!(driver.available(), 3);

    assert_eq!(driver.read_available(), Some(b'A'));
    assert_eq!(driver.available(), 2);

    usart.inject(b'D');
    usart.inject(b'E');
    interrupt_each(&driver, &usart);
    assert_eq!(driver.available(), 4);

    usart.inject(b'F');
    assert_eq!(driver.on_receive_interrupt(), RxEvent::Dropped(b'F'));
    assert_eq!(driver.available(), 4);

    let drained: Vec<u8> = std::iter::from_fn(|| driver.read_available()).collect();
    assert_eq!(drained, b"BCDE".to_vec());
    assert_eq!(driver.read_available(), None);

    let stats = driver.stats();
    assert_eq!(stats.received, 5);
    assert_eq!(stats.dropped, 1);
}

/// Corrupted frames vanish from the stream without reordering the rest
#[test]
fn test_errors_leave_gaps_only() {
    let usart = MockUsart::new();
    let driver: UartDriver<_, 4> = UartDriver::new(&usart);
    driver.init(&UartConfig::default()).unwrap();

    usart.inject(b'1');
    usart.inject_with_error(b'x', Status::ORE);
    usart.inject(b'2');
    usart.inject_with_error(b'y', Status::PE | Status::FE);
    usart.inject(b'3');
    interrupt_each(&driver, &usart);

    let mut buf = [0u8; 4];
    let n = driver.read(&mut buf);
    assert_eq!(&buf[..n], b"123");
    assert_eq!(driver.stats().discarded, 2);
}

/// Nothing is readable after init until an interrupt delivers a byte
#[test]
fn test_reads_empty_until_first_interrupt() {
    let usart = MockUsart::new();
    let driver: UartDriver<_, 4> = UartDriver::new(&usart);
    driver.init(&UartConfig::default()).unwrap();

    for _ in 0..5 {
        assert_eq!(driver.read_available(), None);
    }

    usart.inject(0);
    driver.on_receive_interrupt();
    // A zero byte is data, not "nothing available"
    assert_eq!(driver.read_available(), Some(0));
}

/// Echo loop: every received byte goes straight back out
#[test]
fn test_echo_loop() {
    let usart = MockUsart::new();
    let driver: UartDriver<_, 4> = UartDriver::new(&usart);
    driver.init(&UartConfig::new(115_200, 72_000_000)).unwrap();
    usart.set_tx_latency(2);

    for &byte in b"echo" {
        usart.inject(byte);
        driver.on_receive_interrupt();
        while let Some(byte) = driver.read_available() {
            driver.send_byte(byte).unwrap();
        }
    }

    assert_eq!(usart.transmitted(), b"echo".to_vec());
}

/// BRR for the 8 MHz / 9600 reference board lands in the register as 0x34C
#[test]
fn test_reference_baud_register() {
    let usart = MockUsart::new();
    let driver: UartDriver<_, 4> = UartDriver::new(&usart);
    driver.init(&UartConfig::new(9600, 8_000_000)).unwrap();

    assert!(usart.events().contains(&MockEvent::BaudDivisor(0x34C)));
}

/// Custom priority reaches the interrupt controller
#[test]
fn test_custom_priority() {
    let usart = MockUsart::new();
    let driver: UartDriver<_, 4> = UartDriver::new(&usart);
    driver
        .init(&UartConfig::default().with_irq_priority(5))
        .unwrap();

    assert!(usart
        .events()
        .contains(&MockEvent::InterruptEnabled { priority: 5 }));
}
