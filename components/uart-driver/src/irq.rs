//! Receive interrupt handling
//!
//! The interrupt side of the driver is the sole producer into the receive
//! queue. Per invocation it:
//! 1. reads the status register once
//! 2. on overrun/noise/framing/parity error: throws the byte away and returns
//! 3. otherwise, if RXNE is set: reads DR once and pushes the byte
//!
//! It handles at most one byte, never waits for more, never logs and never
//! allocates. Back-to-back bytes arrive as separate invocations.

use core::sync::atomic::{AtomicU32, Ordering};

use byte_queue::ByteQueue;

use crate::hw::UsartHw;
use crate::regs::Status;

/// What a single receive interrupt did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxEvent {
    /// Byte stored in the queue
    Received(u8),
    /// Byte read but the queue was full (drop newest)
    Dropped(u8),
    /// Line error flagged; byte (if any) thrown away
    Discarded(Status),
    /// Interrupt fired without a byte or an error
    Spurious,
}

/// Run the receive protocol once against `hw`, feeding `queue`
pub fn handle_receive<H, const N: usize>(hw: &H, queue: &ByteQueue<N>) -> RxEvent
where
    H: UsartHw + ?Sized,
{
    let status = hw.status();

    if status.has_error() {
        // SR read followed by DR read is what clears ORE/NE/FE; the value
        // itself is corrupt and never reaches the queue.
        if status.rx_ready() {
            let _ = hw.read_data();
        }
        return RxEvent::Discarded(status & Status::ERRORS);
    }

    if !status.rx_ready() {
        return RxEvent::Spurious;
    }

    let byte = hw.read_data();
    let dropped_before = queue.dropped();
    queue.push(byte);

    if queue.dropped() == dropped_before {
        RxEvent::Received(byte)
    } else {
        RxEvent::Dropped(byte)
    }
}

/// Receive statistics snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RxStats {
    /// Receive interrupts taken
    pub interrupts: u32,
    /// Bytes stored in the queue
    pub received: u32,
    /// Bytes thrown away because of line errors
    pub discarded: u32,
    /// Bytes lost to a full queue
    pub dropped: u32,
}

/// Interrupt-side counters
///
/// Written only from the receive interrupt, so plain load/store pairs are
/// enough; no read-modify-write atomics needed.
#[derive(Debug, Default)]
pub(crate) struct RxCounters {
    interrupts: AtomicU32,
    received: AtomicU32,
    discarded: AtomicU32,
    dropped: AtomicU32,
}

impl RxCounters {
    pub(crate) const fn new() -> Self {
        Self {
            interrupts: AtomicU32::new(0),
            received: AtomicU32::new(0),
            discarded: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
        }
    }

    pub(crate) fn record(&self, event: RxEvent) {
        bump(&self.interrupts);
        match event {
            RxEvent::Received(_) => bump(&self.received),
            RxEvent::Dropped(_) => bump(&self.dropped),
            RxEvent::Discarded(_) => bump(&self.discarded),
            RxEvent::Spurious => {}
        }
    }

    pub(crate) fn reset(&self) {
        for counter in [&self.interrupts, &self.received, &self.discarded, &self.dropped] {
            counter.store(0, Ordering::Relaxed);
        }
    }

    pub(crate) fn snapshot(&self) -> RxStats {
        RxStats {
            interrupts: self.interrupts.load(Ordering::Relaxed),
            received: self.received.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

#[inline]
fn bump(counter: &AtomicU32) {
    counter.store(counter.load(Ordering::Relaxed).wrapping_add(1), Ordering::Relaxed);
}

#[cfg(all(test, feature = "mock"))]
mod tests {
    use super::*;
    use crate::mock::MockUsart;

    #[test]
    fn test_clean_byte_is_queued() {
        let usart = MockUsart::new();
        let queue: ByteQueue<4> = ByteQueue::new();
        usart.inject(b'x');

        assert_eq!(handle_receive(&usart, &queue), RxEvent::Received(b'x'));
        assert_eq!(queue.pop(), Some(b'x'));
        assert_eq!(usart.data_reads(), 1);
    }

    #[test]
    fn test_each_error_flag_discards() {
        for flag in [Status::ORE, Status::NE, Status::FE, Status::PE] {
            let usart = MockUsart::new();
            let queue: ByteQueue<4> = ByteQueue::new();
            usart.inject_with_error(0x42, flag);

            assert_eq!(handle_receive(&usart, &queue), RxEvent::Discarded(flag));
            assert!(queue.is_empty());
            // Corrupt byte consumed so the receiver is clear again
            assert_eq!(usart.pending_rx(), 0);
        }
    }

    #[test]
    fn test_one_byte_per_invocation() {
        let usart = MockUsart::new();
        let queue: ByteQueue<4> = ByteQueue::new();
        usart.inject(1);
        usart.inject(2);

        assert_eq!(handle_receive(&usart, &queue), RxEvent::Received(1));
        assert_eq!(queue.len(), 1);
        assert_eq!(usart.pending_rx(), 1);

        assert_eq!(handle_receive(&usart, &queue), RxEvent::Received(2));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_spurious_interrupt_reads_nothing() {
        let usart = MockUsart::new();
        let queue: ByteQueue<4> = ByteQueue::new();

        assert_eq!(handle_receive(&usart, &queue), RxEvent::Spurious);
        assert_eq!(usart.data_reads(), 0);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_full_queue_reports_drop() {
        let usart = MockUsart::new();
        let queue: ByteQueue<1> = ByteQueue::new();
        usart.inject(1);
        usart.inject(2);

        assert_eq!(handle_receive(&usart, &queue), RxEvent::Received(1));
        assert_eq!(handle_receive(&usart, &queue), RxEvent::Dropped(2));
        assert_eq!(queue.pop(), Some(1));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_counters() {
        let counters = RxCounters::new();
        counters.record(RxEvent::Received(1));
        counters.record(RxEvent::Received(2));
        counters.record(RxEvent::Dropped(3));
        counters.record(RxEvent::Discarded(Status::FE));
        counters.record(RxEvent::Spurious);

        assert_eq!(
            counters.snapshot(),
            RxStats {
                interrupts: 5,
                received: 2,
                discarded: 1,
                dropped: 1,
            }
        );

        counters.reset();
        assert_eq!(counters.snapshot(), RxStats::default());
    }
}
