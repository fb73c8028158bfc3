//! Byte Queue - Interrupt-safe receive buffer
//!
//! # Purpose
//! Buffers bytes handed over by a receive interrupt until foreground code
//! drains them, without locks, allocation, or blocking on the interrupt side.
//!
//! # Integration Points
//! - Depends on: nothing but `core` atomics (plus `critical-section` on
//!   targets without atomic read-modify-write)
//! - Provides to: UART driver (one queue per receive channel)
//! - Producer: receive interrupt handler
//! - Consumer: foreground/polling code
//!
//! # Architecture
//! Fixed-capacity circular buffer with a separate occupancy count:
//! - `head` (write index) is stored only by the producer
//! - `tail` (read index) is stored only by the consumer
//! - `count` is raised by the producer and lowered by the consumer
//!
//! The producer publishes a slot with a release increment of `count`; the
//! consumer observes it with an acquire load before touching the slot, and
//! hands the slot back with a release decrement.
//!
//! # Overflow Policy
//! A push against a full queue drops the incoming byte and keeps everything
//! already buffered (drop newest). This is not an error: the loss is only
//! visible through [`ByteQueue::dropped`].

#![no_std]

#[cfg(test)]
#[macro_use]
extern crate std;

use core::fmt;
use core::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

/// Default receive capacity used by drivers that don't pick their own
pub const DEFAULT_CAPACITY: usize = 64;

/// Fixed-capacity single-producer/single-consumer byte queue
///
/// # Type Parameters
/// * `N` - Capacity in bytes (compile-time constant, must be non-zero)
///
/// # Roles
/// Exactly one execution context may push and exactly one may pop. The
/// methods take `&self` so a queue can live in a `static` shared by an
/// interrupt vector and foreground code; [`ByteQueue::split`] hands out
/// [`Producer`]/[`Consumer`] handles when the roles can be expressed as
/// owned values instead.
///
/// Storage is atomic, so breaking the role contract loses or reorders bytes
/// but never causes undefined behaviour.
pub struct ByteQueue<const N: usize> {
    /// Ring storage
    buffer: [AtomicU8; N],
    /// Write index (producer only)
    head: AtomicUsize,
    /// Read index (consumer only)
    tail: AtomicUsize,
    /// Number of buffered bytes
    count: AtomicUsize,
    /// Bytes discarded because the queue was full (producer only)
    dropped: AtomicUsize,
}

impl<const N: usize> ByteQueue<N> {
    const NON_ZERO_CAPACITY: () = assert!(N > 0, "ByteQueue capacity must be non-zero");

    /// Create a new empty queue
    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::NON_ZERO_CAPACITY;

        Self {
            buffer: [const { AtomicU8::new(0) }; N],
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
            count: AtomicUsize::new(0),
            dropped: AtomicUsize::new(0),
        }
    }

    /// Discard all buffered data and zero both indices
    ///
    /// Must only be called while neither the producer nor the consumer can
    /// run, i.e. before the receive interrupt is enabled.
    pub fn reset(&self) {
        self.head.store(0, Ordering::Relaxed);
        self.tail.store(0, Ordering::Relaxed);
        self.dropped.store(0, Ordering::Relaxed);
        self.count.store(0, Ordering::Release);
    }

    /// Push a byte (producer side)
    ///
    /// Never blocks, never allocates. If the queue is full the byte is
    /// dropped and the buffered contents are left untouched.
    pub fn push(&self, byte: u8) {
        if self.count.load(Ordering::Acquire) >= N {
            let dropped = self.dropped.load(Ordering::Relaxed);
            self.dropped.store(dropped.wrapping_add(1), Ordering::Relaxed);
            return;
        }

        let head = self.head.load(Ordering::Relaxed);
        self.buffer[head].store(byte, Ordering::Relaxed);
        self.head.store(advance::<N>(head), Ordering::Relaxed);
        self.raise_count();
    }

    /// Pop the oldest byte (consumer side)
    ///
    /// Returns `None` when nothing is buffered; an empty queue is left
    /// unchanged.
    pub fn pop(&self) -> Option<u8> {
        if self.count.load(Ordering::Acquire) == 0 {
            return None;
        }

        let tail = self.tail.load(Ordering::Relaxed);
        let byte = self.buffer[tail].load(Ordering::Relaxed);
        self.tail.store(advance::<N>(tail), Ordering::Relaxed);
        self.lower_count();
        Some(byte)
    }

    /// Look at the oldest byte without removing it (consumer side)
    pub fn peek(&self) -> Option<u8> {
        if self.count.load(Ordering::Acquire) == 0 {
            return None;
        }

        let tail = self.tail.load(Ordering::Relaxed);
        Some(self.buffer[tail].load(Ordering::Relaxed))
    }

    /// Number of buffered bytes
    pub fn len(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    /// Check if the queue is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check if the queue is full
    pub fn is_full(&self) -> bool {
        self.len() >= N
    }

    /// Total capacity in bytes
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Bytes dropped by the overflow policy since the last reset
    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Split the queue into its producer and consumer roles
    ///
    /// The exclusive borrow guarantees no other handle exists while the
    /// returned pair is alive.
    pub fn split(&mut self) -> (Producer<'_, N>, Consumer<'_, N>) {
        let queue: &Self = self;
        (Producer { queue }, Consumer { queue })
    }

    #[cfg(target_has_atomic = "ptr")]
    #[inline]
    fn raise_count(&self) {
        self.count.fetch_add(1, Ordering::AcqRel);
    }

    #[cfg(target_has_atomic = "ptr")]
    #[inline]
    fn lower_count(&self) {
        self.count.fetch_sub(1, Ordering::AcqRel);
    }

    // No atomic RMW on this target: the load/store pair must not be split
    // by the other role.
    #[cfg(not(target_has_atomic = "ptr"))]
    #[inline]
    fn raise_count(&self) {
        critical_section::with(|_| {
            let count = self.count.load(Ordering::Acquire);
            self.count.store(count + 1, Ordering::Release);
        });
    }

    #[cfg(not(target_has_atomic = "ptr"))]
    #[inline]
    fn lower_count(&self) {
        critical_section::with(|_| {
            let count = self.count.load(Ordering::Acquire);
            self.count.store(count - 1, Ordering::Release);
        });
    }
}

impl<const N: usize> Default for ByteQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> fmt::Debug for ByteQueue<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteQueue")
            .field("capacity", &N)
            .field("len", &self.len())
            .field("dropped", &self.dropped())
            .finish()
    }
}

#[inline]
const fn advance<const N: usize>(index: usize) -> usize {
    (index + 1) % N
}

/// Producer handle for a byte queue
///
/// Only allows pushing. Not `Clone`, so at most one exists per queue.
pub struct Producer<'a, const N: usize> {
    queue: &'a ByteQueue<N>,
}

impl<'a, const N: usize> Producer<'a, N> {
    /// Push a byte, dropping it if the queue is full
    pub fn push(&mut self, byte: u8) {
        self.queue.push(byte)
    }

    /// Check if queue is full
    pub fn is_full(&self) -> bool {
        self.queue.is_full()
    }
}

/// Consumer handle for a byte queue
///
/// Only allows popping. Not `Clone`, so at most one exists per queue.
pub struct Consumer<'a, const N: usize> {
    queue: &'a ByteQueue<N>,
}

impl<'a, const N: usize> Consumer<'a, N> {
    /// Pop the oldest byte
    pub fn pop(&mut self) -> Option<u8> {
        self.queue.pop()
    }

    /// Look at the oldest byte without removing it
    pub fn peek(&self) -> Option<u8> {
        self.queue.peek()
    }

    /// Check if queue is empty
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Get current queue length
    pub fn len(&self) -> usize {
        self.queue.len()
    }
}

static_assertions::assert_impl_all!(ByteQueue<DEFAULT_CAPACITY>: Send, Sync);
static_assertions::assert_impl_all!(Producer<'static, DEFAULT_CAPACITY>: Send);
static_assertions::assert_impl_all!(Consumer<'static, DEFAULT_CAPACITY>: Send);
static_assertions::assert_not_impl_any!(Producer<'static, DEFAULT_CAPACITY>: Clone, Copy);
static_assertions::assert_not_impl_any!(Consumer<'static, DEFAULT_CAPACITY>: Clone, Copy);
