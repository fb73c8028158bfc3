//! UART Driver
//!
//! Owns the receive queue for one USART and exposes:
//! - one-time setup ([`UartDriver::init`])
//! - blocking, polled transmit ([`UartDriver::send_byte`],
//!   [`UartDriver::send_string`])
//! - non-blocking receive draining ([`UartDriver::read_available`],
//!   [`UartDriver::read`])
//! - the receive interrupt entry point ([`UartDriver::on_receive_interrupt`])
//!
//! Every method takes `&self` so the driver can sit in a `static` that the
//! interrupt vector and foreground code both reach. The receive interrupt is
//! the only producer; foreground code is the only consumer.

use core::fmt;
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use byte_queue::{ByteQueue, DEFAULT_CAPACITY};

use crate::config::UartConfig;
use crate::hw::UsartHw;
use crate::irq::{handle_receive, RxCounters, RxEvent, RxStats};
use crate::regs::{Control1, Status};
use crate::{Result, TxStage, UartError};

/// Default receive queue size
pub const DEFAULT_RX_CAPACITY: usize = DEFAULT_CAPACITY;

/// Spin limit value meaning "wait forever"
const UNBOUNDED: u32 = 0;

/// Effective baud deviation (per mille) above which init warns
const BAUD_DEVIATION_WARN_PERMILLE: u64 = 20;

/// Interrupt-driven UART driver
///
/// # Type Parameters
/// * `H` - Register backend
/// * `N` - Receive queue capacity in bytes
pub struct UartDriver<H: UsartHw, const N: usize = DEFAULT_RX_CAPACITY> {
    hw: H,
    rx_queue: ByteQueue<N>,
    counters: RxCounters,
    initialized: AtomicBool,
    tx_spin_limit: AtomicU32,
}

impl<H: UsartHw, const N: usize> UartDriver<H, N> {
    /// Create an uninitialized driver around a register backend
    pub const fn new(hw: H) -> Self {
        Self {
            hw,
            rx_queue: ByteQueue::new(),
            counters: RxCounters::new(),
            initialized: AtomicBool::new(false),
            tx_spin_limit: AtomicU32::new(UNBOUNDED),
        }
    }

    /// Bring up the peripheral
    ///
    /// Sequence:
    /// 1. reset the receive queue
    /// 2. enable clocks and route pins
    /// 3. CR1 = RXNEIE | TE | RE, CR2 = CR3 = 0
    /// 4. write the baud divisor
    /// 5. set interrupt priority, clear pending, unmask
    /// 6. set UE
    ///
    /// Must run to completion before the receive interrupt can fire, and
    /// only once.
    ///
    /// # Errors
    /// - Configuration errors from [`UartConfig::validate`]
    /// - `AlreadyInitialized` on a second call (nothing is touched)
    pub fn init(&self, config: &UartConfig) -> Result<()> {
        if self.initialized.load(Ordering::Acquire) {
            return Err(UartError::AlreadyInitialized);
        }

        let divisor = config.validate()?;

        log::debug!("[uart_driver] Resetting {}-byte receive queue", N);
        self.rx_queue.reset();
        self.counters.reset();

        self.hw.enable_clocks_and_pins();

        log::debug!("[uart_driver] Control: RXNEIE | TE | RE, BRR = {:#06x}", divisor.bits());
        self.hw.write_control(Control1::RX_INTERRUPT_MODE);
        self.hw.clear_aux_control();
        self.hw.write_baud_divisor(divisor);

        let limit = config.tx_spin_limit.map_or(UNBOUNDED, |limit| limit.max(1));
        self.tx_spin_limit.store(limit, Ordering::Relaxed);

        log::debug!("[uart_driver] Enabling receive interrupt at priority {}", config.irq_priority);
        self.hw.configure_interrupt(config.irq_priority);

        self.hw.write_control(self.hw.control() | Control1::UE);
        self.initialized.store(true, Ordering::Release);

        let effective = divisor.effective_baud(config.clock_hz);
        log::info!(
            "[uart_driver] Initialized: {} baud requested, {} effective (mantissa {}, fraction {:#x})",
            config.baud_rate,
            effective,
            divisor.mantissa(),
            divisor.fraction()
        );

        let requested = u64::from(config.baud_rate);
        let deviation = u64::from(effective).abs_diff(requested) * 1000 / requested;
        if deviation > BAUD_DEVIATION_WARN_PERMILLE {
            log::warn!(
                "[uart_driver] Effective baud off by {}.{}% from {}",
                deviation / 10,
                deviation % 10,
                config.baud_rate
            );
        }

        Ok(())
    }

    /// Whether [`init`](Self::init) has completed
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Send one byte and wait until it has left the transmitter
    ///
    /// Polls TXE, writes DR, then polls TC. With no spin limit configured the
    /// waits are unbounded.
    ///
    /// # Errors
    /// - `NotInitialized` before [`init`](Self::init)
    /// - `TxTimeout` if a spin limit is configured and exhausted
    pub fn send_byte(&self, byte: u8) -> Result<()> {
        if !self.is_initialized() {
            return Err(UartError::NotInitialized);
        }

        self.wait_for(TxStage::DataRegisterEmpty, Status::tx_empty)?;
        self.hw.write_data(byte);
        self.wait_for(TxStage::TransmissionComplete, Status::tx_complete)
    }

    /// Send bytes until a 0 terminator, `max_len` bytes, or the end of
    /// `bytes`, whichever comes first
    ///
    /// # Returns
    /// Number of bytes sent (the terminator is not sent)
    pub fn send_string(&self, bytes: &[u8], max_len: usize) -> Result<usize> {
        let mut sent = 0;
        for &byte in bytes.iter().take(max_len) {
            if byte == 0 {
                break;
            }
            self.send_byte(byte)?;
            sent += 1;
        }
        Ok(sent)
    }

    /// Take the oldest received byte, if any
    pub fn read_available(&self) -> Option<u8> {
        self.rx_queue.pop()
    }

    /// Drain received bytes into `buf`
    ///
    /// # Returns
    /// Number of bytes copied
    pub fn read(&self, buf: &mut [u8]) -> usize {
        let mut count = 0;
        for slot in buf.iter_mut() {
            match self.rx_queue.pop() {
                Some(byte) => {
                    *slot = byte;
                    count += 1;
                }
                None => break,
            }
        }
        count
    }

    /// Number of received bytes waiting
    pub fn available(&self) -> usize {
        self.rx_queue.len()
    }

    /// Receive interrupt entry point
    ///
    /// Call this, and only this, from the USART vector.
    pub fn on_receive_interrupt(&self) -> RxEvent {
        let event = handle_receive(&self.hw, &self.rx_queue);
        self.counters.record(event);
        event
    }

    /// Receive statistics since init
    pub fn stats(&self) -> RxStats {
        self.counters.snapshot()
    }

    /// Text writer over the blocking transmit path
    pub fn writer(&self) -> TxWriter<'_, H, N> {
        TxWriter { driver: self }
    }

    fn wait_for(&self, stage: TxStage, ready: fn(Status) -> bool) -> Result<()> {
        let limit = self.tx_spin_limit.load(Ordering::Relaxed);
        let mut polls: u32 = 0;

        while !ready(self.hw.status()) {
            if limit != UNBOUNDED {
                polls += 1;
                if polls >= limit {
                    log::warn!("[uart_driver] Transmit timed out waiting for {:?}", stage);
                    return Err(UartError::TxTimeout { stage });
                }
            }
            core::hint::spin_loop();
        }

        Ok(())
    }
}

impl<H: UsartHw, const N: usize> fmt::Debug for UartDriver<H, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UartDriver")
            .field("initialized", &self.is_initialized())
            .field("rx_queue", &self.rx_queue)
            .field("stats", &self.stats())
            .finish()
    }
}

/// `core::fmt::Write` adapter that sends text byte by byte
pub struct TxWriter<'a, H: UsartHw, const N: usize> {
    driver: &'a UartDriver<H, N>,
}

impl<H: UsartHw, const N: usize> fmt::Write for TxWriter<'_, H, N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for byte in s.bytes() {
            self.driver.send_byte(byte).map_err(|_| fmt::Error)?;
        }
        Ok(())
    }
}
