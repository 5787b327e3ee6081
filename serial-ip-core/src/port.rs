//! Device facade: composes the register protocol, baud generator, and
//! RX ring behind the three external surfaces.
//!
//! One [`SerialPort`] owns the register-access capability and the
//! software receive ring for the lifetime of the device binding. The
//! external interrupt runtime calls [`SerialPort::on_data_available`]
//! when the hardware raises its receive interrupt; that entry point does
//! bounded, non-blocking work only. Everything else runs in ordinary
//! caller context.
//!
//! Concurrency: the ring is single-producer (interrupt) single-consumer;
//! the control-register read-modify-write pair is the one multi-step
//! register sequence and is serialized by an internal lock.

use core::sync::atomic::{AtomicBool, Ordering};

use spin::Mutex;

use crate::baud::{BaudDivisor, CLOCK_FREQ, DEFAULT_OVERSAMPLE};
use crate::control::{self, ControlWord, Parity, StopBits};
use crate::error::{Error, Result};
use crate::regs::{self, FifoStatus, Register, RegisterBus};
use crate::ring::RxRing;
use crate::stream::SerialStream;

/// Default software receive FIFO capacity in bytes.
pub const DEFAULT_RX_CAPACITY: usize = 1024;

/// Default bound on bytes drained per interrupt.
///
/// Guards against a stuck RX-empty status bit; generously above any
/// plausible hardware FIFO depth so a healthy device is always fully
/// drained in one pass.
pub const DEFAULT_DRAIN_BURST: usize = 256;

/// Default transmit spin budget, in TX-full polls.
pub const DEFAULT_TX_SPIN_BUDGET: u32 = 100_000;

/// Static configuration of one port binding.
#[derive(Debug, Clone, Copy)]
pub struct PortConfig {
    /// Input clock of the IP core in Hz.
    pub clock_hz: u32,
    /// Oversampling factor for the baud divisor (16 or 32 on known
    /// revisions; configurable because the original paths disagreed).
    pub oversample: u32,
    /// Maximum bytes drained per interrupt event.
    pub max_drain_burst: usize,
    /// Maximum TX-full polls before a blocking write gives up.
    pub tx_spin_budget: u32,
}

impl Default for PortConfig {
    fn default() -> Self {
        PortConfig {
            clock_hz: CLOCK_FREQ,
            oversample: DEFAULT_OVERSAMPLE,
            max_drain_burst: DEFAULT_DRAIN_BURST,
            tx_spin_budget: DEFAULT_TX_SPIN_BUDGET,
        }
    }
}

/// Handle to one Serial IP device instance.
///
/// `N` is the software receive ring capacity and must be a power of two.
pub struct SerialPort<B: RegisterBus, const N: usize = DEFAULT_RX_CAPACITY> {
    bus: B,
    config: PortConfig,
    rx: RxRing<N>,
    // Serializes the control-register read-modify-write pair.
    ctrl_lock: Mutex<()>,
    stream_open: AtomicBool,
}

impl<B: RegisterBus, const N: usize> SerialPort<B, N> {
    /// Bind a port to a mapped register window.
    pub fn new(bus: B, config: PortConfig) -> Self {
        #[cfg(feature = "log")]
        log::debug!(
            "serial: attached, clock {} Hz, oversample {}x, rx ring {} bytes",
            config.clock_hz,
            config.oversample,
            N
        );
        SerialPort {
            bus,
            config,
            rx: RxRing::new(),
            ctrl_lock: Mutex::new(()),
            stream_open: AtomicBool::new(false),
        }
    }

    /// The port configuration.
    pub fn config(&self) -> &PortConfig {
        &self.config
    }

    /// The underlying register-access capability.
    pub fn bus(&self) -> &B {
        &self.bus
    }

    // ------------------------------------------------------------------
    // Status
    // ------------------------------------------------------------------

    /// Point-in-time hardware FIFO status.
    pub fn status(&self) -> FifoStatus {
        regs::read_status(&self.bus)
    }

    /// Raw STATUS register value, for diagnostic display.
    pub fn raw_status(&self) -> u32 {
        self.bus.read(Register::Status)
    }

    /// Clear the hardware overflow latch and the software drop counter.
    pub fn clear_overflow(&self) {
        regs::clear_overflow(&self.bus);
        self.rx.clear_overflow();
    }

    /// Bytes dropped by the software ring since the last clear.
    pub fn software_overflow(&self) -> usize {
        self.rx.overflow_count()
    }

    // ------------------------------------------------------------------
    // Control surface
    // ------------------------------------------------------------------

    /// Decoded control word from the live register.
    pub fn control(&self) -> ControlWord {
        let _guard = self.ctrl_lock.lock();
        control::read_control(&self.bus)
    }

    fn update_control(&self, f: impl FnOnce(&mut ControlWord)) {
        let _guard = self.ctrl_lock.lock();
        let mut word = control::read_control(&self.bus);
        f(&mut word);
        control::write_control(&self.bus, &word);
    }

    /// Set data bits per word, 5 to 8.
    pub fn set_word_size(&self, size: u8) -> Result<()> {
        let size = ControlWord::check_word_size(size)?;
        self.update_control(|w| w.word_size = size);
        Ok(())
    }

    /// Current data bits per word.
    pub fn word_size(&self) -> u8 {
        self.control().word_size
    }

    /// Set the parity mode.
    pub fn set_parity(&self, parity: Parity) {
        self.update_control(|w| w.parity = parity);
    }

    /// Current parity mode.
    pub fn parity(&self) -> Parity {
        self.control().parity
    }

    /// Set the stop bit count.
    pub fn set_stop_bits(&self, stop_bits: StopBits) {
        self.update_control(|w| w.stop_bits = stop_bits);
    }

    /// Current stop bit count.
    pub fn stop_bits(&self) -> StopBits {
        self.control().stop_bits
    }

    /// Enable the baud-rate divisor.
    pub fn enable(&self) {
        self.update_control(|w| w.enabled = true);
    }

    /// Disable the baud-rate divisor.
    pub fn disable(&self) {
        self.update_control(|w| w.enabled = false);
    }

    /// Switch loopback (test) mode on or off.
    pub fn set_loopback(&self, on: bool) {
        self.update_control(|w| w.loopback = on);
    }

    // ------------------------------------------------------------------
    // Baud rate
    // ------------------------------------------------------------------

    /// Rate currently programmed into the BRD register.
    pub fn baud_rate(&self) -> f64 {
        BaudDivisor::from_register(self.bus.read(Register::Brd))
            .to_rate(self.config.clock_hz, self.config.oversample)
    }

    /// Program a new rate and switch the divisor and loopback on.
    ///
    /// Enable and loopback are set in a single read-modify-write; the
    /// original driver issued two writes from one stale read and lost
    /// the enable bit on the second.
    pub fn set_baud_rate(&self, rate: f64) -> Result<BaudDivisor> {
        let divisor = BaudDivisor::for_rate(rate, self.config.clock_hz, self.config.oversample)?;
        self.bus.write(Register::Brd, divisor.encode());
        self.update_control(|w| {
            w.enabled = true;
            w.loopback = true;
        });
        #[cfg(feature = "log")]
        log::debug!(
            "serial: baud {} -> divisor {} + {}/256",
            rate,
            divisor.integer,
            divisor.fraction
        );
        Ok(divisor)
    }

    // ------------------------------------------------------------------
    // Poll-style data surface
    // ------------------------------------------------------------------

    /// Pop one byte straight from the hardware FIFO, bypassing the ring.
    ///
    /// `None` when the hardware reports RX-empty. This is the one-shot
    /// attribute read; interrupt-driven consumers use
    /// [`SerialPort::read_buffered`] instead.
    pub fn try_read(&self) -> Option<u8> {
        regs::pop_data(&self.bus)
    }

    /// Push one byte if the transmit FIFO has room, without waiting.
    pub fn try_write(&self, byte: u8) -> Result<()> {
        if self.status().full {
            return Err(Error::FifoFull);
        }
        regs::push_data(&self.bus, byte);
        Ok(())
    }

    /// Push one byte, spinning on TX-full up to the configured budget.
    ///
    /// On expiry the byte is not written and `TxTimeout` is returned, so
    /// the caller can abandon or retry with no partial effect.
    pub fn write_byte(&self, byte: u8) -> Result<()> {
        let mut spins = 0u32;
        while self.status().full {
            if spins >= self.config.tx_spin_budget {
                #[cfg(feature = "log")]
                log::warn!("serial: tx wait expired after {} polls", spins);
                return Err(Error::TxTimeout);
            }
            spins += 1;
            core::hint::spin_loop();
        }
        regs::push_data(&self.bus, byte);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Ingestion pipeline
    // ------------------------------------------------------------------

    /// Interrupt entry point: drain the hardware RX FIFO into the ring.
    ///
    /// Safe to call from interrupt context: never blocks, bounded by
    /// `max_drain_burst` even if the RX-empty bit sticks low. Ring
    /// overflow drops are counted, never silent. Returns the number of
    /// bytes moved into the ring.
    pub fn on_data_available(&self) -> usize {
        #[cfg(feature = "log")]
        let dropped_before = self.rx.overflow_count();

        let mut moved = 0usize;
        for _ in 0..self.config.max_drain_burst {
            let Some(byte) = regs::pop_data(&self.bus) else {
                break;
            };
            if self.rx.push(byte).is_ok() {
                moved += 1;
            }
        }

        #[cfg(feature = "log")]
        {
            let newly_dropped = self.rx.overflow_count() - dropped_before;
            if newly_dropped > 0 {
                log::warn!("serial: rx ring overflow, {} bytes dropped", newly_dropped);
            }
        }
        moved
    }

    /// Take the oldest byte buffered by the ingestion pipeline.
    ///
    /// Consumer context only; the ring is single-consumer.
    pub fn read_buffered(&self) -> Option<u8> {
        self.rx.pop()
    }

    /// Bytes currently buffered by the ingestion pipeline.
    pub fn rx_pending(&self) -> usize {
        self.rx.len()
    }

    /// Software ring capacity.
    pub const fn rx_capacity(&self) -> usize {
        N
    }

    // ------------------------------------------------------------------
    // Stream surface
    // ------------------------------------------------------------------

    /// Open the byte-stream surface.
    ///
    /// At most one stream may be open at a time; the ring consumer side
    /// is single-consumer. Returns `None` while another stream is open.
    pub fn open_stream(&self) -> Option<SerialStream<'_, B, N>> {
        if self.stream_open.swap(true, Ordering::Acquire) {
            return None;
        }
        Some(SerialStream::new(self))
    }

    pub(crate) fn stream_closed(&self) {
        self.stream_open.store(false, Ordering::Release);
    }

    /// Reinitialize the software side of the binding.
    ///
    /// Drops buffered bytes and counters; register state is untouched.
    pub fn reset(&mut self) {
        self.rx.reset();
    }
}
