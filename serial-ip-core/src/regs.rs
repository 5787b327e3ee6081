//! Register-level protocol for the Serial IP core.
//!
//! The IP exposes four 32-bit registers over an AXI4-Lite window:
//!
//! | Offset | Name    | Access | Contents                                  |
//! |--------|---------|--------|-------------------------------------------|
//! | 0      | DATA    | R/W    | FIFO pop on read, push on write (low 8)   |
//! | 1      | STATUS  | R/W1C  | RX-empty, TX-full, overflow flags         |
//! | 2      | CONTROL | R/W    | enable, loopback, framing fields          |
//! | 3      | BRD     | R/W    | integer + fractional baud-rate divisor    |
//!
//! This module owns the pinned offsets and bit assignments, the
//! [`RegisterBus`] access capability, and the data/status operations.
//! Nothing here performs I/O of its own beyond the capability it is given.

use bitflags::bitflags;
use static_assertions::const_assert_eq;

/// Register offsets, in 32-bit words from the mapped base address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum Register {
    /// FIFO data window.
    Data = 0,
    /// FIFO status flags; write-1-to-clear for the overflow latch.
    Status = 1,
    /// Line control fields.
    Control = 2,
    /// Baud-rate divisor.
    Brd = 3,
}

/// Size of the register window in bytes.
pub const SPAN_IN_BYTES: usize = 32;

bitflags! {
    /// STATUS register flags.
    ///
    /// Bit positions are pinned to the hardware revision used by the
    /// polling driver (RX-empty at bit 0, TX-full at bit 2, overflow at
    /// bit 4). The alternate revision placed RX-empty at bit 1; it is
    /// not supported by this crate.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Status: u32 {
        /// Receive FIFO holds no data.
        const RX_EMPTY = 1 << 0;
        /// Transmit FIFO cannot accept another byte.
        const TX_FULL  = 1 << 2;
        /// At least one received byte was lost since the last clear.
        const OVERFLOW = 1 << 4;
    }
}

const_assert_eq!(Status::RX_EMPTY.bits(), 0x01);
const_assert_eq!(Status::TX_FULL.bits(), 0x04);
const_assert_eq!(Status::OVERFLOW.bits(), 0x10);

/// Value written to STATUS to clear the overflow latch.
///
/// Hardware quirk: the register decodes a write of literal `1` as the
/// clear command. The value is unrelated to the OVERFLOW bit position.
pub const STATUS_CLEAR_OVERFLOW: u32 = 1;

// CONTROL register fields.
pub(crate) const CTL_WORD_SIZE_MASK: u32 = 0x03; // stored value = size - 5
pub(crate) const CTL_PARITY_MASK: u32 = 0x0C;
pub(crate) const CTL_PARITY_SHIFT: u32 = 2;
pub(crate) const CTL_ENABLE: u32 = 1 << 4;
pub(crate) const CTL_LOOPBACK: u32 = 1 << 5;
pub(crate) const CTL_STOP_BITS: u32 = 1 << 8;

// BRD register fields.
pub(crate) const BRD_INTEGER_SHIFT: u32 = 8;
pub(crate) const BRD_FRACTION_MASK: u32 = 0xFF;

/// 32-bit access capability for the mapped register window.
///
/// Implementations must perform each access exactly once, unreordered
/// and uncached, since reading DATA pops a hardware FIFO slot. The
/// in-tree [`Mmio`] implementation uses volatile accesses for this.
pub trait RegisterBus {
    /// Read the register at `reg`.
    fn read(&self, reg: Register) -> u32;
    /// Write `value` to the register at `reg`.
    fn write(&self, reg: Register, value: u32);
}

/// Volatile memory-mapped implementation of [`RegisterBus`].
pub struct Mmio {
    base: *mut u32,
}

impl Mmio {
    /// Wraps a mapped register window.
    ///
    /// # Safety
    ///
    /// `base` must point to the start of the device's register window,
    /// mapped non-cacheable, aligned, and valid for [`SPAN_IN_BYTES`]
    /// bytes for the lifetime of the returned value.
    pub const unsafe fn new(base: *mut u32) -> Self {
        Self { base }
    }
}

impl RegisterBus for Mmio {
    fn read(&self, reg: Register) -> u32 {
        unsafe { core::ptr::read_volatile(self.base.add(reg as usize)) }
    }

    fn write(&self, reg: Register, value: u32) {
        unsafe { core::ptr::write_volatile(self.base.add(reg as usize), value) }
    }
}

// The register window is a single shared hardware resource; accesses go
// straight to the device, so the handle may be shared across contexts.
unsafe impl Send for Mmio {}
unsafe impl Sync for Mmio {}

/// Point-in-time view of the hardware FIFO status.
///
/// Decoded at query time from a single STATUS read; never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FifoStatus {
    /// Receive FIFO empty.
    pub empty: bool,
    /// Transmit FIFO full.
    pub full: bool,
    /// Overflow latched since the last clear.
    pub overflow: bool,
}

impl FifoStatus {
    /// Decode a raw STATUS value.
    pub fn from_register(raw: u32) -> Self {
        let flags = Status::from_bits_truncate(raw);
        FifoStatus {
            empty: flags.contains(Status::RX_EMPTY),
            full: flags.contains(Status::TX_FULL),
            overflow: flags.contains(Status::OVERFLOW),
        }
    }
}

/// Read and decode STATUS.
pub fn read_status<B: RegisterBus>(bus: &B) -> FifoStatus {
    FifoStatus::from_register(bus.read(Register::Status))
}

/// Clear the hardware overflow latch.
pub fn clear_overflow<B: RegisterBus>(bus: &B) {
    bus.write(Register::Status, STATUS_CLEAR_OVERFLOW);
}

/// Pop one byte from the receive FIFO.
///
/// Returns `None` without touching DATA when STATUS reports RX-empty;
/// a DATA read on an empty FIFO would still pop a slot on some
/// revisions.
pub fn pop_data<B: RegisterBus>(bus: &B) -> Option<u8> {
    if read_status(bus).empty {
        return None;
    }
    Some(bus.read(Register::Data) as u8)
}

/// Push one byte into the transmit FIFO.
///
/// Unconditional: the hardware neither blocks nor queues beyond its own
/// FIFO, so the caller must have checked TX-full first or the byte may
/// be lost.
pub fn push_data<B: RegisterBus>(bus: &B, byte: u8) {
    bus.write(Register::Data, byte as u32);
}
