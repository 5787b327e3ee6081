//! Bounded software FIFO between the interrupt handler and a consumer.
//!
//! Single-producer/single-consumer ring: the producer (interrupt context)
//! mutates the write index only, the consumer mutates the read index
//! only, and each side reads the other's index with acquire ordering
//! against the matching release store. Under that contract push and pop
//! are lock-free, O(1), and allocation-free.
//!
//! Indices run free and wrap modulo `2^usize`; with a power-of-two
//! capacity `write - read == N` means full, so all `N` slots are usable.
//!
//! Overflow policy is drop-and-report: a push into a full ring discards
//! the byte and bumps a counter. Unread data is never overwritten and the
//! producer never waits.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicUsize, Ordering};

/// A push was dropped because the ring was full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overflow;

/// Fixed-capacity SPSC byte ring. `N` must be a power of two.
pub struct RxRing<const N: usize> {
    buf: [UnsafeCell<u8>; N],
    /// Mutated by the producer only.
    write_index: AtomicUsize,
    /// Mutated by the consumer only.
    read_index: AtomicUsize,
    /// Bytes dropped by [`RxRing::push`] since the last clear.
    dropped: AtomicUsize,
}

// Safe under the SPSC contract: each slot is written before the release
// store that publishes it and read only after the acquire load that
// observes that store.
unsafe impl<const N: usize> Sync for RxRing<N> {}

impl<const N: usize> RxRing<N> {
    /// Create an empty ring.
    pub const fn new() -> Self {
        const {
            assert!(N > 0 && N.is_power_of_two(), "ring capacity must be a power of two");
        }
        RxRing {
            buf: [const { UnsafeCell::new(0) }; N],
            write_index: AtomicUsize::new(0),
            read_index: AtomicUsize::new(0),
            dropped: AtomicUsize::new(0),
        }
    }

    /// Append a byte. Producer context only.
    ///
    /// On a full ring the byte is dropped, the drop counter is bumped
    /// exactly once, and existing unread data is untouched.
    pub fn push(&self, byte: u8) -> Result<(), Overflow> {
        let wr = self.write_index.load(Ordering::Relaxed);
        let rd = self.read_index.load(Ordering::Acquire);
        if wr.wrapping_sub(rd) == N {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return Err(Overflow);
        }
        unsafe {
            *self.buf[wr & (N - 1)].get() = byte;
        }
        self.write_index.store(wr.wrapping_add(1), Ordering::Release);
        Ok(())
    }

    /// Take the oldest unread byte. Consumer context only.
    pub fn pop(&self) -> Option<u8> {
        let rd = self.read_index.load(Ordering::Relaxed);
        let wr = self.write_index.load(Ordering::Acquire);
        if rd == wr {
            return None;
        }
        let byte = unsafe { *self.buf[rd & (N - 1)].get() };
        self.read_index.store(rd.wrapping_add(1), Ordering::Release);
        Some(byte)
    }

    /// Unread bytes at the moment of the call.
    pub fn len(&self) -> usize {
        self.write_index
            .load(Ordering::Acquire)
            .wrapping_sub(self.read_index.load(Ordering::Acquire))
    }

    /// True when no unread bytes are buffered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when a push would drop.
    pub fn is_full(&self) -> bool {
        self.len() == N
    }

    /// Total capacity in bytes.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Bytes dropped since the last [`RxRing::clear_overflow`].
    pub fn overflow_count(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Reset the drop counter.
    pub fn clear_overflow(&self) {
        self.dropped.store(0, Ordering::Relaxed);
    }

    /// Discard all buffered bytes and the drop counter.
    ///
    /// Requires exclusive access: only valid while neither side is
    /// running, i.e. at device reinitialization.
    pub fn reset(&mut self) {
        self.write_index.store(0, Ordering::Relaxed);
        self.read_index.store(0, Ordering::Relaxed);
        self.dropped.store(0, Ordering::Relaxed);
    }
}

impl<const N: usize> Default for RxRing<N> {
    fn default() -> Self {
        Self::new()
    }
}
