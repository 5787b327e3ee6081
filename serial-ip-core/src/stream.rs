//! Byte-stream surface over the ingestion pipeline.
//!
//! Models the line-discipline operation set: open, close, write,
//! write-room. Received bytes arrive through the interrupt path
//! ([`crate::port::SerialPort::on_data_available`]) into the ring; the
//! stream drains the ring. Writes go out with the bounded transmit wait,
//! stopping at the first byte whose wait expires rather than spinning
//! forever on faulted hardware.

use crate::port::SerialPort;
use crate::regs::RegisterBus;

/// An open byte stream on a [`SerialPort`].
///
/// Only one stream can be open per port; dropping it (or calling
/// [`SerialStream::close`]) releases the slot.
pub struct SerialStream<'a, B: RegisterBus, const N: usize> {
    port: &'a SerialPort<B, N>,
}

impl<'a, B: RegisterBus, const N: usize> SerialStream<'a, B, N> {
    pub(crate) fn new(port: &'a SerialPort<B, N>) -> Self {
        SerialStream { port }
    }

    /// Transmit as much of `data` as the hardware accepts.
    ///
    /// Each byte waits on TX-full under the port's spin budget. Returns
    /// the number of bytes written; short when a wait expired, so the
    /// caller can retry the tail or abandon.
    pub fn write(&self, data: &[u8]) -> usize {
        for (written, &byte) in data.iter().enumerate() {
            if self.port.write_byte(byte).is_err() {
                return written;
            }
        }
        data.len()
    }

    /// Bytes the stream would accept right now without a timeout risk.
    ///
    /// Zero when the hardware transmit FIFO is full; otherwise the ring
    /// capacity stands in for the unknowable hardware headroom, matching
    /// the coarse room query the line discipline expects.
    pub fn write_room(&self) -> usize {
        if self.port.status().full {
            0
        } else {
            self.port.rx_capacity()
        }
    }

    /// Drain buffered received bytes into `buf`, returning the count.
    pub fn read(&self, buf: &mut [u8]) -> usize {
        let mut filled = 0;
        while filled < buf.len() {
            match self.port.read_buffered() {
                Some(byte) => {
                    buf[filled] = byte;
                    filled += 1;
                }
                None => break,
            }
        }
        filled
    }

    /// Next buffered received byte, if any.
    pub fn read_byte(&self) -> Option<u8> {
        self.port.read_buffered()
    }

    /// Bytes buffered and ready to read.
    pub fn available(&self) -> usize {
        self.port.rx_pending()
    }

    /// Close the stream, releasing the port's consumer slot.
    pub fn close(self) {}
}

impl<B: RegisterBus, const N: usize> Drop for SerialStream<'_, B, N> {
    fn drop(&mut self) {
        self.port.stream_closed();
    }
}
