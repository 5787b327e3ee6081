//! Error types for the Serial IP driver core.

use core::fmt;

/// Errors reported by the driver core.
///
/// FIFO-empty on read is not an error; reads return `Option<u8>` instead.
/// Receive-side overflow is not an error either: it is counted and
/// surfaced through the status accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The register window could not be mapped. Fatal to the device;
    /// raised at attach time by the memory-mapping collaborator.
    Mapping,
    /// Requested baud rate is zero, negative, or not a finite number.
    InvalidBaudRate,
    /// Oversampling factor of zero would divide by zero in the baud math.
    InvalidOversample,
    /// Word size outside the 5..=8 range supported by the IP.
    InvalidWordSize(u8),
    /// Parity field value with no defined meaning (only 0, 1, 2 exist).
    InvalidParity(u32),
    /// Stop bits count other than 1 or 2.
    InvalidStopBits(u8),
    /// Hardware transmit FIFO is full; the caller may retry or abandon.
    FifoFull,
    /// Bounded transmit wait expired with the TX FIFO still full.
    /// The byte was not written.
    TxTimeout,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Mapping => write!(f, "failed to map device registers"),
            Error::InvalidBaudRate => write!(f, "baud rate must be a positive finite number"),
            Error::InvalidOversample => write!(f, "oversampling factor must be non-zero"),
            Error::InvalidWordSize(n) => write!(f, "word size {} out of range (5 to 8)", n),
            Error::InvalidParity(v) => write!(f, "parity mode {} undefined (0 none, 1 odd, 2 even)", v),
            Error::InvalidStopBits(n) => write!(f, "stop bits {} unsupported (1 or 2)", n),
            Error::FifoFull => write!(f, "transmit FIFO full"),
            Error::TxTimeout => write!(f, "transmit wait expired with FIFO still full"),
        }
    }
}

impl core::error::Error for Error {}

/// Result type for driver operations that can fail.
pub type Result<T> = core::result::Result<T, Error>;
