//! Driver core for the AXI4-Lite Serial IP UART.
//!
//! The IP exposes four 32-bit registers (data, status, control,
//! baud-rate divisor) and an edge-triggered receive interrupt. This
//! crate implements everything between those registers and the outer
//! glue: bit-field encode/decode, the fixed-point baud generator, a
//! lock-free software receive ring, the interrupt-driven ingestion
//! pipeline, and a facade composing them behind poll-style, stream-style
//! and interrupt entry points.
//!
//! Platform binding, sysfs/TTY registration, and physical-to-virtual
//! mapping are external collaborators: they hand this crate a
//! [`regs::RegisterBus`] capability (usually [`regs::Mmio`] over a
//! mapped window) and forward interrupt events to
//! [`port::SerialPort::on_data_available`].
//!
//! # Example
//!
//! ```
//! use serial_ip_core::port::{PortConfig, SerialPort};
//! # use serial_ip_core::regs::{Register, RegisterBus};
//! # struct NullBus;
//! # impl RegisterBus for NullBus {
//! #     fn read(&self, _reg: Register) -> u32 { serial_ip_core::regs::Status::RX_EMPTY.bits() }
//! #     fn write(&self, _reg: Register, _value: u32) {}
//! # }
//! # let bus = NullBus;
//! let port: SerialPort<_, 1024> = SerialPort::new(bus, PortConfig::default());
//! port.set_baud_rate(9600.0)?;
//! port.set_word_size(8)?;
//! assert_eq!(port.try_read(), None);
//! # Ok::<(), serial_ip_core::error::Error>(())
//! ```

#![no_std]

#[cfg(any(test, feature = "std"))]
extern crate std;

pub mod baud;
pub mod control;
pub mod error;
pub mod port;
pub mod regs;
pub mod ring;
pub mod stream;

pub use baud::BaudDivisor;
pub use control::{ControlWord, Parity, StopBits};
pub use error::{Error, Result};
pub use port::{PortConfig, SerialPort};
pub use regs::{FifoStatus, Mmio, Register, RegisterBus, Status};
pub use ring::RxRing;
pub use stream::SerialStream;
