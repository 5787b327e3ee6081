//! `serial` - command-line control of the Serial IP UART.
//!
//! Talks to the IP core through a direct `/dev/mem` mapping of its
//! AXI4-Lite register window. One subcommand per invocation; values are
//! accepted in decimal or `0x`-prefixed hex. Invalid input exits
//! non-zero.

mod devmem;

use anyhow::{Context, Result, bail};
use serial_ip_core::port::{PortConfig, SerialPort};
use serial_ip_core::regs::{Mmio, SPAN_IN_BYTES};
use serial_ip_core::{Error, Parity, StopBits};

use crate::devmem::DevMem;

/// Base of the AXI4-Lite peripheral window on the target board.
const AXI4_LITE_BASE: usize = 0x43C0_0000;
/// Offset of the Serial IP inside that window.
const SERIAL_BASE_OFFSET: usize = 0x20000;

struct Device {
    port: SerialPort<Mmio>,
    // Keeps the /dev/mem mapping alive while `port` holds its pointer.
    _mem: DevMem,
}

fn open_device(oversample: Option<u32>) -> Result<Device> {
    let mem =
        DevMem::map(AXI4_LITE_BASE + SERIAL_BASE_OFFSET, SPAN_IN_BYTES).context(Error::Mapping)?;
    let mut config = PortConfig::default();
    if let Some(oversample) = oversample {
        config.oversample = oversample;
    }
    let port = SerialPort::new(mem.mmio(), config);
    Ok(Device { port, _mem: mem })
}

fn main() {
    if let Err(err) = run() {
        eprintln!("serial: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let oversample = take_oversample(&mut args)?;

    let Some((command, rest)) = args.split_first() else {
        print_usage();
        bail!("missing command");
    };

    match command.as_str() {
        "read" | "r" => cmd_read(&open_device(oversample)?, rest),
        "write" | "w" => cmd_write(&open_device(oversample)?, rest),
        "status" | "s" => cmd_status(&open_device(oversample)?),
        "clear" | "co" => {
            open_device(oversample)?.port.clear_overflow();
            Ok(())
        }
        "baudrate" | "b" => cmd_baudrate(&open_device(oversample)?, rest),
        "enable" => {
            open_device(oversample)?.port.enable();
            Ok(())
        }
        "disable" => {
            open_device(oversample)?.port.disable();
            Ok(())
        }
        "test" => {
            let off = rest.first().is_some_and(|arg| arg == "off");
            open_device(oversample)?.port.set_loopback(!off);
            Ok(())
        }
        "dl" => cmd_word_size(&open_device(oversample)?, rest),
        "p" => cmd_parity(&open_device(oversample)?, rest),
        "stop" => cmd_stop_bits(&open_device(oversample)?, rest),
        "--help" | "--h" => {
            print_usage();
            Ok(())
        }
        other => {
            print_usage();
            bail!("invalid command '{other}'");
        }
    }
}

/// Pull an optional `--oversample N` pair out of the argument list.
fn take_oversample(args: &mut Vec<String>) -> Result<Option<u32>> {
    let Some(pos) = args.iter().position(|arg| arg == "--oversample") else {
        return Ok(None);
    };
    if pos + 1 >= args.len() {
        bail!("--oversample needs a value");
    }
    let value: u32 = args[pos + 1]
        .parse()
        .with_context(|| format!("invalid oversample '{}'", args[pos + 1]))?;
    if value == 0 {
        bail!("{}", Error::InvalidOversample);
    }
    args.drain(pos..=pos + 1);
    Ok(Some(value))
}

fn cmd_read(dev: &Device, args: &[String]) -> Result<()> {
    let count: usize = match args.first() {
        Some(arg) => {
            let n = parse_value(arg).with_context(|| format!("invalid read count '{arg}'"))?;
            if n == 0 {
                bail!("read count must be at least 1");
            }
            n as usize
        }
        None => 1,
    };

    for i in 0..count {
        match dev.port.try_read() {
            Some(data) => println!("Read data[{i}]: {data}"),
            None => {
                println!("FIFO is empty");
                break;
            }
        }
    }
    Ok(())
}

fn cmd_write(dev: &Device, args: &[String]) -> Result<()> {
    if args.is_empty() {
        bail!("write needs at least one value");
    }

    for arg in args {
        let value = parse_value(arg).with_context(|| format!("invalid value '{arg}'"))?;
        match dev.port.try_write(value as u8) {
            Ok(()) => println!("Successfully wrote {value}"),
            Err(Error::FifoFull) => {
                println!("FIFO is now full");
                break;
            }
            Err(other) => return Err(other.into()),
        }
    }
    Ok(())
}

fn cmd_status(dev: &Device) -> Result<()> {
    let raw = dev.port.raw_status();
    let status = dev.port.status();
    println!("FIFO Status: {}", format_binary(raw));
    println!("Empty: {}", yes_no(status.empty));
    println!("Full: {}", yes_no(status.full));
    println!("Overflow: {}", yes_no(status.overflow));
    Ok(())
}

fn cmd_baudrate(dev: &Device, args: &[String]) -> Result<()> {
    match args.first() {
        Some(arg) => {
            let rate: f64 = arg
                .parse()
                .with_context(|| format!("invalid baud rate '{arg}'"))?;
            let divisor = dev.port.set_baud_rate(rate)?;
            println!("BRD register: {}", format_binary(divisor.encode()));
        }
        None => {
            println!("Baud rate is {:.2}", dev.port.baud_rate());
        }
    }
    Ok(())
}

fn cmd_word_size(dev: &Device, args: &[String]) -> Result<()> {
    let arg = args.first().context("usage: serial dl DATA_LENGTH(5 to 8)")?;
    let size = parse_value(arg).with_context(|| format!("invalid data length '{arg}'"))?;
    dev.port.set_word_size(size as u8)?;
    Ok(())
}

fn cmd_parity(dev: &Device, args: &[String]) -> Result<()> {
    let arg = args.first().context("usage: serial p [0,1,2]")?;
    let mode = parse_value(arg).with_context(|| format!("invalid parity mode '{arg}'"))?;
    dev.port.set_parity(Parity::from_field(mode)?);
    Ok(())
}

fn cmd_stop_bits(dev: &Device, args: &[String]) -> Result<()> {
    let arg = args.first().context("usage: serial stop [1,2]")?;
    let count = parse_value(arg).with_context(|| format!("invalid stop bits '{arg}'"))?;
    dev.port.set_stop_bits(StopBits::from_count(count as u8)?);
    Ok(())
}

/// Parse a decimal or `0x`-prefixed hex value.
fn parse_value(arg: &str) -> Result<u32> {
    if let Some(hex) = arg.strip_prefix("0x").or_else(|| arg.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(Into::into)
    } else {
        arg.parse().map_err(Into::into)
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "Yes" } else { "No" }
}

/// Render a register value as binary, grouped by byte.
fn format_binary(value: u32) -> String {
    let mut out = String::with_capacity(35);
    for bit in (0..32).rev() {
        out.push(if value >> bit & 1 == 1 { '1' } else { '0' });
        if bit % 8 == 0 && bit != 0 {
            out.push(' ');
        }
    }
    out
}

fn print_usage() {
    println!("Usage:");
    println!("  Read:");
    println!("    serial read [num_reads]");
    println!("    serial r [num_reads]");
    println!("  Write:");
    println!("    serial write value1 [value2 value3 ...]");
    println!("    serial w value1 [value2 value3 ...]");
    println!("  Set or show baud rate:");
    println!("    serial baudrate [value]");
    println!("    serial b [value]");
    println!("  Check status / clear overflow:");
    println!("    serial status | s");
    println!("    serial clear | co");
    println!("  Divisor and loopback control:");
    println!("    serial enable | disable");
    println!("    serial test [off]");
    println!("  Line settings:");
    println!("    serial dl N          data length, 5 to 8");
    println!("    serial p MODE        parity: 0 none, 1 odd, 2 even");
    println!("    serial stop N        stop bits, 1 or 2");
    println!();
    println!("Notes:");
    println!("- Values can be in decimal or hex (prefix with 0x)");
    println!("- Multiple writes can be specified in a single command");
    println!("- --oversample N overrides the 16x baud oversampling factor");
}
