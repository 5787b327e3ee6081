//! Fixed-point baud-rate divisor math.
//!
//! The BRD register divides the input clock by `oversample * rate`:
//! the integer quotient lands in bits 8 and up, the fractional part in
//! 1/256ths in the low byte. The integer part truncates toward zero and
//! the fraction rounds to nearest, which keeps the reconstructed rate
//! within the resolution of the 8-bit fractional field.
//!
//! The oversampling factor is an explicit parameter: the two original
//! driver paths disagreed on it (16x vs 32x), so nothing here hard-codes
//! either value. [`crate::port::PortConfig`] carries the configured one.

use crate::error::{Error, Result};
use crate::regs::{BRD_FRACTION_MASK, BRD_INTEGER_SHIFT};

/// Input clock of the IP core on the reference board, 100 MHz.
pub const CLOCK_FREQ: u32 = 100_000_000;

/// Oversampling factor used by default.
pub const DEFAULT_OVERSAMPLE: u32 = 16;

/// Decoded BRD register value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaudDivisor {
    /// Integer divisor, BRD bits 8 and up.
    pub integer: u32,
    /// Fractional divisor in 1/256ths, BRD bits 0-7.
    pub fraction: u8,
}

impl BaudDivisor {
    /// Compute the divisor for a requested rate.
    ///
    /// Rejects non-positive and non-finite rates, a zero oversample
    /// factor, and rates so high the divisor rounds all the way to
    /// zero; a zero BRD value would stall the generator.
    pub fn for_rate(rate: f64, clock_hz: u32, oversample: u32) -> Result<Self> {
        if !(rate > 0.0) || !rate.is_finite() {
            return Err(Error::InvalidBaudRate);
        }
        if oversample == 0 {
            return Err(Error::InvalidOversample);
        }

        let divisor = clock_hz as f64 / (oversample as f64 * rate);
        let mut integer = libm::floor(divisor) as u32;
        let mut fraction = libm::round((divisor - integer as f64) * 256.0) as u32;
        // Round-to-nearest can carry into the integer part.
        if fraction == 256 {
            integer += 1;
            fraction = 0;
        }
        if integer == 0 && fraction == 0 {
            return Err(Error::InvalidBaudRate);
        }

        Ok(BaudDivisor {
            integer,
            fraction: fraction as u8,
        })
    }

    /// Rate this divisor approximates for the given clock and oversample.
    pub fn to_rate(&self, clock_hz: u32, oversample: u32) -> f64 {
        let divisor = self.integer as f64 + self.fraction as f64 / 256.0;
        clock_hz as f64 / (oversample as f64 * divisor)
    }

    /// Encode to the BRD register layout.
    pub fn encode(&self) -> u32 {
        (self.integer << BRD_INTEGER_SHIFT) | (self.fraction as u32 & BRD_FRACTION_MASK)
    }

    /// Decode a raw BRD value.
    pub fn from_register(raw: u32) -> Self {
        BaudDivisor {
            integer: raw >> BRD_INTEGER_SHIFT,
            fraction: (raw & BRD_FRACTION_MASK) as u8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_9600_at_100mhz_16x() {
        // 100e6 / (16 * 9600) = 651.0417 -> integer 651, fraction ~11.
        let d = BaudDivisor::for_rate(9600.0, CLOCK_FREQ, 16).unwrap();
        assert_eq!(d.integer, 651);
        assert_eq!(d.fraction, 11);

        let rate = d.to_rate(CLOCK_FREQ, 16);
        assert!((rate - 9600.0).abs() / 9600.0 < 0.01);
    }

    #[test]
    fn test_round_trip_within_fraction_resolution() {
        for &rate in &[300.0, 1200.0, 9600.0, 38400.0, 115200.0, 921600.0] {
            for &oversample in &[16u32, 32] {
                let d = BaudDivisor::for_rate(rate, CLOCK_FREQ, oversample).unwrap();
                let back = d.to_rate(CLOCK_FREQ, oversample);
                // Half a fractional step either way.
                let step = CLOCK_FREQ as f64
                    / (oversample as f64 * 256.0 * (d.integer as f64).max(1.0).powi(2));
                assert!(
                    (back - rate).abs() <= step.max(1.0),
                    "rate {} oversample {}: got {}",
                    rate,
                    oversample,
                    back
                );
            }
        }
    }

    #[test]
    fn test_fraction_rounds_to_nearest() {
        // divisor = 100e6 / (16 * 12800) = 488.28125 -> fraction 72, not 71.
        let d = BaudDivisor::for_rate(12800.0, CLOCK_FREQ, 16).unwrap();
        assert_eq!(d.integer, 488);
        assert_eq!(d.fraction, 72);
    }

    #[test]
    fn test_fraction_carry_into_integer() {
        // 2_047_999 / 2_048 = 999.9995...: the fraction rounds to 256 and
        // must carry instead of truncating to a byte.
        let d = BaudDivisor::for_rate(1.0, 2_047_999, 2_048).unwrap();
        assert_eq!(d.integer, 1000);
        assert_eq!(d.fraction, 0);
    }

    #[test]
    fn test_rejects_bad_rates() {
        assert_eq!(
            BaudDivisor::for_rate(0.0, CLOCK_FREQ, 16),
            Err(Error::InvalidBaudRate)
        );
        assert_eq!(
            BaudDivisor::for_rate(-9600.0, CLOCK_FREQ, 16),
            Err(Error::InvalidBaudRate)
        );
        assert_eq!(
            BaudDivisor::for_rate(f64::NAN, CLOCK_FREQ, 16),
            Err(Error::InvalidBaudRate)
        );
        assert_eq!(
            BaudDivisor::for_rate(f64::INFINITY, CLOCK_FREQ, 16),
            Err(Error::InvalidBaudRate)
        );
        assert_eq!(
            BaudDivisor::for_rate(9600.0, CLOCK_FREQ, 0),
            Err(Error::InvalidOversample)
        );
    }

    #[test]
    fn test_rejects_rate_that_rounds_divisor_to_zero() {
        // 100e6 / (16 * 1e12) rounds to 0 + 0/256; a zero BRD would
        // stall the generator and read back as an infinite rate.
        assert_eq!(
            BaudDivisor::for_rate(1e12, CLOCK_FREQ, 16),
            Err(Error::InvalidBaudRate)
        );
        // The smallest representable divisor is still accepted.
        let d = BaudDivisor::for_rate(CLOCK_FREQ as f64 * 16.0, CLOCK_FREQ, 16).unwrap();
        assert_eq!(d, BaudDivisor { integer: 0, fraction: 1 });
    }

    #[test]
    fn test_register_encoding_round_trip() {
        let d = BaudDivisor {
            integer: 651,
            fraction: 11,
        };
        assert_eq!(d.encode(), (651 << 8) | 11);
        assert_eq!(BaudDivisor::from_register(d.encode()), d);
    }

    #[test]
    fn test_oversample_is_not_hard_coded() {
        // The same rate halves its integer divisor when oversample doubles.
        let d16 = BaudDivisor::for_rate(9600.0, CLOCK_FREQ, 16).unwrap();
        let d32 = BaudDivisor::for_rate(9600.0, CLOCK_FREQ, 32).unwrap();
        assert_eq!(d32.integer, d16.integer / 2);
    }
}
