//! Decoded view of the CONTROL register.
//!
//! The control word is never cached: every mutation is a read-modify-write
//! against the live register so concurrent changes to unrelated bits are
//! not lost. Only the five documented fields are touched; everything else
//! passes through unchanged.

use crate::error::{Error, Result};
use crate::regs::{
    CTL_ENABLE, CTL_LOOPBACK, CTL_PARITY_MASK, CTL_PARITY_SHIFT, CTL_STOP_BITS,
    CTL_WORD_SIZE_MASK, Register, RegisterBus,
};

/// Parity mode field (CONTROL bits 2-3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    /// No parity bit.
    None = 0,
    /// Odd parity.
    Odd = 1,
    /// Even parity.
    Even = 2,
}

impl Parity {
    /// Decode the 2-bit register field. Field value 3 is reserved.
    pub fn from_field(value: u32) -> Result<Self> {
        match value {
            0 => Ok(Parity::None),
            1 => Ok(Parity::Odd),
            2 => Ok(Parity::Even),
            other => Err(Error::InvalidParity(other)),
        }
    }
}

/// Stop bits field (CONTROL bit 8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopBits {
    /// One stop bit.
    One,
    /// Two stop bits.
    Two,
}

impl StopBits {
    /// Map a user-facing count (1 or 2) to the field.
    pub fn from_count(count: u8) -> Result<Self> {
        match count {
            1 => Ok(StopBits::One),
            2 => Ok(StopBits::Two),
            other => Err(Error::InvalidStopBits(other)),
        }
    }

    /// User-facing count.
    pub fn count(self) -> u8 {
        match self {
            StopBits::One => 1,
            StopBits::Two => 2,
        }
    }
}

/// Decoded CONTROL register fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlWord {
    /// Baud-rate divisor enable.
    pub enabled: bool,
    /// Loopback (test) mode: TX feeds RX inside the IP.
    pub loopback: bool,
    /// Data bits per word, 5 to 8. Stored in the register biased by 5.
    pub word_size: u8,
    /// Parity mode.
    pub parity: Parity,
    /// Stop bits.
    pub stop_bits: StopBits,
}

impl ControlWord {
    /// Decode a raw CONTROL value.
    ///
    /// A reserved parity field value reads back as no parity.
    pub fn decode(raw: u32) -> Self {
        ControlWord {
            enabled: raw & CTL_ENABLE != 0,
            loopback: raw & CTL_LOOPBACK != 0,
            word_size: (raw & CTL_WORD_SIZE_MASK) as u8 + 5,
            parity: Parity::from_field((raw & CTL_PARITY_MASK) >> CTL_PARITY_SHIFT)
                .unwrap_or(Parity::None),
            stop_bits: if raw & CTL_STOP_BITS != 0 {
                StopBits::Two
            } else {
                StopBits::One
            },
        }
    }

    /// Merge this word into a raw CONTROL value, clearing only the five
    /// managed fields and preserving every other bit.
    ///
    /// A `word_size` outside 5 to 8 is clamped into range; the register
    /// field cannot express anything else.
    pub fn apply_to(&self, raw: u32) -> u32 {
        let mut value = raw
            & !(CTL_WORD_SIZE_MASK | CTL_PARITY_MASK | CTL_ENABLE | CTL_LOOPBACK | CTL_STOP_BITS);
        value |= (u32::from(self.word_size.clamp(5, 8)) - 5) & CTL_WORD_SIZE_MASK;
        value |= (self.parity as u32) << CTL_PARITY_SHIFT;
        if self.enabled {
            value |= CTL_ENABLE;
        }
        if self.loopback {
            value |= CTL_LOOPBACK;
        }
        if self.stop_bits == StopBits::Two {
            value |= CTL_STOP_BITS;
        }
        value
    }

    /// Validate the word size range, 5 to 8.
    pub fn check_word_size(size: u8) -> Result<u8> {
        if (5..=8).contains(&size) {
            Ok(size)
        } else {
            Err(Error::InvalidWordSize(size))
        }
    }
}

impl Default for ControlWord {
    /// 8N1, disabled, no loopback.
    fn default() -> Self {
        ControlWord {
            enabled: false,
            loopback: false,
            word_size: 8,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }
}

/// Read and decode the live CONTROL register.
pub fn read_control<B: RegisterBus>(bus: &B) -> ControlWord {
    ControlWord::decode(bus.read(Register::Control))
}

/// Write `word` with a read-modify-write against the live register.
///
/// Callers that may race other control writers must serialize around
/// this; the facade holds a lock for the read-modify-write pair.
pub fn write_control<B: RegisterBus>(bus: &B, word: &ControlWord) {
    let raw = bus.read(Register::Control);
    bus.write(Register::Control, word.apply_to(raw));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_default_raw() {
        let word = ControlWord::decode(0);
        assert!(!word.enabled);
        assert!(!word.loopback);
        assert_eq!(word.word_size, 5);
        assert_eq!(word.parity, Parity::None);
        assert_eq!(word.stop_bits, StopBits::One);
    }

    #[test]
    fn test_word_size_bias() {
        // Setting length 7 against an all-zero word stores field value 2.
        let word = ControlWord {
            word_size: 7,
            ..ControlWord::default()
        };
        let raw = word.apply_to(0);
        assert_eq!(raw & CTL_WORD_SIZE_MASK, 2);
        assert_eq!(ControlWord::decode(raw).word_size, 7);
    }

    #[test]
    fn test_round_trip_all_fields() {
        let word = ControlWord {
            enabled: true,
            loopback: true,
            word_size: 6,
            parity: Parity::Even,
            stop_bits: StopBits::Two,
        };
        assert_eq!(ControlWord::decode(word.apply_to(0)), word);
    }

    #[test]
    fn test_apply_preserves_unrelated_bits() {
        // Sentinel in an unmanaged bit position must survive the merge.
        let sentinel = 1 << 13 | 1 << 6;
        let word = ControlWord {
            enabled: true,
            word_size: 8,
            parity: Parity::Odd,
            ..ControlWord::default()
        };
        let raw = word.apply_to(sentinel);
        assert_eq!(raw & sentinel, sentinel);
        assert_eq!(ControlWord::decode(raw), word);
    }

    #[test]
    fn test_apply_clears_previous_fields() {
        let even_two = ControlWord {
            parity: Parity::Even,
            stop_bits: StopBits::Two,
            word_size: 8,
            ..ControlWord::default()
        };
        let none_one = ControlWord {
            parity: Parity::None,
            stop_bits: StopBits::One,
            word_size: 5,
            ..ControlWord::default()
        };
        let raw = none_one.apply_to(even_two.apply_to(0));
        assert_eq!(ControlWord::decode(raw), none_one);
    }

    #[test]
    fn test_parity_field_values() {
        assert_eq!(Parity::from_field(0), Ok(Parity::None));
        assert_eq!(Parity::from_field(1), Ok(Parity::Odd));
        assert_eq!(Parity::from_field(2), Ok(Parity::Even));
        assert_eq!(Parity::from_field(3), Err(Error::InvalidParity(3)));
    }

    #[test]
    fn test_reserved_parity_reads_as_none() {
        let raw = 3 << CTL_PARITY_SHIFT;
        assert_eq!(ControlWord::decode(raw).parity, Parity::None);
    }

    #[test]
    fn test_stop_bits_counts() {
        assert_eq!(StopBits::from_count(1), Ok(StopBits::One));
        assert_eq!(StopBits::from_count(2), Ok(StopBits::Two));
        assert_eq!(StopBits::from_count(0), Err(Error::InvalidStopBits(0)));
        assert_eq!(StopBits::One.count(), 1);
        assert_eq!(StopBits::Two.count(), 2);
    }

    #[test]
    fn test_apply_clamps_out_of_range_word_size() {
        // A hand-built word can carry any u8; encoding must stay in the
        // register's 5-to-8 range instead of wrapping.
        let low = ControlWord {
            word_size: 0,
            ..ControlWord::default()
        };
        assert_eq!(low.apply_to(0) & CTL_WORD_SIZE_MASK, 0);
        assert_eq!(ControlWord::decode(low.apply_to(0)).word_size, 5);

        let high = ControlWord {
            word_size: 200,
            ..ControlWord::default()
        };
        assert_eq!(high.apply_to(0) & CTL_WORD_SIZE_MASK, 3);
        assert_eq!(ControlWord::decode(high.apply_to(0)).word_size, 8);
    }

    #[test]
    fn test_word_size_validation() {
        assert_eq!(ControlWord::check_word_size(5), Ok(5));
        assert_eq!(ControlWord::check_word_size(8), Ok(8));
        assert_eq!(ControlWord::check_word_size(4), Err(Error::InvalidWordSize(4)));
        assert_eq!(ControlWord::check_word_size(9), Err(Error::InvalidWordSize(9)));
    }
}
