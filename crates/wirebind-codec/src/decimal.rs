use std::fmt;
use std::str::FromStr;

use crate::error::CodecError;

/// Fixed-point decimal: `mantissa * 10^-scale`.
///
/// Equality compares mantissa and scale, so `1.0` and `1.00` differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Decimal {
    mantissa: i64,
    scale: u32,
}

/// Largest supported scale; `10^18` still fits in an `i64`.
pub const MAX_SCALE: u32 = 18;

impl Decimal {
    pub const ZERO: Decimal = Decimal::from_int(0);

    /// `mantissa * 10^-scale`.
    ///
    /// # Panics
    ///
    /// If `scale` exceeds [`MAX_SCALE`]. Use [`Decimal::try_new`] for
    /// untrusted scales.
    pub const fn new(mantissa: i64, scale: u32) -> Self {
        match Self::try_new(mantissa, scale) {
            Some(value) => value,
            None => panic!("decimal scale exceeds MAX_SCALE"),
        }
    }

    /// `mantissa * 10^-scale`, or `None` if `scale` exceeds [`MAX_SCALE`].
    pub const fn try_new(mantissa: i64, scale: u32) -> Option<Self> {
        if scale > MAX_SCALE {
            return None;
        }
        Some(Self { mantissa, scale })
    }

    pub const fn from_int(value: i64) -> Self {
        Self {
            mantissa: value,
            scale: 0,
        }
    }

    pub fn mantissa(&self) -> i64 {
        self.mantissa
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// `self / divisor` at `scale` fractional digits, rounding half away
    /// from zero. Returns `None` for a zero divisor, a scale above
    /// [`MAX_SCALE`] or on overflow.
    pub fn div_round_half_up(self, divisor: i64, scale: u32) -> Option<Self> {
        if divisor == 0 || scale > MAX_SCALE {
            return None;
        }
        let numerator = self.mantissa as i128 * pow10(scale);
        let denominator = divisor as i128 * pow10(self.scale);

        let mut quotient = numerator / denominator;
        let remainder = numerator % denominator;
        if remainder.abs() * 2 >= denominator.abs() {
            quotient += if (numerator < 0) == (denominator < 0) { 1 } else { -1 };
        }
        i64::try_from(quotient)
            .ok()
            .and_then(|m| Self::try_new(m, scale))
    }

    /// `self * factor` with the fraction truncated toward zero.
    pub fn mul_trunc(self, factor: i64) -> i64 {
        let product = self.mantissa as i128 * factor as i128 / pow10(self.scale);
        product.clamp(i64::MIN as i128, i64::MAX as i128) as i64
    }

    /// The integer part, fraction truncated toward zero.
    pub fn trunc(self) -> i64 {
        self.mul_trunc(1)
    }
}

/// Fraction digits implied by a power-of-ten divisor (10 -> 1 ... 10^6 -> 6).
/// Any other divisor yields 0.
pub fn scale_of_divisor(divisor: i64) -> u32 {
    match divisor {
        10 => 1,
        100 => 2,
        1_000 => 3,
        10_000 => 4,
        100_000 => 5,
        1_000_000 => 6,
        _ => 0,
    }
}

fn pow10(exp: u32) -> i128 {
    10i128.pow(exp)
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        Self::from_int(value)
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scale == 0 {
            return write!(f, "{}", self.mantissa);
        }
        let digits = self.mantissa.unsigned_abs().to_string();
        let scale = self.scale as usize;
        let padded = format!("{digits:0>width$}", width = scale + 1);
        let (int, frac) = padded.split_at(padded.len() - scale);
        let sign = if self.mantissa < 0 { "-" } else { "" };
        write!(f, "{sign}{int}.{frac}")
    }
}

impl FromStr for Decimal {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CodecError::InvalidSchema(format!("invalid decimal literal: {s:?}"));
        let (int, frac) = s.split_once('.').unwrap_or((s, ""));
        if !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let scale = u32::try_from(frac.len()).map_err(|_| invalid())?;
        let mantissa: i64 = format!("{int}{frac}").parse().map_err(|_| invalid())?;
        Self::try_new(mantissa, scale).ok_or_else(invalid)
    }
}
