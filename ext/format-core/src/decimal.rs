//! Arbitrary precision decimal used for the canonical big-number type.

use crate::{FormatError, Result};
use num::{BigInt, Integer, Signed, ToPrimitive, Zero};
use std::fmt;
use std::str::FromStr;

/// An unscaled big integer and a base-10 scale: `unscaled * 10^-scale`.
///
/// Equality is structural, so `1.0` and `1.00` are different values; compare
/// after [`Decimal::rescale`] when the scale is not fixed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Decimal {
    unscaled: BigInt,
    scale: i32,
}

/// Largest scale magnitude accepted when parsing and largest upward rescale
pub const MAX_SCALE: u32 = 1_000;

fn ten_pow(exp: u32) -> BigInt {
    num::pow(BigInt::from(10), exp as usize)
}

impl Decimal {
    pub fn new<I: Into<BigInt>>(unscaled: I, scale: i32) -> Self {
        Self {
            unscaled: unscaled.into(),
            scale,
        }
    }

    pub fn unscaled(&self) -> &BigInt {
        &self.unscaled
    }

    pub fn scale(&self) -> i32 {
        self.scale
    }

    /// Number of decimal digits in the unscaled value
    pub fn precision(&self) -> u32 {
        if self.unscaled.is_zero() {
            return 1;
        }
        self.unscaled.abs().to_string().len() as u32
    }

    /// Change the scale, rounding half away from zero when digits are dropped.
    ///
    /// Returns `None` when the scale grows by more than [`MAX_SCALE`].
    pub fn rescale(&self, scale: i32) -> Option<Decimal> {
        let shift = i64::from(scale) - i64::from(self.scale);
        if shift >= 0 {
            let shift = u32::try_from(shift).ok().filter(|s| *s <= MAX_SCALE)?;
            return Some(Decimal::new(&self.unscaled * ten_pow(shift), scale));
        }

        // every digit is dropped and the value rounds to zero
        let dropped = shift.unsigned_abs();
        if dropped > u64::from(self.precision()) {
            return Some(Decimal::new(0, scale));
        }
        let divisor = ten_pow(dropped as u32);
        let (quotient, remainder) = self.unscaled.div_rem(&divisor);
        let rounded = if remainder.abs() * BigInt::from(2) >= divisor {
            quotient + self.unscaled.signum()
        } else {
            quotient
        };
        Some(Decimal::new(rounded, scale))
    }

    pub fn to_i64(&self) -> Option<i64> {
        self.unscaled.to_i64()
    }

    pub fn to_i128(&self) -> Option<i128> {
        self.unscaled.to_i128()
    }

    /// Minimal two's complement big-endian bytes of the unscaled value
    pub fn to_be_bytes(&self) -> Vec<u8> {
        self.unscaled.to_signed_bytes_be()
    }

    /// Two's complement big-endian bytes sign-extended to `len`.
    ///
    /// Returns `None` when the unscaled value needs more than `len` bytes.
    pub fn to_fixed_be_bytes(&self, len: usize) -> Option<Vec<u8>> {
        let minimal = self.to_be_bytes();
        if minimal.len() > len {
            return None;
        }
        let fill = if self.unscaled.is_negative() { 0xFF } else { 0x00 };
        let mut bytes = vec![fill; len - minimal.len()];
        bytes.extend_from_slice(&minimal);
        Some(bytes)
    }

    pub fn from_be_bytes(bytes: &[u8], scale: i32) -> Self {
        Decimal::new(BigInt::from_signed_bytes_be(bytes), scale)
    }

    /// Whether the unscaled value fits in `precision` digits
    pub fn fits_precision(&self, precision: u32) -> bool {
        self.precision() <= precision
    }
}

/// Smallest byte width whose signed range holds every `precision` digit value
pub fn fixed_length(precision: u32) -> usize {
    ((precision as f64 * 10f64.log2() + 1.0) / 8.0).ceil() as usize
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        Decimal::new(value, 0)
    }
}

impl FromStr for Decimal {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || FormatError::Internal(format!("invalid decimal literal '{}'", s));
        let text = s.trim();

        let (mantissa, exponent) = match text.find(['e', 'E']) {
            Some(pos) => {
                let exp = text[pos + 1..].parse::<i32>().map_err(|_| invalid())?;
                (&text[..pos], exp)
            }
            None => (text, 0),
        };

        let (negative, digits) = match mantissa.as_bytes().first() {
            Some(b'-') => (true, &mantissa[1..]),
            Some(b'+') => (false, &mantissa[1..]),
            _ => (false, mantissa),
        };

        let (int_part, frac_part) = match digits.split_once('.') {
            Some((i, f)) => (i, f),
            None => (digits, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        if !int_part
            .bytes()
            .chain(frac_part.bytes())
            .all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        let joined = format!("{}{}", int_part, frac_part);
        let mut unscaled = BigInt::from_str(if joined.is_empty() { "0" } else { &joined })
            .map_err(|_| invalid())?;
        if negative {
            unscaled = -unscaled;
        }
        let scale = i32::try_from(frac_part.len())
            .ok()
            .and_then(|digits| digits.checked_sub(exponent))
            .filter(|scale| scale.unsigned_abs() <= MAX_SCALE)
            .ok_or_else(|| {
                FormatError::Internal(format!(
                    "decimal literal '{}' has a scale beyond {} digits",
                    s, MAX_SCALE
                ))
            })?;
        Ok(Decimal::new(unscaled, scale))
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.unscaled.abs().to_string();
        let sign = if self.unscaled.is_negative() { "-" } else { "" };

        if self.scale <= 0 {
            let zeros = if self.unscaled.is_zero() {
                String::new()
            } else {
                "0".repeat(self.scale.unsigned_abs() as usize)
            };
            return write!(f, "{}{}{}", sign, digits, zeros);
        }

        let scale = self.scale as usize;
        if digits.len() > scale {
            let (int_part, frac_part) = digits.split_at(digits.len() - scale);
            write!(f, "{}{}.{}", sign, int_part, frac_part)
        } else {
            write!(f, "{}0.{}{}", sign, "0".repeat(scale - digits.len()), digits)
        }
    }
}
