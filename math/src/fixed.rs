//! Unsigned 64.64 fixed-point numbers.

use crate::error::MathError;
use crate::wide::{mul_div_ceil, mul_div_floor, mul_wide};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of fractional bits.
pub const FRAC_BITS: u32 = 64;
const ONE_RAW: u128 = 1u128 << FRAC_BITS;

/// An unsigned fixed-point value: the upper 64 bits hold the integer part,
/// the lower 64 bits the fraction. All operations round toward zero and
/// report overflow instead of wrapping.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Fixed(u128);

impl Fixed {
    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(ONE_RAW);
    pub const MAX: Self = Self(u128::MAX);

    pub const fn from_raw(raw: u128) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u128 {
        self.0
    }

    pub const fn from_int(value: u64) -> Self {
        Self((value as u128) << FRAC_BITS)
    }

    /// `floor(numerator / denominator)` in fixed point.
    pub fn from_ratio(numerator: u128, denominator: u128) -> Result<Self, MathError> {
        if denominator == 0 {
            return Err(MathError::DivisionByZero);
        }
        mul_div_floor(numerator, ONE_RAW, denominator)
            .map(Self)
            .ok_or(MathError::Overflow)
    }

    /// Like [`Fixed::from_ratio`] but clamps to [`Fixed::MAX`] on overflow.
    pub fn saturating_ratio(numerator: u128, denominator: u128) -> Result<Self, MathError> {
        match Self::from_ratio(numerator, denominator) {
            Err(MathError::Overflow) => Ok(Self::MAX),
            other => other,
        }
    }

    pub fn checked_mul(self, rhs: Self) -> Option<Self> {
        let (hi, lo) = mul_wide(self.0, rhs.0);
        if hi >> FRAC_BITS != 0 {
            return None;
        }
        Some(Self((hi << FRAC_BITS) | (lo >> FRAC_BITS)))
    }

    /// `self ^ exp` by square-and-multiply. `None` as soon as any
    /// intermediate leaves the representable range.
    pub fn checked_pow(self, mut exp: u32) -> Option<Self> {
        let mut result = Self::ONE;
        let mut base = self;
        while exp > 0 {
            if exp & 1 == 1 {
                result = result.checked_mul(base)?;
            }
            exp >>= 1;
            if exp > 0 {
                base = base.checked_mul(base)?;
            }
        }
        Some(result)
    }

    /// Integer part.
    pub const fn floor(self) -> u128 {
        self.0 >> FRAC_BITS
    }

    /// `ceil(self · amount)` as an integer.
    pub fn mul_int_ceil(self, amount: u128) -> Option<u128> {
        mul_div_ceil(self.0, amount, ONE_RAW)
    }

    /// `floor(self · amount)` as an integer.
    pub fn mul_int_floor(self, amount: u128) -> Option<u128> {
        mul_div_floor(self.0, amount, ONE_RAW)
    }
}

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Six decimal places, truncated.
        let frac = mul_div_floor(self.0 & (ONE_RAW - 1), 1_000_000, ONE_RAW).unwrap_or(0);
        write!(f, "{}.{:06}", self.floor(), frac)
    }
}
