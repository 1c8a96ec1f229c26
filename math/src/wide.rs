//! 256-bit intermediates for `u128` multiply-then-divide.

const LOW_MASK: u128 = u64::MAX as u128;

/// Full 256-bit product of two `u128` values as `(hi, lo)`.
pub(crate) fn mul_wide(a: u128, b: u128) -> (u128, u128) {
    let (a1, a0) = (a >> 64, a & LOW_MASK);
    let (b1, b0) = (b >> 64, b & LOW_MASK);

    let p00 = a0 * b0;
    let p01 = a0 * b1;
    let p10 = a1 * b0;
    let p11 = a1 * b1;

    // Each term is below 2^64, so the sum fits.
    let mid = (p00 >> 64) + (p01 & LOW_MASK) + (p10 & LOW_MASK);
    let lo = (p00 & LOW_MASK) | (mid << 64);
    let hi = p11 + (p01 >> 64) + (p10 >> 64) + (mid >> 64);
    (hi, lo)
}

/// Divide the 256-bit value `hi·2^128 + lo` by `d`.
///
/// Returns `(quotient, remainder)`, or `None` when `d` is zero or the
/// quotient does not fit in 128 bits (`hi >= d`).
pub(crate) fn div_wide(hi: u128, lo: u128, d: u128) -> Option<(u128, u128)> {
    if d == 0 || hi >= d {
        return None;
    }
    let mut rem = hi;
    let mut quotient = 0u128;
    for i in (0..128).rev() {
        let carry = rem >> 127;
        rem = (rem << 1) | ((lo >> i) & 1);
        quotient <<= 1;
        if carry == 1 || rem >= d {
            rem = rem.wrapping_sub(d);
            quotient |= 1;
        }
    }
    Some((quotient, rem))
}

/// `floor(a · b / d)`, `None` on division by zero or overflow.
pub fn mul_div_floor(a: u128, b: u128, d: u128) -> Option<u128> {
    let (hi, lo) = mul_wide(a, b);
    div_wide(hi, lo, d).map(|(q, _)| q)
}

/// `ceil(a · b / d)`, `None` on division by zero or overflow.
pub fn mul_div_ceil(a: u128, b: u128, d: u128) -> Option<u128> {
    let (hi, lo) = mul_wide(a, b);
    let (q, rem) = div_wide(hi, lo, d)?;
    if rem == 0 {
        Some(q)
    } else {
        q.checked_add(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mul_wide_small_values_match_native() {
        assert_eq!(mul_wide(0, 12345), (0, 0));
        assert_eq!(mul_wide(1 << 70, 3), (0, 3 << 70));
        assert_eq!(mul_wide(u64::MAX as u128, u64::MAX as u128), (0, (u64::MAX as u128) * (u64::MAX as u128)));
    }

    #[test]
    fn mul_wide_max_values() {
        // (2^128 - 1)^2 = 2^256 - 2^129 + 1
        assert_eq!(mul_wide(u128::MAX, u128::MAX), (u128::MAX - 1, 1));
    }

    #[test]
    fn div_wide_inverts_mul_wide() {
        let a = 0xDEAD_BEEF_0000_1234_5678_9ABC_DEF0_1111u128;
        let b = 0x1_0000_0000_0000_0001u128;
        let (hi, lo) = mul_wide(a, b);
        assert_eq!(div_wide(hi, lo, b), Some((a, 0)));
    }

    #[test]
    fn div_wide_rejects_overflowing_quotient() {
        assert_eq!(div_wide(5, 0, 5), None);
        assert_eq!(div_wide(0, 10, 0), None);
    }

    #[test]
    fn ceil_rounds_up_only_with_remainder() {
        assert_eq!(mul_div_ceil(10, 3, 5), Some(6));
        assert_eq!(mul_div_ceil(10, 3, 4), Some(8));
        assert_eq!(mul_div_floor(10, 3, 4), Some(7));
    }
}
