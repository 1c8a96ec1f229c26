//! Boosting threshold, proposal score and boost-change sizing.
//!
//! A scheme's bar rises exponentially with how many of its proposals are
//! already boosted: `threshold(n) = c ^ n`. A proposal's score is its net
//! yes-stake in units of its bounty. A proposal crosses the bar only when
//! `score > threshold`; equality never boosts.

use crate::error::MathError;
use crate::fixed::Fixed;

/// Hard cap on the exponent regardless of how small the constant is.
pub const MAX_THRESHOLD_EXPONENT: u32 = 4096;

/// Smallest accepted constant, exclusive (1.000 in thousandths).
const MIN_CONST_THOUSANDTHS: u128 = 1000;
/// Largest accepted constant, inclusive (16.000 in thousandths).
const MAX_CONST_THOUSANDTHS: u128 = 16_000;

/// Convert a threshold constant given in thousandths (`2000` = 2.0).
pub fn threshold_const(thousandths: u128) -> Result<Fixed, MathError> {
    if thousandths <= MIN_CONST_THOUSANDTHS || thousandths > MAX_CONST_THOUSANDTHS {
        return Err(MathError::InvalidThresholdConst(thousandths));
    }
    Fixed::from_ratio(thousandths, 1000)
}

/// Largest exponent `n <= MAX_THRESHOLD_EXPONENT` with `base ^ n` representable.
pub fn limit_exponent(base: Fixed) -> u32 {
    if base.checked_pow(MAX_THRESHOLD_EXPONENT).is_some() {
        return MAX_THRESHOLD_EXPONENT;
    }
    // Invariant: pow(lo) fits, pow(hi) overflows.
    let (mut lo, mut hi) = (0u32, MAX_THRESHOLD_EXPONENT);
    while hi - lo > 1 {
        let mid = lo + (hi - lo) / 2;
        if base.checked_pow(mid).is_some() {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    lo
}

/// `base ^ min(boosted, limit)`.
///
/// With `limit` taken from [`limit_exponent`] this never overflows; the
/// error path only guards against mismatched inputs.
pub fn threshold(base: Fixed, boosted: u64, limit: u32) -> Result<Fixed, MathError> {
    let exponent = u32::try_from(boosted).unwrap_or(u32::MAX).min(limit);
    base.checked_pow(exponent).ok_or(MathError::Overflow)
}

/// `max(yes − no, 0) / unit`, saturating at [`Fixed::MAX`].
pub fn score(yes_stake: u128, no_stake: u128, unit: u128) -> Result<Fixed, MathError> {
    Fixed::saturating_ratio(yes_stake.saturating_sub(no_stake), unit)
}

/// Whether a score clears the bar. Strictly greater; equality does not boost.
pub fn crosses(score: Fixed, threshold: Fixed) -> bool {
    score > threshold
}

/// Minimum additional yes-stake after which `score > threshold`.
///
/// The score is `floor(net · 2^64 / unit)` in raw units, so it exceeds the
/// raw threshold `T` exactly when `net ≥ ceil((T + 1) · unit / 2^64)`.
pub fn boost_change(
    yes_stake: u128,
    no_stake: u128,
    unit: u128,
    threshold: Fixed,
) -> Result<u128, MathError> {
    if unit == 0 {
        return Err(MathError::DivisionByZero);
    }
    let bar = threshold.raw().checked_add(1).ok_or(MathError::Overflow)?;
    let required_net = Fixed::from_raw(bar)
        .mul_int_ceil(unit)
        .ok_or(MathError::Overflow)?;
    let target_yes = required_net.checked_add(no_stake).ok_or(MathError::Overflow)?;
    Ok(target_yes.saturating_sub(yes_stake))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn const_bounds() {
        assert!(threshold_const(1000).is_err());
        assert!(threshold_const(16_001).is_err());
        assert_eq!(threshold_const(2000).unwrap(), Fixed::from_int(2));
        assert_eq!(threshold_const(16_000).unwrap(), Fixed::from_int(16));
    }

    #[test]
    fn limit_for_two_is_63() {
        assert_eq!(limit_exponent(Fixed::from_int(2)), 63);
        assert_eq!(limit_exponent(Fixed::from_int(16)), 15);
    }

    #[test]
    fn limit_caps_small_constants() {
        let c = threshold_const(1001).unwrap();
        assert!(limit_exponent(c) <= MAX_THRESHOLD_EXPONENT);
        assert!(threshold(c, u64::MAX, limit_exponent(c)).is_ok());
    }

    #[test]
    fn threshold_is_clamped_at_limit() {
        let two = Fixed::from_int(2);
        let limit = limit_exponent(two);
        assert_eq!(threshold(two, 0, limit).unwrap(), Fixed::ONE);
        assert_eq!(threshold(two, 3, limit).unwrap(), Fixed::from_int(8));
        assert_eq!(
            threshold(two, 10_000, limit).unwrap(),
            threshold(two, limit as u64, limit).unwrap()
        );
    }

    #[test]
    fn score_clamps_negative_net_to_zero() {
        assert_eq!(score(10, 50, 100).unwrap(), Fixed::ZERO);
        assert_eq!(score(150, 50, 100).unwrap(), Fixed::ONE);
    }

    #[test]
    fn equality_does_not_cross() {
        let unit = 100;
        let bar = Fixed::ONE;
        assert!(!crosses(score(100, 0, unit).unwrap(), bar));
        assert!(crosses(score(101, 0, unit).unwrap(), bar));
    }

    #[test]
    fn boost_change_on_fresh_proposal() {
        // Threshold 1.0 with a bounty of 100: 100 ties, 101 crosses.
        assert_eq!(boost_change(0, 0, 100, Fixed::ONE).unwrap(), 101);
    }

    #[test]
    fn boost_change_accounts_for_existing_stakes() {
        let two = Fixed::from_int(2);
        // need net > 2 * 100, i.e. 201; have 50 yes / 30 no → 181 more
        assert_eq!(boost_change(50, 30, 100, two).unwrap(), 181);
        assert_eq!(boost_change(1_000, 0, 100, two).unwrap(), 0);
    }

    #[test]
    fn boost_change_is_exact_boundary() {
        let c = threshold_const(1500).unwrap();
        let t = threshold(c, 3, limit_exponent(c)).unwrap();
        let unit = 777;
        let add = boost_change(10, 40, unit, t).unwrap();
        assert!(crosses(score(10 + add, 40, unit).unwrap(), t));
        assert!(!crosses(score(10 + add - 1, 40, unit).unwrap(), t));
    }
}
