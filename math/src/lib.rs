//! Fixed-point numerics for boosted consensus.
//!
//! The boosting bar of a scheme is `threshold_const ^ boosted_count`, an
//! exponential that must stay exact and must never wrap. Everything here is
//! integer arithmetic over an unsigned 64.64 representation with 256-bit
//! intermediates, independent of any voting state:
//!
//! - [`Fixed`]: checked multiply, ratio construction and exponentiation
//! - [`threshold`]: the capped exponential bar
//! - [`score`]: net yes-stake normalized against the proposal's bounty unit
//! - [`boost_change`]: the minimum extra yes-stake that crosses the bar
//! - [`mul_div_floor`]: overflow-free `a · b / d` for pro-rata payouts

pub mod error;
pub mod fixed;
pub mod threshold;
mod wide;

pub use error::MathError;
pub use fixed::Fixed;
pub use threshold::{
    boost_change, crosses, limit_exponent, score, threshold, threshold_const,
    MAX_THRESHOLD_EXPONENT,
};
pub use wide::{mul_div_ceil, mul_div_floor};
