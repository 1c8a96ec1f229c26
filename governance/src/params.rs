//! Voting parameter sets.
//!
//! A parameter set is registered once and referenced by the Blake2b hash of
//! its canonical 11-value array, so many proposals (and schemes) can share
//! one configuration. Registered sets are immutable.

use crate::error::GovernanceError;
use hive_crypto::hash_params;
use hive_math::{limit_exponent, threshold_const, Fixed};
use hive_types::{ParamsHash, Timestamp};
use serde::{Deserialize, Serialize};

/// Number of values in the canonical parameter array.
pub const PARAMS_LEN: usize = 11;

/// The tunable knobs of one voting configuration.
///
/// Periods are in seconds. `threshold_const` is in thousandths (2000 = 2.0).
/// Percentages are whole percent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameters {
    /// Share of total snapshot reputation the leading side needs for
    /// absolute-majority execution.
    pub queued_vote_required_percentage: u128,
    pub queued_vote_period_limit: u64,
    pub boosted_vote_period_limit: u64,
    pub pre_boosted_vote_period_limit: u64,
    pub threshold_const: u128,
    pub quiet_ending_period: u64,
    /// Reputation minted to the proposer when the proposal passes.
    pub proposing_rep_reward: u128,
    /// Percentage of a pre-boosted vote deposited (burned) at vote time.
    pub voters_reputation_loss_ratio: u128,
    pub minimum_dao_bounty: u128,
    /// Percentage of the scheme's average boosted down-stake used as bounty.
    pub dao_bounty_const: u128,
    pub activation_time: Timestamp,
}

impl Parameters {
    /// Canonical array order, also the hashing order.
    pub fn to_array(&self) -> [u128; PARAMS_LEN] {
        [
            self.queued_vote_required_percentage,
            self.queued_vote_period_limit as u128,
            self.boosted_vote_period_limit as u128,
            self.pre_boosted_vote_period_limit as u128,
            self.threshold_const,
            self.quiet_ending_period as u128,
            self.proposing_rep_reward,
            self.voters_reputation_loss_ratio,
            self.minimum_dao_bounty,
            self.dao_bounty_const,
            self.activation_time.as_secs() as u128,
        ]
    }

    /// Build from the canonical array. Rejects a wrong length or a period
    /// that does not fit in seconds.
    pub fn from_array(values: &[u128]) -> Result<Self, GovernanceError> {
        if values.len() != PARAMS_LEN {
            return Err(GovernanceError::InvalidParameters(format!(
                "expected {} values, got {}",
                PARAMS_LEN,
                values.len()
            )));
        }
        let secs = |index: usize, name: &str| {
            u64::try_from(values[index]).map_err(|_| {
                GovernanceError::InvalidParameters(format!("{} does not fit in seconds", name))
            })
        };
        Ok(Self {
            queued_vote_required_percentage: values[0],
            queued_vote_period_limit: secs(1, "queued_vote_period_limit")?,
            boosted_vote_period_limit: secs(2, "boosted_vote_period_limit")?,
            pre_boosted_vote_period_limit: secs(3, "pre_boosted_vote_period_limit")?,
            threshold_const: values[4],
            quiet_ending_period: secs(5, "quiet_ending_period")?,
            proposing_rep_reward: values[6],
            voters_reputation_loss_ratio: values[7],
            minimum_dao_bounty: values[8],
            dao_bounty_const: values[9],
            activation_time: Timestamp::new(secs(10, "activation_time")?),
        })
    }

    pub fn hash(&self) -> ParamsHash {
        hash_params(&self.to_array())
    }

    pub fn validate(&self) -> Result<(), GovernanceError> {
        let invalid = |msg: &str| Err(GovernanceError::InvalidParameters(msg.to_string()));
        if !(50..=100).contains(&self.queued_vote_required_percentage) {
            return invalid("queued_vote_required_percentage must be within 50..=100");
        }
        if self.threshold_const <= 1000 || self.threshold_const > 16_000 {
            return invalid("threshold_const must be within 1001..=16000");
        }
        if self.voters_reputation_loss_ratio > 100 {
            return invalid("voters_reputation_loss_ratio must be at most 100");
        }
        if self.boosted_vote_period_limit < self.quiet_ending_period {
            return invalid("boosted_vote_period_limit must cover quiet_ending_period");
        }
        if self.minimum_dao_bounty == 0 {
            return invalid("minimum_dao_bounty must be greater than zero");
        }
        if self.dao_bounty_const == 0 {
            return invalid("dao_bounty_const must be greater than zero");
        }
        Ok(())
    }
}

/// A validated parameter set together with its derived threshold data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredParams {
    pub params: Parameters,
    pub threshold_base: Fixed,
    /// Largest boosted count whose threshold power still fits.
    pub limit_exponent: u32,
}

impl RegisteredParams {
    pub fn new(params: Parameters) -> Result<Self, GovernanceError> {
        params.validate()?;
        let threshold_base = threshold_const(params.threshold_const)?;
        Ok(Self {
            limit_exponent: limit_exponent(threshold_base),
            threshold_base,
            params,
        })
    }
}

/// `floor(amount × pct / 100)` for `pct <= 100`, without intermediate overflow.
pub(crate) fn percent_of(amount: u128, pct: u128) -> u128 {
    (amount / 100) * pct + (amount % 100) * pct / 100
}

#[cfg(test)]
pub(crate) fn test_params() -> Parameters {
    Parameters {
        queued_vote_required_percentage: 50,
        queued_vote_period_limit: 60,
        boosted_vote_period_limit: 60,
        pre_boosted_vote_period_limit: 10,
        threshold_const: 2000,
        quiet_ending_period: 10,
        proposing_rep_reward: 60,
        voters_reputation_loss_ratio: 10,
        minimum_dao_bounty: 100,
        dao_bounty_const: 75,
        activation_time: Timestamp::EPOCH,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_roundtrip_preserves_hash() {
        let params = test_params();
        let back = Parameters::from_array(&params.to_array()).unwrap();
        assert_eq!(back, params);
        assert_eq!(back.hash(), params.hash());
    }

    #[test]
    fn wrong_shape_is_rejected() {
        assert!(Parameters::from_array(&[0u128; 10]).is_err());
        let mut values = test_params().to_array();
        values[1] = u128::from(u64::MAX) + 1;
        assert!(Parameters::from_array(&values).is_err());
    }

    #[test]
    fn validation_bounds() {
        let mut p = test_params();
        p.queued_vote_required_percentage = 49;
        assert!(p.validate().is_err());

        let mut p = test_params();
        p.threshold_const = 1000;
        assert!(p.validate().is_err());

        let mut p = test_params();
        p.quiet_ending_period = p.boosted_vote_period_limit + 1;
        assert!(p.validate().is_err());

        let mut p = test_params();
        p.minimum_dao_bounty = 0;
        assert!(p.validate().is_err());

        assert!(test_params().validate().is_ok());
    }

    #[test]
    fn registration_derives_limit() {
        let registered = RegisteredParams::new(test_params()).unwrap();
        assert_eq!(registered.threshold_base, Fixed::from_int(2));
        assert_eq!(registered.limit_exponent, 63);
    }

    #[test]
    fn percent_of_is_exact_floor() {
        assert_eq!(percent_of(100_000, 50), 50_000);
        assert_eq!(percent_of(199, 10), 19);
        assert_eq!(percent_of(u128::MAX, 100), u128::MAX);
    }
}
