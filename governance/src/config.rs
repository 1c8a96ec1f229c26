//! Engine configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::Path;

use hive_crypto::SigningDomain;
use hive_math::MAX_THRESHOLD_EXPONENT;
use hive_utils::{init_logging, LogFormat, LoggingError};

use crate::params::Parameters;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Configuration for one engine instance.
///
/// Can be loaded from a TOML file via [`EngineConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Application name bound into every signing digest.
    #[serde(default = "default_domain_name")]
    pub domain_name: String,

    #[serde(default = "default_domain_version")]
    pub domain_version: String,

    #[serde(default = "default_chain_id")]
    pub chain_id: u64,

    /// Distinguishes engine instances on the same chain.
    #[serde(default = "default_instance")]
    pub instance: String,

    /// Per-scheme cap on simultaneously boosted proposals.
    #[serde(default = "default_max_boosted")]
    pub max_boosted_proposals: u64,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Parameter set registered when the engine starts.
    #[serde(default)]
    pub default_parameters: Option<Parameters>,
}

fn default_domain_name() -> String {
    "hive-voting".to_string()
}

fn default_domain_version() -> String {
    "1".to_string()
}

fn default_chain_id() -> u64 {
    1
}

fn default_instance() -> String {
    "main".to_string()
}

fn default_max_boosted() -> u64 {
    MAX_THRESHOLD_EXPONENT as u64
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            domain_name: default_domain_name(),
            domain_version: default_domain_version(),
            chain_id: default_chain_id(),
            instance: default_instance(),
            max_boosted_proposals: default_max_boosted(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            default_parameters: None,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn signing_domain(&self) -> SigningDomain {
        SigningDomain::new(
            self.domain_name.clone(),
            self.domain_version.clone(),
            self.chain_id,
            self.instance.clone(),
        )
    }

    /// Install the global tracing subscriber with this config's format and level.
    pub fn init_logging(&self) -> Result<(), LoggingError> {
        init_logging(self.log_format, &self.log_level)
    }

    /// Boosted-count cap, never above the fixed-point exponent limit.
    pub fn boosted_cap(&self) -> u64 {
        self.max_boosted_proposals.min(MAX_THRESHOLD_EXPONENT as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_toml_uses_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config.domain_name, "hive-voting");
        assert_eq!(config.chain_id, 1);
        assert_eq!(config.max_boosted_proposals, 4096);
        assert_eq!(config.log_format, LogFormat::Human);
        assert!(config.default_parameters.is_none());
    }

    #[test]
    fn loads_from_file_with_parameters() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
chain_id = 7
instance = "side"
max_boosted_proposals = 10000
log_format = "json"

[default_parameters]
queued_vote_required_percentage = 50
queued_vote_period_limit = 60
boosted_vote_period_limit = 60
pre_boosted_vote_period_limit = 10
threshold_const = 2000
quiet_ending_period = 10
proposing_rep_reward = 60
voters_reputation_loss_ratio = 10
minimum_dao_bounty = 100
dao_bounty_const = 75
activation_time = 0
"#
        )
        .unwrap();

        let config = EngineConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.chain_id, 7);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.boosted_cap(), 4096);
        let params = config.default_parameters.unwrap();
        assert_eq!(params.threshold_const, 2000);
        assert_eq!(params, crate::params::test_params());
    }

    #[test]
    fn domain_follows_config() {
        let mut config = EngineConfig::default();
        let before = config.signing_domain().separator();
        config.instance = "other".into();
        assert_ne!(before, config.signing_domain().separator());
    }

    #[test]
    fn second_logging_init_is_an_error_not_a_panic() {
        let config = EngineConfig::default();
        let _ = config.init_logging();
        assert!(config.init_logging().is_err());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = EngineConfig::from_toml_file(Path::new("/nonexistent/hive.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
