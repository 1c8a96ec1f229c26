//! Errors for the shared types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HiveError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid vote option: {0}")]
    InvalidVoteOption(u8),

    #[error("invalid action type: {0}")]
    InvalidActionType(u8),
}
