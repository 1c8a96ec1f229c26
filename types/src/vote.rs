//! Vote options and signed-action kinds.

use crate::error::HiveError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A voter's (or staker's) choice on a proposal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoteOption {
    /// Counted towards participation only. Not accepted for stakes.
    Abstain,
    Yes,
    No,
}

impl VoteOption {
    /// Wire encoding used inside signed digests.
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Abstain => 0,
            Self::Yes => 1,
            Self::No => 2,
        }
    }

    pub fn from_u8(raw: u8) -> Result<Self, HiveError> {
        match raw {
            0 => Ok(Self::Abstain),
            1 => Ok(Self::Yes),
            2 => Ok(Self::No),
            other => Err(HiveError::InvalidVoteOption(other)),
        }
    }

    /// The other binding side. `Abstain` has no opposite.
    pub fn opposite(self) -> Option<Self> {
        match self {
            Self::Yes => Some(Self::No),
            Self::No => Some(Self::Yes),
            Self::Abstain => None,
        }
    }

    pub fn is_binding(self) -> bool {
        !matches!(self, Self::Abstain)
    }
}

impl fmt::Display for VoteOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Abstain => "abstain",
            Self::Yes => "yes",
            Self::No => "no",
        };
        f.write_str(name)
    }
}

/// What a signed, relayable action does once applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionType {
    Vote,
    Stake,
}

impl ActionType {
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Vote => 1,
            Self::Stake => 2,
        }
    }

    pub fn from_u8(raw: u8) -> Result<Self, HiveError> {
        match raw {
            1 => Ok(Self::Vote),
            2 => Ok(Self::Stake),
            other => Err(HiveError::InvalidActionType(other)),
        }
    }
}
