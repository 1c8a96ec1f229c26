//! Scheme outcome hooks.
//!
//! A scheme registers one hook; the engine calls it once per terminal
//! transition of any of the scheme's proposals. The payload a scheme acts
//! on is opaque here: only success or failure is observed, and a failure is
//! recorded on the proposal without undoing the transition.

use crate::engine::Engine;
use crate::proposal::ExecutionState;
use hive_types::{ProposalId, SchemeId, VoteOption};
use thiserror::Error;

/// What the hook is told about a resolved proposal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub proposal_id: ProposalId,
    pub scheme_id: SchemeId,
    pub decision: VoteOption,
    pub execution_state: ExecutionState,
}

impl Resolution {
    pub fn passed(&self) -> bool {
        self.decision == VoteOption::Yes
    }
}

#[derive(Debug, Error)]
pub enum HookError {
    #[error("outcome hook failed: {0}")]
    Failed(String),

    /// A nested engine call made from the hook was rejected.
    #[error("nested engine call failed: {0}")]
    Engine(#[from] crate::GovernanceError),
}

/// Receives proposal decisions for one scheme.
///
/// The hook gets the engine back so it can act on the decision (e.g. open a
/// follow-up proposal or execute one from another scheme). Calls touching
/// this scheme's proposals are rejected with a re-entrancy error while the
/// hook runs.
pub trait OutcomeHook {
    fn on_resolved(&mut self, engine: &mut Engine, resolution: &Resolution)
        -> Result<(), HookError>;
}

/// Any closure with the right shape is a hook.
impl<F> OutcomeHook for F
where
    F: FnMut(&mut Engine, &Resolution) -> Result<(), HookError>,
{
    fn on_resolved(
        &mut self,
        engine: &mut Engine,
        resolution: &Resolution,
    ) -> Result<(), HookError> {
        self(engine, resolution)
    }
}
