//! The voting engine: owns every proposal and scheme record and serializes
//! all operations on them.
//!
//! Each public operation runs to completion on `&mut self`. Operations that
//! touch a proposal go through [`Engine::guarded`], which marks the proposal
//! in flight for the duration and rolls the proposal, its scheme record and
//! every journaled side effect back if the operation fails part-way.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use hive_crypto::hash_proposal_id;
use hive_math::{boost_change, score, threshold, Fixed};
use hive_types::{
    Address, Clock, FungibleToken, ParamsHash, ProposalId, ReputationLedger, SchemeId,
    Timestamp, VoteOption, WeightProvider,
};

use crate::config::EngineConfig;
use crate::error::GovernanceError;
use crate::events::GovernanceEvent;
use crate::hooks::OutcomeHook;
use crate::params::{Parameters, RegisteredParams};
use crate::proposal::{
    CallbackOutcome, ExecutionState, Proposal, ProposalState, SignalRecord, StakeRecord,
    VoteRecord,
};
use crate::scheme::SchemeRecord;
use crate::state::LedgerState;

/// External systems the engine consumes.
#[derive(Clone)]
pub struct Collaborators {
    pub clock: Arc<dyn Clock>,
    pub weights: Arc<dyn WeightProvider>,
    pub reputation: Arc<dyn ReputationLedger>,
    /// Token staked on proposals and paid out as bounty.
    pub stake_token: Arc<dyn FungibleToken>,
    /// Currency schemes prepay gas refunds in.
    pub native_token: Arc<dyn FungibleToken>,
}

/// Who is calling, and at what execution-cost rate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxContext {
    pub sender: Address,
    pub gas_price: u128,
}

impl TxContext {
    pub fn new(sender: Address) -> Self {
        Self {
            sender,
            gas_price: 0,
        }
    }

    pub fn with_gas_price(mut self, gas_price: u128) -> Self {
        self.gas_price = gas_price;
        self
    }
}

pub struct Engine {
    pub(crate) config: EngineConfig,
    pub(crate) domain_separator: [u8; 32],
    pub(crate) collab: Collaborators,
    pub(crate) state: LedgerState,
    pub(crate) hooks: HashMap<SchemeId, Box<dyn OutcomeHook>>,
    /// Proposals with an operation in progress.
    pub(crate) in_flight: HashSet<ProposalId>,
    /// Schemes whose hook is currently running.
    pub(crate) busy_schemes: HashSet<SchemeId>,
    pub(crate) undo: Vec<Undo>,
    events: Vec<GovernanceEvent>,
}

/// Copy of what an operation may mutate before a fallible collaborator call.
struct Checkpoint {
    proposal: Option<Proposal>,
    scheme: Option<SchemeRecord>,
    events: usize,
    undo: usize,
}

/// A change made outside the proposal and scheme records, journaled so a
/// failed operation can take it back.
pub(crate) enum Undo {
    Vote {
        key: (ProposalId, Address),
        previous: Option<VoteRecord>,
    },
    Stake {
        key: (ProposalId, Address),
        previous: Option<StakeRecord>,
    },
    Burned { from: Address, amount: u128 },
    Locked { owner: Address, amount: u128 },
}

impl Engine {
    pub fn new(config: EngineConfig, collab: Collaborators) -> Result<Self, GovernanceError> {
        let domain_separator = config.signing_domain().separator();
        let default_parameters = config.default_parameters.clone();
        let mut engine = Self {
            config,
            domain_separator,
            collab,
            state: LedgerState::default(),
            hooks: HashMap::new(),
            in_flight: HashSet::new(),
            busy_schemes: HashSet::new(),
            undo: Vec::new(),
            events: Vec::new(),
        };
        if let Some(params) = default_parameters {
            engine.set_parameters(params)?;
        }
        Ok(engine)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Separator bound into every signed-action digest of this instance.
    pub fn domain_separator(&self) -> [u8; 32] {
        self.domain_separator
    }

    /// Drain the events recorded since the last call.
    pub fn take_events(&mut self) -> Vec<GovernanceEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn emit(&mut self, event: GovernanceEvent) {
        self.events.push(event);
    }

    pub(crate) fn now(&self) -> Timestamp {
        self.collab.clock.now()
    }

    // ── parameters ──────────────────────────────────────────────────────

    /// Validate and register a parameter set. Registering an identical set
    /// again is a no-op returning the same hash.
    pub fn set_parameters(&mut self, params: Parameters) -> Result<ParamsHash, GovernanceError> {
        let hash = params.hash();
        if self.state.parameters.contains_key(&hash) {
            return Ok(hash);
        }
        let registered = RegisteredParams::new(params)?;
        tracing::info!(%hash, limit_exponent = registered.limit_exponent, "parameters registered");
        self.state.parameters.insert(hash, registered);
        self.emit(GovernanceEvent::ParametersRegistered { params_hash: hash });
        Ok(hash)
    }

    /// Register from the canonical 11-value array.
    pub fn set_parameters_array(&mut self, values: &[u128]) -> Result<ParamsHash, GovernanceError> {
        self.set_parameters(Parameters::from_array(values)?)
    }

    pub fn parameters(&self, hash: &ParamsHash) -> Option<&Parameters> {
        self.state.parameters.get(hash).map(|r| &r.params)
    }

    pub(crate) fn params_ref(&self, hash: &ParamsHash) -> Result<&RegisteredParams, GovernanceError> {
        self.state
            .parameters
            .get(hash)
            .ok_or(GovernanceError::UnknownParameters(*hash))
    }

    // ── lookups ─────────────────────────────────────────────────────────

    pub fn proposal(&self, id: &ProposalId) -> Option<&Proposal> {
        self.state.proposals.get(id)
    }

    pub fn scheme(&self, id: &SchemeId) -> Option<&SchemeRecord> {
        self.state.schemes.get(id)
    }

    pub fn vote_record(&self, id: &ProposalId, voter: &Address) -> Option<&VoteRecord> {
        self.state.votes.get(&(*id, voter.clone()))
    }

    pub fn stake_record(&self, id: &ProposalId, staker: &Address) -> Option<&StakeRecord> {
        self.state.stakes.get(&(*id, staker.clone()))
    }

    pub fn signaled_vote(&self, id: &ProposalId, voter: &Address) -> Option<&SignalRecord> {
        self.state.signals.get(&(*id, voter.clone()))
    }

    /// Next nonce a signed action from `signer` must carry.
    pub fn signer_nonce(&self, signer: &Address) -> u64 {
        self.state.nonces.get(signer).copied().unwrap_or(0)
    }

    pub(crate) fn proposal_ref(&self, id: &ProposalId) -> Result<&Proposal, GovernanceError> {
        self.state
            .proposals
            .get(id)
            .ok_or(GovernanceError::ProposalNotFound(*id))
    }

    pub(crate) fn proposal_mut(&mut self, id: &ProposalId) -> Result<&mut Proposal, GovernanceError> {
        self.state
            .proposals
            .get_mut(id)
            .ok_or(GovernanceError::ProposalNotFound(*id))
    }

    pub(crate) fn scheme_ref(&self, id: &SchemeId) -> Result<&SchemeRecord, GovernanceError> {
        self.state
            .schemes
            .get(id)
            .ok_or(GovernanceError::SchemeNotFound(*id))
    }

    pub(crate) fn scheme_mut(&mut self, id: &SchemeId) -> Result<&mut SchemeRecord, GovernanceError> {
        self.state
            .schemes
            .get_mut(id)
            .ok_or(GovernanceError::SchemeNotFound(*id))
    }

    /// Proposals of a scheme that have not resolved, in creation order,
    /// skipping `offset` and returning at most `limit`.
    pub fn active_proposals(&self, scheme: &SchemeId, offset: usize, limit: usize) -> Vec<ProposalId> {
        self.scheme_proposals_where(scheme, offset, limit, |p| !p.state.is_terminal())
    }

    /// Resolved proposals of a scheme, paginated like [`Engine::active_proposals`].
    pub fn inactive_proposals(&self, scheme: &SchemeId, offset: usize, limit: usize) -> Vec<ProposalId> {
        self.scheme_proposals_where(scheme, offset, limit, |p| p.state.is_terminal())
    }

    fn scheme_proposals_where(
        &self,
        scheme: &SchemeId,
        offset: usize,
        limit: usize,
        keep: impl Fn(&Proposal) -> bool,
    ) -> Vec<ProposalId> {
        self.state
            .scheme_proposals
            .get(scheme)
            .into_iter()
            .flatten()
            .filter(|id| self.state.proposals.get(*id).is_some_and(&keep))
            .skip(offset)
            .take(limit)
            .copied()
            .collect()
    }

    // ── threshold views ─────────────────────────────────────────────────

    /// Current boosting bar for a scheme under a parameter set.
    pub fn threshold(&self, params: &ParamsHash, scheme: &SchemeId) -> Result<Fixed, GovernanceError> {
        let registered = self.params_ref(params)?;
        self.threshold_for(registered, scheme)
    }

    pub(crate) fn threshold_for(
        &self,
        registered: &RegisteredParams,
        scheme: &SchemeId,
    ) -> Result<Fixed, GovernanceError> {
        let boosted = self.scheme_ref(scheme)?.boosted_count;
        Ok(threshold(
            registered.threshold_base,
            boosted,
            registered.limit_exponent,
        )?)
    }

    /// Net Yes-stake of a proposal in units of its bounty.
    pub fn score(&self, id: &ProposalId) -> Result<Fixed, GovernanceError> {
        Self::score_of(self.proposal_ref(id)?)
    }

    pub(crate) fn score_of(proposal: &Proposal) -> Result<Fixed, GovernanceError> {
        Ok(score(
            proposal.yes_stakes,
            proposal.no_stakes,
            proposal.dao_bounty,
        )?)
    }

    /// Minimum extra Yes-stake that lifts the score strictly above the
    /// scheme's current threshold. Zero when it already is.
    pub fn calculate_boost_change(&self, id: &ProposalId) -> Result<u128, GovernanceError> {
        let proposal = self.proposal_ref(id)?;
        let registered = self.params_ref(&proposal.params_hash)?;
        let bar = self.threshold_for(registered, &proposal.scheme_id)?;
        Ok(boost_change(
            proposal.yes_stakes,
            proposal.no_stakes,
            proposal.dao_bounty,
            bar,
        )?)
    }

    // ── proposing ───────────────────────────────────────────────────────

    /// Open a proposal on behalf of the calling scheme.
    ///
    /// Pins a reputation snapshot, sizes the DAO bounty from the scheme's
    /// average boosted down-stake and enters Queued.
    pub fn propose(
        &mut self,
        ctx: &TxContext,
        owner: &Address,
        params_hash: &ParamsHash,
        proposer: &Address,
    ) -> Result<ProposalId, GovernanceError> {
        let now = self.now();
        let params = self.params_ref(params_hash)?.params.clone();
        if now <= params.activation_time {
            return Err(GovernanceError::NotActive {
                params: *params_hash,
                activation_time: params.activation_time,
                now,
            });
        }
        let scheme_id = self.ensure_scheme(&ctx.sender, owner);
        let average = self.scheme_ref(&scheme_id)?.average_boosted_downstake;
        let dao_bounty = average
            .checked_mul(params.dao_bounty_const)
            .map(|v| v / 100)
            .ok_or(GovernanceError::Overflow("dao bounty"))?
            .max(params.minimum_dao_bounty);

        let nonce = self.state.proposal_nonce;
        self.state.proposal_nonce += 1;
        let id = hash_proposal_id(&scheme_id, proposer, nonce);
        let snapshot = self.collab.weights.snapshot();

        let proposal = Proposal {
            id,
            scheme_id,
            params_hash: *params_hash,
            proposer: proposer.clone(),
            submitted_at: now,
            state: ProposalState::Queued,
            execution_state: ExecutionState::None,
            callback: CallbackOutcome::NotInvoked,
            winning_vote: VoteOption::No,
            yes_votes: 0,
            no_votes: 0,
            abstain_votes: 0,
            pre_boosted_yes: 0,
            pre_boosted_no: 0,
            pre_boosted_deposit_yes: 0,
            pre_boosted_deposit_no: 0,
            yes_stakes: 0,
            no_stakes: 0,
            confidence_threshold: Fixed::ZERO,
            pre_boosted_at: None,
            boosted_at: None,
            current_boosted_period_limit: params.boosted_vote_period_limit,
            quiet_ending_extended: false,
            snapshot,
            dao_bounty,
            dao_bounty_remain: dao_bounty,
            stake_pool_remaining: 0,
            proposer_rewarded: false,
        };
        self.state.proposals.insert(id, proposal);
        self.state.scheme_proposals.entry(scheme_id).or_default().push(id);

        tracing::info!(%id, %scheme_id, %proposer, dao_bounty, "proposal created");
        self.emit(GovernanceEvent::NewProposal {
            proposal_id: id,
            scheme_id,
            proposer: proposer.clone(),
            params_hash: *params_hash,
            dao_bounty,
        });
        self.emit(GovernanceEvent::StateChange {
            proposal_id: id,
            from: ProposalState::None,
            to: ProposalState::Queued,
        });
        Ok(id)
    }

    /// Apply whatever transition elapsed time and current totals justify.
    ///
    /// Callable by anyone. Returns whether this call resolved the proposal;
    /// already resolved proposals are left untouched.
    pub fn execute(&mut self, id: &ProposalId) -> Result<bool, GovernanceError> {
        let id = *id;
        self.guarded(id, |engine| engine.advance(id))
    }

    // ── guard ───────────────────────────────────────────────────────────

    /// Mark `id` in flight for the duration of `op`, rejecting nested calls
    /// on the same proposal or on a scheme whose hook is running. The marker
    /// is released on every exit path.
    pub(crate) fn with_guard<T>(
        &mut self,
        id: ProposalId,
        op: impl FnOnce(&mut Self) -> Result<T, GovernanceError>,
    ) -> Result<T, GovernanceError> {
        let scheme_id = self.proposal_ref(&id)?.scheme_id;
        if self.in_flight.contains(&id) {
            return Err(GovernanceError::Reentrancy(id));
        }
        if self.busy_schemes.contains(&scheme_id) {
            return Err(GovernanceError::SchemeBusy(scheme_id));
        }
        self.in_flight.insert(id);
        let result = op(self);
        self.in_flight.remove(&id);
        result
    }

    /// [`Engine::with_guard`] plus rollback when `op` fails: the proposal,
    /// its scheme record, the event log, and whatever `op` journaled in
    /// [`Undo`] entries.
    pub(crate) fn guarded<T>(
        &mut self,
        id: ProposalId,
        op: impl FnOnce(&mut Self) -> Result<T, GovernanceError>,
    ) -> Result<T, GovernanceError> {
        let checkpoint = self.checkpoint(&id);
        let mark = checkpoint.undo;
        let result = self.with_guard(id, op);
        if result.is_err() {
            self.restore(checkpoint);
        } else {
            self.undo.truncate(mark);
        }
        result
    }

    fn checkpoint(&self, id: &ProposalId) -> Checkpoint {
        let proposal = self.state.proposals.get(id).cloned();
        let scheme = proposal
            .as_ref()
            .and_then(|p| self.state.schemes.get(&p.scheme_id))
            .cloned();
        Checkpoint {
            proposal,
            scheme,
            events: self.events.len(),
            undo: self.undo.len(),
        }
    }

    fn restore(&mut self, checkpoint: Checkpoint) {
        while self.undo.len() > checkpoint.undo {
            let Some(entry) = self.undo.pop() else {
                break;
            };
            self.revert(entry);
        }
        if let Some(proposal) = checkpoint.proposal {
            self.state.proposals.insert(proposal.id, proposal);
        }
        if let Some(scheme) = checkpoint.scheme {
            self.state.schemes.insert(scheme.id, scheme);
        }
        self.events.truncate(checkpoint.events);
    }

    fn revert(&mut self, entry: Undo) {
        match entry {
            Undo::Vote { key, previous } => match previous {
                Some(record) => {
                    self.state.votes.insert(key, record);
                }
                None => {
                    self.state.votes.remove(&key);
                }
            },
            Undo::Stake { key, previous } => match previous {
                Some(record) => {
                    self.state.stakes.insert(key, record);
                }
                None => {
                    self.state.stakes.remove(&key);
                }
            },
            Undo::Burned { from, amount } => {
                if let Err(e) = self.collab.reputation.mint(&from, amount) {
                    tracing::warn!(account = %from, amount, error = %e, "deposit not restored");
                }
            }
            Undo::Locked { owner, amount } => {
                if let Err(e) = self.collab.stake_token.release(&owner, amount) {
                    tracing::warn!(%owner, amount, error = %e, "stake not released");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::test_params;
    use crate::testing::Harness;
    use crate::ErrorKind;

    #[test]
    fn registering_the_same_parameters_is_idempotent() {
        let mut h = Harness::new();
        h.engine.take_events();
        assert_eq!(h.engine.set_parameters(test_params()).unwrap(), h.params_hash);
        assert!(h.engine.take_events().is_empty());
        let from_array = h
            .engine
            .set_parameters_array(&test_params().to_array())
            .unwrap();
        assert_eq!(from_array, h.params_hash);
    }

    #[test]
    fn propose_requires_known_and_active_parameters() {
        let mut h = Harness::new();
        let unknown = ParamsHash::new([9; 32]);
        let err = h
            .engine
            .propose(&h.ctx("scheme"), &h.addr("owner"), &unknown, &h.addr("alice"))
            .unwrap_err();
        assert!(matches!(err, GovernanceError::UnknownParameters(_)));

        let mut later = test_params();
        later.activation_time = Timestamp::new(2_000);
        let hash = h.engine.set_parameters(later).unwrap();
        let err = h
            .engine
            .propose(&h.ctx("scheme"), &h.addr("owner"), &hash, &h.addr("alice"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::State);

        h.clock.set(2_001);
        assert!(h
            .engine
            .propose(&h.ctx("scheme"), &h.addr("owner"), &hash, &h.addr("alice"))
            .is_ok());
    }

    #[test]
    fn new_proposal_is_queued_with_minimum_bounty() {
        let mut h = Harness::new();
        let id = h.propose();
        let p = h.engine.proposal(&id).unwrap();
        assert_eq!(p.state, ProposalState::Queued);
        assert_eq!(p.dao_bounty, 100);
        assert_eq!(p.proposer, h.addr("alice"));
        assert_eq!(p.scheme_id, h.scheme_id());
        assert_ne!(h.propose(), id);
    }

    #[test]
    fn proposal_lists_split_by_resolution_and_paginate() {
        let mut h = Harness::new();
        let ids: Vec<_> = (0..4).map(|_| h.propose()).collect();
        h.engine
            .vote(&h.ctx("alice"), &ids[1], VoteOption::Yes, 0)
            .unwrap();
        let scheme = h.scheme_id();

        assert_eq!(
            h.engine.active_proposals(&scheme, 0, 10),
            vec![ids[0], ids[2], ids[3]]
        );
        assert_eq!(h.engine.active_proposals(&scheme, 1, 1), vec![ids[2]]);
        assert_eq!(h.engine.inactive_proposals(&scheme, 0, 10), vec![ids[1]]);
        assert!(h.engine.inactive_proposals(&scheme, 1, 10).is_empty());
        assert!(h
            .engine
            .active_proposals(&SchemeId::new([3; 32]), 0, 10)
            .is_empty());
    }

    #[test]
    fn threshold_view_starts_at_one() {
        let mut h = Harness::new();
        let id = h.propose();
        let threshold = h.engine.threshold(&h.params_hash, &h.scheme_id()).unwrap();
        assert_eq!(threshold, Fixed::ONE);
        assert_eq!(h.engine.score(&id).unwrap(), Fixed::ZERO);
        assert_eq!(h.engine.calculate_boost_change(&id).unwrap(), 101);
    }

    #[test]
    fn failed_operation_takes_back_vote_and_burn() {
        let mut h = Harness::new();
        let id = h.propose();
        let carol = h.addr("carol");
        h.engine.vote(&h.ctx("carol"), &id, VoteOption::No, 1_000).unwrap();
        h.engine.take_events();

        let err = h
            .engine
            .guarded(id, |engine| {
                engine.internal_vote(id, &carol, VoteOption::No, 500)?;
                Err::<(), _>(GovernanceError::Overflow("injected"))
            })
            .unwrap_err();
        assert!(matches!(err, GovernanceError::Overflow("injected")));

        let record = h.engine.vote_record(&id, &carol).unwrap();
        assert_eq!(record.weight, 1_000);
        assert_eq!(record.deposit, 100);
        let p = h.engine.proposal(&id).unwrap();
        assert_eq!(p.no_votes, 1_000);
        assert_eq!(p.pre_boosted_deposit_no, 100);
        assert_eq!(h.reputation.balance_of(&carol), 9_900);
        assert_eq!(h.reputation.total_supply(), 99_900);
        assert!(h.engine.take_events().is_empty());
        assert!(h.engine.undo.is_empty());
    }

    #[test]
    fn failed_operation_releases_locked_stake() {
        let mut h = Harness::new();
        let id = h.propose();
        let dave = h.addr("dave");
        h.engine
            .guarded(id, |engine| {
                engine.internal_stake(id, &dave, VoteOption::No, 40)?;
                Err::<(), _>(GovernanceError::Overflow("injected"))
            })
            .unwrap_err();

        assert!(h.engine.stake_record(&id, &dave).is_none());
        assert_eq!(h.stake_token.balance_of(&dave), 1_000);
        assert_eq!(h.engine.proposal(&id).unwrap().no_stakes, 0);
        assert_eq!(h.engine.scheme(&h.scheme_id()).unwrap().escrow, 0);
    }

    #[test]
    fn successful_operation_clears_the_journal() {
        let mut h = Harness::new();
        let id = h.propose();
        h.engine.stake(&h.ctx("dave"), &id, VoteOption::No, 40).unwrap();
        h.engine.vote(&h.ctx("carol"), &id, VoteOption::No, 1_000).unwrap();
        assert!(h.engine.undo.is_empty());
        assert_eq!(h.engine.stake_record(&id, &h.addr("dave")).unwrap().amount, 40);
    }

    #[test]
    fn unknown_proposal_is_a_state_error() {
        let mut h = Harness::new();
        let err = h.engine.execute(&ProposalId::new([5; 32])).unwrap_err();
        assert!(matches!(err, GovernanceError::ProposalNotFound(_)));
        assert_eq!(err.kind(), ErrorKind::State);
    }
}
