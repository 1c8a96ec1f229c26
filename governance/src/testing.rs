//! Shared fixture for unit tests.

use std::sync::Arc;

use hive_crypto::hash_scheme_id;
use hive_nullables::{NullClock, NullReputation, NullToken};
use hive_types::{Address, ParamsHash, ProposalId, SchemeId, VoteOption};

use crate::engine::{Collaborators, Engine, TxContext};
use crate::params::test_params;
use crate::{EngineConfig, ProposalState};

pub(crate) struct Harness {
    pub engine: Engine,
    pub clock: Arc<NullClock>,
    pub reputation: Arc<NullReputation>,
    pub stake_token: Arc<NullToken>,
    pub native_token: Arc<NullToken>,
    pub params_hash: ParamsHash,
}

pub(crate) fn addr(name: &str) -> Address {
    Address::new(format!("hive_{}", name))
}

impl Harness {
    /// Reputation: alice 70k, bob 20k, carol 10k.
    /// Stake tokens: dave 1k, erin 10k. Native currency: scheme 1k.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let clock = Arc::new(NullClock::new(1_000));
        let reputation = Arc::new(NullReputation::with_balances(&[
            (addr("alice"), 70_000),
            (addr("bob"), 20_000),
            (addr("carol"), 10_000),
        ]));
        let stake_token = Arc::new(NullToken::with_balances(&[
            (addr("dave"), 1_000),
            (addr("erin"), 10_000),
        ]));
        let native_token = Arc::new(NullToken::with_balances(&[(addr("scheme"), 1_000)]));
        let collab = Collaborators {
            clock: clock.clone(),
            weights: reputation.clone(),
            reputation: reputation.clone(),
            stake_token: stake_token.clone(),
            native_token: native_token.clone(),
        };
        let mut engine = Engine::new(config, collab).unwrap();
        let params_hash = engine.set_parameters(test_params()).unwrap();
        Self {
            engine,
            clock,
            reputation,
            stake_token,
            native_token,
            params_hash,
        }
    }

    pub fn addr(&self, name: &str) -> Address {
        addr(name)
    }

    pub fn ctx(&self, name: &str) -> TxContext {
        TxContext::new(addr(name))
    }

    pub fn scheme_id(&self) -> SchemeId {
        hash_scheme_id(&addr("scheme"), &addr("owner"))
    }

    pub fn propose(&mut self) -> ProposalId {
        let params_hash = self.params_hash;
        self.engine
            .propose(&self.ctx("scheme"), &addr("owner"), &params_hash, &addr("alice"))
            .unwrap()
    }

    /// Stake exactly the boost change from erin and wait out the pre-boost period.
    pub fn boost(&mut self, id: &ProposalId) {
        let change = self.engine.calculate_boost_change(id).unwrap();
        self.engine
            .stake(&self.ctx("erin"), id, VoteOption::Yes, change)
            .unwrap();
        assert_eq!(self.engine.proposal(id).unwrap().state, ProposalState::PreBoosted);
        self.clock.advance(10);
        self.engine.execute(id).unwrap();
        assert_eq!(self.engine.proposal(id).unwrap().state, ProposalState::Boosted);
    }
}
