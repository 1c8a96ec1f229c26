//! Proposal state machine.
//!
//! ```text
//! Queued ──score > bar──▶ PreBoosted ──period elapsed, still above──▶ Boosted
//!   ▲                         │                                        │
//!   └──score ≤ min(conf, bar)─┘                      leader flips late ▼
//!                                                              QuietEndingPeriod
//! any live state ──absolute majority──▶ Executed
//! Queued ──queue period elapsed──▶ Expired
//! Boosted / QuietEndingPeriod ──deadline──▶ Executed (Yes ahead) | Expired (No ahead)
//! ```

use hive_math::crosses;
use hive_types::{ProposalId, VoteOption};
use hive_utils::format_duration;

use crate::engine::Engine;
use crate::error::GovernanceError;
use crate::events::GovernanceEvent;
use crate::hooks::Resolution;
use crate::params::percent_of;
use crate::proposal::{CallbackOutcome, ExecutionState, ProposalState};

impl Engine {
    /// Run every transition justified now. Returns true when this call
    /// resolved the proposal.
    pub(crate) fn advance(&mut self, id: ProposalId) -> Result<bool, GovernanceError> {
        let now = self.now();
        let before = self.proposal_ref(&id)?.clone();
        if before.state.is_terminal() {
            return Ok(false);
        }
        let registered = self.params_ref(&before.params_hash)?.clone();
        let params = &registered.params;
        let total_weight = self.collab.weights.total_weight_at(before.snapshot);
        let execution_bar = percent_of(total_weight, params.queued_vote_required_percentage);

        let mut p = before.clone();
        let mut outcome = ExecutionState::None;
        let mut entered_boost = false;
        let mut confidence_lowered = false;

        if p.votes(p.winning_vote) > execution_bar {
            outcome = if p.state.is_boosted() {
                ExecutionState::QueueBarCrossed
            } else {
                ExecutionState::ExecutedInQueue
            };
        } else {
            if p.state == ProposalState::Queued {
                if p.submitted_at.has_expired(params.queued_vote_period_limit, now) {
                    outcome = ExecutionState::QueueTimeOut;
                    p.winning_vote = VoteOption::No;
                } else {
                    let bar = self.threshold_for(&registered, &p.scheme_id)?;
                    if crosses(Self::score_of(&p)?, bar) {
                        p.state = ProposalState::PreBoosted;
                        p.pre_boosted_at = Some(now);
                        p.confidence_threshold = bar;
                    }
                }
            }

            if p.state == ProposalState::PreBoosted {
                let bar = self.threshold_for(&registered, &p.scheme_id)?;
                let score = Self::score_of(&p)?;
                let since = p.pre_boosted_at.unwrap_or(p.submitted_at);
                if since.has_expired(params.pre_boosted_vote_period_limit, now) {
                    if crosses(score, bar) {
                        let boosted = self.scheme_ref(&p.scheme_id)?.boosted_count;
                        if boosted < self.config.boosted_cap() {
                            p.state = ProposalState::Boosted;
                            p.boosted_at = Some(now);
                            p.current_boosted_period_limit = params.boosted_vote_period_limit;
                            entered_boost = true;
                        }
                    } else {
                        p.state = ProposalState::Queued;
                    }
                } else if score <= p.confidence_threshold.min(bar) {
                    p.state = ProposalState::Queued;
                } else if p.confidence_threshold > score {
                    p.confidence_threshold = bar;
                    confidence_lowered = true;
                }
            }
        }

        if outcome == ExecutionState::None && p.state.is_boosted() {
            if let Some(deadline) = p.boosted_deadline() {
                if now >= deadline {
                    outcome = if p.winning_vote == VoteOption::Yes {
                        ExecutionState::ExecutedInBoost
                    } else {
                        ExecutionState::BoostedTimeOut
                    };
                }
            }
        }

        // Scheme bookkeeping first: it is the only fallible step left.
        if entered_boost {
            self.scheme_mut(&p.scheme_id)?.enter_boost(p.no_stakes)?;
            tracing::info!(
                %id,
                window = %format_duration(p.current_boosted_period_limit),
                "proposal boosted"
            );
        }
        let resolved = outcome != ExecutionState::None;
        if resolved {
            if p.state.is_boosted() {
                self.scheme_mut(&p.scheme_id)?.exit_boost(p.no_stakes);
            }
            p.execution_state = outcome;
            p.state = match outcome {
                ExecutionState::QueueTimeOut | ExecutionState::BoostedTimeOut => {
                    ProposalState::Expired
                }
                _ => ProposalState::Executed,
            };
        }

        let after = p.state;
        let decision = p.winning_vote;
        let scheme_id = p.scheme_id;
        let confidence = p.confidence_threshold;
        *self.proposal_mut(&id)? = p;

        if confidence_lowered {
            self.emit(GovernanceEvent::ConfidenceLevelChange {
                proposal_id: id,
                confidence_threshold: confidence,
            });
        }
        if before.state != after {
            tracing::debug!(%id, from = %before.state, to = %after, "state change");
            self.emit(GovernanceEvent::StateChange {
                proposal_id: id,
                from: before.state,
                to: after,
            });
        }
        if resolved {
            tracing::info!(%id, %decision, ?outcome, total_weight, "proposal resolved");
            self.emit(GovernanceEvent::ExecuteProposal {
                proposal_id: id,
                scheme_id,
                decision,
                execution_state: outcome,
                total_weight,
            });
            self.deliver_outcome(Resolution {
                proposal_id: id,
                scheme_id,
                decision,
                execution_state: outcome,
            });
        }
        Ok(resolved)
    }

    /// Hand the decision to the scheme's hook, if one is registered, and
    /// record how it went. Never fails: a hook error is an outcome.
    fn deliver_outcome(&mut self, resolution: Resolution) {
        let scheme_id = resolution.scheme_id;
        let Some(mut hook) = self.hooks.remove(&scheme_id) else {
            return;
        };
        self.busy_schemes.insert(scheme_id);
        let result = hook.on_resolved(self, &resolution);
        self.busy_schemes.remove(&scheme_id);
        self.hooks.insert(scheme_id, hook);

        let outcome = match result {
            Ok(()) => CallbackOutcome::Succeeded,
            Err(e) => {
                tracing::warn!(proposal = %resolution.proposal_id, error = %e, "outcome hook failed");
                CallbackOutcome::Failed(e.to_string())
            }
        };
        if let Some(proposal) = self.state.proposals.get_mut(&resolution.proposal_id) {
            proposal.callback = outcome.clone();
        }
        self.emit(GovernanceEvent::CallbackResult {
            proposal_id: resolution.proposal_id,
            outcome,
        });
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use hive_math::Fixed;
    use hive_types::VoteOption;

    use crate::hooks::{HookError, Resolution};
    use crate::testing::Harness;
    use crate::{CallbackOutcome, Engine, EngineConfig, ErrorKind, ExecutionState, ProposalState};

    #[test]
    fn score_equal_to_threshold_does_not_boost() {
        let mut h = Harness::new();
        let id = h.propose();
        let dave = h.ctx("dave");
        h.engine.stake(&dave, &id, VoteOption::Yes, 100).unwrap();
        assert_eq!(h.engine.score(&id).unwrap(), Fixed::ONE);
        assert_eq!(h.engine.proposal(&id).unwrap().state, ProposalState::Queued);
        assert_eq!(h.engine.calculate_boost_change(&id).unwrap(), 1);

        h.engine.stake(&dave, &id, VoteOption::Yes, 1).unwrap();
        assert_eq!(h.engine.proposal(&id).unwrap().state, ProposalState::PreBoosted);
        assert_eq!(h.engine.calculate_boost_change(&id).unwrap(), 0);
    }

    #[test]
    fn queue_period_elapses_to_expired() {
        let mut h = Harness::new();
        let id = h.propose();
        h.clock.advance(59);
        assert!(!h.engine.execute(&id).unwrap());
        h.clock.advance(1);
        assert!(h.engine.execute(&id).unwrap());
        let p = h.engine.proposal(&id).unwrap();
        assert_eq!(p.state, ProposalState::Expired);
        assert_eq!(p.execution_state, ExecutionState::QueueTimeOut);
        assert_eq!(p.winning_vote, VoteOption::No);

        // Terminal proposals are left alone.
        assert!(!h.engine.execute(&id).unwrap());
        assert!(h.engine.vote(&h.ctx("carol"), &id, VoteOption::Yes, 0).is_err());
    }

    #[test]
    fn falling_score_demotes_pre_boosted() {
        let mut h = Harness::new();
        let id = h.propose();
        h.engine.stake(&h.ctx("erin"), &id, VoteOption::Yes, 101).unwrap();
        assert_eq!(h.engine.proposal(&id).unwrap().state, ProposalState::PreBoosted);
        h.engine.stake(&h.ctx("dave"), &id, VoteOption::No, 50).unwrap();
        assert_eq!(h.engine.proposal(&id).unwrap().state, ProposalState::Queued);
    }

    #[test]
    fn boosting_raises_the_scheme_threshold() {
        let mut h = Harness::new();
        let first = h.propose();
        h.boost(&first);
        let scheme = h.engine.scheme(&h.scheme_id()).unwrap();
        assert_eq!(scheme.boosted_count, 1);
        assert_eq!(
            h.engine.threshold(&h.params_hash, &h.scheme_id()).unwrap(),
            Fixed::from_int(2)
        );

        let second = h.propose();
        assert_eq!(h.engine.calculate_boost_change(&second).unwrap(), 201);
    }

    #[test]
    fn majority_during_boost_crosses_the_queue_bar() {
        let mut h = Harness::new();
        let id = h.propose();
        h.boost(&id);
        assert!(h.engine.vote(&h.ctx("alice"), &id, VoteOption::Yes, 0).unwrap());
        let p = h.engine.proposal(&id).unwrap();
        assert_eq!(p.state, ProposalState::Executed);
        assert_eq!(p.execution_state, ExecutionState::QueueBarCrossed);
        assert_eq!(h.engine.scheme(&h.scheme_id()).unwrap().boosted_count, 0);
    }

    #[test]
    fn full_boost_slots_keep_proposal_pre_boosted() {
        let mut h = Harness::with_config(EngineConfig {
            max_boosted_proposals: 1,
            ..EngineConfig::default()
        });
        let first = h.propose();
        h.boost(&first);

        let second = h.propose();
        h.engine
            .stake(&h.ctx("erin"), &second, VoteOption::Yes, 201)
            .unwrap();
        assert_eq!(h.engine.proposal(&second).unwrap().state, ProposalState::PreBoosted);
        h.clock.advance(10);
        assert!(!h.engine.execute(&second).unwrap());
        assert_eq!(h.engine.proposal(&second).unwrap().state, ProposalState::PreBoosted);
        assert_eq!(h.engine.scheme(&h.scheme_id()).unwrap().boosted_count, 1);

        // Resolving the first proposal frees the slot.
        h.engine
            .vote(&h.ctx("alice"), &first, VoteOption::Yes, 0)
            .unwrap();
        assert_eq!(h.engine.scheme(&h.scheme_id()).unwrap().boosted_count, 0);
        h.engine.execute(&second).unwrap();
        assert_eq!(h.engine.proposal(&second).unwrap().state, ProposalState::Boosted);
        assert_eq!(h.engine.scheme(&h.scheme_id()).unwrap().boosted_count, 1);
    }

    #[test]
    fn pre_boost_period_ending_below_the_bar_requeues() {
        let mut h = Harness::new();
        let first = h.propose();
        let second = h.propose();
        h.engine
            .stake(&h.ctx("erin"), &second, VoteOption::Yes, 101)
            .unwrap();
        assert_eq!(h.engine.proposal(&second).unwrap().state, ProposalState::PreBoosted);

        // Boosting the first doubles the bar while the second waits.
        h.boost(&first);
        assert!(!h.engine.execute(&second).unwrap());
        let p = h.engine.proposal(&second).unwrap();
        assert_eq!(p.state, ProposalState::Queued);
        assert_eq!(p.boosted_at, None);
        assert_eq!(h.engine.scheme(&h.scheme_id()).unwrap().boosted_count, 1);
    }

    #[test]
    fn boosted_deadline_with_yes_ahead_executes() {
        let mut h = Harness::new();
        let id = h.propose();
        h.boost(&id);
        h.engine
            .vote(&h.ctx("carol"), &id, VoteOption::Yes, 1_000)
            .unwrap();
        h.clock.advance(60);
        assert!(h.engine.execute(&id).unwrap());
        let p = h.engine.proposal(&id).unwrap();
        assert_eq!(p.state, ProposalState::Executed);
        assert_eq!(p.execution_state, ExecutionState::ExecutedInBoost);
        assert_eq!(h.engine.scheme(&h.scheme_id()).unwrap().boosted_count, 0);
    }

    #[test]
    fn boosted_deadline_with_no_ahead_expires() {
        let mut h = Harness::new();
        let id = h.propose();
        h.boost(&id);
        h.clock.advance(60);
        assert!(h.engine.execute(&id).unwrap());
        let p = h.engine.proposal(&id).unwrap();
        assert_eq!(p.state, ProposalState::Expired);
        assert_eq!(p.execution_state, ExecutionState::BoostedTimeOut);
    }

    #[test]
    fn late_flip_extends_deadline_once() {
        let mut h = Harness::new();
        let id = h.propose();
        h.boost(&id);
        h.clock.advance(55);
        h.engine
            .vote(&h.ctx("carol"), &id, VoteOption::Yes, 1_000)
            .unwrap();
        let p = h.engine.proposal(&id).unwrap();
        assert_eq!(p.state, ProposalState::QuietEndingPeriod);
        assert_eq!(p.current_boosted_period_limit, 70);

        h.clock.advance(10);
        assert!(!h.engine.execute(&id).unwrap());
        h.engine
            .vote(&h.ctx("bob"), &id, VoteOption::No, 2_000)
            .unwrap();
        assert_eq!(h.engine.proposal(&id).unwrap().current_boosted_period_limit, 70);

        h.clock.advance(5);
        assert!(h.engine.execute(&id).unwrap());
        let p = h.engine.proposal(&id).unwrap();
        assert_eq!(p.state, ProposalState::Expired);
        assert_eq!(p.execution_state, ExecutionState::BoostedTimeOut);
    }

    #[test]
    fn early_flip_does_not_extend() {
        let mut h = Harness::new();
        let id = h.propose();
        h.boost(&id);
        h.clock.advance(20);
        h.engine
            .vote(&h.ctx("carol"), &id, VoteOption::Yes, 1_000)
            .unwrap();
        let p = h.engine.proposal(&id).unwrap();
        assert_eq!(p.state, ProposalState::Boosted);
        assert_eq!(p.current_boosted_period_limit, 60);
    }

    #[test]
    fn hook_sees_decision_and_failure_is_recorded() {
        let mut h = Harness::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = seen.clone();
        h.engine
            .register_hook(
                &h.ctx("scheme"),
                &h.addr("owner"),
                Box::new(move |_: &mut Engine, r: &Resolution| -> Result<(), HookError> {
                    log.borrow_mut().push(r.clone());
                    Err(HookError::Failed("payload reverted".into()))
                }),
            )
            .unwrap();
        let id = h.propose();
        h.engine
            .vote(&h.ctx("alice"), &id, VoteOption::Yes, 0)
            .unwrap();

        let p = h.engine.proposal(&id).unwrap();
        assert_eq!(p.state, ProposalState::Executed);
        assert!(matches!(&p.callback, CallbackOutcome::Failed(reason) if reason.contains("payload reverted")));
        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].passed());
        assert_eq!(seen[0].execution_state, ExecutionState::ExecutedInQueue);
    }

    #[test]
    fn nested_calls_from_hook_are_rejected() {
        let mut h = Harness::new();
        let other = h.propose();
        let kinds = Rc::new(RefCell::new(Vec::new()));
        let log = kinds.clone();
        h.engine
            .register_hook(
                &h.ctx("scheme"),
                &h.addr("owner"),
                Box::new(move |engine: &mut Engine, r: &Resolution| -> Result<(), HookError> {
                    if let Err(e) = engine.execute(&r.proposal_id) {
                        log.borrow_mut().push(e.kind());
                    }
                    if let Err(e) = engine.execute(&other) {
                        log.borrow_mut().push(e.kind());
                    }
                    Ok(())
                }),
            )
            .unwrap();
        let id = h.propose();
        assert!(h
            .engine
            .vote(&h.ctx("alice"), &id, VoteOption::Yes, 0)
            .unwrap());

        assert_eq!(
            *kinds.borrow(),
            vec![ErrorKind::Reentrancy, ErrorKind::Reentrancy]
        );
        let p = h.engine.proposal(&id).unwrap();
        assert_eq!(p.callback, CallbackOutcome::Succeeded);

        // The guard is released afterwards.
        h.clock.advance(60);
        assert!(h.engine.execute(&other).unwrap());
    }
}
