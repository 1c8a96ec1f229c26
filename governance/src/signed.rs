//! Off-chain signed votes and stakes relayed by a third party.
//!
//! A signer authorizes one action by signing its digest; anyone can then
//! submit it. Staging ([`Engine::share_signed_action`]) only verifies and
//! records the intent. Verification always rebuilds the digest from the
//! signer's current nonce, so an action signed for any other nonce fails
//! as a wrong signer. Applying it ([`Engine::execute_signed_vote`],
//! [`Engine::execute_signed_stake`]) verifies again, runs the ordinary
//! vote/stake path on the signer's behalf and consumes the signer's nonce.
//!
//! Digest layout (Blake2b-256):
//!
//! ```text
//! domain separator (32) ‖ "hive/action" ‖ action type (1) ‖ proposal id (32)
//! ‖ signer length (4, BE) ‖ signer ‖ option (1) ‖ amount (16, BE) ‖ nonce (8, BE)
//! ```

use hive_crypto::{blake2b_256_multi, derive_address, sign_message, verify_signature};
use hive_types::{
    ActionType, Address, Digest, KeyPair, ProposalId, PublicKey, Signature, Timestamp,
    VoteOption,
};
use serde::{Deserialize, Serialize};

use crate::engine::{Engine, TxContext};
use crate::error::GovernanceError;
use crate::events::GovernanceEvent;

/// Digest a signer signs to authorize one action.
pub fn action_digest(
    domain_separator: &[u8; 32],
    proposal_id: &ProposalId,
    signer: &Address,
    option: VoteOption,
    amount: u128,
    nonce: u64,
    action_type: ActionType,
) -> Digest {
    let signer_len = (signer.as_bytes().len() as u32).to_be_bytes();
    Digest::new(blake2b_256_multi(&[
        domain_separator,
        b"hive/action",
        &[action_type.as_u8()],
        proposal_id.as_bytes(),
        &signer_len,
        signer.as_bytes(),
        &[option.as_u8()],
        &amount.to_be_bytes(),
        &nonce.to_be_bytes(),
    ]))
}

/// An action authorized off-chain, as submitted by a relayer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedAction {
    pub proposal_id: ProposalId,
    pub signer: Address,
    pub public_key: PublicKey,
    pub option: VoteOption,
    pub amount: u128,
    pub nonce: u64,
    pub action_type: ActionType,
    pub signature: Signature,
}

impl SignedAction {
    /// Sign an action as the key pair's address.
    pub fn sign(
        domain_separator: &[u8; 32],
        keys: &KeyPair,
        proposal_id: ProposalId,
        option: VoteOption,
        amount: u128,
        nonce: u64,
        action_type: ActionType,
    ) -> Self {
        let signer = derive_address(&keys.public);
        let digest = action_digest(
            domain_separator,
            &proposal_id,
            &signer,
            option,
            amount,
            nonce,
            action_type,
        );
        Self {
            signature: sign_message(digest.as_bytes(), &keys.private),
            public_key: keys.public.clone(),
            proposal_id,
            signer,
            option,
            amount,
            nonce,
            action_type,
        }
    }

    /// Address whose key produced `signature` over `digest`, if it verifies.
    pub fn recover(&self, digest: &Digest) -> Option<Address> {
        verify_signature(digest.as_bytes(), &self.signature, &self.public_key)
            .then(|| derive_address(&self.public_key))
    }
}

/// A verified action waiting to be applied.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedIntent {
    pub action: SignedAction,
    pub digest: Digest,
    pub staged_at: Timestamp,
}

impl Engine {
    /// Digest of an action under this engine's signing domain.
    pub fn hash_action(
        &self,
        proposal_id: &ProposalId,
        signer: &Address,
        option: VoteOption,
        amount: u128,
        nonce: u64,
        action_type: ActionType,
    ) -> Digest {
        action_digest(
            &self.domain_separator,
            proposal_id,
            signer,
            option,
            amount,
            nonce,
            action_type,
        )
    }

    /// Verify a signed action and stage it for relaying. No vote or stake
    /// is applied and the nonce is not consumed.
    pub fn share_signed_action(&mut self, action: SignedAction) -> Result<Digest, GovernanceError> {
        self.proposal_ref(&action.proposal_id)?;
        let digest = self.authorize(&action, action.action_type)?;
        let intent = SignedIntent {
            digest,
            staged_at: self.now(),
            action: action.clone(),
        };
        self.state
            .intents
            .insert((action.signer.clone(), action.nonce), intent);
        tracing::debug!(
            proposal = %action.proposal_id,
            signer = %action.signer,
            nonce = action.nonce,
            %digest,
            "signed action staged"
        );
        self.emit(GovernanceEvent::ActionSigned {
            proposal_id: action.proposal_id,
            signer: action.signer,
            option: action.option,
            amount: action.amount,
            nonce: action.nonce,
            action_type: action.action_type,
            digest,
        });
        Ok(digest)
    }

    /// Staged intent for a signer and nonce.
    pub fn signed_intent(&self, signer: &Address, nonce: u64) -> Option<&SignedIntent> {
        self.state.intents.get(&(signer.clone(), nonce))
    }

    /// Apply a signed vote on the signer's behalf. The relayer pays; no gas
    /// refund is made.
    pub fn execute_signed_vote(
        &mut self,
        ctx: &TxContext,
        action: &SignedAction,
    ) -> Result<bool, GovernanceError> {
        self.authorize(action, ActionType::Vote)?;
        let id = action.proposal_id;
        let resolved = self.guarded(id, |engine| {
            engine.internal_vote(id, &action.signer, action.option, action.amount)
        })?;
        self.consume_nonce(ctx, action);
        Ok(resolved)
    }

    /// Apply a signed stake; tokens are locked from the signer.
    pub fn execute_signed_stake(
        &mut self,
        ctx: &TxContext,
        action: &SignedAction,
    ) -> Result<bool, GovernanceError> {
        self.authorize(action, ActionType::Stake)?;
        let id = action.proposal_id;
        let resolved = self.guarded(id, |engine| {
            engine.internal_stake(id, &action.signer, action.option, action.amount)
        })?;
        self.consume_nonce(ctx, action);
        Ok(resolved)
    }

    /// Rebuild the digest of `kind` against the signer's current nonce and
    /// check the signature recovers to the claimed signer.
    fn authorize(&self, action: &SignedAction, kind: ActionType) -> Result<Digest, GovernanceError> {
        let nonce = self.signer_nonce(&action.signer);
        if action.nonce != nonce {
            tracing::debug!(
                signer = %action.signer,
                expected = nonce,
                provided = action.nonce,
                "signed action nonce mismatch"
            );
        }
        let digest = self.hash_action(
            &action.proposal_id,
            &action.signer,
            action.option,
            action.amount,
            nonce,
            kind,
        );
        let recovered = action.recover(&digest);
        if recovered.as_ref() != Some(&action.signer) {
            return Err(GovernanceError::WrongSigner {
                proposal_id: action.proposal_id,
                expected: action.signer.clone(),
                recovered,
            });
        }
        Ok(digest)
    }

    fn consume_nonce(&mut self, ctx: &TxContext, action: &SignedAction) {
        *self.state.nonces.entry(action.signer.clone()).or_insert(0) += 1;
        self.state
            .intents
            .remove(&(action.signer.clone(), action.nonce));
        tracing::debug!(
            proposal = %action.proposal_id,
            signer = %action.signer,
            relayer = %ctx.sender,
            "signed action applied"
        );
    }
}
