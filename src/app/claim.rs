//! The claim/payout calculator.
//!
//! A pure function over a consistent read snapshot: no mutation, trivially
//! parallelizable across (virtual floor, user) queries, safe to run
//! concurrently with ingestion against a [`SharedSnapshot`] load.
//!
//! [`SharedSnapshot`]: super::ledger::SharedSnapshot

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::domain::{
    Outcome, OutcomeId, TokenId, UserId, VirtualFloor, VirtualFloorId, VirtualFloorState,
};

use super::store::EntityStore;

/// Whether a claim pays out winnings or refunds principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ClaimKind {
    Payouts,
    Refunds,
}

/// A computed claim: the total amount withdrawable by one user and the
/// position-token ids to redeem for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreparedClaim {
    pub kind: ClaimKind,
    pub total_amount: Decimal,
    pub token_ids: Vec<TokenId>,
}

/// Errors preparing a claim.
///
/// `MissingField` and `ZeroWeightedSupply` signal an inconsistent snapshot
/// and are fatal; they are never silently degraded to a zero claim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClaimError {
    #[error("virtual floor {0} does not exist")]
    UnknownVirtualFloor(VirtualFloorId),

    #[error("missing field: {field}")]
    MissingField { field: &'static str },

    #[error("virtual floor {virtual_floor} has {count} outcomes, expected at least 2")]
    TooFewOutcomes {
        virtual_floor: VirtualFloorId,
        count: usize,
    },

    #[error("winning outcome {outcome} has zero weighted supply")]
    ZeroWeightedSupply { outcome: OutcomeId },

    #[error("claim arithmetic overflow on outcome {outcome}")]
    Overflow { outcome: OutcomeId },
}

/// Compute what `user` can claim from `virtual_floor`.
///
/// Returns `Ok(None)` while the floor is still active — no claim exists,
/// which is distinct from a claim of zero.
pub fn prepare_claim(
    store: &EntityStore,
    virtual_floor: &VirtualFloorId,
    user: &UserId,
) -> Result<Option<PreparedClaim>, ClaimError> {
    let vf = store
        .get::<VirtualFloor>(virtual_floor)
        .ok_or_else(|| ClaimError::UnknownVirtualFloor(virtual_floor.clone()))?;

    match vf.state {
        VirtualFloorState::ClaimablePayouts => payout_claim(store, vf, user).map(Some),
        VirtualFloorState::ClaimableRefundsFlagged
        | VirtualFloorState::ClaimableRefundsResolvedNoWinners
        | VirtualFloorState::ClaimableRefundsResolvableNever => {
            refund_claim(store, virtual_floor, user).map(Some)
        }
        VirtualFloorState::ActiveResultNone
        | VirtualFloorState::ActiveResultSet
        | VirtualFloorState::ActiveResultChallenged => Ok(None),
    }
}

/// Prorated winnings: the user's weighted share of `winner_profits` on the
/// winning outcome, plus their principal.
fn payout_claim(
    store: &EntityStore,
    vf: &VirtualFloor,
    user: &UserId,
) -> Result<PreparedClaim, ClaimError> {
    let winning = vf
        .winning_outcome
        .clone()
        .ok_or(ClaimError::MissingField {
            field: "winning_outcome",
        })?;
    let winner_profits = vf.winner_profits.ok_or(ClaimError::MissingField {
        field: "winner_profits",
    })?;
    let outcome = store
        .get::<Outcome>(&winning)
        .ok_or(ClaimError::MissingField {
            field: "winning_outcome.total_weighted_supply",
        })?;

    // At most one row per (outcome, user) pair exists, by construction of
    // the keyed store.
    let Some(user_outcome) = store.user_outcome(&winning, user) else {
        return Ok(PreparedClaim {
            kind: ClaimKind::Payouts,
            total_amount: Decimal::ZERO,
            token_ids: Vec::new(),
        });
    };

    // Unreachable when upstream behaved: a winner resolution implies value
    // on the winning outcome. If it ever trips, the snapshot is corrupt.
    if outcome.total_weighted_supply.is_zero() {
        return Err(ClaimError::ZeroWeightedSupply { outcome: winning });
    }

    let profit = user_outcome
        .total_weighted_balance
        .checked_mul(winner_profits)
        .and_then(|share| share.checked_div(outcome.total_weighted_supply))
        .ok_or_else(|| ClaimError::Overflow {
            outcome: winning.clone(),
        })?;

    Ok(PreparedClaim {
        kind: ClaimKind::Payouts,
        total_amount: user_outcome.total_balance + profit,
        token_ids: store.user_token_ids_under(&winning, user),
    })
}

/// Principal-only refund, summed across every outcome the user holds a
/// position on.
fn refund_claim(
    store: &EntityStore,
    virtual_floor: &VirtualFloorId,
    user: &UserId,
) -> Result<PreparedClaim, ClaimError> {
    let outcomes = store.outcomes_of(virtual_floor);
    if outcomes.len() < 2 {
        return Err(ClaimError::TooFewOutcomes {
            virtual_floor: virtual_floor.clone(),
            count: outcomes.len(),
        });
    }

    let mut total_amount = Decimal::ZERO;
    let mut token_ids = Vec::new();
    for outcome in outcomes {
        if let Some(user_outcome) = store.user_outcome(&outcome.id, user) {
            total_amount += user_outcome.total_balance;
            token_ids.extend(store.user_token_ids_under(&outcome.id, user));
        }
    }
    token_ids.sort();

    Ok(PreparedClaim {
        kind: ClaimKind::Refunds,
        total_amount,
        token_ids,
    })
}
