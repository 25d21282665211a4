//! Entity rows of the denormalized ledger hierarchy.
//!
//! Entities are append-only in existence: rows are never deleted, only their
//! numeric fields mutate. Each type implements [`Entity`], which the
//! repository's three access contracts are generic over.

use std::fmt;
use std::hash::Hash;

use rust_decimal::Decimal;

use super::error::IntegrityError;
use super::id::{
    AggregateId, CategoryId, OpponentId, OutcomeId, ResultSourceId, SubcategoryId, TokenAddress,
    TokenId, TransferRecordId, UserId, UserOutcomeId, UserOutcomeTimeslotId, VirtualFloorId,
};
use super::state::VirtualFloorState;

/// A keyed entity row.
pub trait Entity {
    /// Key type of this entity kind.
    type Id: Clone + Eq + Hash + fmt::Display;

    /// Kind label used in integrity errors.
    const KIND: &'static str;

    /// The row's key.
    fn id(&self) -> Self::Id;
}

/// An ERC-20 payment token, recorded once at first sighting and never
/// mutated afterward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentToken {
    pub address: TokenAddress,
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
}

impl Entity for PaymentToken {
    type Id = TokenAddress;
    const KIND: &'static str = "PaymentToken";

    fn id(&self) -> TokenAddress {
        self.address.clone()
    }
}

/// An account. The zero/burn address gets a row like any other account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub address: UserId,
    pub concurrent_virtual_floors: i64,
    pub max_concurrent_virtual_floors: i64,
}

impl User {
    /// A fresh account row with zeroed counters.
    #[must_use]
    pub fn new(address: UserId) -> Self {
        Self {
            address,
            concurrent_virtual_floors: 0,
            max_concurrent_virtual_floors: 0,
        }
    }
}

impl Entity for User {
    type Id = UserId;
    const KIND: &'static str = "User";

    fn id(&self) -> UserId {
        self.address.clone()
    }
}

/// One prediction-market round.
///
/// `total_supply` starts at `bonus_amount` and is thereafter adjusted only
/// through the credit/debit hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualFloor {
    pub id: VirtualFloorId,
    pub owner: UserId,
    pub payment_token: TokenAddress,
    pub subcategory: SubcategoryId,
    pub title: String,
    pub description: String,
    pub is_listed: bool,
    pub discord_channel_id: String,
    pub beta_open: Decimal,
    pub creation_fee_rate: Decimal,
    pub platform_fee_rate: Decimal,
    pub t_created: u64,
    pub t_open: u64,
    pub t_close: u64,
    pub t_resolve: u64,
    pub t_result_set_min: u64,
    pub t_result_set_max: u64,
    pub t_result_challenge_max: Option<u64>,
    pub state: VirtualFloorState,
    pub winning_outcome: Option<OutcomeId>,
    pub winner_profits: Option<Decimal>,
    pub challenger: Option<UserId>,
    pub flagging_reason: Option<String>,
    pub total_supply: Decimal,
    pub bonus_amount: Decimal,
    pub min_commitment_amount: Decimal,
    pub max_commitment_amount: Decimal,
}

impl VirtualFloor {
    /// Move to `next`, rejecting transitions the lifecycle machine forbids.
    pub fn transition_to(&mut self, next: VirtualFloorState) -> Result<(), IntegrityError> {
        if !self.state.can_transition_to(next) {
            return Err(IntegrityError::InvalidStateTransition {
                virtual_floor: self.id.clone(),
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }
}

impl Entity for VirtualFloor {
    type Id = VirtualFloorId;
    const KIND: &'static str = "VirtualFloor";

    fn id(&self) -> VirtualFloorId {
        self.id.clone()
    }
}

/// One mutually exclusive option within a virtual floor.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub id: OutcomeId,
    pub title: String,
    pub total_supply: Decimal,
    pub total_weighted_supply: Decimal,
}

impl Outcome {
    #[must_use]
    pub fn new(id: OutcomeId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            total_supply: Decimal::ZERO,
            total_weighted_supply: Decimal::ZERO,
        }
    }
}

impl Entity for Outcome {
    type Id = OutcomeId;
    const KIND: &'static str = "Outcome";

    fn id(&self) -> OutcomeId {
        self.id.clone()
    }
}

/// A minute-granularity commitment bucket on one outcome. `beta` is fixed at
/// first mint and immutable afterward.
#[derive(Debug, Clone, PartialEq)]
pub struct OutcomeTimeslot {
    pub token_id: TokenId,
    pub outcome: OutcomeId,
    pub timeslot: u64,
    pub beta: Decimal,
    pub total_supply: Decimal,
}

impl Entity for OutcomeTimeslot {
    type Id = TokenId;
    const KIND: &'static str = "OutcomeTimeslot";

    fn id(&self) -> TokenId {
        self.token_id.clone()
    }
}

/// A user's aggregate position on one outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct UserOutcome {
    pub id: UserOutcomeId,
    pub total_balance: Decimal,
    pub total_weighted_balance: Decimal,
}

impl UserOutcome {
    #[must_use]
    pub fn new(id: UserOutcomeId) -> Self {
        Self {
            id,
            total_balance: Decimal::ZERO,
            total_weighted_balance: Decimal::ZERO,
        }
    }
}

impl Entity for UserOutcome {
    type Id = UserOutcomeId;
    const KIND: &'static str = "UserOutcome";

    fn id(&self) -> UserOutcomeId {
        self.id.clone()
    }
}

/// A user's balance on one outcome timeslot.
#[derive(Debug, Clone, PartialEq)]
pub struct UserOutcomeTimeslot {
    pub id: UserOutcomeTimeslotId,
    pub outcome: OutcomeId,
    pub balance: Decimal,
}

impl UserOutcomeTimeslot {
    #[must_use]
    pub fn new(id: UserOutcomeTimeslotId, outcome: OutcomeId) -> Self {
        Self {
            id,
            outcome,
            balance: Decimal::ZERO,
        }
    }
}

impl Entity for UserOutcomeTimeslot {
    type Id = UserOutcomeTimeslotId;
    const KIND: &'static str = "UserOutcomeTimeslot";

    fn id(&self) -> UserOutcomeTimeslotId {
        self.id.clone()
    }
}

/// One entry of the append-only transfer audit trail. Written on every mint
/// and transfer, never read back by the aggregation logic.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferRecord {
    pub id: TransferRecordId,
    pub from: UserId,
    pub to: UserId,
    pub timestamp: u64,
    pub amount: Decimal,
}

impl Entity for TransferRecord {
    type Id = TransferRecordId;
    const KIND: &'static str = "TransferRecord";

    fn id(&self) -> TransferRecordId {
        self.id.clone()
    }
}

/// A category, created idempotently from decoded metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: CategoryId,
}

impl Entity for Category {
    type Id = CategoryId;
    const KIND: &'static str = "Category";

    fn id(&self) -> CategoryId {
        self.id.clone()
    }
}

/// A subcategory, scoped under its category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subcategory {
    pub id: SubcategoryId,
}

impl Entity for Subcategory {
    type Id = SubcategoryId;
    const KIND: &'static str = "Subcategory";

    fn id(&self) -> SubcategoryId {
        self.id.clone()
    }
}

/// An opponent declared in virtual-floor metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opponent {
    pub id: OpponentId,
    pub title: String,
    pub image: String,
}

impl Entity for Opponent {
    type Id = OpponentId;
    const KIND: &'static str = "Opponent";

    fn id(&self) -> OpponentId {
        self.id.clone()
    }
}

/// A result source declared in virtual-floor metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultSource {
    pub id: ResultSourceId,
    pub title: String,
    pub url: String,
}

impl Entity for ResultSource {
    type Id = ResultSourceId;
    const KIND: &'static str = "ResultSource";

    fn id(&self) -> ResultSourceId {
        self.id.clone()
    }
}

/// The singleton aggregate counter, kept at a fixed key and updated through
/// the same repository discipline as every other row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateCounter {
    pub id: AggregateId,
    pub total_virtual_floors_created: u64,
}

impl AggregateCounter {
    /// The zeroed singleton row.
    #[must_use]
    pub fn singleton() -> Self {
        Self {
            id: AggregateId::singleton(),
            total_virtual_floors_created: 0,
        }
    }
}

impl Entity for AggregateCounter {
    type Id = AggregateId;
    const KIND: &'static str = "VirtualFloorsAggregate";

    fn id(&self) -> AggregateId {
        self.id.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floor() -> VirtualFloor {
        VirtualFloor {
            id: VirtualFloorId::from("0x1"),
            owner: UserId::from("0xaa"),
            payment_token: TokenAddress::from("0xt"),
            subcategory: SubcategoryId::new(CategoryId::from("sports"), "tennis"),
            title: "title".into(),
            description: "description".into(),
            is_listed: true,
            discord_channel_id: "123".into(),
            beta_open: Decimal::TEN,
            creation_fee_rate: Decimal::ZERO,
            platform_fee_rate: Decimal::ZERO,
            t_created: 0,
            t_open: 0,
            t_close: 100,
            t_resolve: 200,
            t_result_set_min: 200,
            t_result_set_max: 3800,
            t_result_challenge_max: None,
            state: VirtualFloorState::ActiveResultNone,
            winning_outcome: None,
            winner_profits: None,
            challenger: None,
            flagging_reason: None,
            total_supply: Decimal::ZERO,
            bonus_amount: Decimal::ZERO,
            min_commitment_amount: Decimal::ZERO,
            max_commitment_amount: Decimal::ZERO,
        }
    }

    #[test]
    fn transition_rejects_leaving_terminal_state() {
        let mut vf = floor();
        vf.transition_to(VirtualFloorState::ClaimablePayouts).unwrap();
        let err = vf
            .transition_to(VirtualFloorState::ClaimableRefundsFlagged)
            .unwrap_err();
        assert!(matches!(err, IntegrityError::InvalidStateTransition { .. }));
        assert_eq!(vf.state, VirtualFloorState::ClaimablePayouts);
    }

    #[test]
    fn transition_walks_result_flow() {
        let mut vf = floor();
        vf.transition_to(VirtualFloorState::ActiveResultSet).unwrap();
        vf.transition_to(VirtualFloorState::ActiveResultChallenged)
            .unwrap();
        vf.transition_to(VirtualFloorState::ClaimableRefundsResolvedNoWinners)
            .unwrap();
    }
}
