//! The entity repository.
//!
//! One keyed table per entity kind, with three access contracts the rest of
//! the engine goes through exclusively:
//!
//! - [`EntityStore::create_new`] - exclusive creation, fails if present
//! - [`EntityStore::load_or_create`] - idempotent get-or-create
//! - [`EntityStore::load_existent`] / [`EntityStore::get_existent`] -
//!   required lookup, fails if absent
//!
//! Composite keys make cardinality invariants structural: a second
//! `UserOutcome` row for the same (outcome, user) pair cannot exist.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::domain::{
    AggregateCounter, AggregateId, Category, CategoryId, Entity, IntegrityError, Opponent,
    OpponentId, Outcome, OutcomeId, OutcomeTimeslot, PaymentToken, ResultSource, ResultSourceId,
    Subcategory, SubcategoryId, TokenAddress, TokenId, TransferRecord, TransferRecordId, User,
    UserId, UserOutcome, UserOutcomeId, UserOutcomeTimeslot, UserOutcomeTimeslotId, VirtualFloor,
    VirtualFloorId,
};

/// Access to the table holding entity kind `E`.
pub trait Table<E: Entity> {
    fn table(&self) -> &HashMap<E::Id, E>;
    fn table_mut(&mut self) -> &mut HashMap<E::Id, E>;
}

/// Keyed storage for the whole entity hierarchy.
///
/// Cloning the store clones every table; the ledger relies on this for
/// copy-on-apply atomicity.
#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    payment_tokens: HashMap<TokenAddress, PaymentToken>,
    users: HashMap<UserId, User>,
    virtual_floors: HashMap<VirtualFloorId, VirtualFloor>,
    outcomes: HashMap<OutcomeId, Outcome>,
    outcome_timeslots: HashMap<TokenId, OutcomeTimeslot>,
    user_outcomes: HashMap<UserOutcomeId, UserOutcome>,
    user_outcome_timeslots: HashMap<UserOutcomeTimeslotId, UserOutcomeTimeslot>,
    transfer_records: HashMap<TransferRecordId, TransferRecord>,
    categories: HashMap<CategoryId, Category>,
    subcategories: HashMap<SubcategoryId, Subcategory>,
    opponents: HashMap<OpponentId, Opponent>,
    result_sources: HashMap<ResultSourceId, ResultSource>,
    aggregates: HashMap<AggregateId, AggregateCounter>,
}

macro_rules! table {
    ($entity:ty, $field:ident) => {
        impl Table<$entity> for EntityStore {
            fn table(&self) -> &HashMap<<$entity as Entity>::Id, $entity> {
                &self.$field
            }

            fn table_mut(&mut self) -> &mut HashMap<<$entity as Entity>::Id, $entity> {
                &mut self.$field
            }
        }
    };
}

table!(PaymentToken, payment_tokens);
table!(User, users);
table!(VirtualFloor, virtual_floors);
table!(Outcome, outcomes);
table!(OutcomeTimeslot, outcome_timeslots);
table!(UserOutcome, user_outcomes);
table!(UserOutcomeTimeslot, user_outcome_timeslots);
table!(TransferRecord, transfer_records);
table!(Category, categories);
table!(Subcategory, subcategories);
table!(Opponent, opponents);
table!(ResultSource, result_sources);
table!(AggregateCounter, aggregates);

impl EntityStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Exclusive creation: fails if a row with the entity's id exists.
    /// Existing rows are never overwritten.
    pub fn create_new<E: Entity>(&mut self, entity: E) -> Result<&mut E, IntegrityError>
    where
        Self: Table<E>,
    {
        let id = entity.id();
        match <Self as Table<E>>::table_mut(self).entry(id.clone()) {
            Entry::Occupied(_) => Err(IntegrityError::AlreadyExists {
                kind: E::KIND,
                id: id.to_string(),
            }),
            Entry::Vacant(vacant) => Ok(vacant.insert(entity)),
        }
    }

    /// Idempotent get-or-create. Returns the row and whether it was created
    /// just now, so first-sighting work can be gated on creation.
    pub fn load_or_create<E: Entity>(
        &mut self,
        id: E::Id,
        init: impl FnOnce() -> E,
    ) -> (&mut E, bool)
    where
        Self: Table<E>,
    {
        match <Self as Table<E>>::table_mut(self).entry(id) {
            Entry::Occupied(occupied) => (occupied.into_mut(), false),
            Entry::Vacant(vacant) => (vacant.insert(init()), true),
        }
    }

    /// Required mutable lookup: fails if the row does not exist.
    pub fn load_existent<E: Entity>(&mut self, id: &E::Id) -> Result<&mut E, IntegrityError>
    where
        Self: Table<E>,
    {
        <Self as Table<E>>::table_mut(self)
            .get_mut(id)
            .ok_or_else(|| IntegrityError::Missing {
                kind: E::KIND,
                id: id.to_string(),
            })
    }

    /// Required read-only lookup: fails if the row does not exist.
    pub fn get_existent<E: Entity>(&self, id: &E::Id) -> Result<&E, IntegrityError>
    where
        Self: Table<E>,
    {
        <Self as Table<E>>::table(self)
            .get(id)
            .ok_or_else(|| IntegrityError::Missing {
                kind: E::KIND,
                id: id.to_string(),
            })
    }

    /// Optional read-only lookup.
    pub fn get<E: Entity>(&self, id: &E::Id) -> Option<&E>
    where
        Self: Table<E>,
    {
        <Self as Table<E>>::table(self).get(id)
    }

    /// Number of rows of entity kind `E`.
    pub fn count<E: Entity>(&self) -> usize
    where
        Self: Table<E>,
    {
        <Self as Table<E>>::table(self).len()
    }

    /// All outcomes of a virtual floor, in declaration order.
    #[must_use]
    pub fn outcomes_of(&self, virtual_floor: &VirtualFloorId) -> Vec<&Outcome> {
        let mut rows: Vec<&Outcome> = self
            .outcomes
            .values()
            .filter(|outcome| &outcome.id.virtual_floor == virtual_floor)
            .collect();
        rows.sort_by_key(|outcome| outcome.id.index);
        rows
    }

    /// A user's aggregate position on one outcome, if any.
    #[must_use]
    pub fn user_outcome(&self, outcome: &OutcomeId, user: &UserId) -> Option<&UserOutcome> {
        self.user_outcomes
            .get(&UserOutcomeId::new(outcome.clone(), user.clone()))
    }

    /// A user's balance on one outcome timeslot, if any.
    #[must_use]
    pub fn user_outcome_timeslot(
        &self,
        token_id: &TokenId,
        user: &UserId,
    ) -> Option<&UserOutcomeTimeslot> {
        self.user_outcome_timeslots
            .get(&UserOutcomeTimeslotId::new(token_id.clone(), user.clone()))
    }

    /// Token ids of the user's outcome-timeslot rows under one outcome,
    /// sorted for deterministic output.
    #[must_use]
    pub fn user_token_ids_under(&self, outcome: &OutcomeId, user: &UserId) -> Vec<TokenId> {
        let mut ids: Vec<TokenId> = self
            .user_outcome_timeslots
            .values()
            .filter(|row| &row.outcome == outcome && &row.id.user == user)
            .map(|row| row.id.token_id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// All balances held against one outcome timeslot, including the burn
    /// sink's.
    pub fn balances_of_timeslot(
        &self,
        token_id: &TokenId,
    ) -> impl Iterator<Item = &UserOutcomeTimeslot> {
        let token_id = token_id.clone();
        self.user_outcome_timeslots
            .values()
            .filter(move |row| row.id.token_id == token_id)
    }

    /// The transfer audit trail, unordered.
    pub fn transfer_records(&self) -> impl Iterator<Item = &TransferRecord> {
        self.transfer_records.values()
    }

    /// All virtual floors, unordered.
    pub fn virtual_floors(&self) -> impl Iterator<Item = &VirtualFloor> {
        self.virtual_floors.values()
    }
}
