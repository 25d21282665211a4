//! Exchange-agnostic domain types: ids, entities, events, lifecycle states,
//! exact amount conversions, and integrity faults.

pub mod amount;
mod entity;
mod error;
mod event;
mod id;
mod state;

pub use entity::{
    AggregateCounter, Category, Entity, Opponent, Outcome, OutcomeTimeslot, PaymentToken,
    ResultSource, Subcategory, TransferRecord, User, UserOutcome, UserOutcomeTimeslot,
    VirtualFloor,
};
pub use error::IntegrityError;
pub use event::{
    EventEnvelope, LedgerEvent, QuotaAdjustment, VersionedMetadata, VirtualFloorCreation,
};
pub use id::{
    AggregateId, CategoryId, EventPosition, OpponentId, OutcomeId, ResultSourceId, SubcategoryId,
    TokenAddress, TokenId, TransferRecordId, TxHash, UserId, UserOutcomeId, UserOutcomeTimeslotId,
    VirtualFloorId,
};
pub use state::{ResolutionType, ResultUpdateAction, VirtualFloorState};
