//! Integrity faults raised while applying events.
//!
//! Every variant signals either an engine bug or an upstream protocol
//! violation. None of them is recoverable by repair: the offending event is
//! discarded wholesale and ingestion halts at its position.

use thiserror::Error;

use super::id::{EventPosition, OutcomeId, VirtualFloorId};
use super::state::VirtualFloorState;

/// A violated existence, uniqueness, ordering, or immutability invariant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntegrityError {
    /// Exclusive creation found the entity already present.
    #[error("{kind}({id}) already exists")]
    AlreadyExists { kind: &'static str, id: String },

    /// A required entity was not found.
    #[error("{kind}({id}) does not exist")]
    Missing { kind: &'static str, id: String },

    /// An immutable field was re-sighted with a different value.
    #[error("{kind}({id}).{field}: stored {stored} != incoming {incoming}")]
    FieldMismatch {
        kind: &'static str,
        id: String,
        field: &'static str,
        stored: String,
        incoming: String,
    },

    /// An event arrived at or before the last committed position.
    #[error("event at {incoming} is not after last committed position {last}")]
    OutOfOrder {
        last: EventPosition,
        incoming: EventPosition,
    },

    /// Decoded metadata declared a different outcome count than the event.
    #[error(
        "virtual floor {virtual_floor}: metadata has {decoded} outcomes, event declares {declared}"
    )]
    OutcomeCountMismatch {
        virtual_floor: VirtualFloorId,
        declared: u8,
        decoded: usize,
    },

    /// A batch transfer carried differing numbers of token ids and values.
    #[error("transfer batch arity mismatch: {ids} token ids, {values} values")]
    TransferArityMismatch { ids: usize, values: usize },

    /// An illegal lifecycle transition was requested.
    #[error("virtual floor {virtual_floor}: illegal state transition {from} -> {to}")]
    InvalidStateTransition {
        virtual_floor: VirtualFloorId,
        from: VirtualFloorState,
        to: VirtualFloorState,
    },

    /// A payout denominator was zero where value is known to exist.
    #[error("outcome {outcome} has zero weighted supply")]
    ZeroWeightedSupply { outcome: OutcomeId },
}
