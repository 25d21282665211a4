//! The inbound event stream.
//!
//! Events are immutable facts emitted by the upstream rule-enforcing engine.
//! This crate trusts their contents entirely: no business rule already
//! enforced upstream is re-validated here. Envelopes carry the producing
//! transaction's coordinates, which define the strict total order and key the
//! transfer audit trail.

use serde::{Deserialize, Serialize};

use super::id::{EventPosition, TokenAddress, TokenId, TxHash, UserId, VirtualFloorId};
use super::state::{ResolutionType, ResultUpdateAction};

/// An opaque versioned market-description blob. Only version 1, whose
/// payload is a JSON document, is understood by the decoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionedMetadata {
    pub version: u32,
    pub data: String,
}

/// One event plus its ordering coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub block_number: u64,
    pub tx_index: u32,
    pub log_index: u32,
    pub tx_hash: TxHash,
    /// Block timestamp, unix seconds.
    pub timestamp: u64,
    pub payload: LedgerEvent,
}

impl EventEnvelope {
    /// The envelope's position in the strict total order.
    #[must_use]
    pub fn position(&self) -> EventPosition {
        EventPosition {
            block_number: self.block_number,
            tx_index: self.tx_index,
            log_index: self.log_index,
        }
    }
}

/// Parameters of a `VirtualFloorCreation` event.
///
/// Raw `u128` values are fixed-point integers: `*_e18` fields at 1e18 scale,
/// amounts in the payment token's base units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtualFloorCreation {
    pub virtual_floor_id: VirtualFloorId,
    pub creator: UserId,
    pub payment_token: TokenAddress,
    pub beta_open_e18: u128,
    pub creation_fee_rate_e18: u128,
    pub platform_fee_rate_e18: u128,
    pub t_open: u64,
    pub t_close: u64,
    pub t_resolve: u64,
    pub n_outcomes: u8,
    pub bonus_amount: u128,
    pub min_commitment_amount: u128,
    pub max_commitment_amount: u128,
    pub metadata: VersionedMetadata,
}

/// One creator/amount pair of a quota adjustment batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaAdjustment {
    pub creator: UserId,
    pub relative_amount: i64,
}

/// The nine upstream event kinds consumed by the aggregation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LedgerEvent {
    /// Whitelist toggle; consumed only to discover payment tokens early.
    PaymentTokenWhitelistUpdate {
        token: TokenAddress,
        whitelisted: bool,
    },
    VirtualFloorCreation(VirtualFloorCreation),
    /// A stake: the mint path of the position token.
    UserCommitment {
        virtual_floor_id: VirtualFloorId,
        outcome_index: u8,
        committer: UserId,
        token_id: TokenId,
        timeslot: u64,
        amount: u128,
        beta_e18: u128,
    },
    TransferSingle {
        from: UserId,
        to: UserId,
        token_id: TokenId,
        value: u128,
    },
    TransferBatch {
        from: UserId,
        to: UserId,
        token_ids: Vec<TokenId>,
        values: Vec<u128>,
    },
    VirtualFloorCancellationUnresolvable {
        virtual_floor_id: VirtualFloorId,
    },
    VirtualFloorCancellationFlagged {
        virtual_floor_id: VirtualFloorId,
        reason: String,
    },
    VirtualFloorResolution {
        virtual_floor_id: VirtualFloorId,
        winning_outcome_index: u8,
        resolution_type: ResolutionType,
        winner_profits: u128,
    },
    CreationQuotaAdjustments {
        adjustments: Vec<QuotaAdjustment>,
    },
    ResultUpdate {
        virtual_floor_id: VirtualFloorId,
        operator: UserId,
        action: ResultUpdateAction,
        outcome_index: u8,
    },
}
