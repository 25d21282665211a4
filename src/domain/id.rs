//! Identifier newtypes for every entity kind.
//!
//! String-backed ids keep their inner value private so all construction goes
//! through the defined constructors. Composite ids are plain structs whose
//! `Display` output matches the canonical `{parent}-{child}` string form used
//! in transfer logs and operator tooling.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Create a new id from a string.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the id as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self::new(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }
    };
}

string_id! {
    /// ERC-20 payment-token contract address.
    TokenAddress
}

string_id! {
    /// Account address. The zero address is an ordinary account used as the
    /// mint origin and burn sink.
    UserId
}

string_id! {
    /// Virtual-floor id, as the hex form of the on-chain uint256.
    VirtualFloorId
}

string_id! {
    /// ERC-1155 position-token id, as the hex form of the on-chain uint256.
    /// Doubles as the `OutcomeTimeslot` entity key.
    TokenId
}

string_id! {
    /// Transaction hash, carried on every event envelope.
    TxHash
}

string_id! {
    /// Category slug. The slug is the id.
    CategoryId
}

string_id! {
    /// Key of a singleton aggregate row.
    AggregateId
}

const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

impl UserId {
    /// The universal zero/burn address.
    #[must_use]
    pub fn zero() -> Self {
        Self::new(ZERO_ADDRESS)
    }

    /// Whether this is the zero/burn address.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == ZERO_ADDRESS
    }
}

impl AggregateId {
    /// The fixed key under which the single aggregate-counter row lives.
    #[must_use]
    pub fn singleton() -> Self {
        Self::new("singleton")
    }
}

/// Outcome key: one row per declared outcome index of a virtual floor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OutcomeId {
    pub virtual_floor: VirtualFloorId,
    pub index: u8,
}

impl OutcomeId {
    #[must_use]
    pub fn new(virtual_floor: VirtualFloorId, index: u8) -> Self {
        Self {
            virtual_floor,
            index,
        }
    }
}

impl fmt::Display for OutcomeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.virtual_floor, self.index)
    }
}

/// Subcategory key, scoped under its category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubcategoryId {
    pub category: CategoryId,
    pub slug: String,
}

impl SubcategoryId {
    #[must_use]
    pub fn new(category: CategoryId, slug: impl Into<String>) -> Self {
        Self {
            category,
            slug: slug.into(),
        }
    }
}

impl fmt::Display for SubcategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.category, self.slug)
    }
}

/// Key of a user's aggregate position on one outcome. At most one row per
/// (outcome, user) pair can exist, by construction of the keyed table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserOutcomeId {
    pub outcome: OutcomeId,
    pub user: UserId,
}

impl UserOutcomeId {
    #[must_use]
    pub fn new(outcome: OutcomeId, user: UserId) -> Self {
        Self { outcome, user }
    }
}

impl fmt::Display for UserOutcomeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.outcome, self.user)
    }
}

/// Key of a user's balance on one outcome timeslot (position token).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserOutcomeTimeslotId {
    pub token_id: TokenId,
    pub user: UserId,
}

impl UserOutcomeTimeslotId {
    #[must_use]
    pub fn new(token_id: TokenId, user: UserId) -> Self {
        Self { token_id, user }
    }
}

impl fmt::Display for UserOutcomeTimeslotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.token_id, self.user)
    }
}

/// Key of one transfer-log record. `pair_index` disambiguates entries within
/// a single multi-item batch transfer, so the key stays unique even when one
/// log entry moves several token ids at once.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransferRecordId {
    pub token_id: TokenId,
    pub tx_hash: TxHash,
    pub log_index: u32,
    pub pair_index: u32,
}

impl fmt::Display for TransferRecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}",
            self.token_id, self.tx_hash, self.log_index, self.pair_index
        )
    }
}

/// Key of an opponent row declared in virtual-floor metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OpponentId {
    pub virtual_floor: VirtualFloorId,
    pub index: u32,
}

impl fmt::Display for OpponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.virtual_floor, self.index)
    }
}

/// Key of a result-source row declared in virtual-floor metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResultSourceId {
    pub virtual_floor: VirtualFloorId,
    pub index: u32,
}

impl fmt::Display for ResultSourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.virtual_floor, self.index)
    }
}

/// Position of an event in the strict total order:
/// (block number, transaction index, log index).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventPosition {
    pub block_number: u64,
    pub tx_index: u32,
    pub log_index: u32,
}

impl fmt::Display for EventPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.block_number, self.tx_index, self.log_index
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_address_roundtrip() {
        let zero = UserId::zero();
        assert!(zero.is_zero());
        assert!(!UserId::from("0xabc").is_zero());
    }

    #[test]
    fn outcome_id_display() {
        let id = OutcomeId::new(VirtualFloorId::from("0x1f"), 2);
        assert_eq!(id.to_string(), "0x1f-2");
    }

    #[test]
    fn user_outcome_id_display() {
        let outcome = OutcomeId::new(VirtualFloorId::from("0x1f"), 0);
        let id = UserOutcomeId::new(outcome, UserId::from("0xaa"));
        assert_eq!(id.to_string(), "0x1f-0-0xaa");
    }

    #[test]
    fn transfer_record_id_is_unique_per_pair_index() {
        let a = TransferRecordId {
            token_id: TokenId::from("0x01"),
            tx_hash: TxHash::from("0xdead"),
            log_index: 3,
            pair_index: 0,
        };
        let mut b = a.clone();
        b.pair_index = 1;
        assert_ne!(a, b);
        assert_eq!(a.to_string(), "0x01-0xdead-3-0");
    }

    #[test]
    fn event_position_orders_by_block_then_tx_then_log() {
        let p = |b, t, l| EventPosition {
            block_number: b,
            tx_index: t,
            log_index: l,
        };
        assert!(p(1, 0, 5) < p(2, 0, 0));
        assert!(p(1, 1, 0) < p(1, 2, 0));
        assert!(p(1, 1, 3) < p(1, 1, 4));
        assert_eq!(p(1, 1, 3), p(1, 1, 3));
    }
}
