//! Shared fixtures for integration tests: a canned payment token, an
//! event-log builder with monotonically increasing positions, and metadata
//! blobs in the version-1 JSON format.
#![allow(dead_code)]

use floorledger::adapter::{JsonMetadataDecoder, StaticTokenMetadataSource};
use floorledger::app::Ledger;
use floorledger::config::WindowsConfig;
use floorledger::domain::{
    EventEnvelope, LedgerEvent, QuotaAdjustment, ResolutionType, ResultUpdateAction, TokenAddress,
    TokenId, TxHash, UserId, VersionedMetadata, VirtualFloorCreation, VirtualFloorId,
};
use floorledger::port::Erc20Metadata;

pub const USDC: &str = "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48";
pub const ALICE: &str = "0xa11ce00000000000000000000000000000000001";
pub const BOB: &str = "0xb0b0000000000000000000000000000000000002";
pub const CAROL: &str = "0xca40100000000000000000000000000000000003";

pub const DECIMALS: u32 = 6;

pub const BETA_1_0: u128 = 1_000_000_000_000_000_000;
pub const BETA_1_5: u128 = 1_500_000_000_000_000_000;
pub const BETA_2_0: u128 = 2_000_000_000_000_000_000;

/// Whole payment-token units in raw base units (6 decimals).
pub fn units(n: u128) -> u128 {
    n * 1_000_000
}

pub fn usdc_source() -> StaticTokenMetadataSource {
    StaticTokenMetadataSource::new().with_token(
        TokenAddress::from(USDC),
        Erc20Metadata {
            name: "USD Coin".into(),
            symbol: "USDC".into(),
            decimals: DECIMALS,
        },
    )
}

pub fn ledger() -> Ledger<JsonMetadataDecoder, StaticTokenMetadataSource> {
    Ledger::new(
        JsonMetadataDecoder::new(),
        usdc_source(),
        WindowsConfig::default(),
    )
}

/// A version-1 metadata blob declaring `n_outcomes` outcomes.
pub fn metadata_blob(n_outcomes: usize) -> VersionedMetadata {
    let outcomes: Vec<_> = (0..n_outcomes)
        .map(|i| serde_json::json!({"title": format!("Outcome {i}")}))
        .collect();
    let document = serde_json::json!({
        "category": "sports",
        "subcategory": "tennis",
        "title": "Match of the day",
        "description": "A test floor",
        "isListed": true,
        "opponents": [
            {"title": "Home", "image": "https://img/home.png"},
            {"title": "Away", "image": "https://img/away.png"},
        ],
        "outcomes": outcomes,
        "resultSources": [{"title": "Official", "url": "https://example.com/results"}],
        "discordChannelId": "9000",
    });
    VersionedMetadata {
        version: 1,
        data: document.to_string(),
    }
}

/// Builds envelopes with strictly increasing positions, one block apart.
pub struct EventLog {
    block: u64,
}

impl EventLog {
    pub fn new() -> Self {
        Self { block: 0 }
    }

    pub fn next(&mut self, payload: LedgerEvent) -> EventEnvelope {
        self.block += 1;
        EventEnvelope {
            block_number: self.block,
            tx_index: 0,
            log_index: 0,
            tx_hash: TxHash::from(format!("0xtx{:04}", self.block)),
            timestamp: 1_650_000_000 + self.block * 60,
            payload,
        }
    }

    pub fn whitelist(&mut self, token: &str) -> EventEnvelope {
        self.next(LedgerEvent::PaymentTokenWhitelistUpdate {
            token: TokenAddress::from(token),
            whitelisted: true,
        })
    }

    pub fn create_floor(
        &mut self,
        vf: &str,
        creator: &str,
        n_outcomes: u8,
        bonus_amount: u128,
    ) -> EventEnvelope {
        self.create_floor_with_metadata(
            vf,
            creator,
            n_outcomes,
            bonus_amount,
            metadata_blob(usize::from(n_outcomes)),
        )
    }

    pub fn create_floor_with_metadata(
        &mut self,
        vf: &str,
        creator: &str,
        n_outcomes: u8,
        bonus_amount: u128,
        metadata: VersionedMetadata,
    ) -> EventEnvelope {
        self.next(LedgerEvent::VirtualFloorCreation(VirtualFloorCreation {
            virtual_floor_id: VirtualFloorId::from(vf),
            creator: UserId::from(creator),
            payment_token: TokenAddress::from(USDC),
            beta_open_e18: 10 * BETA_1_0,
            creation_fee_rate_e18: 10_000_000_000_000_000,
            platform_fee_rate_e18: 25_000_000_000_000_000,
            t_open: 1_650_000_000,
            t_close: 1_650_100_000,
            t_resolve: 1_650_200_000,
            n_outcomes,
            bonus_amount,
            min_commitment_amount: units(1),
            max_commitment_amount: units(1_000),
            metadata,
        }))
    }

    pub fn commit(
        &mut self,
        vf: &str,
        outcome_index: u8,
        committer: &str,
        token_id: &str,
        amount: u128,
        beta_e18: u128,
    ) -> EventEnvelope {
        self.next(LedgerEvent::UserCommitment {
            virtual_floor_id: VirtualFloorId::from(vf),
            outcome_index,
            committer: UserId::from(committer),
            token_id: TokenId::from(token_id),
            timeslot: 1_650_000_000,
            amount,
            beta_e18,
        })
    }

    pub fn transfer(&mut self, from: &str, to: &str, token_id: &str, value: u128) -> EventEnvelope {
        self.next(LedgerEvent::TransferSingle {
            from: UserId::from(from),
            to: UserId::from(to),
            token_id: TokenId::from(token_id),
            value,
        })
    }

    pub fn transfer_to_zero(&mut self, from: &str, token_id: &str, value: u128) -> EventEnvelope {
        self.next(LedgerEvent::TransferSingle {
            from: UserId::from(from),
            to: UserId::zero(),
            token_id: TokenId::from(token_id),
            value,
        })
    }

    pub fn transfer_batch(
        &mut self,
        from: &str,
        to: &str,
        token_ids: &[&str],
        values: &[u128],
    ) -> EventEnvelope {
        self.next(LedgerEvent::TransferBatch {
            from: UserId::from(from),
            to: UserId::from(to),
            token_ids: token_ids.iter().map(|t| TokenId::from(*t)).collect(),
            values: values.to_vec(),
        })
    }

    pub fn resolve(
        &mut self,
        vf: &str,
        winning_outcome_index: u8,
        resolution_type: ResolutionType,
        winner_profits: u128,
    ) -> EventEnvelope {
        self.next(LedgerEvent::VirtualFloorResolution {
            virtual_floor_id: VirtualFloorId::from(vf),
            winning_outcome_index,
            resolution_type,
            winner_profits,
        })
    }

    pub fn cancel_unresolvable(&mut self, vf: &str) -> EventEnvelope {
        self.next(LedgerEvent::VirtualFloorCancellationUnresolvable {
            virtual_floor_id: VirtualFloorId::from(vf),
        })
    }

    pub fn cancel_flagged(&mut self, vf: &str, reason: &str) -> EventEnvelope {
        self.next(LedgerEvent::VirtualFloorCancellationFlagged {
            virtual_floor_id: VirtualFloorId::from(vf),
            reason: reason.into(),
        })
    }

    pub fn quota_adjustments(&mut self, adjustments: &[(&str, i64)]) -> EventEnvelope {
        self.next(LedgerEvent::CreationQuotaAdjustments {
            adjustments: adjustments
                .iter()
                .map(|(creator, relative_amount)| QuotaAdjustment {
                    creator: UserId::from(*creator),
                    relative_amount: *relative_amount,
                })
                .collect(),
        })
    }

    pub fn result_update(
        &mut self,
        vf: &str,
        operator: &str,
        action: ResultUpdateAction,
        outcome_index: u8,
    ) -> EventEnvelope {
        self.next(LedgerEvent::ResultUpdate {
            virtual_floor_id: VirtualFloorId::from(vf),
            operator: UserId::from(operator),
            action,
            outcome_index,
        })
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}
