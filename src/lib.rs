//! Floorledger - event-sourced ledger aggregation and payout calculation
//! for time-decaying-odds prediction markets ("virtual floors").
//!
//! The crate consumes an ordered stream of immutable ledger events,
//! incrementally maintains denormalized aggregate balances across a
//! VirtualFloor -> Outcome -> OutcomeTimeslot -> user hierarchy, drives a
//! per-floor lifecycle state machine, and computes final claimable amounts.
//! It trusts event contents entirely: business rules are enforced by the
//! upstream producer, and any event that contradicts recorded state halts
//! ingestion rather than being repaired.
//!
//! # Architecture
//!
//! - [`domain`] - ids, entity rows, events, lifecycle states, exact decimal
//!   amount conversions, integrity faults
//! - [`port`] - boundary traits: metadata decoding, ERC-20 metadata reads
//! - [`adapter`] - the version-1 JSON metadata decoder and the JSON-RPC /
//!   static token-metadata sources
//! - [`app`] - the entity repository, the aggregation engine behind
//!   [`app::Ledger`], and the pure read-side [`app::prepare_claim`]
//! - [`config`] - TOML configuration (logging, result windows, RPC endpoint)
//! - [`error`] - error types for the crate
//!
//! # Example
//!
//! ```no_run
//! use floorledger::adapter::{JsonMetadataDecoder, StaticTokenMetadataSource};
//! use floorledger::app::Ledger;
//! use floorledger::config::WindowsConfig;
//! use floorledger::domain::{EventEnvelope, LedgerEvent, TokenAddress, TxHash};
//! use floorledger::port::Erc20Metadata;
//!
//! let tokens = StaticTokenMetadataSource::new().with_token(
//!     TokenAddress::from("0xusdc"),
//!     Erc20Metadata {
//!         name: "USD Coin".into(),
//!         symbol: "USDC".into(),
//!         decimals: 6,
//!     },
//! );
//! let mut ledger = Ledger::new(
//!     JsonMetadataDecoder::new(),
//!     tokens,
//!     WindowsConfig::default(),
//! );
//!
//! let envelope = EventEnvelope {
//!     block_number: 1,
//!     tx_index: 0,
//!     log_index: 0,
//!     tx_hash: TxHash::from("0xabc"),
//!     timestamp: 1_650_000_000,
//!     payload: LedgerEvent::PaymentTokenWhitelistUpdate {
//!         token: TokenAddress::from("0xusdc"),
//!         whitelisted: true,
//!     },
//! };
//! ledger.apply(&envelope)?;
//! # Ok::<(), floorledger::error::Error>(())
//! ```

pub mod adapter;
pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod port;
