//! Token-metadata port.
//!
//! ERC-20 name/symbol/decimals are read once per payment token, at first
//! sighting. A failed read is transient: the engine halts on the same event
//! and the read is retried there, never bypassed or defaulted.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::TokenAddress;

/// ERC-20 metadata as returned by the token contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Erc20Metadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
}

/// Errors reading token metadata. All variants are transient for the event
/// that triggered the read.
#[derive(Error, Debug)]
pub enum TokenMetadataError {
    #[error("transport failure reading metadata for {address}: {reason}")]
    Transport { address: TokenAddress, reason: String },

    #[error("rpc failure reading metadata for {address}: {code} {message}")]
    Rpc {
        address: TokenAddress,
        code: i64,
        message: String,
    },

    #[error("metadata response for {address} could not be decoded: {reason}")]
    Decode { address: TokenAddress, reason: String },

    #[error("no metadata registered for {address}")]
    Unknown { address: TokenAddress },
}

/// Reads ERC-20 metadata for payment tokens.
pub trait TokenMetadataSource: Send + Sync {
    /// Read name/symbol/decimals for `address`.
    fn read(&self, address: &TokenAddress) -> Result<Erc20Metadata, TokenMetadataError>;
}

impl<T: TokenMetadataSource + ?Sized> TokenMetadataSource for Box<T> {
    fn read(&self, address: &TokenAddress) -> Result<Erc20Metadata, TokenMetadataError> {
        (**self).read(address)
    }
}
