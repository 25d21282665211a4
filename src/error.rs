use thiserror::Error;

use crate::app::claim::ClaimError;
use crate::domain::amount::AmountError;
use crate::domain::IntegrityError;
use crate::port::metadata::MetadataError;
use crate::port::token::TokenMetadataError;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Integrity(#[from] IntegrityError),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error(transparent)]
    TokenMetadata(#[from] TokenMetadataError),

    #[error(transparent)]
    Amount(#[from] AmountError),

    #[error(transparent)]
    Claim(#[from] ClaimError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    /// Whether retrying the same event may succeed.
    ///
    /// Only external token-metadata reads are transient; every other failure
    /// is a fault in the event log or the engine and halts ingestion.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::TokenMetadata(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
