//! Metadata-decoder port.
//!
//! Market descriptions travel inside `VirtualFloorCreation` events as opaque
//! versioned blobs. The decoder turns a supported blob into the structured
//! description the engine persists; an unsupported version is fatal and
//! non-retryable without a code change.

use serde::Deserialize;
use thiserror::Error;

use crate::domain::VersionedMetadata;

/// An opponent entry of a decoded market description.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OpponentMetadata {
    pub title: String,
    pub image: String,
}

/// An outcome entry of a decoded market description.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OutcomeMetadata {
    pub title: String,
}

/// A result-source entry of a decoded market description.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResultSourceMetadata {
    pub title: String,
    pub url: String,
}

/// A fully decoded market description.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualFloorMetadata {
    pub category: String,
    pub subcategory: String,
    pub title: String,
    pub description: String,
    pub is_listed: bool,
    pub opponents: Vec<OpponentMetadata>,
    pub outcomes: Vec<OutcomeMetadata>,
    pub result_sources: Vec<ResultSourceMetadata>,
    pub discord_channel_id: String,
}

/// Errors decoding a metadata blob. Both variants are fatal for the event
/// that carried the blob.
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("metadata version {version} not supported")]
    UnsupportedVersion { version: u32 },

    #[error("malformed metadata payload: {0}")]
    Malformed(#[source] serde_json::Error),
}

/// Decodes versioned market-description blobs.
pub trait MetadataDecoder: Send + Sync {
    /// Decode `blob`, failing on any version this decoder does not understand.
    fn decode(&self, blob: &VersionedMetadata) -> Result<VirtualFloorMetadata, MetadataError>;
}
