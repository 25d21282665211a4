//! Boundary traits for external collaborators.

pub mod metadata;
pub mod token;

pub use metadata::{
    MetadataDecoder, MetadataError, OpponentMetadata, OutcomeMetadata, ResultSourceMetadata,
    VirtualFloorMetadata,
};
pub use token::{Erc20Metadata, TokenMetadataError, TokenMetadataSource};
