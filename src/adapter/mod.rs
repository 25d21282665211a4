//! Boundary implementations: the version-1 metadata decoder and the ERC-20
//! metadata sources.

pub mod metadata;
pub mod token;

pub use metadata::{JsonMetadataDecoder, SUPPORTED_METADATA_VERSION};
pub use token::{RpcTokenMetadataSource, StaticTokenMetadataSource};
