//! Version-1 JSON metadata decoder.

use crate::domain::VersionedMetadata;
use crate::port::metadata::{MetadataDecoder, MetadataError, VirtualFloorMetadata};

/// The only blob version this decoder understands.
pub const SUPPORTED_METADATA_VERSION: u32 = 1;

/// Decodes version-1 blobs, whose payload is a JSON document.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonMetadataDecoder;

impl JsonMetadataDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl MetadataDecoder for JsonMetadataDecoder {
    fn decode(&self, blob: &VersionedMetadata) -> Result<VirtualFloorMetadata, MetadataError> {
        if blob.version != SUPPORTED_METADATA_VERSION {
            return Err(MetadataError::UnsupportedVersion {
                version: blob.version,
            });
        }
        serde_json::from_str(&blob.data).map_err(MetadataError::Malformed)
    }
}
