//! Content descriptors.

use serde::{Deserialize, Serialize};

use crate::digest::Digest;

/// OCI image manifest.
pub const OCI_IMAGE_MANIFEST: &str = "application/vnd.oci.image.manifest.v1+json";
/// Docker schema 2 manifest.
pub const DOCKER_MANIFEST_V2: &str = "application/vnd.docker.distribution.manifest.v2+json";

/// Identifies a piece of content: what it is, its digest and its size.
///
/// Serializes to the OCI descriptor shape:
/// `{"mediaType": ..., "digest": ..., "size": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    /// Media type of the content.
    pub media_type: String,
    /// Content digest.
    pub digest: Digest,
    /// Size in bytes.
    pub size: u64,
}

impl Descriptor {
    /// Create a descriptor.
    pub fn new(media_type: impl Into<String>, digest: Digest, size: u64) -> Self {
        Descriptor {
            media_type: media_type.into(),
            digest,
            size,
        }
    }

    /// Describe in-memory content, hashing it with SHA-256.
    pub fn from_bytes(media_type: impl Into<String>, data: &[u8]) -> Self {
        Descriptor::new(media_type, Digest::sha256(data), data.len() as u64)
    }

    /// Whether this descriptor names the content with `digest`.
    ///
    /// Only the digest is compared; size and media type are metadata.
    pub fn same_content(&self, digest: &Digest) -> bool {
        self.digest == *digest
    }
}
