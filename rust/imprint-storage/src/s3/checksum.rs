//! Payload digests sent along with uploads.
//!
//! S3 recomputes the digest named by an `x-amz-checksum-*` header and refuses
//! the upload when it differs, so a truncated PDF never lands in the bucket.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sha2::{Digest, Sha256};

/// Digest algorithm used for upload checksums.
///
/// ```
/// use imprint_storage::s3::Hasher;
///
/// let checksum = Hasher::Sha256.checksum(b"%PDF-1.4");
/// assert_eq!(checksum.header_name(), "x-amz-checksum-sha256");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Hasher {
    /// SHA-256
    #[default]
    Sha256,
}

impl Hasher {
    /// Digest `data`.
    pub fn checksum(&self, data: &[u8]) -> Checksum {
        let digest = match self {
            Self::Sha256 => Sha256::digest(data).to_vec(),
        };
        Checksum {
            hasher: *self,
            digest,
        }
    }

    /// Lowercase algorithm name as it appears in header names.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
        }
    }
}

/// A digest together with the algorithm that produced it. Displays as the
/// base64 header value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checksum {
    hasher: Hasher,
    digest: Vec<u8>,
}

impl Checksum {
    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.digest
    }

    /// Algorithm name, e.g. `sha256`.
    pub fn name(&self) -> &'static str {
        self.hasher.name()
    }

    /// Header that carries this checksum.
    pub fn header_name(&self) -> String {
        format!("x-amz-checksum-{}", self.name())
    }
}

impl std::fmt::Display for Checksum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&STANDARD.encode(&self.digest))
    }
}
