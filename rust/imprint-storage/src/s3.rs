//! S3-compatible artifact storage for AWS S3, Cloudflare R2, MinIO and the like.
//!
//! [`Bucket`] implements [`ArtifactStore`] on top of SigV4 presigned requests.
//! Objects are addressed path-style as `{endpoint}/{bucket}/{key}`, and keys
//! are used verbatim so that a CDN in front of the bucket serves an artifact
//! under the same key it was stored with.
//!
//! # Examples
//!
//! ```no_run
//! use imprint_storage::ArtifactStore;
//! use imprint_storage::s3::{Address, Bucket, Credentials, Lookup, Session};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let credentials = Credentials {
//!     access_key_id: std::env::var("AWS_ACCESS_KEY_ID")?,
//!     secret_access_key: std::env::var("AWS_SECRET_ACCESS_KEY")?,
//!     session_token: None,
//! };
//!
//! let bucket = Bucket::open(
//!     Address::new("https://s3.amazonaws.com", "us-east-1", "artifacts"),
//!     Session::new(credentials),
//! )
//! .with_lookup(Lookup::List);
//!
//! if !bucket.exists("h/generated.pdf").await? {
//!     bucket.put("h/generated.pdf", b"%PDF".to_vec()).await?;
//! }
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use url::Url;

use crate::{ArtifactStore, StorageError};

mod access;
pub use access::*;

mod checksum;
pub use checksum::*;

pub mod key;

mod list;
pub use list::ListPage;
use list::ServiceFault;

mod request;
pub use request::*;

impl From<AuthorizationError> for StorageError {
    fn from(error: AuthorizationError) -> Self {
        StorageError::AuthorizationError(error.to_string())
    }
}

/// Where a bucket lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    endpoint: String,
    region: String,
    bucket: String,
}

impl Address {
    /// Create an address for `bucket` at `endpoint`, signed for `region`.
    pub fn new(
        endpoint: impl Into<String>,
        region: impl Into<String>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            region: region.into(),
            bucket: bucket.into(),
        }
    }

    /// Base endpoint URL (e.g., "https://s3.us-east-1.amazonaws.com")
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Signing region (e.g., "us-east-1", or "auto" for R2)
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Bucket name
    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

/// How [`Bucket::exists`](ArtifactStore::exists) finds out whether a key is
/// present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Lookup {
    /// A single `HEAD` on the key. Needs `s3:GetObject`.
    #[default]
    Head,
    /// List keys with the key as prefix and look for an exact match among
    /// them. Needs `s3:ListBucket`.
    List,
}

/// An S3-compatible bucket holding artifacts.
#[derive(Debug, Clone)]
pub struct Bucket {
    address: Address,
    session: Session,
    hasher: Hasher,
    lookup: Lookup,
    client: reqwest::Client,
}

impl Bucket {
    /// Open the bucket at `address`, authorizing requests with `session`.
    ///
    /// By default uses SHA-256 for checksums and `HEAD` for lookups.
    pub fn open(address: Address, session: Session) -> Self {
        Self {
            address,
            session,
            hasher: Hasher::Sha256,
            lookup: Lookup::Head,
            client: reqwest::Client::new(),
        }
    }

    /// Use `client` for all requests.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Set the lookup strategy for existence checks.
    pub fn with_lookup(mut self, lookup: Lookup) -> Self {
        self.lookup = lookup;
        self
    }

    /// Set the hasher for computing checksums.
    pub fn with_hasher(mut self, hasher: Hasher) -> Self {
        self.hasher = hasher;
        self
    }

    /// The address this bucket was opened at.
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Build the URL for a given key.
    fn url(&self, key: &str) -> Result<Url, StorageError> {
        let object_key = key::encode(key)?;
        let base_url = self.address.endpoint.trim_end_matches('/');
        let url_str = format!("{base_url}/{}/{object_key}", self.address.bucket);

        Url::parse(&url_str)
            .map_err(|e| StorageError::InvalidKey(format!("{key}: {e}")))
    }

    /// Build the bucket URL (for listing operations).
    fn bucket_url(&self) -> Result<Url, StorageError> {
        let base_url = self.address.endpoint.trim_end_matches('/');
        let url_str = format!("{base_url}/{}", self.address.bucket);

        Url::parse(&url_str)
            .map_err(|e| StorageError::ConnectionFailed(format!("Failed to parse URL: {}", e)))
    }

    /// List one page of keys starting with `prefix`.
    ///
    /// Pass the previous page's `continuation` to read the next one.
    pub async fn list(
        &self,
        prefix: &str,
        continuation_token: Option<&str>,
    ) -> Result<ListPage, StorageError> {
        let response = List::new(
            self.bucket_url()?,
            self.address.region.as_str(),
            Some(prefix),
            continuation_token,
        )
        .perform(self)
        .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(match ServiceFault::parse(&body) {
                Some(fault) => fault.into(),
                None => {
                    StorageError::ServiceError(format!("Failed to list objects: {}", status))
                }
            });
        }

        ListPage::parse(&body)
    }

    async fn head(&self, key: &str) -> Result<bool, StorageError> {
        let response = Head::new(self.url(key)?, self.address.region.as_str())
            .perform(self)
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(true)
        } else if status == reqwest::StatusCode::NOT_FOUND {
            Ok(false)
        } else {
            Err(StorageError::ServiceError(format!(
                "Failed to look up '{}': {}",
                key, status
            )))
        }
    }

    async fn find(&self, key: &str) -> Result<bool, StorageError> {
        let mut continuation_token = None;
        loop {
            let page = self.list(key, continuation_token.as_deref()).await?;
            if page.keys.iter().any(|candidate| candidate == key) {
                return Ok(true);
            }
            match page.continuation {
                Some(token) => continuation_token = Some(token),
                None => return Ok(false),
            }
        }
    }
}

#[async_trait]
impl ArtifactStore for Bucket {
    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let found = match self.lookup {
            Lookup::Head => self.head(key).await?,
            Lookup::List => self.find(key).await?,
        };
        tracing::debug!(bucket = %self.address.bucket, key, found, "Looked up object");
        Ok(found)
    }

    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), StorageError> {
        let size = bytes.len();
        let response = Put::new(self.url(key)?, self.address.region.as_str(), bytes)
            .with_checksum(&self.hasher)
            .perform(self)
            .await?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(bucket = %self.address.bucket, key, size, "Stored object");
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(match ServiceFault::parse(&body) {
                Some(fault) => fault.into(),
                None => StorageError::ServiceError(format!(
                    "Failed to store '{}': {}",
                    key, status
                )),
            })
        }
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let response = Get::new(self.url(key)?, self.address.region.as_str())
            .perform(self)
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(Some(response.bytes().await?.to_vec()))
        } else if status == reqwest::StatusCode::NOT_FOUND {
            Ok(None)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(match ServiceFault::parse(&body) {
                Some(fault) => fault.into(),
                None => StorageError::ServiceError(format!(
                    "Failed to read '{}': {}",
                    key, status
                )),
            })
        }
    }
}
