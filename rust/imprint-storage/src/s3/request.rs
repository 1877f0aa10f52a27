//! S3 request types and execution.
//!
//! This module contains the request types ([`Put`], [`Get`], [`Head`], [`List`]) and
//! the [`Request`] trait for executing them against a [`Bucket`].

use async_trait::async_trait;
use url::Url;

use super::access::Invocation;
use super::checksum::{Checksum, Hasher};
use super::{Bucket, list::list_url};
use crate::StorageError;

/// A PUT request to upload an object.
#[derive(Debug)]
pub struct Put {
    url: Url,
    region: String,
    body: Vec<u8>,
    checksum: Option<Checksum>,
}

impl Put {
    /// Create a new PUT request with the given URL and body.
    ///
    /// Use [`with_checksum`](Self::with_checksum) to add integrity verification.
    pub fn new(url: Url, region: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            url,
            region: region.into(),
            body,
            checksum: None,
        }
    }

    /// Compute and set the checksum using the given hasher.
    pub fn with_checksum(mut self, hasher: &Hasher) -> Self {
        self.checksum = Some(hasher.checksum(&self.body));
        self
    }
}

impl Invocation for Put {
    fn method(&self) -> &'static str {
        "PUT"
    }

    fn url(&self) -> &Url {
        &self.url
    }

    fn region(&self) -> &str {
        &self.region
    }

    fn checksum(&self) -> Option<&Checksum> {
        self.checksum.as_ref()
    }
}

impl Request for Put {
    fn body(&self) -> Option<&[u8]> {
        Some(&self.body)
    }
}

/// A GET request to retrieve an object.
#[derive(Debug, Clone)]
pub struct Get {
    url: Url,
    region: String,
}

impl Get {
    /// Create a new GET request for the given URL.
    pub fn new(url: Url, region: impl Into<String>) -> Self {
        Self {
            url,
            region: region.into(),
        }
    }
}

impl Invocation for Get {
    fn method(&self) -> &'static str {
        "GET"
    }

    fn url(&self) -> &Url {
        &self.url
    }

    fn region(&self) -> &str {
        &self.region
    }
}

impl Request for Get {}

/// A HEAD request probing for an object without transferring it.
#[derive(Debug, Clone)]
pub struct Head {
    url: Url,
    region: String,
}

impl Head {
    /// Create a new HEAD request for the given URL.
    pub fn new(url: Url, region: impl Into<String>) -> Self {
        Self {
            url,
            region: region.into(),
        }
    }
}

impl Invocation for Head {
    fn method(&self) -> &'static str {
        "HEAD"
    }

    fn url(&self) -> &Url {
        &self.url
    }

    fn region(&self) -> &str {
        &self.region
    }
}

impl Request for Head {}

/// A ListObjectsV2 request for one page of keys.
#[derive(Debug, Clone)]
pub struct List {
    url: Url,
    region: String,
}

impl List {
    /// Create a new list request against `bucket_url`.
    pub fn new(
        bucket_url: Url,
        region: impl Into<String>,
        prefix: Option<&str>,
        continuation_token: Option<&str>,
    ) -> Self {
        Self {
            url: list_url(bucket_url, prefix, continuation_token),
            region: region.into(),
        }
    }
}

impl Invocation for List {
    fn method(&self) -> &'static str {
        "GET"
    }

    fn url(&self) -> &Url {
        &self.url
    }

    fn region(&self) -> &str {
        &self.region
    }
}

impl Request for List {}

/// Executable S3 request with an optional body.
///
/// This trait extends [`Invocation`] with the request body and the ability to
/// execute the request against a bucket. [`Invocation`] only carries what is
/// needed for signing.
#[async_trait]
pub trait Request: Invocation + Sized + Sync {
    /// The request body, if any.
    fn body(&self) -> Option<&[u8]> {
        None
    }

    /// Perform this request against the given bucket.
    async fn perform(&self, bucket: &Bucket) -> Result<reqwest::Response, StorageError> {
        let authorized = bucket.session.authorize(self)?;

        let mut builder = match self.method() {
            "GET" => bucket.client.get(authorized.url),
            "PUT" => bucket.client.put(authorized.url),
            "HEAD" => bucket.client.head(authorized.url),
            method => {
                let method = reqwest::Method::from_bytes(method.as_bytes())
                    .map_err(|error| StorageError::RequestFailed(error.to_string()))?;
                bucket.client.request(method, authorized.url)
            }
        };

        for (key, value) in authorized.headers {
            // reqwest derives `host` from the URL
            if key != "host" {
                builder = builder.header(key, value);
            }
        }

        if let Some(body) = self.body() {
            builder = builder.body(body.to_vec());
        }

        Ok(builder.send().await?)
    }
}
