//! Reading `ListObjectsV2` pages and S3 error bodies.
//!
//! Listing is only used to answer [`Lookup::List`](super::Lookup::List)
//! existence checks, so a page is reduced to its keys and the token of the
//! page after it.

use serde::Deserialize;
use url::Url;

use crate::StorageError;

/// The keys of one listing page and, when S3 truncated it, the token that
/// continues the listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListPage {
    /// Keys on this page, in S3 order
    pub keys: Vec<String>,
    /// Present only when more pages follow
    pub continuation: Option<String>,
}

impl ListPage {
    /// Parse a `ListBucketResult` document. S3 `<Error>` documents become
    /// [StorageError::ServiceError].
    pub(crate) fn parse(xml: &str) -> Result<Self, StorageError> {
        if let Some(fault) = ServiceFault::parse(xml) {
            return Err(fault.into());
        }
        // quick-xml fills defaults for any root element
        if !xml.contains("<ListBucketResult") {
            return Err(StorageError::SerializationError(
                "Expected a ListBucketResult document".into(),
            ));
        }

        let document: ListBucketResult = quick_xml::de::from_str(xml).map_err(|error| {
            StorageError::SerializationError(format!("Unreadable listing: {error}"))
        })?;

        Ok(Self {
            keys: document.contents.into_iter().map(|entry| entry.key).collect(),
            continuation: document
                .next_continuation_token
                .filter(|_| document.is_truncated),
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListBucketResult {
    #[serde(default)]
    is_truncated: bool,
    #[serde(default)]
    contents: Vec<Entry>,
    next_continuation_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Entry {
    key: String,
}

/// An S3 `<Error>` document such as `NoSuchBucket` or `AccessDenied`.
#[derive(Debug, Deserialize)]
#[serde(rename = "Error", rename_all = "PascalCase")]
pub(crate) struct ServiceFault {
    code: String,
    message: Option<String>,
}

impl ServiceFault {
    pub(crate) fn parse(xml: &str) -> Option<Self> {
        xml.contains("<Error")
            .then(|| quick_xml::de::from_str(xml).ok())
            .flatten()
    }
}

impl From<ServiceFault> for StorageError {
    fn from(fault: ServiceFault) -> Self {
        StorageError::ServiceError(format!(
            "{}: {}",
            fault.code,
            fault.message.unwrap_or_default()
        ))
    }
}

/// `bucket_url` with the `ListObjectsV2` query attached.
pub(crate) fn list_url(bucket_url: Url, prefix: Option<&str>, continuation: Option<&str>) -> Url {
    let mut url = bucket_url;
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("list-type", "2");
        if let Some(prefix) = prefix {
            query.append_pair("prefix", prefix);
        }
        if let Some(token) = continuation {
            query.append_pair("continuation-token", token);
        }
    }
    url
}
