//! AWS S3 Signature Version 4 signing implementation.
//!
//! This module provides presigned URL generation for S3-compatible storage services
//! including AWS S3 and Cloudflare R2, using [query string authentication].
//!
//! [query string authentication]: https://docs.aws.amazon.com/AmazonS3/latest/API/sigv4-query-string-auth.html

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use imprint_common::{Clock, SystemClock};
use sha2::{Digest, Sha256};
use std::fmt::Write as FmtWrite;
use thiserror::Error;
use url::Url;

use super::Checksum;
use super::key::percent_encode;

/// Default URL expiration: 1 hours.
pub const DEFAULT_EXPIRES: u64 = 3600;

/// AWS S3 credentials for signing requests.
#[derive(Clone)]
pub struct Credentials {
    /// AWS Access Key ID
    pub access_key_id: String,
    /// AWS Secret Access Key
    pub secret_access_key: String,
    /// Session token for temporary credentials (e.g. an assumed role)
    pub session_token: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

impl Credentials {
    /// Authorize a request with AWS SigV4 presigned URL.
    ///
    /// Derives the signing key on demand using the request's time.
    /// The request provides all signing parameters (region, service, expires, time).
    pub fn authorize<I: Invocation>(
        &self,
        request: &I,
    ) -> Result<Authorization, AuthorizationError> {
        let time = request.time();
        let timestamp = time.format("%Y%m%dT%H%M%SZ").to_string();
        let date = &timestamp[0..8];

        let region = request.region();
        let service = request.service();
        let expires = request.expires();

        let key = SigningKey::derive(&self.secret_access_key, date, region, service)?;
        let scope = format!("{}/{}/{}/aws4_request", date, region, service);

        let url = request.url();
        let host = host_header(url)?;

        // Build signed headers
        let mut headers = vec![("host".to_string(), host)];
        // With a checksum header S3 performs an integrity check on the body.
        if let Some(checksum) = request.checksum() {
            headers.push((checksum.header_name(), checksum.to_string()));
        }
        headers.sort_by(|a, b| a.0.cmp(&b.0));

        let signed_headers: String = headers
            .iter()
            .map(|(k, _)| k.as_str())
            .collect::<Vec<_>>()
            .join(";");

        // Build query parameters
        let mut query_params: Vec<(String, String)> = vec![
            ("X-Amz-Algorithm".into(), "AWS4-HMAC-SHA256".into()),
            ("X-Amz-Content-Sha256".into(), "UNSIGNED-PAYLOAD".into()),
            (
                "X-Amz-Credential".into(),
                format!("{}/{}", self.access_key_id, scope),
            ),
            ("X-Amz-Date".into(), timestamp.clone()),
            ("X-Amz-Expires".into(), expires.to_string()),
        ];

        if let Some(token) = &self.session_token {
            query_params.push(("X-Amz-Security-Token".into(), token.clone()));
        }

        query_params.push(("X-Amz-SignedHeaders".into(), signed_headers.clone()));

        // Keep query parameters already on the request URL
        // (e.g., list-type=2, prefix=... for ListObjectsV2)
        for (key, value) in url.query_pairs() {
            query_params.push((key.into_owned(), value.into_owned()));
        }

        // Sort all query parameters alphabetically (required by SigV4)
        query_params.sort();

        // The request path is already percent-encoded once, which is the
        // canonical form S3 expects.
        let canonical_uri = url.path();

        let canonical_query: String = query_params
            .iter()
            .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        let canonical_headers: String = headers
            .iter()
            .map(|(k, v)| format!("{}:{}", k, v.trim()))
            .collect::<Vec<_>>()
            .join("\n");

        let canonical_request = format!(
            "{}\n{}\n{}\n{}\n\n{}\nUNSIGNED-PAYLOAD",
            request.method(),
            canonical_uri,
            canonical_query,
            canonical_headers,
            signed_headers
        );

        // Create string to sign
        let digest = Sha256::digest(canonical_request.as_bytes());
        let payload = format!(
            "AWS4-HMAC-SHA256\n{}\n{}\n{}",
            timestamp,
            scope,
            hex_encode(&digest)
        );

        let signature = key.sign(payload.as_bytes())?;

        // Build final URL with all query parameters
        let mut url = url.clone();
        url.set_query(None);
        {
            let mut query = url.query_pairs_mut();
            for (k, v) in &query_params {
                query.append_pair(k, v);
            }
            query.append_pair("X-Amz-Signature", &signature.to_string());
        }

        Ok(Authorization { url, headers })
    }
}

/// AWS SigV4 signing key derived from credentials.
///
/// The key is derived through an HMAC chain:
/// `HMAC(HMAC(HMAC(HMAC("AWS4" + secret, date), region), service), "aws4_request")`
#[derive(Clone)]
struct SigningKey(Vec<u8>);

impl SigningKey {
    /// Derive a signing key using the AWS4 key derivation algorithm.
    fn derive(
        secret: &str,
        date: &str,
        region: &str,
        service: &str,
    ) -> Result<Self, AuthorizationError> {
        let secret = format!("AWS4{}", secret);
        let k_date = Self::hmac(secret.as_bytes(), date.as_bytes())?;
        let k_region = Self::hmac(&k_date, region.as_bytes())?;
        let k_service = Self::hmac(&k_region, service.as_bytes())?;
        Ok(Self(Self::hmac(&k_service, b"aws4_request")?))
    }

    /// Compute HMAC-SHA256.
    fn hmac(key: &[u8], data: &[u8]) -> Result<Vec<u8>, AuthorizationError> {
        let mut mac = Hmac::<Sha256>::new_from_slice(key)
            .map_err(|error| AuthorizationError::Signing(error.to_string()))?;
        mac.update(data);
        Ok(mac.finalize().into_bytes().to_vec())
    }

    /// Sign data using this key.
    fn sign(&self, data: &[u8]) -> Result<Signature, AuthorizationError> {
        Ok(Signature(Self::hmac(&self.0, data)?))
    }
}

/// Unsigned access, for buckets that allow anonymous requests.
#[derive(Debug, Clone, Copy, Default)]
pub struct Public;

impl Public {
    /// Authorize a public request.
    ///
    /// Adds required headers (host, checksum) without signing.
    pub fn authorize<I: Invocation>(
        &self,
        request: &I,
    ) -> Result<Authorization, AuthorizationError> {
        let mut headers = vec![("host".to_string(), host_header(request.url())?)];
        if let Some(checksum) = request.checksum() {
            headers.push((checksum.header_name(), checksum.to_string()));
        }

        Ok(Authorization {
            url: request.url().clone(),
            headers,
        })
    }
}

/// How requests against a bucket are authorized.
#[derive(Debug, Clone)]
pub enum Session {
    /// Requests are sent unsigned.
    Public(Public),
    /// Requests are presigned with SigV4 credentials.
    Signed(Credentials),
}

impl Session {
    /// A session that presigns every request with `credentials`.
    pub fn new(credentials: Credentials) -> Self {
        Self::Signed(credentials)
    }

    /// A session that sends requests unsigned.
    pub fn public() -> Self {
        Self::Public(Public)
    }

    /// Authorize `request` for this session.
    pub fn authorize<I: Invocation>(
        &self,
        request: &I,
    ) -> Result<Authorization, AuthorizationError> {
        match self {
            Self::Public(public) => public.authorize(request),
            Self::Signed(credentials) => credentials.authorize(request),
        }
    }
}

/// Request metadata required for S3 authorization.
///
/// This trait captures all information needed to sign an S3 request:
/// - HTTP method, URL, checksum (request-specific)
/// - Region, service, expires, time (signing parameters)
///
/// The [`Request`](super::Request) trait extends this with the body and execution
/// capability.
pub trait Invocation {
    /// The HTTP method for this request.
    fn method(&self) -> &'static str;

    /// The URL for this request.
    fn url(&self) -> &Url;

    /// The AWS region for signing (e.g., "us-east-1", "auto").
    fn region(&self) -> &str;

    /// The checksum of the body, if any.
    fn checksum(&self) -> Option<&Checksum> {
        None
    }

    /// The service name for signing. Defaults to "s3".
    fn service(&self) -> &str {
        "s3"
    }

    /// URL signature expiration in seconds.
    fn expires(&self) -> u64 {
        DEFAULT_EXPIRES
    }

    /// The timestamp for signing. Defaults to current time.
    fn time(&self) -> DateTime<Utc> {
        SystemClock.now()
    }
}

/// An authorization of the request
#[derive(Debug)]
pub struct Authorization {
    /// The presigned URL
    pub url: Url,
    /// Headers that must be included in the HTTP request
    pub headers: Vec<(String, String)>,
}

/// HMAC-SHA256 signature bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Signature(Vec<u8>);

impl std::fmt::Display for Signature {
    /// Displays hex encoded representation of the signature
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&hex_encode(&self.0))
    }
}

/// Errors that can occur during signing.
#[derive(Error, Debug)]
pub enum AuthorizationError {
    /// The endpoint URL is invalid (e.g., missing host).
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
    /// Failed to parse a URL.
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
    /// The HMAC chain could not be computed.
    #[error("signing failed: {0}")]
    Signing(String),
}

/// The `host` header value for `url`, including non-default ports.
fn host_header(url: &Url) -> Result<String, AuthorizationError> {
    let hostname = url
        .host_str()
        .ok_or_else(|| AuthorizationError::InvalidEndpoint("URL missing host".into()))?;
    Ok(match url.port() {
        Some(port) => format!("{}:{}", hostname, port),
        None => hostname.to_string(),
    })
}

/// Encode bytes as lowercase hexadecimal string.
///
/// Used for encoding SHA-256 hashes in AWS signature strings.
fn hex_encode(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(s, "{:02x}", byte);
    }
    s
}
