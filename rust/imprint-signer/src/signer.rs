use std::sync::Arc;

use imprint_common::{Clock, SystemClock};

use crate::{CannedPolicy, SigningError, SigningKey, url_safe_base64};

/// Default lifetime of a capability URL: 15 minutes.
pub const DEFAULT_TTL: u64 = 900;

/// A signed, time-limited URL for one resource.
///
/// Rendered with [`Display`](std::fmt::Display) as
/// `<resource>?Expires=<expires>&Signature=<signature>&Key-Pair-Id=<key_pair_id>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityUrl {
    /// The URL access is granted to
    pub resource: String,
    /// Unix timestamp (seconds) after which the URL stops working
    pub expires: i64,
    /// URL-safe base64 signature over the canned policy
    pub signature: String,
    /// Identifies the public key the CDN verifies the signature with
    pub key_pair_id: String,
}

impl std::fmt::Display for CapabilityUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}?Expires={}&Signature={}&Key-Pair-Id={}",
            self.resource, self.expires, self.signature, self.key_pair_id
        )
    }
}

/// Sign a canned policy for `resource` expiring at `expires`.
///
/// Signing is deterministic: the same inputs always produce the same URL.
pub fn sign_resource(
    resource: &str,
    expires: i64,
    signing_key: &SigningKey,
    key_pair_id: &str,
) -> Result<CapabilityUrl, SigningError> {
    let policy = CannedPolicy::new(resource, expires).to_json()?;
    let signature = signing_key.sign(policy.as_bytes())?;

    Ok(CapabilityUrl {
        resource: resource.to_owned(),
        expires,
        signature: url_safe_base64(&signature),
        key_pair_id: key_pair_id.to_owned(),
    })
}

/// Issues capability URLs for keys served below a CDN base URL.
#[derive(Debug, Clone)]
pub struct CapabilityUrlSigner {
    cdn_url: String,
    key_pair_id: String,
    ttl: u64,
    clock: Arc<dyn Clock>,
}

impl CapabilityUrlSigner {
    /// Create a signer for resources below `cdn_url`, verified by the CDN
    /// with the public key registered as `key_pair_id`.
    pub fn new(cdn_url: impl Into<String>, key_pair_id: impl Into<String>) -> Self {
        Self {
            cdn_url: cdn_url.into(),
            key_pair_id: key_pair_id.into(),
            ttl: DEFAULT_TTL,
            clock: Arc::new(SystemClock),
        }
    }

    /// Set how many seconds issued URLs stay valid.
    pub fn with_ttl(mut self, ttl: u64) -> Self {
        self.ttl = ttl;
        self
    }

    /// Read the current time from `clock`.
    pub fn with_clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Seconds issued URLs stay valid.
    pub fn ttl(&self) -> u64 {
        self.ttl
    }

    /// The CDN URL of `key`.
    pub fn resource(&self, key: &str) -> String {
        format!("{}/{}", self.cdn_url.trim_end_matches('/'), key)
    }

    /// Sign a URL granting access to `key` for the configured TTL.
    pub fn sign(&self, key: &str, signing_key: &SigningKey) -> Result<CapabilityUrl, SigningError> {
        let expires = i64::try_from(self.ttl)
            .ok()
            .and_then(|ttl| self.clock.epoch_seconds().checked_add(ttl))
            .ok_or_else(|| SigningError::SigningFailed(format!("TTL {} is out of range", self.ttl)))?;

        let url = sign_resource(&self.resource(key), expires, signing_key, &self.key_pair_id)?;
        tracing::debug!(key, expires, "Signed capability URL");
        Ok(url)
    }
}
