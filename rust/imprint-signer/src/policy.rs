//! The canned policy document.
//!
//! CloudFront recomputes the policy from the URL it receives and compares it
//! byte for byte with what was signed, so the document must be rendered
//! compactly with keys in exactly this order:
//!
//! ```text
//! {"Statement":[{"Resource":"<resource>","Condition":{"DateLessThan":{"AWS:EpochTime":<expires>}}}]}
//! ```

use serde::Serialize;

use crate::SigningError;

/// A policy granting read access to one resource until an expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CannedPolicy {
    /// The exact URL access is granted to
    pub resource: String,
    /// Unix timestamp (seconds) after which access is denied
    pub expires: i64,
}

#[derive(Serialize)]
struct Document<'a> {
    #[serde(rename = "Statement")]
    statement: [Statement<'a>; 1],
}

#[derive(Serialize)]
struct Statement<'a> {
    #[serde(rename = "Resource")]
    resource: &'a str,
    #[serde(rename = "Condition")]
    condition: Condition,
}

#[derive(Serialize)]
struct Condition {
    #[serde(rename = "DateLessThan")]
    date_less_than: EpochTime,
}

#[derive(Serialize)]
struct EpochTime {
    #[serde(rename = "AWS:EpochTime")]
    epoch_time: i64,
}

impl CannedPolicy {
    /// Create a policy for `resource` that expires at `expires`.
    pub fn new(resource: impl Into<String>, expires: i64) -> Self {
        Self {
            resource: resource.into(),
            expires,
        }
    }

    /// Render the policy as the compact JSON that gets signed.
    pub fn to_json(&self) -> Result<String, SigningError> {
        let document = Document {
            statement: [Statement {
                resource: &self.resource,
                condition: Condition {
                    date_less_than: EpochTime {
                        epoch_time: self.expires,
                    },
                },
            }],
        };

        serde_json::to_string(&document)
            .map_err(|error| SigningError::SigningFailed(error.to_string()))
    }
}
