use std::collections::HashMap;

use base64::Engine;
use bytes::Bytes;

use crate::{Document, Margins, PressError};

/// A request to render (or re-deliver) a document.
///
/// Keeps the payload exactly as received, for fingerprinting, next to the
/// parameters decoded from it as `application/x-www-form-urlencoded`.
/// Recognised parameters:
///
/// | name | meaning |
/// |---|---|
/// | `filename` | file name in the storage key |
/// | `project_name` | namespace in front of the storage key |
/// | `margin_top`, `margin_bottom`, `margin_left`, `margin_right` | page margins |
/// | `body` | HTML of the document |
/// | `header`, `footer` | HTML repeated on every page |
#[derive(Debug, Clone)]
pub struct RenderRequest {
    payload: Bytes,
    parameters: HashMap<String, String>,
}

impl RenderRequest {
    /// Decode the parameters of `payload`.
    pub fn new(payload: Bytes) -> Self {
        let parameters = parse_parameters(&payload);
        Self {
            payload,
            parameters,
        }
    }

    /// Decode the parameters of a base64 wrapped `payload`, as delivered by
    /// API gateways.
    ///
    /// A payload that is not valid base64 yields no parameters.
    pub fn from_base64(payload: Bytes) -> Self {
        let parameters = base64::engine::general_purpose::STANDARD
            .decode(&payload)
            .map(|decoded| parse_parameters(&decoded))
            .unwrap_or_default();
        Self {
            payload,
            parameters,
        }
    }

    /// The bytes as received.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// The value of parameter `name`; empty values count as absent.
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    /// The requested file name.
    pub fn filename(&self) -> Option<&str> {
        self.parameter("filename")
    }

    /// The requested namespace.
    pub fn project_name(&self) -> Option<&str> {
        self.parameter("project_name")
    }

    /// What to render. Fails when `body` is missing or a margin is not a
    /// non-negative integer.
    pub fn document(&self) -> Result<Document, PressError> {
        let body = self
            .parameter("body")
            .ok_or_else(|| PressError::InvalidRequest("missing 'body' parameter".into()))?;

        Ok(Document {
            body: body.to_owned(),
            header: self.parameter("header").map(str::to_owned),
            footer: self.parameter("footer").map(str::to_owned),
            margins: Margins {
                top: self.margin("margin_top")?,
                bottom: self.margin("margin_bottom")?,
                left: self.margin("margin_left")?,
                right: self.margin("margin_right")?,
            },
        })
    }

    fn margin(&self, name: &str) -> Result<Option<u32>, PressError> {
        self.parameter(name)
            .map(|value| {
                value.trim().parse::<u32>().map_err(|_| {
                    PressError::InvalidRequest(format!("'{name}' must be a non-negative integer"))
                })
            })
            .transpose()
    }
}

/// The first value of every parameter in a form-urlencoded payload.
fn parse_parameters(payload: &[u8]) -> HashMap<String, String> {
    let mut parameters = HashMap::new();
    for (name, value) in url::form_urlencoded::parse(payload) {
        parameters
            .entry(name.into_owned())
            .or_insert_with(|| value.into_owned());
    }
    parameters
}
