#![warn(missing_docs)]

//! Imprint turns HTML into PDF documents at most once per distinct request
//! and answers every request with a short-lived signed link to the result.
//!
//! A request is fingerprinted over its raw bytes ([fingerprint]), the
//! fingerprint is placed into a storage key ([build_key]) and the [Press]
//! only renders when its [ArtifactStore](imprint_storage::ArtifactStore) has
//! nothing under that key yet. Either way the response is a capability URL
//! signed for the CDN in front of the store, or (with [Delivery::Inline]) the
//! document itself.
//!
//! ```rust
//! use imprint_press::{build_key, fingerprint};
//!
//! let fingerprint = fingerprint(b"body=%3Ch1%3EHi%3C%2Fh1%3E");
//! let key = build_key(&fingerprint, Some("invoices"), None);
//!
//! assert_eq!(key.as_str(), format!("invoices/{fingerprint}/generated.pdf"));
//! ```

mod error;
pub use error::*;

mod fingerprint;
pub use fingerprint::*;

mod key;
pub use key::*;

mod request;
pub use request::*;

pub mod render;
pub use render::{Document, Margins, RenderError, Renderer, WkHtmlToPdf};

mod press;
pub use press::*;

pub mod config;
pub mod service;
pub mod telemetry;
