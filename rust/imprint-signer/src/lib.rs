#![warn(missing_docs)]

//! Grants temporary read access to stored artifacts through capability URLs
//! that a CDN verifies with the canned-policy scheme.
//!
//! A capability URL names a single resource and an expiry. The CDN checks an
//! RSA (PKCS#1 v1.5, SHA-1) signature over a compact JSON policy built from
//! those two values, so whoever holds the URL can read that one resource
//! until it expires, without any storage credentials.
//!
//! ```rust
//! use imprint_common::FixedClock;
//! use imprint_signer::{CapabilityUrlSigner, SigningKey};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let key = SigningKey::from_rsa(rsa::RsaPrivateKey::new(&mut rand::thread_rng(), 1024)?)?;
//! let signer = CapabilityUrlSigner::new("https://cdn.example.com", "K2JCJMDEHXQW5F")
//!     .with_clock(FixedClock::at_epoch_seconds(1_700_000_000));
//!
//! let url = signer.sign("h/generated.pdf", &key)?;
//! assert_eq!(url.expires, 1_700_000_900);
//! assert!(url.to_string().starts_with("https://cdn.example.com/h/generated.pdf?Expires=1700000900&Signature="));
//! # Ok(())
//! # }
//! ```
//!
//! Signing keys are fetched from a [SecretStore] (any
//! [imprint_storage::ArtifactStore] qualifies) and memoized for the lifetime
//! of the process by [KeyCache].

mod error;
pub use error::*;

mod encoding;
pub use encoding::*;

mod key;
pub use key::*;

mod policy;
pub use policy::*;

mod provider;
pub use provider::*;

mod signer;
pub use signer::*;

#[cfg(any(test, feature = "helpers"))]
mod helpers;
#[cfg(any(test, feature = "helpers"))]
pub use helpers::*;
