#![warn(missing_docs)]

//! This crate contains the storage contract that the rest of Imprint relies
//! on to de-duplicate rendered artifacts, together with the backends that
//! implement it.
//!
//! An [ArtifactStore] answers three questions about an object key: does an
//! object live under exactly this key, what bytes are stored there, and
//! please store these bytes here. The available backends are:
//!
//! - [MemoryStore]: a `HashMap` kept in memory, shared by clone
//! - [FileSystemStore]: one file per key below a root directory
//! - [s3::Bucket]: any S3-compatible object store, reached with SigV4
//!   presigned requests
//!
//! ```rust
//! use imprint_storage::{ArtifactStore, MemoryStore};
//!
//! # async fn example() -> Result<(), imprint_storage::StorageError> {
//! let store = MemoryStore::default();
//!
//! store.put("h/report.pdf", b"%PDF".to_vec()).await?;
//!
//! assert!(store.exists("h/report.pdf").await?);
//! assert!(!store.exists("h/report").await?);
//! # Ok(())
//! # }
//! ```

mod error;
pub use error::*;

mod store;
pub use store::*;

pub mod s3;
