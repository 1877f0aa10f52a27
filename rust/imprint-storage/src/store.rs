use async_trait::async_trait;
use imprint_common::ConditionalSync;

use crate::StorageError;

mod memory;
pub use memory::*;

mod fs;
pub use fs::*;

mod measure;
pub use measure::*;

/// An [ArtifactStore] is a facade over some durable storage substrate that
/// keeps immutable byte artifacts under string keys.
///
/// Implementations must honor two guarantees that the de-duplication logic
/// built on top of them depends on:
///
/// - [ArtifactStore::exists] matches keys exactly. An object stored under
///   `h/report-v2.pdf` must never make `h/report.pdf` (or `h/report`) appear
///   to exist, even when the underlying service only offers prefix listing.
/// - [ArtifactStore::put] is idempotent. Storing the same bytes under the same
///   key a second time is not an error, which is what makes two concurrent
///   identical requests safe without any locking.
///
/// Stores are cheap to clone and all operations take `&self`, so one handle
/// can be shared by every in-flight request.
#[async_trait]
pub trait ArtifactStore: Clone + ConditionalSync {
    /// Whether an object is stored under exactly `key`
    async fn exists(&self, key: &str) -> Result<bool, StorageError>;

    /// Store `bytes` under `key`, replacing any previous object
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), StorageError>;

    /// Retrieve the bytes (if any) stored under `key`
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;
}
