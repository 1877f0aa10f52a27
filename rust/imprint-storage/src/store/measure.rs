use async_trait::async_trait;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use super::ArtifactStore;
use crate::StorageError;

/// A [MeasuredStore] acts as a proxy over an [ArtifactStore] implementation
/// that counts existence checks, reads and writes.
#[derive(Clone, Debug)]
pub struct MeasuredStore<Store>
where
    Store: ArtifactStore,
{
    lookups: Arc<AtomicUsize>,
    reads: Arc<AtomicUsize>,
    writes: Arc<AtomicUsize>,
    store: Store,
}

impl<Store> MeasuredStore<Store>
where
    Store: ArtifactStore,
{
    /// Wrap the provided [ArtifactStore] so that calls to it may be measured.
    pub fn new(store: Store) -> Self {
        Self {
            lookups: Arc::new(AtomicUsize::default()),
            reads: Arc::new(AtomicUsize::default()),
            writes: Arc::new(AtomicUsize::default()),
            store,
        }
    }

    /// The aggregate number of existence checks against the wrapped store
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::Relaxed)
    }

    /// The aggregate number of reads from the wrapped store
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }

    /// The aggregate number of writes to the wrapped store
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }

    /// The wrapped store
    pub fn inner(&self) -> &Store {
        &self.store
    }
}

#[async_trait]
impl<Store> ArtifactStore for MeasuredStore<Store>
where
    Store: ArtifactStore,
{
    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        self.store.exists(key).await
    }

    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), StorageError> {
        self.writes.fetch_add(1, Ordering::Relaxed);
        self.store.put(key, bytes).await
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        self.store.get(key).await
    }
}
