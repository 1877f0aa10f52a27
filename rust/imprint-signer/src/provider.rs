use std::sync::Arc;

use async_trait::async_trait;
use imprint_common::ConditionalSync;
use imprint_storage::{ArtifactStore, StorageError};
use tokio::sync::OnceCell;

use crate::{SigningError, SigningKey};

/// Somewhere secrets can be fetched from by locator.
///
/// Every [ArtifactStore] is a [SecretStore], with the object key as locator,
/// so a private bucket (or a directory, or memory in tests) can hold the
/// signing key.
#[async_trait]
pub trait SecretStore: ConditionalSync {
    /// The bytes of the secret at `locator`, if there is one
    async fn fetch(&self, locator: &str) -> Result<Option<Vec<u8>>, StorageError>;
}

#[async_trait]
impl<Store> SecretStore for Store
where
    Store: ArtifactStore,
{
    async fn fetch(&self, locator: &str) -> Result<Option<Vec<u8>>, StorageError> {
        self.get(locator).await
    }
}

/// Loads the signing key from a [SecretStore].
#[derive(Debug, Clone)]
pub struct KeyMaterialProvider<Store> {
    store: Store,
    locator: String,
}

impl<Store> KeyMaterialProvider<Store>
where
    Store: SecretStore,
{
    /// Read the key stored at `locator` in `store`.
    pub fn new(store: Store, locator: impl Into<String>) -> Self {
        Self {
            store,
            locator: locator.into(),
        }
    }

    /// Where the key is read from.
    pub fn locator(&self) -> &str {
        &self.locator
    }

    /// Fetch and parse the key. Every call goes back to the store.
    pub async fn load_signing_key(&self) -> Result<SigningKey, SigningError> {
        let pem = self
            .store
            .fetch(&self.locator)
            .await?
            .ok_or_else(|| SigningError::KeyNotFound(self.locator.clone()))?;

        let key = SigningKey::from_pem(&pem)?;
        tracing::info!(locator = %self.locator, "Loaded signing key");
        Ok(key)
    }
}

/// Memoizes the key loaded by a [KeyMaterialProvider] for the lifetime of
/// the process.
///
/// Clones share the memoized key. Concurrent first callers wait on a single
/// load. A failed load is not remembered, so the next caller tries again.
#[derive(Debug, Clone)]
pub struct KeyCache<Store> {
    provider: KeyMaterialProvider<Store>,
    key: Arc<OnceCell<Arc<SigningKey>>>,
}

impl<Store> KeyCache<Store>
where
    Store: SecretStore,
{
    /// Memoize keys loaded by `provider`.
    pub fn new(provider: KeyMaterialProvider<Store>) -> Self {
        Self {
            provider,
            key: Arc::new(OnceCell::new()),
        }
    }

    /// The signing key, loading it on first use.
    pub async fn signing_key(&self) -> Result<Arc<SigningKey>, SigningError> {
        self.key
            .get_or_try_init(|| async { self.provider.load_signing_key().await.map(Arc::new) })
            .await
            .cloned()
    }
}
