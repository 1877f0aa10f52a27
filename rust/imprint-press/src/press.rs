use bytes::Bytes;
use imprint_signer::{CapabilityUrl, CapabilityUrlSigner, KeyCache, SecretStore};
use imprint_storage::ArtifactStore;
use tracing::{Span, error, info, instrument};

use crate::{CacheKey, PressError, RenderRequest, Renderer, build_key, fingerprint};

/// What a successful request answers with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Delivery {
    /// A signed, expiring URL to the artifact
    #[default]
    Url,
    /// The artifact bytes
    Inline,
}

/// The answer to one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivered {
    /// A signed URL to the stored artifact
    Url(CapabilityUrl),
    /// The artifact itself
    Artifact(Vec<u8>),
}

/// Renders each distinct request once and signs access to the result.
///
/// For every request the [Press] derives a [CacheKey] from the raw payload
/// and only renders when the store holds nothing under that key. Nothing
/// coordinates identical requests that arrive together: both may render and
/// both may store, which is harmless because stores are idempotent.
#[derive(Debug, Clone)]
pub struct Press<Store, Render, Secrets> {
    store: Store,
    renderer: Render,
    signer: CapabilityUrlSigner,
    keys: KeyCache<Secrets>,
    delivery: Delivery,
    base64_body: bool,
}

impl<Store, Render, Secrets> Press<Store, Render, Secrets>
where
    Store: ArtifactStore,
    Render: Renderer,
    Secrets: SecretStore + Clone,
{
    /// Assemble a press from its collaborators.
    pub fn new(
        store: Store,
        renderer: Render,
        signer: CapabilityUrlSigner,
        keys: KeyCache<Secrets>,
    ) -> Self {
        Self {
            store,
            renderer,
            signer,
            keys,
            delivery: Delivery::Url,
            base64_body: false,
        }
    }

    /// Answer with `delivery`.
    pub fn with_delivery(mut self, delivery: Delivery) -> Self {
        self.delivery = delivery;
        self
    }

    /// Expect base64 wrapped payloads.
    pub fn with_base64_body(mut self, base64_body: bool) -> Self {
        self.base64_body = base64_body;
        self
    }

    /// The artifact store.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Handle one request whose body is `payload`.
    ///
    /// Failures are logged here, once, before they are returned.
    #[instrument(name = "press", skip_all, fields(key = tracing::field::Empty))]
    pub async fn handle(&self, payload: Bytes) -> Result<Delivered, PressError> {
        let result = self.run(payload).await;
        if let Err(error) = &result {
            error!(error = %error, "Failed to handle request");
        }
        result
    }

    async fn run(&self, payload: Bytes) -> Result<Delivered, PressError> {
        let request = if self.base64_body {
            RenderRequest::from_base64(payload)
        } else {
            RenderRequest::new(payload)
        };

        let key = build_key(
            &fingerprint(request.payload()),
            request.project_name(),
            request.filename(),
        );
        Span::current().record("key", key.as_str());

        let rendered = if self.store.exists(key.as_str()).await? {
            info!("Found stored artifact");
            None
        } else {
            let document = request.document()?;
            let bytes = self.renderer.render(&document).await?;
            let size = bytes.len();

            let kept = (self.delivery == Delivery::Inline).then(|| bytes.clone());
            self.store.put(key.as_str(), bytes).await?;
            info!(bytes = size, "Stored new artifact");
            kept
        };

        self.deliver(&key, rendered).await
    }

    async fn deliver(
        &self,
        key: &CacheKey,
        rendered: Option<Vec<u8>>,
    ) -> Result<Delivered, PressError> {
        match self.delivery {
            Delivery::Url => {
                let signing_key = self.keys.signing_key().await?;
                let url = self.signer.sign(key.as_str(), &signing_key)?;
                info!(expires = url.expires, "Issued capability URL");
                Ok(Delivered::Url(url))
            }
            Delivery::Inline => match rendered {
                Some(bytes) => Ok(Delivered::Artifact(bytes)),
                None => self
                    .store
                    .get(key.as_str())
                    .await?
                    .map(Delivered::Artifact)
                    .ok_or_else(|| PressError::ArtifactMissing(key.to_string())),
            },
        }
    }
}
