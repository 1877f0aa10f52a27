#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use imprint_common::FixedClock;
use imprint_press::{Document, Press, RenderError, Renderer};
use imprint_signer::{
    CapabilityUrlSigner, KeyCache, KeyMaterialProvider, SigningKey, generate_test_key, pkcs1_pem,
};
use imprint_storage::{ArtifactStore, MeasuredStore, MemoryStore};

pub const NOW: i64 = 1_700_000_000;
pub const CDN_URL: &str = "https://d111111abcdef8.cloudfront.net";
pub const KEY_PAIR_ID: &str = "K2JCJMDEHXQW5F";
pub const KEY_LOCATOR: &str = "cloudfront/private_key.pem";
pub const KEY_SEED: u64 = 7;

/// A renderer that counts its invocations and returns a fake PDF embedding
/// the body.
#[derive(Debug, Clone, Default)]
pub struct CountingRenderer {
    renders: Arc<AtomicUsize>,
    fail: bool,
}

impl CountingRenderer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn renders(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Renderer for CountingRenderer {
    async fn render(&self, document: &Document) -> Result<Vec<u8>, RenderError> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(RenderError::Failed {
                status: "exit status: 1".into(),
                stderr: "boom".into(),
            });
        }
        Ok(format!("%PDF-1.4 {}", document.body).into_bytes())
    }
}

pub type TestPress = Press<MeasuredStore<MemoryStore>, CountingRenderer, MemoryStore>;

pub struct Harness {
    pub press: TestPress,
    pub store: MeasuredStore<MemoryStore>,
    pub renderer: CountingRenderer,
    pub key: SigningKey,
}

/// A press over memory stores with the signing key in place and the clock
/// pinned at [NOW].
pub async fn harness(renderer: CountingRenderer) -> Result<Harness> {
    let key = generate_test_key(KEY_SEED);

    let secrets = MemoryStore::default();
    secrets
        .put(KEY_LOCATOR, pkcs1_pem(&key)?.into_bytes())
        .await?;

    let store = MeasuredStore::new(MemoryStore::default());
    let signer = CapabilityUrlSigner::new(CDN_URL, KEY_PAIR_ID)
        .with_clock(FixedClock::at_epoch_seconds(NOW));
    let keys = KeyCache::new(KeyMaterialProvider::new(secrets, KEY_LOCATOR));

    Ok(Harness {
        press: Press::new(store.clone(), renderer.clone(), signer, keys),
        store,
        renderer,
        key: SigningKey::from_rsa(key)?,
    })
}

/// The `Expires` value of a signed URL.
pub fn expires_of(url: &str) -> Option<i64> {
    url.split(['?', '&'])
        .find_map(|pair| pair.strip_prefix("Expires="))
        .and_then(|value| value.parse().ok())
}
