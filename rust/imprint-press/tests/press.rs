mod fixtures;

use anyhow::Result;
use bytes::Bytes;
use fixtures::{CDN_URL, CountingRenderer, KEY_PAIR_ID, NOW, expires_of, harness};
use imprint_press::{Delivered, Delivery, PressError, fingerprint};
use imprint_signer::{CannedPolicy, SigningError};
use imprint_storage::ArtifactStore;
use pretty_assertions::assert_eq;

const PAYLOAD: &[u8] = b"body=%3Chtml%3EHi%3C%2Fhtml%3E";

fn url_of(delivered: Delivered) -> Result<String> {
    match delivered {
        Delivered::Url(url) => Ok(url.to_string()),
        Delivered::Artifact(_) => Err(anyhow::anyhow!("expected a URL")),
    }
}

#[tokio::test]
async fn it_renders_once_and_signs_every_time() -> Result<()> {
    let harness = harness(CountingRenderer::default()).await?;
    let key = format!("{}/generated.pdf", fingerprint(PAYLOAD));

    let first = url_of(harness.press.handle(Bytes::from_static(PAYLOAD)).await?)?;

    assert_eq!(harness.renderer.renders(), 1);
    assert_eq!(harness.store.inner().keys().await, vec![key.clone()]);
    assert_eq!(
        harness.store.get(&key).await?,
        Some(b"%PDF-1.4 <html>Hi</html>".to_vec())
    );
    assert!(first.starts_with(&format!("{CDN_URL}/{key}?Expires=")));
    assert!(first.ends_with(&format!("&Key-Pair-Id={KEY_PAIR_ID}")));
    assert_eq!(expires_of(&first), Some(NOW + 900));

    let second = url_of(harness.press.handle(Bytes::from_static(PAYLOAD)).await?)?;

    assert_eq!(harness.renderer.renders(), 1);
    assert_eq!(harness.store.writes(), 1);
    assert_eq!(second, first);
    Ok(())
}

#[tokio::test]
async fn it_signs_a_policy_the_cdn_can_verify() -> Result<()> {
    use base64::Engine;
    use signature::Verifier;

    let harness = harness(CountingRenderer::default()).await?;
    let Delivered::Url(url) = harness.press.handle(Bytes::from_static(PAYLOAD)).await? else {
        anyhow::bail!("expected a URL");
    };

    assert!(!url.signature.contains(['+', '/', '=']));
    let signature: String = url
        .signature
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '=',
            '~' => '/',
            other => other,
        })
        .collect();
    let signature = base64::engine::general_purpose::STANDARD.decode(signature)?;
    let signature = rsa::pkcs1v15::Signature::try_from(signature.as_slice())?;

    let policy = CannedPolicy::new(url.resource.clone(), url.expires).to_json()?;
    harness
        .key
        .verifying_key()
        .verify(policy.as_bytes(), &signature)?;
    Ok(())
}

#[tokio::test]
async fn it_places_named_artifacts_in_their_project() -> Result<()> {
    let harness = harness(CountingRenderer::default()).await?;
    let payload = b"body=x&project_name=acme&filename=invoice-42.pdf";

    let url = url_of(harness.press.handle(Bytes::from_static(payload)).await?)?;

    let key = format!("acme/{}/invoice-42.pdf", fingerprint(payload));
    assert_eq!(harness.store.inner().keys().await, vec![key.clone()]);
    assert!(url.starts_with(&format!("{CDN_URL}/{key}?")));
    Ok(())
}

#[tokio::test]
async fn it_is_not_fooled_by_keys_sharing_a_prefix() -> Result<()> {
    let harness = harness(CountingRenderer::default()).await?;
    let key = format!("{}/generated.pdf", fingerprint(PAYLOAD));
    harness
        .store
        .put(&format!("{key}.old"), b"stale".to_vec())
        .await?;

    harness.press.handle(Bytes::from_static(PAYLOAD)).await?;

    assert_eq!(harness.renderer.renders(), 1);
    assert!(harness.store.exists(&key).await?);
    Ok(())
}

#[tokio::test]
async fn it_delivers_artifacts_inline() -> Result<()> {
    let harness = harness(CountingRenderer::default()).await?;
    let press = harness.press.clone().with_delivery(Delivery::Inline);

    let rendered = press.handle(Bytes::from_static(PAYLOAD)).await?;
    let stored = press.handle(Bytes::from_static(PAYLOAD)).await?;

    let expected = Delivered::Artifact(b"%PDF-1.4 <html>Hi</html>".to_vec());
    assert_eq!(rendered, expected);
    assert_eq!(stored, expected);
    assert_eq!(harness.renderer.renders(), 1);
    assert_eq!(harness.store.reads(), 1);
    Ok(())
}

#[tokio::test]
async fn it_reads_base64_wrapped_payloads() -> Result<()> {
    use base64::Engine;

    let harness = harness(CountingRenderer::default()).await?;
    let press = harness.press.clone().with_base64_body(true);
    let payload = base64::engine::general_purpose::STANDARD.encode("body=hi&filename=b64.pdf");

    press.handle(Bytes::from(payload.clone())).await?;

    // Fingerprinted as received, parameters read after decoding
    assert_eq!(
        harness.store.inner().keys().await,
        vec![format!("{}/b64.pdf", fingerprint(payload.as_bytes()))]
    );
    Ok(())
}

#[tokio::test]
async fn it_refuses_to_render_without_a_body() -> Result<()> {
    let harness = harness(CountingRenderer::default()).await?;

    let result = harness
        .press
        .handle(Bytes::from_static(b"filename=a.pdf"))
        .await;

    assert!(matches!(result, Err(PressError::InvalidRequest(_))));
    assert_eq!(harness.renderer.renders(), 0);
    assert!(harness.store.inner().is_empty().await);
    Ok(())
}

#[tokio::test]
async fn it_stores_nothing_when_rendering_fails() -> Result<()> {
    let harness = harness(CountingRenderer::failing()).await?;

    let result = harness.press.handle(Bytes::from_static(PAYLOAD)).await;

    assert!(matches!(result, Err(PressError::Render(_))));
    assert_eq!(harness.store.writes(), 0);
    Ok(())
}

#[tokio::test]
async fn it_surfaces_a_missing_signing_key() -> Result<()> {
    use imprint_common::FixedClock;
    use imprint_press::Press;
    use imprint_signer::{CapabilityUrlSigner, KeyCache, KeyMaterialProvider};
    use imprint_storage::MemoryStore;

    let store = MemoryStore::default();
    let press = Press::new(
        store.clone(),
        CountingRenderer::default(),
        CapabilityUrlSigner::new(CDN_URL, KEY_PAIR_ID).with_clock(FixedClock::at_epoch_seconds(NOW)),
        KeyCache::new(KeyMaterialProvider::new(MemoryStore::default(), "missing.pem")),
    );

    let result = press.handle(Bytes::from_static(PAYLOAD)).await;

    assert!(matches!(
        result,
        Err(PressError::Signing(SigningError::KeyNotFound(_)))
    ));
    // The artifact is kept; the next request only needs to sign
    assert_eq!(store.len().await, 1);
    Ok(())
}

#[tokio::test]
async fn it_tolerates_identical_concurrent_requests() -> Result<()> {
    let harness = harness(CountingRenderer::default()).await?;

    let tasks: Vec<_> = (0..4)
        .map(|_| {
            let press = harness.press.clone();
            tokio::spawn(async move { press.handle(Bytes::from_static(PAYLOAD)).await })
        })
        .collect();

    let mut urls = Vec::new();
    for task in tasks {
        urls.push(url_of(task.await??)?);
    }

    urls.dedup();
    assert_eq!(urls.len(), 1);
    assert_eq!(harness.store.inner().len().await, 1);
    assert!(harness.renderer.renders() >= 1);
    Ok(())
}
