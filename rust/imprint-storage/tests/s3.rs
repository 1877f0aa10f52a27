mod emulator;

use anyhow::Result;
use emulator::{ACCESS_KEY_ID, BUCKET, LocalS3, SECRET_ACCESS_KEY};
use imprint_storage::s3::{Address, Bucket, Credentials, Lookup, Session};
use imprint_storage::{ArtifactStore, StorageError};

fn credentials() -> Credentials {
    Credentials {
        access_key_id: ACCESS_KEY_ID.into(),
        secret_access_key: SECRET_ACCESS_KEY.into(),
        session_token: None,
    }
}

fn open(server: &LocalS3, lookup: Lookup) -> Bucket {
    Bucket::open(
        Address::new(&server.endpoint, "us-east-1", BUCKET),
        Session::new(credentials()),
    )
    .with_lookup(lookup)
}

#[tokio::test]
async fn it_stores_and_reads_back_an_object() -> Result<()> {
    let server = LocalS3::start().await?;
    let bucket = open(&server, Lookup::Head);

    bucket
        .put("9e107d9d372bb6826bd81d3542a419d6/generated.pdf", b"%PDF-1.4".to_vec())
        .await?;

    assert_eq!(
        bucket
            .get("9e107d9d372bb6826bd81d3542a419d6/generated.pdf")
            .await?,
        Some(b"%PDF-1.4".to_vec())
    );
    assert_eq!(
        server.keys().await,
        vec!["9e107d9d372bb6826bd81d3542a419d6/generated.pdf"]
    );
    Ok(())
}

#[tokio::test]
async fn it_reads_a_missing_object_as_none() -> Result<()> {
    let server = LocalS3::start().await?;
    let bucket = open(&server, Lookup::Head);

    assert_eq!(bucket.get("h/missing.pdf").await?, None);
    Ok(())
}

#[tokio::test]
async fn it_matches_keys_exactly_with_either_lookup() -> Result<()> {
    for lookup in [Lookup::Head, Lookup::List] {
        let server = LocalS3::start().await?;
        let bucket = open(&server, lookup);
        bucket.put("h/report-v2.pdf", b"v2".to_vec()).await?;

        assert!(bucket.exists("h/report-v2.pdf").await?, "{lookup:?}");
        assert!(!bucket.exists("h/report.pdf").await?, "{lookup:?}");
        assert!(!bucket.exists("h/report").await?, "{lookup:?}");
        assert!(!bucket.exists("h").await?, "{lookup:?}");

        bucket.put("h/report.pdf", b"v1".to_vec()).await?;
        assert!(bucket.exists("h/report.pdf").await?, "{lookup:?}");
    }
    Ok(())
}

#[tokio::test]
async fn it_follows_continuation_tokens_when_listing() -> Result<()> {
    let server = LocalS3::start_with_page_size(2).await?;
    let bucket = open(&server, Lookup::List);

    for suffix in ["", ".1", ".2", ".3", ".4"] {
        bucket
            .put(&format!("h/generated.pdf{suffix}"), b"x".to_vec())
            .await?;
    }

    assert!(bucket.exists("h/generated.pdf").await?);
    assert!(bucket.exists("h/generated.pdf.4").await?);
    assert!(!bucket.exists("h/generated.pdf.5").await?);
    assert!(server.list_requests().await >= 3);
    Ok(())
}

#[tokio::test]
async fn it_treats_repeated_puts_as_success() -> Result<()> {
    let server = LocalS3::start().await?;
    let bucket = open(&server, Lookup::Head);

    bucket.put("h/generated.pdf", b"same".to_vec()).await?;
    bucket.put("h/generated.pdf", b"same".to_vec()).await?;

    assert_eq!(bucket.get("h/generated.pdf").await?, Some(b"same".to_vec()));
    assert_eq!(server.keys().await.len(), 1);
    Ok(())
}

#[tokio::test]
async fn it_fails_with_wrong_credentials() -> Result<()> {
    let server = LocalS3::start().await?;
    let bucket = Bucket::open(
        Address::new(&server.endpoint, "us-east-1", BUCKET),
        Session::new(Credentials {
            access_key_id: ACCESS_KEY_ID.into(),
            secret_access_key: "not the secret".into(),
            session_token: None,
        }),
    );

    let result = bucket.put("h/generated.pdf", b"x".to_vec()).await;
    assert!(matches!(result, Err(StorageError::ServiceError(_))), "{result:?}");
    assert!(server.keys().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn it_reports_a_missing_bucket_when_listing() -> Result<()> {
    let server = LocalS3::start().await?;
    let bucket = Bucket::open(
        Address::new(&server.endpoint, "us-east-1", "no-such-bucket"),
        Session::new(credentials()),
    )
    .with_lookup(Lookup::List);

    let result = bucket.exists("h/generated.pdf").await;
    assert!(
        matches!(result, Err(StorageError::ServiceError(ref message)) if message.contains("NoSuchBucket")),
        "{result:?}"
    );
    Ok(())
}

#[tokio::test]
async fn it_fails_to_connect_to_a_closed_endpoint() -> Result<()> {
    let endpoint = {
        let server = LocalS3::start().await?;
        server.endpoint.clone()
    };
    // Give the accept loop a moment to wind down.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let bucket = Bucket::open(
        Address::new(endpoint, "us-east-1", BUCKET),
        Session::new(credentials()),
    );
    assert!(bucket.exists("h/generated.pdf").await.is_err());
    Ok(())
}
