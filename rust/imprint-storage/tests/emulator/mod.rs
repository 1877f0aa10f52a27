//! In-memory S3-compatible server for integration tests.
//!
//! Requests are authenticated with SigV4, so every test that talks to it also
//! verifies the presigning done by `imprint_storage::s3`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;
use bytes::Bytes;
use hyper::server::conn::http1;
use hyper_util::rt::TokioIo;
use hyper_util::service::TowerToHyperService;
use s3s::dto::{
    ETag, GetObjectInput, GetObjectOutput, HeadObjectInput, HeadObjectOutput, ListObjectsV2Input,
    ListObjectsV2Output, Object, PutObjectInput, PutObjectOutput, StreamingBlob, Timestamp,
};
use s3s::service::S3ServiceBuilder;
use s3s::{S3, S3Request, S3Response, S3Result, s3_error};
use tokio::net::TcpListener;
use tokio::sync::RwLock;

pub const ACCESS_KEY_ID: &str = "test-access-key";
pub const SECRET_ACCESS_KEY: &str = "test-secret-key";
pub const BUCKET: &str = "artifacts";

/// A running emulator. The server stops when this is dropped.
pub struct LocalS3 {
    /// The endpoint URL where the server is listening
    pub endpoint: String,
    storage: InMemoryS3,
    _shutdown: tokio::sync::oneshot::Sender<()>,
}

impl LocalS3 {
    /// Start an authenticated emulator holding one empty bucket.
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_with_page_size(1000).await
    }

    /// Like [LocalS3::start], returning at most `page_size` keys per
    /// ListObjectsV2 page.
    pub async fn start_with_page_size(page_size: usize) -> anyhow::Result<Self> {
        let storage = InMemoryS3 {
            page_size,
            ..Default::default()
        };
        storage.create_bucket(BUCKET).await;

        let mut builder = S3ServiceBuilder::new(storage.clone());
        builder.set_auth(s3s::auth::SimpleAuth::from_single(
            ACCESS_KEY_ID,
            SECRET_ACCESS_KEY,
        ));
        let service = builder.build();

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let endpoint = format!("http://{}", listener.local_addr()?);

        let (shutdown_tx, mut shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    result = listener.accept() => {
                        if let Ok((stream, _)) = result {
                            let hyper_service = TowerToHyperService::new(service.clone());
                            tokio::spawn(async move {
                                let _ = http1::Builder::new()
                                    .serve_connection(TokioIo::new(stream), hyper_service)
                                    .await;
                            });
                        }
                    }
                }
            }
        });

        Ok(Self {
            endpoint,
            storage,
            _shutdown: shutdown_tx,
        })
    }

    /// Keys currently stored in the bucket, sorted.
    pub async fn keys(&self) -> Vec<String> {
        let buckets = self.storage.buckets.read().await;
        let mut keys: Vec<String> = buckets
            .get(BUCKET)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    /// Number of ListObjectsV2 requests served so far.
    pub async fn list_requests(&self) -> usize {
        *self.storage.list_requests.read().await
    }
}

#[derive(Clone)]
struct StoredObject {
    data: Vec<u8>,
    e_tag: String,
    last_modified: Timestamp,
}

/// Structure: bucket_name -> key -> StoredObject
#[derive(Clone, Default)]
struct InMemoryS3 {
    buckets: Arc<RwLock<HashMap<String, HashMap<String, StoredObject>>>>,
    list_requests: Arc<RwLock<usize>>,
    page_size: usize,
}

impl InMemoryS3 {
    async fn create_bucket(&self, bucket: &str) {
        self.buckets
            .write()
            .await
            .entry(bucket.to_string())
            .or_default();
    }
}

#[async_trait]
impl S3 for InMemoryS3 {
    async fn get_object(
        &self,
        req: S3Request<GetObjectInput>,
    ) -> S3Result<S3Response<GetObjectOutput>> {
        let buckets = self.buckets.read().await;
        let bucket = buckets
            .get(&req.input.bucket)
            .ok_or_else(|| s3_error!(NoSuchBucket))?;
        let object = bucket
            .get(&req.input.key)
            .ok_or_else(|| s3_error!(NoSuchKey))?;

        let body = s3s::Body::from(Bytes::from(object.data.clone()));
        Ok(S3Response::new(GetObjectOutput {
            body: Some(StreamingBlob::from(body)),
            content_length: Some(object.data.len() as i64),
            e_tag: Some(ETag::Strong(object.e_tag.clone())),
            last_modified: Some(object.last_modified.clone()),
            ..Default::default()
        }))
    }

    async fn put_object(
        &self,
        req: S3Request<PutObjectInput>,
    ) -> S3Result<S3Response<PutObjectOutput>> {
        let bucket = req.input.bucket.clone();
        let key = req.input.key.clone();

        let mut data = Vec::new();
        if let Some(mut body) = req.input.body {
            use futures_util::StreamExt;
            while let Some(chunk) = body.next().await {
                if let Ok(bytes) = chunk {
                    data.extend_from_slice(&bytes);
                }
            }
        }

        let e_tag = format!("{:x}", md5::compute(&data));
        let stored = StoredObject {
            data,
            e_tag: e_tag.clone(),
            last_modified: Timestamp::from(SystemTime::now()),
        };

        let mut buckets = self.buckets.write().await;
        buckets
            .get_mut(&bucket)
            .ok_or_else(|| s3_error!(NoSuchBucket))?
            .insert(key, stored);

        Ok(S3Response::new(PutObjectOutput {
            e_tag: Some(ETag::Strong(e_tag)),
            ..Default::default()
        }))
    }

    async fn head_object(
        &self,
        req: S3Request<HeadObjectInput>,
    ) -> S3Result<S3Response<HeadObjectOutput>> {
        let buckets = self.buckets.read().await;
        let object = buckets
            .get(&req.input.bucket)
            .and_then(|bucket| bucket.get(&req.input.key))
            .ok_or_else(|| s3_error!(NoSuchKey))?;

        Ok(S3Response::new(HeadObjectOutput {
            content_length: Some(object.data.len() as i64),
            e_tag: Some(ETag::Strong(object.e_tag.clone())),
            last_modified: Some(object.last_modified.clone()),
            ..Default::default()
        }))
    }

    async fn list_objects_v2(
        &self,
        req: S3Request<ListObjectsV2Input>,
    ) -> S3Result<S3Response<ListObjectsV2Output>> {
        *self.list_requests.write().await += 1;

        let prefix = req.input.prefix.as_deref().unwrap_or("");
        let buckets = self.buckets.read().await;
        let bucket = buckets
            .get(&req.input.bucket)
            .ok_or_else(|| s3_error!(NoSuchBucket))?;

        let mut keys: Vec<&String> = bucket.keys().filter(|key| key.starts_with(prefix)).collect();
        keys.sort();

        // Continuation tokens are the last key of the previous page.
        if let Some(after) = req.input.continuation_token.as_deref() {
            keys.retain(|key| key.as_str() > after);
        }

        let is_truncated = keys.len() > self.page_size;
        keys.truncate(self.page_size);

        let next_continuation_token = if is_truncated {
            keys.last().map(|key| key.to_string())
        } else {
            None
        };

        let contents = keys
            .into_iter()
            .map(|key| Object {
                key: Some(key.clone()),
                size: bucket.get(key).map(|object| object.data.len() as i64),
                ..Default::default()
            })
            .collect();

        Ok(S3Response::new(ListObjectsV2Output {
            contents: Some(contents),
            is_truncated: Some(is_truncated),
            next_continuation_token,
            ..Default::default()
        }))
    }
}
