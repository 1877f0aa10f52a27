//! Command-line and environment configuration.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use imprint_storage::s3::{Credentials, Lookup, Session};
use imprint_storage::{ArtifactStore, StorageError};
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::Delivery;

/// Where artifacts and the signing key are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// An S3-compatible object store
    S3,
    /// Directories below `--fs-root`
    Fs,
    /// Process memory; nothing survives a restart
    Memory,
}

/// How existence is checked in S3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LookupStrategy {
    /// `HEAD` the object
    Head,
    /// List keys sharing the key as prefix and look for an exact match
    List,
}

impl From<LookupStrategy> for Lookup {
    fn from(strategy: LookupStrategy) -> Self {
        match strategy {
            LookupStrategy::Head => Lookup::Head,
            LookupStrategy::List => Lookup::List,
        }
    }
}

/// Log line layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human readable single lines
    Compact,
    /// One JSON object per line
    Json,
}

/// Settings that parse but cannot work together, or startup steps they
/// describe that failed.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Signed URLs were requested from a backend that starts without a key
    #[error("The memory backend needs --private-key-file to deliver signed URLs")]
    MissingKeyFile,

    /// The private key file could not be read
    #[error("Could not read private key file '{path}': {source}")]
    KeyFile {
        /// Path of the file
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// The private key could not be stored
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Command-line arguments of the `imprint` server.
#[derive(Debug, Parser)]
#[command(name = "imprint", version, about = "Render-once PDF service handing out signed links")]
pub struct ImprintCli {
    /// Address to listen on.
    #[arg(long, env = "IMPRINT_LISTEN", default_value = "127.0.0.1:8080")]
    pub listen: SocketAddr,

    /// Storage backend for artifacts and the signing key.
    #[arg(long, env = "IMPRINT_BACKEND", value_enum, default_value_t = Backend::S3)]
    pub backend: Backend,

    /// Bucket that artifacts are stored in.
    #[arg(long, env = "BUCKET_NAME")]
    pub bucket: String,

    /// Bucket holding the CDN private key.
    #[arg(long, env = "APP_KEYS_BUCKET_NAME")]
    pub keys_bucket: String,

    /// Object name of the CDN private key (PEM) inside the keys bucket.
    #[arg(long, env = "CLOUDFRONT_PRIVATE_KEY_OBJECT_NAME")]
    pub private_key_object: String,

    /// PEM file stored into the keys bucket under `--private-key-object` at
    /// startup. The memory backend needs it to sign URLs.
    #[arg(long, env = "CLOUDFRONT_PRIVATE_KEY_FILE")]
    pub private_key_file: Option<PathBuf>,

    /// Base URL the CDN serves the artifact bucket under.
    #[arg(long, env = "CLOUDFRONT_PRIVATE_URL")]
    pub cdn_url: String,

    /// Id of the CDN key pair whose private key signs URLs.
    #[arg(long, env = "CLOUDFRONT_KEY_PAIR_ID")]
    pub key_pair_id: String,

    /// S3 endpoint.
    #[arg(long, env = "S3_ENDPOINT", default_value = "https://s3.amazonaws.com")]
    pub s3_endpoint: String,

    /// S3 signing region.
    #[arg(long, env = "AWS_REGION", default_value = "us-east-1")]
    pub region: String,

    /// S3 access key id; requests are sent unsigned without one.
    #[arg(long, env = "AWS_ACCESS_KEY_ID", requires = "secret_access_key")]
    pub access_key_id: Option<String>,

    /// S3 secret access key.
    #[arg(
        long,
        env = "AWS_SECRET_ACCESS_KEY",
        hide_env_values = true,
        requires = "access_key_id"
    )]
    pub secret_access_key: Option<String>,

    /// Session token of temporary S3 credentials.
    #[arg(long, env = "AWS_SESSION_TOKEN", hide_env_values = true)]
    pub session_token: Option<String>,

    /// How S3 existence checks are made.
    #[arg(long, env = "IMPRINT_LOOKUP", value_enum, default_value_t = LookupStrategy::Head)]
    pub lookup: LookupStrategy,

    /// Root directory of the file-system backend.
    #[arg(long, env = "IMPRINT_FS_ROOT", default_value = "./imprint-data")]
    pub fs_root: PathBuf,

    /// The wkhtmltopdf binary, or a directory containing it.
    #[arg(long, env = "WKHTMLTOPDF_PATH", default_value = "wkhtmltopdf")]
    pub wkhtmltopdf: PathBuf,

    /// Answer with a signed URL or with the PDF itself.
    #[arg(long, env = "IMPRINT_DELIVERY", value_enum, default_value_t = Delivery::Url)]
    pub delivery: Delivery,

    /// Request bodies arrive base64 encoded.
    #[arg(long, env = "IMPRINT_BASE64_BODY")]
    pub base64_body: bool,

    /// Seconds a signed URL stays valid.
    #[arg(long, env = "IMPRINT_URL_TTL", default_value_t = imprint_signer::DEFAULT_TTL)]
    pub ttl: u64,

    /// Default log level; `RUST_LOG` takes precedence.
    #[arg(long, env = "IMPRINT_LOG_LEVEL", default_value = "info")]
    pub log_level: LevelFilter,

    /// Log line layout.
    #[arg(long, env = "IMPRINT_LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

impl ImprintCli {
    /// Reject combinations that would fail on every request.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend == Backend::Memory
            && self.delivery == Delivery::Url
            && self.private_key_file.is_none()
        {
            return Err(ConfigError::MissingKeyFile);
        }
        Ok(())
    }

    /// Copy `--private-key-file` (when given) into `keys` under
    /// `--private-key-object`.
    pub async fn seed_keys<Store: ArtifactStore>(&self, keys: &Store) -> Result<(), ConfigError> {
        let Some(path) = &self.private_key_file else {
            return Ok(());
        };
        let pem = tokio::fs::read(path)
            .await
            .map_err(|source| ConfigError::KeyFile {
                path: path.clone(),
                source,
            })?;
        keys.put(&self.private_key_object, pem).await?;
        tracing::info!(object = %self.private_key_object, "Stored private key from file");
        Ok(())
    }

    /// The S3 session these arguments describe.
    pub fn session(&self) -> Session {
        match (&self.access_key_id, &self.secret_access_key) {
            (Some(access_key_id), Some(secret_access_key)) => Session::new(Credentials {
                access_key_id: access_key_id.clone(),
                secret_access_key: secret_access_key.clone(),
                session_token: self.session_token.clone(),
            }),
            _ => Session::public(),
        }
    }
}
