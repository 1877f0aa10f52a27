use anyhow::Result;
use clap::Parser;
use imprint_press::config::{Backend, ImprintCli};
use imprint_press::{Press, WkHtmlToPdf, service, telemetry};
use imprint_signer::{CapabilityUrlSigner, KeyCache, KeyMaterialProvider};
use imprint_storage::s3::{Address, Bucket};
use imprint_storage::{ArtifactStore, FileSystemStore, MemoryStore};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = ImprintCli::parse();
    telemetry::init(cli.log_level, cli.log_format)?;
    cli.validate()?;

    match cli.backend {
        Backend::S3 => {
            let bucket = |name: &str| {
                Bucket::open(
                    Address::new(&cli.s3_endpoint, &cli.region, name),
                    cli.session(),
                )
                .with_lookup(cli.lookup.into())
            };
            serve(&cli, bucket(&cli.bucket), bucket(&cli.keys_bucket)).await
        }
        Backend::Fs => {
            let artifacts = FileSystemStore::new(cli.fs_root.join(&cli.bucket)).await?;
            let keys = FileSystemStore::new(cli.fs_root.join(&cli.keys_bucket)).await?;
            serve(&cli, artifacts, keys).await
        }
        Backend::Memory => serve(&cli, MemoryStore::default(), MemoryStore::default()).await,
    }
}

async fn serve<Store>(cli: &ImprintCli, artifacts: Store, keys: Store) -> Result<()>
where
    Store: ArtifactStore + 'static,
{
    cli.seed_keys(&keys).await?;

    let signer = CapabilityUrlSigner::new(&cli.cdn_url, &cli.key_pair_id).with_ttl(cli.ttl);
    let keys = KeyCache::new(KeyMaterialProvider::new(keys, &cli.private_key_object));
    let press = Press::new(artifacts, WkHtmlToPdf::new(&cli.wkhtmltopdf), signer, keys)
        .with_delivery(cli.delivery)
        .with_base64_body(cli.base64_body);

    let listener = TcpListener::bind(cli.listen).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        backend = ?cli.backend,
        bucket = %cli.bucket,
        "Listening"
    );

    axum::serve(listener, service::router(press))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await?;
    Ok(())
}
