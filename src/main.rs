use anyhow::{Context, Result};
use object_share::{
    app,
    config::AppConfig,
    services::{
        object_store::S3ObjectStore,
        registry::UploadRegistry,
        share_service::ShareService,
        token_service::TokenAuthority,
    },
};
use std::{io::ErrorKind, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config ---
    let cfg = AppConfig::from_env_and_args()?;

    tracing::info!("Starting object-share with config: {:?}", cfg);

    let tokens = TokenAuthority::new(cfg.token_secret.clone());
    if !tokens.is_configured() {
        tracing::warn!("SECRET_TOKEN is not set; uploads, downloads and deletes will fail");
    }

    // --- Object store + service ---
    let store = S3ObjectStore::new(&cfg.s3).context("configuring object store client")?;
    let service = ShareService::new(
        Arc::new(store),
        Arc::new(UploadRegistry::new()),
        tokens,
        cfg.links,
    );

    if cfg.ensure_bucket_on_start {
        let created = service
            .ensure_bucket()
            .await
            .with_context(|| format!("ensuring bucket `{}` exists", cfg.s3.bucket))?;
        if created {
            tracing::info!("Created bucket {}", cfg.s3.bucket);
        } else {
            tracing::debug!("Bucket {} already exists", cfg.s3.bucket);
        }
    }

    // --- Build router ---
    let router = app(service, cfg.max_upload_bytes);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router).await?;

    Ok(())
}
