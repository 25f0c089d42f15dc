mod config;

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use storefront_api::blob::{BlobStore, HttpBlobStore, LocalBlobStore};
use storefront_api::{AppState, AppStateInner, auth, build_router};
use storefront_db::Database;

use crate::config::{BlobBackend, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storefront=debug,tower_http=debug".into()),
        )
        .init();

    let config = ServerConfig::from_env();
    if config.has_placeholder_secret() {
        warn!("STOREFRONT_JWT_SECRET is unset or a placeholder; tokens can be forged. Set it before deploying.");
    }

    let db = Database::open(&config.db_path)?;

    if let Some(admin) = &config.admin {
        auth::ensure_superadmin(&db, &admin.username, &admin.password, &admin.email)
            .context("Failed to seed admin account")?;
    }

    let blobs: Arc<dyn BlobStore> = match config.blob_backend {
        BlobBackend::Local => {
            Arc::new(LocalBlobStore::new(config.media_dir.clone(), config.public_url.clone()).await?)
        }
        BlobBackend::Http => {
            let endpoint = config
                .blob_endpoint
                .clone()
                .context("STOREFRONT_BLOB_ENDPOINT is required for the http blob backend")?;
            info!("Using remote blob store at {}", endpoint);
            Arc::new(HttpBlobStore::new(endpoint, config.blob_token.clone().unwrap_or_default()))
        }
    };

    let state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret: config.jwt_secret.clone(),
        blobs,
    });

    let media_dir = (config.blob_backend == BlobBackend::Local).then_some(config.media_dir.as_path());
    let app = build_router(state, media_dir);

    let listener = config.bind().await?;
    info!("Storefront server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
