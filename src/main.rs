use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::{io::ErrorKind, str::FromStr, sync::Arc};
use tokio::{net::TcpListener, signal};
use tracing_subscriber::EnvFilter;

mod config;
mod errors;
mod handlers;
mod models;
mod routes;
mod services;

use config::{AppConfig, StorageBackend};
use services::{
    local_store::LocalObjectStore, metadata_store::MetadataStore, object_store::ObjectStore,
    photo_service::PhotoService, s3_store::S3ObjectStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // --- Parse config + migrate flag ---
    let (cfg, migrate) = AppConfig::from_env_and_args()?;

    tracing::info!("Starting pixly with config: {:?}", cfg);

    // --- Initialize SQLite connection ---
    let connect_options = SqliteConnectOptions::from_str(&cfg.database_url)
        .with_context(|| format!("parsing DATABASE_URL `{}`", cfg.database_url))?
        .create_if_missing(true);

    // Create parent directory if needed
    let db_path = connect_options.get_filename();
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
            tracing::info!("Created missing directory {:?}", parent);
        }
    }

    let db: Arc<sqlx::Pool<sqlx::Sqlite>> = Arc::new(
        SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await
            .context("connecting to the metadata database")?,
    );

    // --- Handle migration mode ---
    if migrate {
        services::metadata_store::run_migrations(&db).await?;
        tracing::info!("Database migration complete.");
        return Ok(()); // exit after migration
    }

    // --- Initialize object store ---
    let objects: Arc<dyn ObjectStore> = match cfg.storage_backend {
        StorageBackend::S3 => Arc::new(
            S3ObjectStore::from_env(
                &cfg.bucket_name,
                cfg.s3_endpoint.as_deref(),
                cfg.public_base_url.as_deref(),
            )
            .await,
        ),
        StorageBackend::Local => Arc::new(LocalObjectStore::new(
            &cfg.storage_dir,
            &cfg.bucket_name,
            cfg.public_base_url.clone(),
        )),
    };
    tracing::info!(
        "Using {:?} object store, bucket `{}`",
        cfg.storage_backend,
        cfg.bucket_name
    );

    // --- Build router ---
    let service = PhotoService::new(MetadataStore::new(db), objects);
    let app = routes::routes::app(service, cfg.max_upload_bytes);

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
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
