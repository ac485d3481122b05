//! Driftwood API Server
//!
//! Main entry point for the Driftwood backend service.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use driftwood_api::{AppState, create_router};
use driftwood_core::asset::{AssetStore, ReclaimQueue};
use driftwood_core::content::{Reconciler, ReferenceScanner};
use driftwood_core::draft::{HandleAllocator, InMemoryDraftRegistry};
use driftwood_core::publish::{ChannelScheduler, DraftSweeper, Publisher, spawn_reconcile_worker};
use driftwood_core::storage::{OpendalStore, StorageConfig, StorageProvider};
use driftwood_db::connect;
use driftwood_shared::config::StorageSettings;
use driftwood_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "driftwood=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Connect to database
    let db = connect(&config.database.url).await?;
    info!("Connected to database");

    // Blob storage
    let storage_config = StorageConfig::new(
        storage_provider(&config.storage)?,
        config.storage.public_base_url.clone(),
    )
    .with_max_file_size(config.storage.max_upload_size);
    let blob = Arc::new(OpendalStore::from_config(storage_config)?);
    info!(provider = blob.provider_name(), "Blob storage configured");

    // Core components
    let registry = Arc::new(InMemoryDraftRegistry::new());
    let allocator = Arc::new(HandleAllocator::new());
    let asset_repo = Arc::new(driftwood_db::AssetRepository::new(db.clone()));
    let post_repo = Arc::new(driftwood_db::PostRepository::new(db.clone()));
    let assets = Arc::new(AssetStore::new(blob, asset_repo));
    let reclaim = Arc::new(ReclaimQueue::new());

    // Post-commit reconciliation worker
    let (scheduler, committed_rx) = ChannelScheduler::new();
    let reconciler = Reconciler::new(
        ReferenceScanner::new(&config.storage.public_base_url),
        assets.clone(),
        reclaim.clone(),
    );
    spawn_reconcile_worker(committed_rx, reconciler);

    // Reclaim-queue drain loop
    {
        let assets = assets.clone();
        let reclaim = reclaim.clone();
        let every = std::time::Duration::from_secs(config.drafts.reclaim_interval_secs);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                reclaim.drain(&assets).await;
            }
        });
    }

    // Abandoned-draft sweeper
    let ttl = chrono::Duration::seconds(
        i64::try_from(config.drafts.ttl_secs).unwrap_or(i64::MAX),
    );
    DraftSweeper::new(registry.clone(), assets.clone(), reclaim.clone(), ttl).spawn(
        std::time::Duration::from_secs(config.drafts.sweep_interval_secs),
    );

    let publisher = Arc::new(Publisher::new(
        post_repo,
        assets.clone(),
        registry.clone(),
        Arc::new(scheduler),
        reclaim,
    ));

    // Create application state
    let state = AppState {
        db: Arc::new(db),
        allocator,
        registry,
        assets,
        publisher,
    };

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Maps flat storage settings onto the storage provider.
fn storage_provider(settings: &StorageSettings) -> anyhow::Result<StorageProvider> {
    match settings.backend.as_str() {
        "s3" => Ok(StorageProvider::s3(
            settings
                .endpoint
                .clone()
                .context("storage.endpoint is required for the s3 backend")?,
            settings
                .bucket
                .clone()
                .context("storage.bucket is required for the s3 backend")?,
            settings
                .access_key_id
                .clone()
                .context("storage.access_key_id is required for the s3 backend")?,
            settings
                .secret_access_key
                .clone()
                .context("storage.secret_access_key is required for the s3 backend")?,
            settings.region.clone().unwrap_or_else(|| "auto".to_string()),
        )),
        "azblob" => Ok(StorageProvider::azure_blob(
            settings
                .account
                .clone()
                .context("storage.account is required for the azblob backend")?,
            settings
                .access_key
                .clone()
                .context("storage.access_key is required for the azblob backend")?,
            settings
                .bucket
                .clone()
                .context("storage.bucket is required for the azblob backend")?,
        )),
        "fs" => Ok(StorageProvider::local_fs(
            settings.root.clone().unwrap_or_else(|| "./media".to_string()),
        )),
        other => anyhow::bail!("unknown storage backend: {other}"),
    }
}
