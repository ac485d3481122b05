//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes for drafts, assets, and posts
//! - Identity middleware (caller identity is supplied by the upstream
//!   gateway; token internals live outside this service)
//! - Application state

pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use driftwood_core::asset::AssetStore;
use driftwood_core::draft::{HandleAllocator, InMemoryDraftRegistry};
use driftwood_core::publish::Publisher;
use driftwood_core::storage::OpendalStore;

/// Asset store over the production blob backend and repository.
pub type DbAssetStore = AssetStore<OpendalStore, driftwood_db::AssetRepository>;

/// Publisher over the production repositories and registry.
pub type DbPublisher = Publisher<
    OpendalStore,
    driftwood_db::AssetRepository,
    driftwood_db::PostRepository,
    InMemoryDraftRegistry,
>;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// Draft handle allocator.
    pub allocator: Arc<HandleAllocator>,
    /// Draft ownership registry.
    pub registry: Arc<InMemoryDraftRegistry>,
    /// Asset store.
    pub assets: Arc<DbAssetStore>,
    /// Finalization orchestrator.
    pub publisher: Arc<DbPublisher>,
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
