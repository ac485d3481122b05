//! API route definitions.

pub mod assets;
pub mod drafts;
pub mod health;
pub mod posts;

use axum::Router;
use axum::middleware::from_fn;

use crate::AppState;
use crate::middleware::identity_middleware;

/// Builds the `/api/v1` route tree.
pub fn api_routes() -> Router<AppState> {
    let protected = Router::new()
        .merge(drafts::routes())
        .merge(assets::routes())
        .merge(posts::routes())
        .layer(from_fn(identity_middleware));

    Router::new().merge(health::routes()).merge(protected)
}
