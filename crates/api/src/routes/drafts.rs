//! Draft handle routes.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use serde::Serialize;
use tracing::info;

use driftwood_core::draft::DraftRegistry;

use crate::{AppState, middleware::CurrentUser};

/// Creates the draft routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/drafts", post(allocate_draft))
}

/// Response for a freshly allocated draft handle.
#[derive(Debug, Serialize)]
pub struct DraftResponse {
    /// The placeholder id to stage uploads under.
    pub handle: i64,
}

/// POST `/drafts`
/// Allocate a draft handle and register it to the caller.
async fn allocate_draft(State(state): State<AppState>, user: CurrentUser) -> impl IntoResponse {
    let handle = state.allocator.allocate();
    state.registry.register(handle, user.user_id());

    info!(%handle, user_id = %user.user_id(), "draft handle allocated");

    (
        StatusCode::CREATED,
        Json(DraftResponse {
            handle: handle.into_inner(),
        }),
    )
        .into_response()
}
