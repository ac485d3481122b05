//! Post lifecycle routes: finalize, read, edit, delete.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};

use driftwood_core::publish::{NewPost, Post, PostKind, PublishError};
use driftwood_shared::types::{DraftHandle, ResourceId};

use crate::{AppState, middleware::CurrentUser};

use super::assets::draft_error_response;

/// Creates the post routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/posts", post(finalize_post))
        .route("/posts/{post_id}", get(get_post))
        .route("/posts/{post_id}", put(update_post))
        .route("/posts/{post_id}", delete(delete_post))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for finalizing a draft into a post.
#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    /// Draft handle the client staged uploads under.
    pub handle: i64,
    /// Post kind: `community` or `notice`.
    pub kind: String,
    /// Title.
    pub title: String,
    /// Rendered content embedding public asset URLs.
    pub content: String,
}

/// Request body for editing post content.
#[derive(Debug, Deserialize)]
pub struct UpdatePostRequest {
    /// New rendered content.
    pub content: String,
}

/// Response for a post.
#[derive(Debug, Serialize)]
pub struct PostResponse {
    /// Post ID.
    pub id: i64,
    /// Post kind.
    pub kind: String,
    /// Authoring user id.
    pub author_id: i64,
    /// Title.
    pub title: String,
    /// Rendered content.
    pub content: String,
    /// Created at timestamp (ISO 8601).
    pub created_at: String,
    /// Updated at timestamp (ISO 8601).
    pub updated_at: String,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        Self {
            id: post.id.into_inner(),
            kind: post.kind.as_str().to_string(),
            author_id: post.author_id.into_inner(),
            title: post.title,
            content: post.content,
            created_at: post.created_at.to_rfc3339(),
            updated_at: post.updated_at.to_rfc3339(),
        }
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/posts`
/// Finalize a draft: persist the post, claim its staged assets, release the
/// handle, and schedule orphan reconciliation.
async fn finalize_post(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<CreatePostRequest>,
) -> Response {
    let Some(handle) = DraftHandle::from_raw(payload.handle) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "validation_error",
                "message": "handle must be a negative draft id"
            })),
        )
            .into_response();
    };
    let Some(kind) = PostKind::parse(&payload.kind) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "validation_error",
                "message": format!("unknown post kind: {}", payload.kind)
            })),
        )
            .into_response();
    };

    let fields = NewPost {
        kind,
        author_id: user.user_id(),
        title: payload.title,
        content: payload.content,
    };

    match state.publisher.finalize(handle, user.user_id(), fields).await {
        Ok(post) => {
            info!(post_id = %post.id, %handle, user_id = %user.user_id(), "post finalized");
            (StatusCode::CREATED, Json(PostResponse::from(post))).into_response()
        }
        Err(e) => {
            error!(error = %e, %handle, "failed to finalize post");
            publish_error_response(&e)
        }
    }
}

/// GET `/posts/{post_id}`
async fn get_post(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(post_id): Path<i64>,
) -> Response {
    match state.publisher.get(ResourceId::new(post_id)).await {
        Ok(post) => (StatusCode::OK, Json(PostResponse::from(post))).into_response(),
        Err(e) => publish_error_response(&e),
    }
}

/// PUT `/posts/{post_id}`
/// Persist new content and schedule reconciliation of removed embeds.
async fn update_post(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(post_id): Path<i64>,
    Json(payload): Json<UpdatePostRequest>,
) -> Response {
    match state
        .publisher
        .update_content(ResourceId::new(post_id), payload.content)
        .await
    {
        Ok(post) => {
            info!(post_id = %post.id, "post updated");
            (StatusCode::OK, Json(PostResponse::from(post))).into_response()
        }
        Err(e) => {
            error!(error = %e, post_id, "failed to update post");
            publish_error_response(&e)
        }
    }
}

/// DELETE `/posts/{post_id}`
/// Delete a post, cascade-deleting its assets.
async fn delete_post(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(post_id): Path<i64>,
) -> Response {
    match state.publisher.delete(ResourceId::new(post_id)).await {
        Ok(removed) => {
            info!(post_id, deleted_assets = removed, "post deleted");
            (StatusCode::OK, Json(json!({ "deleted_assets": removed }))).into_response()
        }
        Err(e) => {
            error!(error = %e, post_id, "failed to delete post");
            publish_error_response(&e)
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Maps orchestrator failures onto transport status codes.
fn publish_error_response(e: &PublishError) -> Response {
    match e {
        PublishError::Draft(draft) => draft_error_response(draft),
        PublishError::PostNotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "not_found",
                "message": "Post not found"
            })),
        )
            .into_response(),
        PublishError::Validation(message) => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "validation_error",
                "message": message
            })),
        )
            .into_response(),
        PublishError::Asset(_) | PublishError::Repository(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "internal_error",
                "message": "An error occurred"
            })),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use driftwood_core::draft::DraftError;

    #[test]
    fn test_publish_error_mapping() {
        let handle = DraftHandle::from_raw(-1).unwrap();

        let response =
            publish_error_response(&PublishError::Draft(DraftError::HandleNotFound(handle)));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = publish_error_response(&PublishError::Draft(DraftError::NotOwner(handle)));
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = publish_error_response(&PublishError::PostNotFound(ResourceId::new(1)));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = publish_error_response(&PublishError::validation("empty title"));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = publish_error_response(&PublishError::repository("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_post_response_from_post() {
        let now = chrono::Utc::now();
        let post = Post {
            id: ResourceId::new(55),
            kind: PostKind::Community,
            author_id: driftwood_shared::types::UserId::new(10),
            title: "Harbor at dusk".to_string(),
            content: "<p>hi</p>".to_string(),
            created_at: now,
            updated_at: now,
        };

        let response = PostResponse::from(post);
        assert_eq!(response.id, 55);
        assert_eq!(response.kind, "community");
        assert_eq!(response.created_at, now.to_rfc3339());
    }
}
