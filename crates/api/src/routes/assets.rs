//! Asset upload and listing routes.

use axum::{
    Json, Router,
    extract::{Multipart, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};

use driftwood_core::asset::{Asset, AssetError, TargetKind, UploadInput};
use driftwood_core::draft::{DraftError, DraftRegistry};
use driftwood_core::storage::StorageError;
use driftwood_shared::types::TargetRef;

use crate::{AppState, middleware::CurrentUser};

/// Creates the asset routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/assets", post(upload_asset))
        .route("/assets", get(list_assets))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listing assets.
#[derive(Debug, Deserialize)]
pub struct ListAssetsQuery {
    /// Target kind tag.
    pub target_kind: String,
    /// Target id (draft handle or real resource id).
    pub target_id: i64,
}

/// Response for an asset.
#[derive(Debug, Serialize)]
pub struct AssetResponse {
    /// Asset ID.
    pub id: i64,
    /// Target id the asset is attached to.
    pub target_id: i64,
    /// Full public URL.
    pub public_url: String,
    /// Original filename.
    pub file_name: String,
    /// MIME type.
    pub content_type: String,
    /// File size in bytes.
    pub file_size: i64,
    /// Created at timestamp (ISO 8601).
    pub created_at: String,
}

impl AssetResponse {
    fn from_asset(asset: Asset, public_url: String) -> Self {
        Self {
            id: asset.id.into_inner(),
            target_id: asset.target.as_i64(),
            public_url,
            file_name: asset.file_name,
            content_type: asset.content_type,
            file_size: asset.file_size,
            created_at: asset.created_at.to_rfc3339(),
        }
    }
}

/// Parsed multipart upload form.
struct UploadForm {
    target_kind: TargetKind,
    target: TargetRef,
    file_name: String,
    content_type: String,
    bytes: Bytes,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/assets` (multipart: `target_kind`, `target_id`, `file`)
/// Upload an asset for a draft or persisted target.
async fn upload_asset(
    State(state): State<AppState>,
    user: CurrentUser,
    multipart: Multipart,
) -> Response {
    let form = match read_upload_form(multipart).await {
        Ok(form) => form,
        Err(response) => return response,
    };

    // Uploads staged under a draft handle require ownership of that handle.
    if let TargetRef::Draft(handle) = form.target {
        if let Err(e) = state.registry.validate(handle, user.user_id()) {
            return draft_error_response(&e);
        }
    }

    let input = UploadInput {
        target_kind: form.target_kind,
        target: form.target,
        owner_email: user.email().to_string(),
        file_name: form.file_name,
        content_type: form.content_type,
        bytes: form.bytes,
    };

    match state.assets.upload(input).await {
        Ok(stored) => {
            info!(
                asset_id = %stored.asset.id,
                target = %stored.asset.target,
                user_id = %user.user_id(),
                "asset uploaded"
            );
            (
                StatusCode::CREATED,
                Json(json!({
                    "asset_id": stored.asset.id.into_inner(),
                    "public_url": stored.public_url,
                })),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "failed to upload asset");
            asset_error_response(&e)
        }
    }
}

/// GET `/assets?target_kind=&target_id=`
/// List assets attached to one target.
async fn list_assets(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<ListAssetsQuery>,
) -> Response {
    let Some(kind) = TargetKind::parse(&query.target_kind) else {
        return validation_response(&format!("unknown target kind: {}", query.target_kind));
    };
    let target = TargetRef::from_i64(query.target_id);

    match state.assets.list_by_target(kind, target).await {
        Ok(assets) => {
            let items: Vec<AssetResponse> = assets
                .into_iter()
                .map(|asset| {
                    let url = state.assets.public_url(&asset.blob_key);
                    AssetResponse::from_asset(asset, url)
                })
                .collect();
            (StatusCode::OK, Json(json!({ "assets": items }))).into_response()
        }
        Err(e) => {
            error!(error = %e, "failed to list assets");
            internal_error_response()
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Reads and validates the multipart upload form.
async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, Response> {
    let mut target_kind = None;
    let mut target_id = None;
    let mut file = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(validation_response(&format!("malformed multipart body: {e}"))),
        };

        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "target_kind" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| validation_response(&format!("invalid target_kind field: {e}")))?;
                target_kind = TargetKind::parse(&text);
                if target_kind.is_none() {
                    return Err(validation_response(&format!("unknown target kind: {text}")));
                }
            }
            "target_id" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| validation_response(&format!("invalid target_id field: {e}")))?;
                let raw: i64 = text
                    .parse()
                    .map_err(|_| validation_response("target_id must be an integer"))?;
                target_id = Some(raw);
            }
            "file" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| validation_response(&format!("failed to read file: {e}")))?;
                file = Some((file_name, content_type, bytes));
            }
            _ => {}
        }
    }

    let (Some(target_kind), Some(target_id), Some((file_name, content_type, bytes))) =
        (target_kind, target_id, file)
    else {
        return Err(validation_response(
            "target_kind, target_id and file fields are required",
        ));
    };

    Ok(UploadForm {
        target_kind,
        target: TargetRef::from_i64(target_id),
        file_name,
        content_type,
        bytes,
    })
}

fn validation_response(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": "validation_error",
            "message": message
        })),
    )
        .into_response()
}

fn internal_error_response() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": "internal_error",
            "message": "An error occurred"
        })),
    )
        .into_response()
}

/// Maps draft registry failures on the upload path.
pub(crate) fn draft_error_response(e: &DraftError) -> Response {
    match e {
        DraftError::HandleNotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "draft_not_found",
                "message": "Draft handle is unknown or expired"
            })),
        )
            .into_response(),
        DraftError::NotOwner(_) => (
            StatusCode::FORBIDDEN,
            Json(json!({
                "error": "forbidden",
                "message": "Draft handle belongs to another user"
            })),
        )
            .into_response(),
    }
}

/// Maps asset store failures on the upload path.
fn asset_error_response(e: &AssetError) -> Response {
    match e {
        AssetError::Storage(StorageError::FileTooLarge { .. }) => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "file_too_large",
                "message": e.to_string()
            })),
        )
            .into_response(),
        AssetError::Storage(StorageError::InvalidMimeType { .. }) => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_mime_type",
                "message": e.to_string()
            })),
        )
            .into_response(),
        AssetError::Storage(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "storage_error",
                "message": "Storage operation failed"
            })),
        )
            .into_response(),
        AssetError::NotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "not_found",
                "message": "Asset not found"
            })),
        )
            .into_response(),
        AssetError::UnknownTargetKind(_) | AssetError::Repository(_) => internal_error_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_error_mapping() {
        use driftwood_shared::types::DraftHandle;
        let handle = DraftHandle::from_raw(-1).unwrap();

        let response = draft_error_response(&DraftError::HandleNotFound(handle));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = draft_error_response(&DraftError::NotOwner(handle));
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_asset_error_mapping() {
        let response =
            asset_error_response(&AssetError::Storage(StorageError::file_too_large(10, 1)));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response =
            asset_error_response(&AssetError::Storage(StorageError::invalid_mime_type("x")));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response =
            asset_error_response(&AssetError::Storage(StorageError::operation("boom")));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = asset_error_response(&AssetError::repository("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
