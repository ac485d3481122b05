//! Identity middleware for protected routes.
//!
//! Authentication itself happens upstream; the gateway forwards the
//! authenticated caller as trusted `x-user-id` / `x-user-email` headers.
//! This middleware turns those headers into an [`Identity`] extension.

use axum::{
    Json,
    extract::{FromRequestParts, Request},
    http::{StatusCode, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;

use driftwood_shared::types::UserId;

/// Header carrying the authenticated user id.
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the authenticated user email.
pub const USER_EMAIL_HEADER: &str = "x-user-email";

/// Authenticated caller identity.
#[derive(Debug, Clone)]
pub struct Identity {
    /// Numeric user id.
    pub user_id: UserId,
    /// User email, recorded as asset owner on uploads.
    pub email: String,
}

/// Middleware that resolves the caller identity from gateway headers.
pub async fn identity_middleware(mut request: Request, next: Next) -> Response {
    let user_id = request
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.parse::<UserId>().ok());
    let email = request
        .headers()
        .get(USER_EMAIL_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string);

    let (Some(user_id), Some(email)) = (user_id, email) else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": "unauthorized",
                "message": "Caller identity headers are required"
            })),
        )
            .into_response();
    };

    request.extensions_mut().insert(Identity { user_id, email });
    next.run(request).await
}

/// Extractor for the authenticated caller.
///
/// Use this in handlers to get the caller's identity:
///
/// ```ignore
/// async fn handler(user: CurrentUser) -> impl IntoResponse {
///     let user_id = user.user_id();
///     // ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Identity);

impl CurrentUser {
    /// Returns the caller's user id.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.0.user_id
    }

    /// Returns the caller's email.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.0.email
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<serde_json::Value>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({
                        "error": "unauthorized",
                        "message": "Authentication required"
                    })),
                )
            })
    }
}
