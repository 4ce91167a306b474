//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for login, logout and session checks.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use lesson_tracker_core::Identity;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiError, ErrorBody};
use crate::web::extract::json_body;
use crate::web::middleware::{session_token, SESSION_COOKIE};
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    /// Also set as the `session` cookie; usable as a bearer token.
    pub token: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

#[derive(Serialize, ToSchema)]
pub struct ValidResponse {
    pub valid: bool,
    pub user_id: Uuid,
}

fn session_cookie(token: &str, max_age_secs: i64, secure: bool) -> String {
    let secure = if secure { " Secure;" } else { "" };
    format!(
        "{}={}; HttpOnly;{} SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE, token, secure, max_age_secs
    )
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /login - Exchange credentials for a session
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful; session cookie set", body = LoginResponse),
        (status = 400, description = "Malformed request body", body = ErrorBody),
        (status = 401, description = "Invalid username or password", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let req = json_body(payload)?;

    let session = state.auth.login(&req.username, &req.password).await?;

    let cookie = session_cookie(
        &session.token,
        state.auth.session_ttl().num_seconds(),
        state.config.cookie_secure,
    );
    let response = LoginResponse {
        token: session.token,
        user_id: session.user_id,
        expires_at: session.expires_at,
    };

    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie)], Json(response)))
}

/// POST /logout - Invalidate the current session, if any
#[utoipa::path(
    post,
    path = "/logout",
    responses(
        (status = 200, description = "Session revoked (or there was none); cookie cleared"),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(token) = session_token(&headers) {
        state.auth.logout(token).await?;
    }

    let cookie = session_cookie("", 0, state.config.cookie_secure);
    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie)]))
}

/// GET /valid - Check whether the presented session is still valid
#[utoipa::path(
    get,
    path = "/valid",
    responses(
        (status = 200, description = "Session is valid", body = ValidResponse),
        (status = 401, description = "Missing, unknown or expired session", body = ErrorBody)
    )
)]
pub async fn valid_handler(Extension(identity): Extension<Identity>) -> Json<ValidResponse> {
    Json(ValidResponse {
        valid: true,
        user_id: identity.user_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_carries_token_and_lifetime() {
        let cookie = session_cookie("abc", 60, true);
        assert_eq!(
            cookie,
            "session=abc; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age=60"
        );
    }

    #[test]
    fn insecure_cookie_for_plain_http() {
        let cookie = session_cookie("", 0, false);
        assert_eq!(cookie, "session=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0");
    }
}
