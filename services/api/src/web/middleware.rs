//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::error::ApiError;
use crate::web::state::AppState;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session";

/// Extracts the session token from the `session` cookie, falling back to an
/// `Authorization: Bearer` header.
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|c| {
            let (name, value) = c.trim().split_once('=')?;
            (name == SESSION_COOKIE && !value.is_empty()).then_some(value)
        });

    from_cookie.or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
    })
}

/// Middleware that validates the session token and resolves the caller's identity.
///
/// If valid, inserts the `Identity` into request extensions for handlers to use.
/// If missing, unknown or expired, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = state.auth.validate(session_token(req.headers())).await?;

    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(header::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn token_is_read_from_session_cookie() {
        let map = headers(&[(header::COOKIE, "theme=dark; session=abc123; lang=pl")]);
        assert_eq!(session_token(&map), Some("abc123"));
    }

    #[test]
    fn similarly_named_cookies_are_ignored() {
        let map = headers(&[(header::COOKIE, "old_session=zzz; sessionid=yyy")]);
        assert_eq!(session_token(&map), None);
    }

    #[test]
    fn cleared_cookie_counts_as_missing() {
        let map = headers(&[(header::COOKIE, "session=")]);
        assert_eq!(session_token(&map), None);
    }

    #[test]
    fn bearer_header_is_a_fallback() {
        let map = headers(&[(header::AUTHORIZATION, "Bearer tok")]);
        assert_eq!(session_token(&map), Some("tok"));

        let both = headers(&[
            (header::COOKIE, "session=from-cookie"),
            (header::AUTHORIZATION, "Bearer from-header"),
        ]);
        assert_eq!(session_token(&both), Some("from-cookie"));
    }

    #[test]
    fn other_schemes_are_ignored() {
        let map = headers(&[(header::AUTHORIZATION, "Basic dXNlcjpwdw==")]);
        assert_eq!(session_token(&map), None);
    }
}
