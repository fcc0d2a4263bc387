//! Authentication middleware
//!
//! `protect` validates the bearer token (or `jwt` cookie), loads the
//! account, rejects tokens issued before the last password change, and
//! injects the current user into request extensions. `require_roles`
//! gates a route on the authenticated user's role.

use axum::{
    body::Body,
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::error::{AppError, Result};
use crate::models::user;
use crate::state::AppState;
use crate::store::{doc_id, Document};

/// The authenticated user's document, available as a request extension
/// behind `protect`.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Document);

impl CurrentUser {
    /// The user's identifier.
    pub fn id(&self) -> Result<&str> {
        doc_id(&self.0)
            .ok_or_else(|| AppError::Internal("authenticated user has no id".to_string()))
    }

    /// The user's role, defaulting to `user`.
    #[must_use]
    pub fn role(&self) -> &str {
        self.0
            .get("role")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("user")
    }
}

/// Pull a token from the `Authorization: Bearer` header or the `jwt`
/// cookie.
fn extract_token(request: &Request<Body>) -> Option<String> {
    if let Some(value) = request.headers().get(header::AUTHORIZATION) {
        if let Ok(value) = value.to_str() {
            if let Some(token) = value.strip_prefix("Bearer ") {
                return Some(token.trim().to_string());
            }
        }
    }
    cookie_token(request.headers())
}

/// Read the `jwt` cookie from a header map.
pub fn cookie_token(headers: &axum::http::HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    for pair in cookies.split(';') {
        let pair = pair.trim();
        if let Some(token) = pair.strip_prefix("jwt=") {
            if !token.is_empty() && token != "logged-out" {
                return Some(token.to_string());
            }
        }
    }
    None
}

/// Resolve a verified token into the account it belongs to.
pub async fn user_for_token(state: &AppState, token: &str) -> Result<Document> {
    let claims = state.tokens().verify(token)?;
    let doc = state
        .store()
        .find_by_id(user::COLLECTION, &claims.sub)
        .await?
        .filter(user::is_active)
        .ok_or_else(|| {
            AppError::Unauthorized(
                "The user belonging to this token does no longer exist".to_string(),
            )
        })?;

    if user::changed_password_after(&doc, claims.iat) {
        return Err(AppError::Unauthorized(
            "User recently changed password, please log in again".to_string(),
        ));
    }
    Ok(doc)
}

/// Middleware: require a valid token and attach the current user.
pub async fn protect(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response> {
    let token = extract_token(&request)
        .ok_or_else(|| AppError::Unauthorized("You are not logged in".to_string()))?;
    let doc = user_for_token(&state, &token).await?;
    request.extensions_mut().insert(CurrentUser(doc));
    Ok(next.run(request).await)
}

/// Middleware body: require one of the given roles. Wire it with
/// `middleware::from_fn(move |req, next| require_roles(ROLES, req, next))`
/// behind [`protect`].
pub async fn require_roles(
    roles: &'static [&'static str],
    request: Request<Body>,
    next: Next,
) -> Result<Response> {
    let current = request
        .extensions()
        .get::<CurrentUser>()
        .ok_or_else(|| AppError::Unauthorized("You are not logged in".to_string()))?;
    if !roles.contains(&current.role()) {
        return Err(AppError::Forbidden(
            "You do not have permission to perform this action".to_string(),
        ));
    }
    Ok(next.run(request).await)
}

/// Best-effort current user for server-rendered pages: never fails, just
/// returns `None` when the cookie is absent or stale.
pub async fn maybe_user(state: &AppState, headers: &axum::http::HeaderMap) -> Option<Document> {
    let token = cookie_token(headers)?;
    user_for_token(state, &token).await.ok()
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderMap, HeaderValue};

    use super::*;

    fn headers_with_cookie(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_cookie_token_parsing() {
        let headers = headers_with_cookie("theme=dark; jwt=abc.def.ghi; lang=en");
        assert_eq!(cookie_token(&headers), Some("abc.def.ghi".to_string()));
    }

    #[test]
    fn test_cookie_token_ignores_logged_out() {
        let headers = headers_with_cookie("jwt=logged-out");
        assert_eq!(cookie_token(&headers), None);
    }

    #[test]
    fn test_cookie_token_missing() {
        assert_eq!(cookie_token(&HeaderMap::new()), None);
        let headers = headers_with_cookie("theme=dark");
        assert_eq!(cookie_token(&headers), None);
    }

    #[test]
    fn test_current_user_role_default() {
        let user = CurrentUser(Document::new());
        assert_eq!(user.role(), "user");

        let mut doc = Document::new();
        doc.insert("role".into(), serde_json::json!("admin"));
        assert_eq!(CurrentUser(doc).role(), "admin");
    }
}
