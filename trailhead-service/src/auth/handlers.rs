//! Account and session endpoints
//!
//! Signup, login, logout, password recovery, and the authenticated
//! self-service routes (`/me`, `update-me`, `delete-me`,
//! `update-my-password`). Signup owns password hashing; the generic user
//! create operation is disabled in the model layer.

use axum::{
    extract::{Json, Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Extension,
};
use base64::Engine;
use rand::RngCore;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{AppError, FieldViolation, Result};
use crate::handlers::{allow_fields, crud, Envelope};
use crate::models::user::{self, User};
use crate::state::AppState;
use crate::store::{
    doc_id, now_rfc3339, Document, Filter, FilterCondition, Pagination, QuerySpec,
};

use super::extract::CurrentUser;

/// Reset tokens are valid for ten minutes.
const RESET_TOKEN_TTL_SECS: i64 = 10 * 60;

/// Minimum password length.
const MIN_PASSWORD_LEN: usize = 8;

fn hash_reset_token(raw: &str) -> String {
    blake3::hash(raw.as_bytes()).to_hex().to_string()
}

fn new_reset_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Validate a password/confirmation pair, collecting every violation.
fn validate_password_pair(
    password: Option<&str>,
    password_confirm: Option<&str>,
) -> Result<String> {
    let mut violations = Vec::new();
    match password {
        None => violations.push(FieldViolation::new("password", "Please provide a password")),
        Some(p) if p.len() < MIN_PASSWORD_LEN => violations.push(FieldViolation::new(
            "password",
            "A password must have at least 8 characters",
        )),
        _ => {}
    }
    match (password, password_confirm) {
        (_, None) => violations.push(FieldViolation::new(
            "password_confirm",
            "Please confirm your password",
        )),
        (Some(p), Some(c)) if p != c => violations.push(FieldViolation::new(
            "password_confirm",
            "Passwords are not the same",
        )),
        _ => {}
    }
    if violations.is_empty() {
        Ok(password.unwrap_or_default().to_string())
    } else {
        Err(AppError::ValidationFailed(violations))
    }
}

/// Sign a token for the user and wrap it in the response envelope plus
/// the `jwt` cookie.
fn send_token(state: &AppState, user: Document, code: StatusCode) -> Result<Response> {
    let id = doc_id(&user)
        .ok_or_else(|| AppError::Internal("stored user has no id".to_string()))?
        .to_string();
    let token = state.tokens().sign(&id)?;

    let sanitized = Value::Object(user::sanitize(user));
    let envelope = if code == StatusCode::CREATED {
        Envelope::created("user", sanitized)
    } else {
        Envelope::single("user", sanitized)
    }
    .with("token", &token);

    let cookie = HeaderValue::from_str(&state.tokens().cookie(&token))
        .map_err(|e| AppError::Internal(format!("invalid cookie value: {e}")))?;
    let mut response = envelope.into_response();
    response.headers_mut().insert(header::SET_COOKIE, cookie);
    Ok(response)
}

async fn find_user_by_email(state: &AppState, email: &str) -> Result<Option<Document>> {
    let query = QuerySpec {
        filter: Filter::new()
            .and(FilterCondition::eq("email", email))
            .and(FilterCondition::ne("active", false)),
        pagination: Pagination::new(0, 1),
        ..QuerySpec::default()
    };
    let mut docs = state.store().find(user::COLLECTION, &query).await?;
    Ok(docs.pop())
}

/// Signup request body.
#[derive(Debug, Deserialize)]
pub struct SignupPayload {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub password_confirm: Option<String>,
    pub role: Option<String>,
}

/// `POST /signup`
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupPayload>,
) -> Result<Response> {
    let mut violations = Vec::new();

    let name = payload.name.as_deref().map(str::trim).unwrap_or_default();
    if name.is_empty() {
        violations.push(FieldViolation::new("name", "Please tell us your name"));
    }
    let email = payload
        .email
        .as_deref()
        .map(|e| e.trim().to_lowercase())
        .unwrap_or_default();
    if !user::is_valid_email(&email) {
        violations.push(FieldViolation::new("email", "Please provide a valid email"));
    }
    let role = payload.role.clone().unwrap_or_else(|| "user".to_string());
    if !user::SELF_ASSIGNABLE_ROLES.contains(&role.as_str()) {
        violations.push(FieldViolation::new("role", "Role is either: user, guide"));
    }

    let password = match validate_password_pair(
        payload.password.as_deref(),
        payload.password_confirm.as_deref(),
    ) {
        Ok(password) => Some(password),
        Err(AppError::ValidationFailed(mut password_violations)) => {
            violations.append(&mut password_violations);
            None
        }
        Err(other) => return Err(other),
    };
    if !violations.is_empty() {
        return Err(AppError::ValidationFailed(violations));
    }
    let password = password.unwrap_or_default();

    if find_user_by_email(&state, &email).await?.is_some() {
        return Err(AppError::duplicate("User", "email", email));
    }

    let mut doc = Document::new();
    doc.insert("name".into(), json!(name));
    doc.insert("email".into(), json!(&email));
    doc.insert("role".into(), json!(role));
    doc.insert("photo".into(), json!("default.jpg"));
    doc.insert("password".into(), json!(state.passwords().hash(&password)?));
    doc.insert("active".into(), json!(true));
    let created = state.store().insert(user::COLLECTION, doc).await?;

    state.mailer().send_welcome(&email, name, "/me").await?;

    send_token(&state, created, StatusCode::CREATED)
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// `POST /login`
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<Response> {
    let (Some(email), Some(password)) = (payload.email, payload.password) else {
        return Err(AppError::BadRequest(
            "Please provide a valid email and password".to_string(),
        ));
    };

    let incorrect = || AppError::Unauthorized("Incorrect email or password".to_string());
    let doc = find_user_by_email(&state, &email.trim().to_lowercase())
        .await?
        .ok_or_else(incorrect)?;
    let hash = doc
        .get("password")
        .and_then(Value::as_str)
        .ok_or_else(incorrect)?;
    if !state.passwords().verify(&password, hash)? {
        return Err(incorrect());
    }

    send_token(&state, doc, StatusCode::OK)
}

/// `GET /logout` — replace the cookie with a short-lived dummy.
pub async fn logout(State(state): State<AppState>) -> Result<Response> {
    let cookie = HeaderValue::from_str(&state.tokens().logout_cookie())
        .map_err(|e| AppError::Internal(format!("invalid cookie value: {e}")))?;
    let mut response = Envelope::message_only().into_response();
    response.headers_mut().insert(header::SET_COOKIE, cookie);
    Ok(response)
}

/// Forgot-password request body.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordPayload {
    pub email: Option<String>,
}

/// `POST /forgot-password` — store a hashed single-use token and mail the
/// raw one.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordPayload>,
) -> Result<Envelope> {
    let email = payload
        .email
        .as_deref()
        .map(|e| e.trim().to_lowercase())
        .unwrap_or_default();
    let doc = find_user_by_email(&state, &email)
        .await?
        .ok_or_else(|| AppError::not_found("User", &email))?;
    let id = doc_id(&doc)
        .ok_or_else(|| AppError::Internal("stored user has no id".to_string()))?
        .to_string();
    let name = doc
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let raw_token = new_reset_token();
    let expires = (chrono::Utc::now() + chrono::Duration::seconds(RESET_TOKEN_TTL_SECS))
        .to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

    let mut patch = Document::new();
    patch.insert("password_reset_token".into(), json!(hash_reset_token(&raw_token)));
    patch.insert("password_reset_expires".into(), json!(expires));
    state.store().update(user::COLLECTION, &id, patch).await?;

    let reset_url = format!("/api/v1/users/reset-password/{raw_token}");
    if let Err(error) = state.mailer().send_password_reset(&email, &name, &reset_url).await {
        // roll the token back so a half-sent reset cannot be replayed
        let mut rollback = Document::new();
        rollback.insert("password_reset_token".into(), Value::Null);
        rollback.insert("password_reset_expires".into(), Value::Null);
        state.store().update(user::COLLECTION, &id, rollback).await?;
        tracing::error!("password reset email failed: {error}");
        return Err(AppError::Internal(
            "There was an error sending the email. Try again later".to_string(),
        ));
    }

    Ok(Envelope::message_only().with("message", "Token sent to email"))
}

/// Reset-password request body.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordPayload {
    pub password: Option<String>,
    pub password_confirm: Option<String>,
}

/// `PATCH /reset-password/{token}`
pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(payload): Json<ResetPasswordPayload>,
) -> Result<Response> {
    let digest = hash_reset_token(&token);
    let query = QuerySpec {
        filter: Filter::new()
            .and(FilterCondition::eq("password_reset_token", digest))
            .and(FilterCondition::gt("password_reset_expires", now_rfc3339())),
        pagination: Pagination::new(0, 1),
        ..QuerySpec::default()
    };
    let doc = state
        .store()
        .find(user::COLLECTION, &query)
        .await?
        .pop()
        .ok_or_else(|| AppError::BadRequest("Token is invalid or has expired".to_string()))?;
    let id = doc_id(&doc)
        .ok_or_else(|| AppError::Internal("stored user has no id".to_string()))?
        .to_string();

    let password = validate_password_pair(
        payload.password.as_deref(),
        payload.password_confirm.as_deref(),
    )?;

    let updated = apply_new_password(&state, &id, &password).await?;
    send_token(&state, updated, StatusCode::OK)
}

/// Hash and persist a new password, invalidating outstanding tokens.
async fn apply_new_password(state: &AppState, id: &str, password: &str) -> Result<Document> {
    let mut patch = Document::new();
    patch.insert("password".into(), json!(state.passwords().hash(password)?));
    // backdate by a second so a token minted in the same instant stays valid
    let changed_at = (chrono::Utc::now() - chrono::Duration::seconds(1))
        .to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
    patch.insert("password_changed_at".into(), json!(changed_at));
    patch.insert("password_reset_token".into(), Value::Null);
    patch.insert("password_reset_expires".into(), Value::Null);
    state
        .store()
        .update(user::COLLECTION, id, patch)
        .await?
        .ok_or_else(|| AppError::not_found("User", id))
}

/// Update-password request body.
#[derive(Debug, Deserialize)]
pub struct UpdatePasswordPayload {
    pub password_current: Option<String>,
    pub password: Option<String>,
    pub password_confirm: Option<String>,
}

/// `PATCH /update-my-password` (authenticated)
pub async fn update_password(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<UpdatePasswordPayload>,
) -> Result<Response> {
    let id = current.id()?.to_string();
    let hash = current
        .0
        .get("password")
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::Internal("stored user has no password".to_string()))?;

    let current_password = payload.password_current.as_deref().unwrap_or_default();
    if !state.passwords().verify(current_password, hash)? {
        return Err(AppError::Unauthorized(
            "Your current password is wrong".to_string(),
        ));
    }

    let password = validate_password_pair(
        payload.password.as_deref(),
        payload.password_confirm.as_deref(),
    )?;
    let updated = apply_new_password(&state, &id, &password).await?;
    send_token(&state, updated, StatusCode::OK)
}

/// `GET /me` (authenticated)
pub async fn get_me(Extension(current): Extension<CurrentUser>) -> Result<Envelope> {
    Ok(Envelope::single(
        "user",
        Value::Object(user::sanitize(current.0)),
    ))
}

/// `PATCH /update-me` (authenticated) — allow-listed profile fields only.
pub async fn update_me(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<Value>,
) -> Result<Envelope> {
    let Some(body) = body.as_object() else {
        return Err(AppError::BadRequest("Expected a JSON object".to_string()));
    };
    if body.contains_key("password") || body.contains_key("password_confirm") {
        return Err(AppError::BadRequest(
            "This route is not for password updates. Please use /update-my-password".to_string(),
        ));
    }

    let filtered = allow_fields(body, &["name", "email", "photo"]);
    let payload: user::UpdateUser = serde_json::from_value(Value::Object(filtered))
        .map_err(|e| AppError::BadRequest(format!("Malformed body: {e}")))?;

    let id = current.id()?.to_string();
    let doc = crud::update_doc::<User>(state.store(), &id, payload).await?;
    Ok(Envelope::single("user", Value::Object(doc)))
}

/// `DELETE /delete-me` (authenticated) — soft-deactivate the account.
pub async fn delete_me(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Envelope> {
    let id = current.id()?.to_string();
    let mut patch = Document::new();
    patch.insert("active".into(), json!(false));
    state
        .store()
        .update(user::COLLECTION, &id, patch)
        .await?
        .ok_or_else(|| AppError::not_found("User", &id))?;
    Ok(Envelope::no_content())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_password_pair_ok() {
        let password =
            validate_password_pair(Some("long-enough"), Some("long-enough")).unwrap();
        assert_eq!(password, "long-enough");
    }

    #[test]
    fn test_validate_password_pair_collects_violations() {
        let err = validate_password_pair(Some("short"), None).unwrap_err();
        let AppError::ValidationFailed(violations) = err else {
            panic!("expected validation failure");
        };
        assert_eq!(violations.len(), 2);
    }

    #[test]
    fn test_validate_password_pair_mismatch() {
        let err = validate_password_pair(Some("long-enough"), Some("different-one")).unwrap_err();
        let AppError::ValidationFailed(violations) = err else {
            panic!("expected validation failure");
        };
        assert_eq!(violations[0].field, "password_confirm");
    }

    #[test]
    fn test_reset_token_round_trip() {
        let raw = new_reset_token();
        assert!(raw.len() >= 40);
        // deterministic digest, distinct from the raw token
        assert_eq!(hash_reset_token(&raw), hash_reset_token(&raw));
        assert_ne!(hash_reset_token(&raw), raw);
    }

    #[test]
    fn test_reset_tokens_are_unique() {
        assert_ne!(new_reset_token(), new_reset_token());
    }
}
