/// Account endpoints
///
/// This module provides user account endpoints:
/// - Registration
/// - Login (token issuance)
/// - Logout (token revocation)
///
/// # Endpoints
///
/// - `POST /register` - Create an account
/// - `POST /login` - Exchange username/password for a bearer token
/// - `POST /logout` - Revoke the presented token

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::auth::CurrentUser,
};
use axum::{extract::State, http::StatusCode, Json};
use bazaar_shared::{
    auth::password,
    models::{
        token::AuthToken,
        user::{CreateUser, User},
    },
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Login name
    #[validate(
        required(message = "This field is required."),
        length(min = 1, max = 150, message = "Ensure this field has at most 150 characters.")
    )]
    pub username: Option<String>,

    /// Email address
    #[validate(
        required(message = "This field is required."),
        email(message = "Enter a valid email address.")
    )]
    pub email: Option<String>,

    /// Password (validated for minimum strength)
    #[validate(required(message = "This field is required."))]
    pub password: Option<String>,

    /// Password confirmation; must match `password`
    #[validate(required(message = "This field is required."))]
    pub password2: Option<String>,

    /// Optional given name
    #[validate(length(max = 150, message = "Ensure this field has at most 150 characters."))]
    pub first_name: Option<String>,

    /// Optional family name
    #[validate(length(max = 150, message = "Ensure this field has at most 150 characters."))]
    pub last_name: Option<String>,
}

/// Created-user representation (no password echoed)
#[derive(Debug, Serialize)]
pub struct UserResponse {
    /// User ID
    pub id: Uuid,

    /// Login name
    pub username: String,

    /// Email address
    pub email: String,

    /// Optional given name
    pub first_name: Option<String>,

    /// Optional family name
    pub last_name: Option<String>,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Login name
    #[validate(required(message = "This field is required."))]
    pub username: Option<String>,

    /// Password
    #[validate(required(message = "This field is required."))]
    pub password: Option<String>,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Opaque bearer token key
    pub token: String,

    /// User ID
    pub user_id: Uuid,

    /// Whether the user has staff privileges
    pub is_staff: bool,
}

/// Logout response
#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    /// Confirmation message
    pub detail: String,
}

/// Register a new user
///
/// No token is issued at registration; the client logs in afterwards.
///
/// # Endpoint
///
/// ```text
/// POST /register
/// Content-Type: application/json
///
/// {
///   "username": "testuser",
///   "email": "test@example.com",
///   "password": "testpass123",
///   "password2": "testpass123",
///   "first_name": "Test",
///   "last_name": "User"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: missing/malformed fields, password mismatch, weak
///   password, or duplicate username/email; the body names the offending
///   fields
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    req.validate()?;

    let username = req.username.unwrap_or_default();
    let email = req.email.unwrap_or_default();
    let password = req.password.unwrap_or_default();
    let password2 = req.password2.unwrap_or_default();

    if password != password2 {
        return Err(ApiError::field("password", "Password fields didn't match."));
    }

    password::validate_password_strength(&password)
        .map_err(|msg| ApiError::field("password", msg))?;

    // Duplicates are pre-checked so the client gets a field-level message;
    // the unique constraints remain the backstop for concurrent registration.
    if User::find_by_username(&state.db, &username).await?.is_some() {
        return Err(ApiError::field(
            "username",
            "A user with that username already exists.",
        ));
    }
    if User::find_by_email(&state.db, &email).await?.is_some() {
        return Err(ApiError::field(
            "email",
            "A user with that email already exists.",
        ));
    }

    let password_hash = password::hash_password(&password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            username,
            email,
            password_hash,
            first_name: req.first_name,
            last_name: req.last_name,
            is_staff: false,
            is_superuser: false,
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            id: user.id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
        }),
    ))
}

/// Login endpoint
///
/// Exchanges a valid username/password for an opaque bearer token. An
/// unknown username and a wrong password produce the same response, so the
/// endpoint cannot be used to enumerate accounts. Logging in again rotates
/// the user's token (see `bazaar_shared::models::token`).
///
/// # Endpoint
///
/// ```text
/// POST /login
/// Content-Type: application/json
///
/// {
///   "username": "testuser",
///   "password": "testpass123"
/// }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "token": "opaque-40-char-key",
///   "user_id": "uuid",
///   "is_staff": false
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: missing fields, or credentials that don't match
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    req.validate()?;

    let username = req.username.unwrap_or_default();
    let password = req.password.unwrap_or_default();

    // Bad credentials are a validation-style 400, deliberately identical for
    // unknown usernames and wrong passwords.
    let invalid_credentials =
        || ApiError::non_field("Unable to log in with provided credentials.");

    let user = User::find_by_username(&state.db, &username)
        .await?
        .ok_or_else(invalid_credentials)?;

    let valid = password::verify_password(&password, &user.password_hash)?;
    if !valid {
        return Err(invalid_credentials());
    }

    let (_token, key) = AuthToken::issue(&state.db, user.id).await?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(LoginResponse {
        token: key,
        user_id: user.id,
        is_staff: user.is_staff,
    }))
}

/// Logout endpoint
///
/// Deletes the presented token. Exactly-once per token lifetime: a second
/// logout with the same key no longer authenticates and is rejected with
/// 401 by the extractor. Only POST is routed; other verbs get 405.
///
/// # Endpoint
///
/// ```text
/// POST /logout
/// Authorization: Token <key>
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: missing or already-revoked token
pub async fn logout(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
) -> ApiResult<Json<LogoutResponse>> {
    let deleted = AuthToken::delete(&state.db, ctx.token_id).await?;
    if !deleted {
        // The token vanished between extraction and deletion (concurrent
        // logout); report it the same as any other dead token.
        return Err(ApiError::Unauthorized("Invalid token.".to_string()));
    }

    tracing::info!(user_id = %ctx.user_id, "User logged out");

    Ok(Json(LogoutResponse {
        detail: "Successfully logged out.".to_string(),
    }))
}
