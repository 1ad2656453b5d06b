/// Token resolution for incoming requests
///
/// Credentials arrive as `Authorization: Token <key>`. The key is hashed and
/// matched against the `auth_tokens` table; on success the request carries an
/// [`AuthContext`] identifying the caller. Every failure mode (missing
/// header, wrong scheme, unknown key) is reported as missing/invalid
/// credentials, 401 at the API layer, never as a permission problem.
///
/// # Example
///
/// ```no_run
/// use bazaar_shared::auth::middleware::authenticate_token;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) {
/// let header = Some("Token 3b8a…");
/// match authenticate_token(&pool, header).await {
///     Ok(ctx) => println!("authenticated as {}", ctx.username),
///     Err(e) => println!("rejected: {}", e),
/// }
/// # }
/// ```

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::policy::Role;
use crate::models::token::AuthToken;
use crate::models::user::User;

/// Header scheme prefix for token credentials
pub const TOKEN_SCHEME: &str = "Token ";

/// Authenticated caller identity, derived from a resolved token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// Row ID of the presented token (logout deletes exactly this row)
    pub token_id: Uuid,

    /// Caller's username
    pub username: String,

    /// Staff flag as stored on the user record
    pub is_staff: bool,

    /// Superuser flag as stored on the user record
    pub is_superuser: bool,
}

impl AuthContext {
    /// Builds a context from a resolved token/user pair
    pub fn from_parts(token: &AuthToken, user: &User) -> Self {
        Self {
            user_id: user.id,
            token_id: token.id,
            username: user.username.clone(),
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
        }
    }

    /// The caller's role for policy checks
    pub fn role(&self) -> Role {
        if self.is_staff || self.is_superuser {
            Role::Staff
        } else {
            Role::Authenticated
        }
    }
}

/// Error type for credential resolution
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No Authorization header was supplied
    #[error("Authentication credentials were not provided.")]
    MissingCredentials,

    /// Header present but the scheme or key is not a live token
    #[error("Invalid token.")]
    InvalidToken,

    /// Database error during lookup
    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// Resolves an Authorization header value to an [`AuthContext`]
///
/// # Arguments
///
/// * `pool` - Database connection pool
/// * `header` - The raw `Authorization` header value, if any
///
/// # Errors
///
/// - [`AuthError::MissingCredentials`] when no header was supplied
/// - [`AuthError::InvalidToken`] when the scheme isn't `Token` or the key
///   matches no live token (including keys already revoked by logout)
pub async fn authenticate_token(
    pool: &PgPool,
    header: Option<&str>,
) -> Result<AuthContext, AuthError> {
    let header = header.ok_or(AuthError::MissingCredentials)?;

    let key = header
        .strip_prefix(TOKEN_SCHEME)
        .ok_or(AuthError::InvalidToken)?;

    let resolved = AuthToken::resolve_key(pool, key)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

    match resolved {
        Some((token, user)) => Ok(AuthContext::from_parts(&token, &user)),
        None => Err(AuthError::InvalidToken),
    }
}
