/// Auth token model and database operations
///
/// One opaque bearer token per user. The table stores only the SHA-256 hash
/// of the key (see `crate::auth::token`); the plaintext is returned to the
/// client at login and cannot be recovered afterwards, so re-login rotates
/// the token instead of reusing it.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE auth_tokens (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
///     token_hash VARCHAR(64) NOT NULL UNIQUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::token::{generate_key, hash_key};
use crate::models::user::User;

/// Persisted token record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuthToken {
    /// Unique token row ID
    pub id: Uuid,

    /// Owning user (one token per user)
    pub user_id: Uuid,

    /// SHA-256 hex digest of the opaque key
    pub token_hash: String,

    /// When the token was issued
    pub created_at: DateTime<Utc>,
}

impl AuthToken {
    /// Issues a token for a user, rotating any existing one
    ///
    /// Deletes the user's previous token row (if any) and inserts a fresh
    /// key inside a single transaction, preserving the at-most-one-live-token
    /// invariant even under concurrent logins.
    ///
    /// Returns the persisted record and the plaintext key. The plaintext is
    /// only available here; hand it to the client now.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction fails or the database is
    /// unreachable.
    pub async fn issue(pool: &PgPool, user_id: Uuid) -> Result<(Self, String), sqlx::Error> {
        let key = generate_key();
        let token_hash = hash_key(&key);

        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM auth_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let token = sqlx::query_as::<_, AuthToken>(
            r#"
            INSERT INTO auth_tokens (user_id, token_hash)
            VALUES ($1, $2)
            RETURNING id, user_id, token_hash, created_at
            "#,
        )
        .bind(user_id)
        .bind(&token_hash)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((token, key))
    }

    /// Resolves a plaintext key to its token record and owning user
    ///
    /// Returns `None` when the key matches no live token; the caller turns
    /// that into a 401.
    pub async fn resolve_key(
        pool: &PgPool,
        key: &str,
    ) -> Result<Option<(Self, User)>, sqlx::Error> {
        let token_hash = hash_key(key);

        let row = sqlx::query_as::<_, TokenWithUser>(
            r#"
            SELECT t.id AS token_id, t.user_id, t.token_hash, t.created_at AS token_created_at,
                   u.id, u.username, u.email, u.password_hash, u.first_name, u.last_name,
                   u.is_staff, u.is_superuser, u.created_at, u.updated_at
            FROM auth_tokens t
            JOIN users u ON u.id = t.user_id
            WHERE t.token_hash = $1
            "#,
        )
        .bind(&token_hash)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(TokenWithUser::into_parts))
    }

    /// Deletes a token row by ID
    ///
    /// Returns true if a row was deleted. Logout calls this exactly once per
    /// token lifetime; a second call finds nothing and the caller rejects
    /// the request as unauthenticated.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM auth_tokens WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Joined row shape for `resolve_key`
#[derive(sqlx::FromRow)]
struct TokenWithUser {
    token_id: Uuid,
    user_id: Uuid,
    token_hash: String,
    token_created_at: DateTime<Utc>,
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    first_name: Option<String>,
    last_name: Option<String>,
    is_staff: bool,
    is_superuser: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TokenWithUser {
    fn into_parts(self) -> (AuthToken, User) {
        (
            AuthToken {
                id: self.token_id,
                user_id: self.user_id,
                token_hash: self.token_hash,
                created_at: self.token_created_at,
            },
            User {
                id: self.id,
                username: self.username,
                email: self.email,
                password_hash: self.password_hash,
                first_name: self.first_name,
                last_name: self.last_name,
                is_staff: self.is_staff,
                is_superuser: self.is_superuser,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
        )
    }
}
