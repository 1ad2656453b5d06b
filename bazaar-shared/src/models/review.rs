/// Review model and database operations
///
/// A user may hold at most one review per product, enforced twice: an
/// application-level pre-check (`exists_for`) that produces a clean
/// validation message, and the `reviews_product_id_user_id_key` unique
/// constraint as the backstop for concurrent duplicates.
///
/// Reviews are jointly referenced by product and user and cascade away with
/// either. Listings are newest-first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Customer review
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Review {
    /// Unique review ID
    pub id: Uuid,

    /// Reviewed product
    pub product_id: Uuid,

    /// Authoring user
    pub user_id: Uuid,

    /// Star rating in [1, 5]
    pub rating: i32,

    /// Free-text feedback
    pub feedback: String,

    /// When the review was posted
    pub created_at: DateTime<Utc>,

    /// When the review was last updated
    pub updated_at: DateTime<Utc>,
}

/// Review joined with its author's username, the shape listings serialize
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ReviewWithAuthor {
    /// Unique review ID
    pub id: Uuid,

    /// Reviewed product
    pub product_id: Uuid,

    /// Authoring user
    pub user_id: Uuid,

    /// Author's username
    pub username: String,

    /// Star rating in [1, 5]
    pub rating: i32,

    /// Free-text feedback
    pub feedback: String,

    /// When the review was posted
    pub created_at: DateTime<Utc>,

    /// When the review was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a review
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReview {
    /// Reviewed product
    pub product_id: Uuid,

    /// Authoring user
    pub user_id: Uuid,

    /// Star rating in [1, 5]
    pub rating: i32,

    /// Free-text feedback
    pub feedback: String,
}

impl Review {
    /// Persists a review
    ///
    /// # Errors
    ///
    /// A duplicate (product, user) pair trips the unique constraint; callers
    /// pre-check with [`Review::exists_for`] and translate the constraint
    /// error identically when a concurrent request slips past the pre-check.
    pub async fn create(pool: &PgPool, data: CreateReview) -> Result<Self, sqlx::Error> {
        let review = sqlx::query_as::<_, Review>(
            r#"
            INSERT INTO reviews (product_id, user_id, rating, feedback)
            VALUES ($1, $2, $3, $4)
            RETURNING id, product_id, user_id, rating, feedback, created_at, updated_at
            "#,
        )
        .bind(data.product_id)
        .bind(data.user_id)
        .bind(data.rating)
        .bind(data.feedback)
        .fetch_one(pool)
        .await?;

        Ok(review)
    }

    /// Whether the user already reviewed the product
    pub async fn exists_for(
        pool: &PgPool,
        product_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM reviews WHERE product_id = $1 AND user_id = $2)",
        )
        .bind(product_id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    /// Lists a product's reviews with author usernames, newest first
    pub async fn list_for_product(
        pool: &PgPool,
        product_id: Uuid,
    ) -> Result<Vec<ReviewWithAuthor>, sqlx::Error> {
        let reviews = sqlx::query_as::<_, ReviewWithAuthor>(
            r#"
            SELECT r.id, r.product_id, r.user_id, u.username, r.rating, r.feedback,
                   r.created_at, r.updated_at
            FROM reviews r
            JOIN users u ON u.id = r.user_id
            WHERE r.product_id = $1
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(product_id)
        .fetch_all(pool)
        .await?;

        Ok(reviews)
    }

    /// Counts a product's reviews
    pub async fn count_for_product(pool: &PgPool, product_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM reviews WHERE product_id = $1")
                .bind(product_id)
                .fetch_one(pool)
                .await?;

        Ok(count)
    }
}
