/// Product model and database operations
///
/// Catalog entries are readable by anyone and mutated only by staff users.
/// The average rating is never stored; it is recomputed from the review set
/// on every read.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE products (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL,
///     price NUMERIC(10, 2) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Catalog entry
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    /// Unique product ID (UUID v4)
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Long-form description
    pub description: String,

    /// Fixed-point price: at most 10 digits total, 2 fractional
    pub price: Decimal,

    /// When the product was created
    pub created_at: DateTime<Utc>,

    /// When the product was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProduct {
    /// Display name
    pub name: String,

    /// Long-form description
    pub description: String,

    /// Fixed-point price
    pub price: Decimal,
}

impl Product {
    /// Creates a new product
    pub async fn create(pool: &PgPool, data: CreateProduct) -> Result<Self, sqlx::Error> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (name, description, price)
            VALUES ($1, $2, $3)
            RETURNING id, name, description, price, created_at, updated_at
            "#,
        )
        .bind(data.name)
        .bind(data.description)
        .bind(data.price)
        .fetch_one(pool)
        .await?;

        Ok(product)
    }

    /// Finds a product by ID, returning `None` if absent
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, price, created_at, updated_at
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(product)
    }

    /// Lists all products, ordered by name ascending
    ///
    /// The catalog is small by design; there is no pagination on this
    /// surface.
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, price, created_at, updated_at
            FROM products
            ORDER BY name ASC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(products)
    }

    /// Replaces a product's name, description, and price
    ///
    /// Returns the updated row, or `None` when the product doesn't exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: CreateProduct,
    ) -> Result<Option<Self>, sqlx::Error> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET name = $2, description = $3, price = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, description, price, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(data.name)
        .bind(data.description)
        .bind(data.price)
        .fetch_optional(pool)
        .await?;

        Ok(product)
    }

    /// Deletes a product by ID
    ///
    /// Images and reviews cascade away with the row. Returns true if a row
    /// was deleted.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Computes the product's average rating
    ///
    /// Mean of `rating` over the product's reviews, 0.0 when there are none.
    /// Recomputed live on every call; there is no cache to go stale.
    pub async fn average_rating(pool: &PgPool, id: Uuid) -> Result<f64, sqlx::Error> {
        let avg: f64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(AVG(rating), 0)::FLOAT8
            FROM reviews
            WHERE product_id = $1
            "#,
        )
        .bind(id)
        .fetch_one(pool)
        .await?;

        Ok(avg)
    }
}
