/// Product image model and database operations
///
/// Rows reference files stored under the media root (the `image` column is
/// the path relative to it). A product owns its images: deleting the product
/// cascades the rows away. There is no update or delete endpoint for
/// individual images.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Image attached to a product
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProductImage {
    /// Unique image ID
    pub id: Uuid,

    /// Owning product
    pub product_id: Uuid,

    /// Storage path relative to the media root
    pub image: String,

    /// When the image was uploaded
    pub created_at: DateTime<Utc>,
}

impl ProductImage {
    /// Records an uploaded image for a product
    ///
    /// The file itself is written by the API layer before this row is
    /// inserted; `image` is its media-root-relative path.
    pub async fn create(
        pool: &PgPool,
        product_id: Uuid,
        image: &str,
    ) -> Result<Self, sqlx::Error> {
        let row = sqlx::query_as::<_, ProductImage>(
            r#"
            INSERT INTO product_images (product_id, image)
            VALUES ($1, $2)
            RETURNING id, product_id, image, created_at
            "#,
        )
        .bind(product_id)
        .bind(image)
        .fetch_one(pool)
        .await?;

        Ok(row)
    }

    /// Lists a product's images, oldest first
    pub async fn list_for_product(
        pool: &PgPool,
        product_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let rows = sqlx::query_as::<_, ProductImage>(
            r#"
            SELECT id, product_id, image, created_at
            FROM product_images
            WHERE product_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(product_id)
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }

    /// Counts a product's images
    pub async fn count_for_product(pool: &PgPool, product_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM product_images WHERE product_id = $1")
                .bind(product_id)
                .fetch_one(pool)
                .await?;

        Ok(count)
    }
}
