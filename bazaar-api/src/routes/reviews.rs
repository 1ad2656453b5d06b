/// Review endpoints
///
/// List-and-create surface scoped to a product:
///
/// - `GET /products/:id/reviews` - List the product's reviews (public)
/// - `POST /products/:id/reviews` - Post a review (authenticated)
///
/// Anonymous writes are rejected with 401 by the `CurrentUser` extractor
/// (missing credentials, not insufficient privilege) before the policy or
/// handler body run.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::auth::CurrentUser,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use bazaar_shared::{
    auth::policy::{self, Action},
    models::{
        product::Product,
        review::{CreateReview, Review, ReviewWithAuthor},
    },
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Create request for a review
#[derive(Debug, Deserialize, Validate)]
pub struct ReviewRequest {
    /// Star rating; integer in [1, 5]
    #[validate(
        required(message = "This field is required."),
        range(min = 1, max = 5, message = "Ensure this value is between 1 and 5.")
    )]
    pub rating: Option<i32>,

    /// Free-text feedback
    #[validate(required(message = "This field is required."))]
    pub feedback: Option<String>,
}

/// Review representation in listings and product detail
#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    /// Review ID
    pub id: Uuid,

    /// Authoring user's ID
    pub user_id: Uuid,

    /// Authoring user's username
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

impl From<ReviewWithAuthor> for ReviewResponse {
    fn from(row: ReviewWithAuthor) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            username: row.username,
            rating: row.rating,
            feedback: row.feedback,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// List a product's reviews
///
/// Public. Newest first.
///
/// # Errors
///
/// - `404 Not Found`: no product with this ID
pub async fn list_reviews(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<ReviewResponse>>> {
    let product = Product::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("A product with this ID does not exist.".to_string()))?;

    let reviews = Review::list_for_product(&state.db, product.id).await?;

    Ok(Json(
        reviews.into_iter().map(ReviewResponse::from).collect(),
    ))
}

/// Post a review
///
/// Requires authentication; any authenticated user may review any product,
/// at most once. The duplicate pre-check produces a clean validation
/// message; the store's unique constraint backstops concurrent duplicates
/// and is translated to the same 400.
///
/// # Endpoint
///
/// ```text
/// POST /products/:id/reviews
/// Authorization: Token <key>
/// Content-Type: application/json
///
/// {
///   "rating": 5,
///   "feedback": "This is an amazing monitor!"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: rating outside [1, 5], missing fields, or an
///   existing review by this user for this product
/// - `401 Unauthorized`: missing or invalid credentials
/// - `404 Not Found`: no product with this ID
pub async fn create_review(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ReviewRequest>,
) -> ApiResult<(StatusCode, Json<ReviewResponse>)> {
    policy::require(ctx.role(), Action::WriteReview)?;

    let product = Product::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("A product with this ID does not exist.".to_string()))?;

    req.validate()?;

    if Review::exists_for(&state.db, product.id, ctx.user_id).await? {
        return Err(ApiError::non_field(
            "You have already submitted a review for this product.",
        ));
    }

    let review = Review::create(
        &state.db,
        CreateReview {
            product_id: product.id,
            user_id: ctx.user_id,
            rating: req.rating.unwrap_or_default(),
            feedback: req.feedback.unwrap_or_default(),
        },
    )
    .await?;

    tracing::info!(review_id = %review.id, product_id = %product.id, "Review posted");

    Ok((
        StatusCode::CREATED,
        Json(ReviewResponse {
            id: review.id,
            user_id: review.user_id,
            username: ctx.username,
            rating: review.rating,
            feedback: review.feedback,
            created_at: review.created_at,
            updated_at: review.updated_at,
        }),
    ))
}
