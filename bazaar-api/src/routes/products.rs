/// Catalog endpoints
///
/// This module provides the product catalog surface:
/// - Listing and detail (public)
/// - Create, update, delete (staff only)
/// - Image upload (staff only, multipart)
///
/// # Endpoints
///
/// - `GET /products` - List catalog, ordered by name
/// - `POST /products` - Create product
/// - `GET /products/:id` - Product detail with reviews
/// - `PUT /products/:id` - Replace product fields
/// - `DELETE /products/:id` - Delete product (cascades images and reviews)
/// - `POST /products/:id/upload-image` - Attach an image

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    media::{self, ImageFormat},
    middleware::auth::CurrentUser,
    routes::reviews::ReviewResponse,
};
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use bazaar_shared::{
    auth::policy::{self, Action},
    models::{
        product::{CreateProduct, Product},
        product_image::ProductImage,
        review::Review,
    },
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Price precision: at most 10 digits total, 2 of them fractional
const PRICE_MAX_DIGITS: u32 = 10;
const PRICE_DECIMAL_PLACES: u32 = 2;

/// Create/update request for a product
#[derive(Debug, Deserialize, Validate)]
pub struct ProductRequest {
    /// Display name
    #[validate(
        required(message = "This field is required."),
        length(min = 1, max = 255, message = "Ensure this field has at most 255 characters.")
    )]
    pub name: Option<String>,

    /// Long-form description
    #[validate(required(message = "This field is required."))]
    pub description: Option<String>,

    /// Fixed-point price, serialized as a decimal string
    #[validate(required(message = "This field is required."))]
    pub price: Option<Decimal>,
}

impl ProductRequest {
    /// Runs declarative validation plus the price precision rule, returning
    /// the model-layer input on success
    fn into_create(self) -> ApiResult<CreateProduct> {
        self.validate()?;

        let price = self.price.unwrap_or_default();
        validate_price(&price)?;

        Ok(CreateProduct {
            name: self.name.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            price,
        })
    }
}

/// Checks the fixed-point constraints on a price value
fn validate_price(price: &Decimal) -> Result<(), ApiError> {
    if price.is_sign_negative() {
        return Err(ApiError::field(
            "price",
            "Ensure this value is greater than or equal to 0.",
        ));
    }
    if price.scale() > PRICE_DECIMAL_PLACES {
        return Err(ApiError::field(
            "price",
            format!(
                "Ensure that there are no more than {} decimal places.",
                PRICE_DECIMAL_PLACES
            ),
        ));
    }
    // The fractional places are fixed, so the whole part gets what's left
    let whole_digit_limit = Decimal::from(10_i64.pow(PRICE_MAX_DIGITS - PRICE_DECIMAL_PLACES));
    if price.trunc() >= whole_digit_limit {
        return Err(ApiError::field(
            "price",
            format!(
                "Ensure that there are no more than {} digits in total.",
                PRICE_MAX_DIGITS
            ),
        ));
    }
    Ok(())
}

/// Image reference as serialized in product payloads
#[derive(Debug, Serialize)]
pub struct ImageResponse {
    /// Image ID
    pub id: Uuid,

    /// Storage path relative to the media root
    pub image: String,
}

impl From<ProductImage> for ImageResponse {
    fn from(row: ProductImage) -> Self {
        Self {
            id: row.id,
            image: row.image,
        }
    }
}

/// List-shape product representation
#[derive(Debug, Serialize)]
pub struct ProductSummary {
    /// Product ID
    pub id: Uuid,

    /// Link to the detail endpoint
    pub url: String,

    /// Display name
    pub name: String,

    /// Fixed-point price
    pub price: Decimal,

    /// Live mean of the product's ratings (0.0 with no reviews)
    pub average_rating: f64,

    /// Attached images
    pub images: Vec<ImageResponse>,
}

/// Detail-shape product representation
#[derive(Debug, Serialize)]
pub struct ProductDetail {
    /// Product ID
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Long-form description
    pub description: String,

    /// Fixed-point price
    pub price: Decimal,

    /// Live mean of the product's ratings (0.0 with no reviews)
    pub average_rating: f64,

    /// Attached images
    pub images: Vec<ImageResponse>,

    /// The product's reviews, newest first
    pub reviews: Vec<ReviewResponse>,
}

async fn summarize(state: &AppState, product: Product) -> ApiResult<ProductSummary> {
    let average_rating = Product::average_rating(&state.db, product.id).await?;
    let images = ProductImage::list_for_product(&state.db, product.id).await?;

    Ok(ProductSummary {
        id: product.id,
        url: format!("/products/{}", product.id),
        name: product.name,
        price: product.price,
        average_rating,
        images: images.into_iter().map(ImageResponse::from).collect(),
    })
}

async fn detail(state: &AppState, product: Product) -> ApiResult<ProductDetail> {
    let average_rating = Product::average_rating(&state.db, product.id).await?;
    let images = ProductImage::list_for_product(&state.db, product.id).await?;
    let reviews = Review::list_for_product(&state.db, product.id).await?;

    Ok(ProductDetail {
        id: product.id,
        name: product.name,
        description: product.description,
        price: product.price,
        average_rating,
        images: images.into_iter().map(ImageResponse::from).collect(),
        reviews: reviews.into_iter().map(ReviewResponse::from).collect(),
    })
}

/// List the catalog
///
/// Public. Products are ordered by name ascending; each entry carries its
/// computed average rating and image list.
pub async fn list_products(State(state): State<AppState>) -> ApiResult<Json<Vec<ProductSummary>>> {
    let products = Product::list(&state.db).await?;

    let mut summaries = Vec::with_capacity(products.len());
    for product in products {
        summaries.push(summarize(&state, product).await?);
    }

    Ok(Json(summaries))
}

/// Create a product
///
/// Staff only; non-staff callers get 403, anonymous callers 401.
///
/// # Errors
///
/// - `400 Bad Request`: missing fields or price outside 10-digit/2-place
///   precision
/// - `401/403`: missing credentials / insufficient role
pub async fn create_product(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Json(req): Json<ProductRequest>,
) -> ApiResult<(StatusCode, Json<ProductSummary>)> {
    policy::require(ctx.role(), Action::WriteCatalog)?;

    let data = req.into_create()?;
    let product = Product::create(&state.db, data).await?;

    tracing::info!(product_id = %product.id, "Product created");

    let summary = summarize(&state, product).await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

/// Product detail
///
/// Public. Includes description, image list, review list, and the computed
/// average rating.
///
/// # Errors
///
/// - `404 Not Found`: no product with this ID
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ProductDetail>> {
    let product = Product::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Not found.".to_string()))?;

    Ok(Json(detail(&state, product).await?))
}

/// Replace a product's fields
///
/// Staff only. Full update: name, description, and price are all required.
///
/// # Errors
///
/// - `400 Bad Request`: validation failure
/// - `401/403`: missing credentials / insufficient role
/// - `404 Not Found`: no product with this ID
pub async fn update_product(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ProductRequest>,
) -> ApiResult<Json<ProductDetail>> {
    policy::require(ctx.role(), Action::WriteCatalog)?;

    let data = req.into_create()?;
    let product = Product::update(&state.db, id, data)
        .await?
        .ok_or_else(|| ApiError::NotFound("Not found.".to_string()))?;

    tracing::info!(product_id = %product.id, "Product updated");

    Ok(Json(detail(&state, product).await?))
}

/// Delete a product
///
/// Staff only. Images and reviews cascade away with the row.
///
/// # Errors
///
/// - `401/403`: missing credentials / insufficient role
/// - `404 Not Found`: no product with this ID
pub async fn delete_product(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    policy::require(ctx.role(), Action::WriteCatalog)?;

    let deleted = Product::delete(&state.db, id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Not found.".to_string()));
    }

    tracing::info!(product_id = %id, "Product deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Attach an image to a product
///
/// Staff only. The multipart body must carry an `image` part whose bytes
/// sniff as a valid GIF, PNG, JPEG, or WebP.
///
/// # Endpoint
///
/// ```text
/// POST /products/:id/upload-image
/// Content-Type: multipart/form-data
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: no `image` part, or a payload that isn't a
///   structurally valid image
/// - `401/403`: missing credentials / insufficient role
/// - `404 Not Found`: no product with this ID
pub async fn upload_image(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<ImageResponse>)> {
    policy::require(ctx.role(), Action::UploadImage)?;

    // Raised explicitly so a bad product ID reads as a lookup failure, not a
    // payload problem.
    let product = Product::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("A product with this ID does not exist.".to_string()))?;

    let mut payload: Option<Vec<u8>> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::field("image", "The submitted data was not a file."))?
    {
        if field.name() == Some("image") {
            let data = field
                .bytes()
                .await
                .map_err(|_| ApiError::field("image", "The submitted data was not a file."))?;
            payload = Some(data.to_vec());
            break;
        }
    }

    let data = payload.ok_or_else(|| ApiError::field("image", "No file was submitted."))?;

    let format = ImageFormat::sniff(&data).ok_or_else(|| {
        ApiError::field(
            "image",
            "Upload a valid image. The file you uploaded was either not an image or a corrupted image.",
        )
    })?;

    let path = media::store_image(state.media_root(), product.id, format, &data)
        .await
        .map_err(|e| ApiError::InternalError(format!("Failed to store image: {}", e)))?;

    let image = ProductImage::create(&state.db, product.id, &path).await?;

    tracing::info!(product_id = %product.id, image_id = %image.id, "Image uploaded");

    Ok((StatusCode::CREATED, Json(ImageResponse::from(image))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_validate_price_accepts_two_places() {
        assert!(validate_price(&Decimal::from_str("99.99").unwrap()).is_ok());
        assert!(validate_price(&Decimal::from_str("0.00").unwrap()).is_ok());
        assert!(validate_price(&Decimal::from_str("12345678.99").unwrap()).is_ok());
    }

    #[test]
    fn test_validate_price_rejects_excess_scale() {
        let err = validate_price(&Decimal::from_str("9.999").unwrap()).unwrap_err();
        assert!(err.to_string().contains("Validation failed"));
    }

    #[test]
    fn test_validate_price_rejects_excess_digits() {
        // 9 whole digits + 2 decimal places = 11 total
        assert!(validate_price(&Decimal::from_str("123456789.99").unwrap()).is_err());
        // Exactly at the limit passes
        assert!(validate_price(&Decimal::from_str("99999999.99").unwrap()).is_ok());
    }

    #[test]
    fn test_validate_price_rejects_negative() {
        assert!(validate_price(&Decimal::from_str("-1.00").unwrap()).is_err());
    }

    #[test]
    fn test_product_request_missing_fields() {
        let req: ProductRequest = serde_json::from_str("{}").expect("empty body deserializes");
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();

        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("description"));
        assert!(fields.contains_key("price"));
    }

    #[test]
    fn test_product_request_price_from_string() {
        let req: ProductRequest =
            serde_json::from_str(r#"{"name": "Mouse", "description": "A mouse.", "price": "59.99"}"#)
                .expect("body deserializes");
        assert_eq!(req.price, Some(Decimal::from_str("59.99").unwrap()));
        assert!(req.validate().is_ok());
    }
}
