/// Integration tests for the catalog endpoints and image upload
///
/// Requires a running PostgreSQL database; tests skip when `DATABASE_URL`
/// is unset. See `common/mod.rs`.

mod common;

use axum::http::StatusCode;
use bazaar_shared::models::product::Product;
use bazaar_shared::models::product_image::ProductImage;
use bazaar_shared::models::review::{CreateReview, Review};
use common::{has_field_error, TestContext, MINIMAL_GIF};
use serde_json::json;
use uuid::Uuid;

macro_rules! ctx_or_skip {
    () => {
        match TestContext::try_new().await {
            Some(ctx) => ctx,
            None => {
                eprintln!("DATABASE_URL not set; skipping integration test");
                return;
            }
        }
    };
}

#[tokio::test]
async fn test_list_products_unauthenticated() {
    let ctx = ctx_or_skip!();
    let product = ctx.create_product(&TestContext::unique("Keyboard"), "99.99").await;

    let (status, body) = ctx.get("/products").await;

    assert_eq!(status, StatusCode::OK);
    let listed = body
        .as_array()
        .expect("list response is an array")
        .iter()
        .find(|p| p["id"] == product.id.to_string())
        .expect("created product appears in the listing")
        .clone();

    assert_eq!(listed["name"], product.name.as_str());
    assert_eq!(listed["price"], "99.99");
    assert_eq!(listed["average_rating"], 0.0);
    assert_eq!(listed["url"], format!("/products/{}", product.id));
    assert!(listed["images"].as_array().expect("images array").is_empty());

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_list_products_ordered_by_name() {
    let ctx = ctx_or_skip!();
    let suffix = Uuid::new_v4().simple().to_string();
    let last = ctx.create_product(&format!("zzz-{}", suffix), "1.00").await;
    let first = ctx.create_product(&format!("aaa-{}", suffix), "1.00").await;

    let (status, body) = ctx.get("/products").await;
    assert_eq!(status, StatusCode::OK);

    let ids: Vec<String> = body
        .as_array()
        .expect("array")
        .iter()
        .map(|p| p["id"].as_str().unwrap_or_default().to_string())
        .collect();

    let first_pos = ids.iter().position(|id| *id == first.id.to_string());
    let last_pos = ids.iter().position(|id| *id == last.id.to_string());
    assert!(
        first_pos.expect("aaa product listed") < last_pos.expect("zzz product listed"),
        "products are ordered by name ascending"
    );

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_retrieve_product_detail() {
    let ctx = ctx_or_skip!();
    let product = ctx.create_product(&TestContext::unique("Monitor"), "299.99").await;

    let (status, body) = ctx.get(&format!("/products/{}", product.id)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], product.name.as_str());
    assert_eq!(body["description"], "A product under test.");
    assert_eq!(body["price"], "299.99");
    assert_eq!(body["average_rating"], 0.0);
    assert!(body["reviews"].as_array().expect("reviews array").is_empty());

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_retrieve_unknown_product() {
    let ctx = ctx_or_skip!();

    let (status, _) = ctx.get(&format!("/products/{}", Uuid::new_v4())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_admin_can_create_product() {
    let ctx = ctx_or_skip!();
    let admin = ctx.create_user(true).await;
    let token = ctx.login(&admin.username).await;
    let name = TestContext::unique("New Mouse");

    let (status, body) = ctx
        .post_json(
            "/products",
            Some(&token),
            &json!({ "name": name, "description": "A new gaming mouse.", "price": "59.99" }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED, "body: {}", body);
    assert_eq!(body["name"], name.as_str());
    assert_eq!(body["price"], "59.99");

    let id: Uuid = body["id"]
        .as_str()
        .expect("id in response")
        .parse()
        .expect("id is a uuid");
    ctx.track_product(id);

    let stored = Product::find_by_id(&ctx.db, id)
        .await
        .expect("query product")
        .expect("product persisted");
    assert_eq!(stored.name, name);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_regular_user_cannot_create_product() {
    let ctx = ctx_or_skip!();
    let user = ctx.create_user(false).await;
    let token = ctx.login(&user.username).await;
    let name = TestContext::unique("Unauthorized Product");

    let (status, _) = ctx
        .post_json(
            "/products",
            Some(&token),
            &json!({ "name": name, "description": "This should not be created.", "price": "10.00" }),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products WHERE name = $1")
        .bind(&name)
        .fetch_one(&ctx.db)
        .await
        .expect("count products");
    assert_eq!(count, 0, "product must not be created");

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_anonymous_cannot_create_product() {
    let ctx = ctx_or_skip!();

    let (status, _) = ctx
        .post_json(
            "/products",
            None,
            &json!({ "name": "Anon", "description": "No credentials.", "price": "10.00" }),
        )
        .await;

    // Missing credentials, not insufficient privilege
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_admin_can_update_product() {
    let ctx = ctx_or_skip!();
    let admin = ctx.create_user(true).await;
    let token = ctx.login(&admin.username).await;
    let product = ctx.create_product(&TestContext::unique("Keyboard"), "99.99").await;
    let new_name = TestContext::unique("Updated Keyboard");

    let (status, body) = ctx
        .put_json(
            &format!("/products/{}", product.id),
            Some(&token),
            &json!({ "name": new_name, "description": "An updated description.", "price": "109.99" }),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "body: {}", body);
    assert_eq!(body["name"], new_name.as_str());
    assert_eq!(body["price"], "109.99");

    let stored = Product::find_by_id(&ctx.db, product.id)
        .await
        .expect("query product")
        .expect("product still exists");
    assert_eq!(stored.name, new_name);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_regular_user_cannot_update_product() {
    let ctx = ctx_or_skip!();
    let user = ctx.create_user(false).await;
    let token = ctx.login(&user.username).await;
    let product = ctx.create_product(&TestContext::unique("Keyboard"), "99.99").await;

    let (status, _) = ctx
        .put_json(
            &format!("/products/{}", product.id),
            Some(&token),
            &json!({ "name": "Unauthorized Update", "description": "Nope.", "price": "1.00" }),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);

    let stored = Product::find_by_id(&ctx.db, product.id)
        .await
        .expect("query product")
        .expect("product still exists");
    assert_eq!(stored.name, product.name, "product must be unmodified");

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_update_unknown_product() {
    let ctx = ctx_or_skip!();
    let admin = ctx.create_user(true).await;
    let token = ctx.login(&admin.username).await;

    let (status, _) = ctx
        .put_json(
            &format!("/products/{}", Uuid::new_v4()),
            Some(&token),
            &json!({ "name": "Ghost", "description": "Missing.", "price": "1.00" }),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_admin_can_delete_product() {
    let ctx = ctx_or_skip!();
    let admin = ctx.create_user(true).await;
    let token = ctx.login(&admin.username).await;
    let product = ctx.create_product(&TestContext::unique("Doomed"), "5.00").await;

    let (status, _) = ctx
        .send_empty("DELETE", &format!("/products/{}", product.id), Some(&token))
        .await;

    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(Product::find_by_id(&ctx.db, product.id)
        .await
        .expect("query product")
        .is_none());

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_regular_user_cannot_delete_product() {
    let ctx = ctx_or_skip!();
    let user = ctx.create_user(false).await;
    let token = ctx.login(&user.username).await;
    let product = ctx.create_product(&TestContext::unique("Sturdy"), "5.00").await;

    let (status, _) = ctx
        .send_empty("DELETE", &format!("/products/{}", product.id), Some(&token))
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(Product::find_by_id(&ctx.db, product.id)
        .await
        .expect("query product")
        .is_some());

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_delete_cascades_images_and_reviews() {
    let ctx = ctx_or_skip!();
    let admin = ctx.create_user(true).await;
    let reviewer = ctx.create_user(false).await;
    let token = ctx.login(&admin.username).await;
    let product = ctx.create_product(&TestContext::unique("Cascade"), "5.00").await;

    ProductImage::create(&ctx.db, product.id, "products/test/cascade.gif")
        .await
        .expect("create image row");
    Review::create(
        &ctx.db,
        CreateReview {
            product_id: product.id,
            user_id: reviewer.id,
            rating: 4,
            feedback: "Fine.".to_string(),
        },
    )
    .await
    .expect("create review row");

    let (status, _) = ctx
        .send_empty("DELETE", &format!("/products/{}", product.id), Some(&token))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // No orphaned rows remain
    assert_eq!(
        ProductImage::count_for_product(&ctx.db, product.id)
            .await
            .expect("count images"),
        0
    );
    assert_eq!(
        Review::count_for_product(&ctx.db, product.id)
            .await
            .expect("count reviews"),
        0
    );

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_create_product_price_precision() {
    let ctx = ctx_or_skip!();
    let admin = ctx.create_user(true).await;
    let token = ctx.login(&admin.username).await;

    // Three fractional digits
    let (status, body) = ctx
        .post_json(
            "/products",
            Some(&token),
            &json!({ "name": "Precise", "description": "Too precise.", "price": "9.999" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(has_field_error(&body, "price"), "body: {}", body);

    // Eleven digits in total
    let (status, body) = ctx
        .post_json(
            "/products",
            Some(&token),
            &json!({ "name": "Huge", "description": "Too many digits.", "price": "123456789.99" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(has_field_error(&body, "price"), "body: {}", body);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_create_product_missing_fields() {
    let ctx = ctx_or_skip!();
    let admin = ctx.create_user(true).await;
    let token = ctx.login(&admin.username).await;

    let (status, body) = ctx.post_json("/products", Some(&token), &json!({})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(has_field_error(&body, "name"), "body: {}", body);
    assert!(has_field_error(&body, "price"), "body: {}", body);

    ctx.cleanup().await;
}

// --- Image upload ---

#[tokio::test]
async fn test_admin_can_upload_image() {
    let ctx = ctx_or_skip!();
    let admin = ctx.create_user(true).await;
    let token = ctx.login(&admin.username).await;
    let product = ctx.create_product(&TestContext::unique("Pictured"), "10.00").await;

    let (status, body) = ctx
        .post_image(
            &format!("/products/{}/upload-image", product.id),
            Some(&token),
            "test_image.gif",
            MINIMAL_GIF,
        )
        .await;

    assert_eq!(status, StatusCode::CREATED, "body: {}", body);
    let path = body["image"].as_str().expect("image path in response");
    assert!(path.starts_with(&format!("products/{}/", product.id)));
    assert!(path.ends_with(".gif"));

    // Exactly one image associated, and the file landed under the media root
    let images = ProductImage::list_for_product(&ctx.db, product.id)
        .await
        .expect("list images");
    assert_eq!(images.len(), 1);
    let on_disk = tokio::fs::read(ctx.media_root.join(path))
        .await
        .expect("stored file exists");
    assert_eq!(on_disk, MINIMAL_GIF);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_regular_user_cannot_upload_image() {
    let ctx = ctx_or_skip!();
    let user = ctx.create_user(false).await;
    let token = ctx.login(&user.username).await;
    let product = ctx.create_product(&TestContext::unique("Pictured"), "10.00").await;

    let (status, _) = ctx
        .post_image(
            &format!("/products/{}/upload-image", product.id),
            Some(&token),
            "test_image.gif",
            MINIMAL_GIF,
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        ProductImage::count_for_product(&ctx.db, product.id)
            .await
            .expect("count images"),
        0
    );

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_upload_image_unknown_product() {
    let ctx = ctx_or_skip!();
    let admin = ctx.create_user(true).await;
    let token = ctx.login(&admin.username).await;

    let (status, _) = ctx
        .post_image(
            &format!("/products/{}/upload-image", Uuid::new_v4()),
            Some(&token),
            "test_image.gif",
            MINIMAL_GIF,
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_upload_rejects_invalid_image() {
    let ctx = ctx_or_skip!();
    let admin = ctx.create_user(true).await;
    let token = ctx.login(&admin.username).await;
    let product = ctx.create_product(&TestContext::unique("Pictured"), "10.00").await;

    let (status, body) = ctx
        .post_image(
            &format!("/products/{}/upload-image", product.id),
            Some(&token),
            "not_an_image.txt",
            b"this is plain text, not image data",
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(has_field_error(&body, "image"), "body: {}", body);
    assert_eq!(
        ProductImage::count_for_product(&ctx.db, product.id)
            .await
            .expect("count images"),
        0
    );

    ctx.cleanup().await;
}
