/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Account endpoints (register, login, logout)
/// - `products`: Catalog CRUD and image upload
/// - `reviews`: Per-product review listing and creation

pub mod auth;
pub mod health;
pub mod products;
pub mod reviews;
