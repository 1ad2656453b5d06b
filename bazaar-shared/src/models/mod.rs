/// Database models for Bazaar
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: User accounts (registration, role flags)
/// - `token`: Opaque bearer tokens, one per user
/// - `product`: Product catalog entries with the average-rating aggregate
/// - `product_image`: Images attached to products
/// - `review`: Per-product customer reviews, unique per (product, user)

pub mod product;
pub mod product_image;
pub mod review;
pub mod token;
pub mod user;
