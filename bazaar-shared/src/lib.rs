//! # Bazaar Shared Library
//!
//! This crate contains the data layer and authentication subsystem shared by
//! the Bazaar API server and its tooling.
//!
//! ## Module Organization
//!
//! - `models`: Database models and CRUD operations (users, tokens, catalog, reviews)
//! - `auth`: Password hashing, opaque token issuance, and the role policy
//! - `db`: Connection pool and migration runner

pub mod auth;
pub mod db;
pub mod models;

/// Current version of the Bazaar shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
