/// Middleware and extractors for the API server
///
/// - `auth`: the `CurrentUser` extractor backing every authenticated endpoint

pub mod auth;
