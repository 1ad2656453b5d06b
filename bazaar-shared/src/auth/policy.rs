/// Role policy and permission checks
///
/// Every mutating endpoint consults this table before its handler body runs.
/// The policy is a plain function over (role, action) rather than anything
/// attached to handler types, so the full access matrix is visible in one
/// place and testable without a server.
///
/// # Permission Model
///
/// - Catalog and review reads are open to everyone, including anonymous
///   callers.
/// - Catalog writes and image uploads require a staff user.
/// - Review writes require any authenticated user.
///
/// # Example
///
/// ```
/// use bazaar_shared::auth::policy::{is_allowed, require, Action, Role};
///
/// assert!(is_allowed(Role::Anonymous, Action::ReadCatalog));
/// assert!(require(Role::Staff, Action::WriteCatalog).is_ok());
/// assert!(require(Role::Authenticated, Action::WriteCatalog).is_err());
/// ```

use serde::{Deserialize, Serialize};

/// Caller role, derived from the authenticated user record (or its absence)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// No credentials presented
    Anonymous,

    /// Valid token for a non-staff user
    Authenticated,

    /// Valid token for a user with is_staff or is_superuser set
    Staff,
}

/// Operations gated by the policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// List products or fetch product detail
    ReadCatalog,

    /// Create, update, or delete a product
    WriteCatalog,

    /// Attach an image to a product
    UploadImage,

    /// List a product's reviews
    ReadReviews,

    /// Post a review
    WriteReview,
}

/// Error type for policy denials
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    /// Caller's role does not permit the action
    #[error("Role {role:?} may not perform {action:?}")]
    Denied {
        role: Role,
        action: Action,
    },
}

/// The access matrix: returns whether `role` may perform `action`
pub fn is_allowed(role: Role, action: Action) -> bool {
    match action {
        Action::ReadCatalog | Action::ReadReviews => true,
        Action::WriteCatalog | Action::UploadImage => role == Role::Staff,
        Action::WriteReview => matches!(role, Role::Authenticated | Role::Staff),
    }
}

/// Checks the policy, returning a `PolicyError` on denial
///
/// # Errors
///
/// Returns `PolicyError::Denied` when the role is not allowed the action.
/// The API layer maps this to 403 Forbidden; anonymous callers are rejected
/// with 401 before the policy is consulted.
pub fn require(role: Role, action: Action) -> Result<(), PolicyError> {
    if is_allowed(role, action) {
        Ok(())
    } else {
        Err(PolicyError::Denied { role, action })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_open_to_everyone() {
        for role in [Role::Anonymous, Role::Authenticated, Role::Staff] {
            assert!(is_allowed(role, Action::ReadCatalog));
            assert!(is_allowed(role, Action::ReadReviews));
        }
    }

    #[test]
    fn test_catalog_writes_staff_only() {
        assert!(is_allowed(Role::Staff, Action::WriteCatalog));
        assert!(is_allowed(Role::Staff, Action::UploadImage));

        assert!(!is_allowed(Role::Authenticated, Action::WriteCatalog));
        assert!(!is_allowed(Role::Authenticated, Action::UploadImage));
        assert!(!is_allowed(Role::Anonymous, Action::WriteCatalog));
        assert!(!is_allowed(Role::Anonymous, Action::UploadImage));
    }

    #[test]
    fn test_review_writes_require_authentication() {
        assert!(is_allowed(Role::Authenticated, Action::WriteReview));
        assert!(is_allowed(Role::Staff, Action::WriteReview));
        assert!(!is_allowed(Role::Anonymous, Action::WriteReview));
    }

    #[test]
    fn test_require_reports_denial() {
        let err = require(Role::Authenticated, Action::WriteCatalog).unwrap_err();
        assert!(err.to_string().contains("WriteCatalog"));
    }
}
