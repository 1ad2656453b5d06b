/// Token authentication extractor
///
/// Handlers that require a caller take a [`CurrentUser`] argument; extraction
/// resolves the `Authorization: Token <key>` header against the store and
/// rejects with 401 before the handler body runs. Role checks (403) happen
/// afterwards, in the handler, via the policy module, so an anonymous write
/// is always reported as missing credentials rather than insufficient
/// privilege.
///
/// # Example
///
/// ```no_run
/// use bazaar_api::error::ApiResult;
/// use bazaar_api::middleware::auth::CurrentUser;
///
/// async fn whoami(CurrentUser(ctx): CurrentUser) -> ApiResult<String> {
///     Ok(ctx.username)
/// }
/// ```

use axum::{extract::FromRequestParts, http::header, http::request::Parts};
use bazaar_shared::auth::middleware::{authenticate_token, AuthContext};

use crate::{app::AppState, error::ApiError};

/// The authenticated caller, resolved from the bearer token
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthContext);

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());

        let ctx = authenticate_token(&state.db, header).await?;

        Ok(CurrentUser(ctx))
    }
}
