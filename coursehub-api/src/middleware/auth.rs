/// Bearer authentication and admin authorization
///
/// `require_auth` resolves the bearer token through the [`IdentityVerifier`]
/// held in [`AppState`] and inserts an [`AuthContext`] into the request
/// extensions. `require_admin` must run inside it and checks the caller's
/// email against `ADMIN_EMAILS`.
///
/// [`IdentityVerifier`]: coursehub_shared::auth::identity::IdentityVerifier

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use coursehub_shared::auth::identity::{bearer_token, AuthContext};
use tracing::{debug, warn};

use crate::{app::AppState, error::ApiError};

pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(req.headers())?;

    let identity = state.identity.verify(token).await.map_err(|e| {
        debug!(error = %e, "Bearer token rejected");
        ApiError::from(e)
    })?;

    req.extensions_mut().insert(AuthContext::from(identity));

    Ok(next.run(req).await)
}

pub async fn require_admin(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx = req
        .extensions()
        .get::<AuthContext>()
        .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

    if !state.config.admin.is_admin(&ctx.email) {
        warn!(user_id = %ctx.user_id, "Non-admin request to admin route");
        return Err(ApiError::Forbidden("Admin access required".to_string()));
    }

    Ok(next.run(req).await)
}
