/// `GET /v1/purchases`: the caller's purchase history, newest first

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Extension, Json};
use chrono::Utc;
use coursehub_shared::{auth::identity::AuthContext, entitlement::PurchaseSummary};

pub async fn list_purchases(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<PurchaseSummary>>> {
    Ok(Json(
        state
            .entitlements
            .list_purchases(auth.user_id, Utc::now())
            .await?,
    ))
}
