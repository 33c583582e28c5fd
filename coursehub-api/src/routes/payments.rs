/// Client payment confirmation
///
/// # Endpoint
///
/// ```text
/// POST /v1/payments/confirm
/// Content-Type: application/json
///
/// {
///   "gatewayOrderId": "order_...",
///   "gatewayPaymentId": "pay_...",
///   "gatewaySignature": "hex hmac",
///   "courseId": "uuid",
///   "userId": "uuid"
/// }
/// ```
///
/// # Response
///
/// ```json
/// { "success": true, "message": "Payment verified", "purchaseId": "uuid" }
/// ```
///
/// The order must have been issued by `POST /v1/orders` for the same
/// `userId` and `courseId`. Any verification failure is a 400 with
/// `success: false` and grants nothing.

use crate::{app::AppState, error::ApiResult, extract::ApiJson};
use axum::{extract::State, Json};
use coursehub_shared::payment::confirmation::PaymentConfirmation;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationResponse {
    pub success: bool,
    pub message: String,
    pub purchase_id: Uuid,
}

pub async fn confirm_payment(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<PaymentConfirmation>,
) -> ApiResult<Json<ConfirmationResponse>> {
    let grant = state.confirmations.confirm(&req).await?;

    info!(
        purchase_id = %grant.purchase.id,
        created = grant.created,
        mode = ?state.confirmations.mode(),
        "Payment confirmed"
    );

    let message = if grant.created {
        "Payment verified and course access granted"
    } else {
        "Payment already recorded"
    };

    Ok(Json(ConfirmationResponse {
        success: true,
        message: message.to_string(),
        purchase_id: grant.purchase.id,
    }))
}
