/// Gateway webhook receiver
///
/// The body is taken as raw [`Bytes`] so the HMAC is computed over exactly
/// what the gateway signed; JSON parsing happens only after verification.
///
/// # Endpoint
///
/// ```text
/// POST /v1/webhooks/payment
/// X-Signature: <hex hmac-sha256 of the body>     (or X-Razorpay-Signature)
/// ```
///
/// # Responses
///
/// - `200 {"message", "purchaseId", "created"}` for `order.paid` / `payment.captured`
/// - `400 {"error": "unhandled_event"}` for any other verified event
/// - `400` with the standard error body for a bad signature or payload

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use coursehub_shared::payment::webhook::WebhookOutcome;
use serde::Serialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

/// Accepted signature headers, in lookup order
pub const SIGNATURE_HEADERS: [&str; 2] = ["x-signature", "x-razorpay-signature"];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
    pub message: String,
    pub purchase_id: Uuid,
    pub created: bool,
}

fn signature(headers: &HeaderMap) -> Option<&str> {
    SIGNATURE_HEADERS
        .iter()
        .find_map(|name| headers.get(*name))
        .and_then(|v| v.to_str().ok())
}

pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Response> {
    let outcome = state.webhooks.handle(&body, signature(&headers)).await?;

    Ok(match outcome {
        WebhookOutcome::Granted(grant) => {
            info!(
                purchase_id = %grant.purchase.id,
                created = grant.created,
                "Webhook processed"
            );
            Json(WebhookResponse {
                message: if grant.created {
                    "Course access granted"
                } else {
                    "Payment already recorded"
                }
                .to_string(),
                purchase_id: grant.purchase.id,
                created: grant.created,
            })
            .into_response()
        }
        WebhookOutcome::Ignored(event) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "unhandled_event", "event": event })),
        )
            .into_response(),
    })
}
