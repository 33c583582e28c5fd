/// Gateway order issuance
///
/// # Endpoint
///
/// ```text
/// POST /v1/orders
/// Content-Type: application/json
///
/// { "amountMinorUnits": 4999, "userId": "uuid", "courseId": "uuid" }
/// ```
///
/// # Response (201)
///
/// ```json
/// { "gatewayOrderId": "order_EKwxwAgItmmXdp", "amount": 4999, "currency": "INR" }
/// ```

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ApiJson,
};
use axum::{extract::State, http::StatusCode, Json};
use coursehub_shared::{error::FieldError, payment::orders::OrderRef};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub amount_minor_units: Option<i64>,
    pub user_id: Option<String>,
    pub course_id: Option<String>,
}

impl CreateOrderRequest {
    /// Reports every missing or malformed field at once
    fn validate(&self) -> ApiResult<(i64, Uuid, Uuid)> {
        let mut errors = Vec::new();

        let mut id = |field: &str, raw: &Option<String>| match raw.as_deref().map(str::trim) {
            None | Some("") => {
                errors.push(FieldError::missing(field));
                None
            }
            Some(raw) => Uuid::parse_str(raw)
                .map_err(|_| errors.push(FieldError::new(field, "must be a valid UUID")))
                .ok(),
        };
        let user_id = id("userId", &self.user_id);
        let course_id = id("courseId", &self.course_id);

        if self.amount_minor_units.is_none() {
            errors.push(FieldError::missing("amountMinorUnits"));
        }

        match (self.amount_minor_units, user_id, course_id) {
            (Some(amount), Some(user_id), Some(course_id)) if errors.is_empty() => {
                Ok((amount, user_id, course_id))
            }
            _ => Err(ApiError::ValidationError(errors)),
        }
    }
}

/// Create a gateway order for a course purchase
///
/// # Errors
///
/// - `400 Bad Request`: missing fields, non-positive amount or an amount
///   different from the course price
/// - `404 Not Found`: unknown course or user
/// - `502 Bad Gateway`: the payment gateway failed or timed out
pub async fn create_order(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateOrderRequest>,
) -> ApiResult<(StatusCode, Json<OrderRef>)> {
    let (amount, user_id, course_id) = req.validate()?;

    let order = state.orders.issue(user_id, course_id, amount).await?;

    Ok((StatusCode::CREATED, Json(order)))
}
