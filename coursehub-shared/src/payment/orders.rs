/// Order issuance
///
/// Creates a gateway order for a course purchase and records it locally. The
/// order's notes carry the user and course ids; they come back on the webhook
/// and on a server-side order fetch. The local record is what a client
/// confirmation is checked against.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::gateway::{CreateOrder, OrderNotes, PaymentGateway};
use crate::error::{CoreError, CoreResult};
use crate::models::order::NewOrder;
use crate::store::Store;

pub const DEFAULT_CURRENCY: &str = "INR";

/// What the client needs to open the gateway checkout
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRef {
    pub gateway_order_id: String,
    pub amount: i64,
    pub currency: String,
}

pub struct OrderService {
    store: Arc<dyn Store>,
    gateway: Arc<dyn PaymentGateway>,
    currency: String,
}

impl OrderService {
    pub fn new(
        store: Arc<dyn Store>,
        gateway: Arc<dyn PaymentGateway>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            store,
            gateway,
            currency: currency.into(),
        }
    }

    /// Issues an order for `course_id` priced in minor units
    ///
    /// # Errors
    ///
    /// - `Validation` if `amount` is not positive or differs from the course price
    /// - `NotFound` if the course or the user does not exist
    /// - `Gateway` if the provider call fails or times out
    pub async fn issue(&self, user_id: Uuid, course_id: Uuid, amount: i64) -> CoreResult<OrderRef> {
        if amount <= 0 {
            return Err(CoreError::invalid(
                "amountMinorUnits",
                "must be a positive integer",
            ));
        }

        let course = self
            .store
            .find_course(course_id)
            .await?
            .ok_or_else(|| CoreError::NotFound("Course not found".to_string()))?;

        if course.price != amount {
            return Err(CoreError::invalid(
                "amountMinorUnits",
                format!("must equal the course price of {}", course.price),
            ));
        }

        if self.store.find_user(user_id).await?.is_none() {
            return Err(CoreError::NotFound("User not found".to_string()));
        }

        let order = self
            .gateway
            .create_order(CreateOrder {
                amount,
                currency: self.currency.clone(),
                receipt: format!("receipt_{}", Utc::now().timestamp_millis()),
                notes: OrderNotes { user_id, course_id },
            })
            .await?;

        self.store
            .insert_order(NewOrder {
                gateway_order_id: order.id.clone(),
                user_id,
                course_id,
                amount,
                currency: order.currency.clone(),
            })
            .await?;

        info!(
            order_id = %order.id,
            user_id = %user_id,
            course_id = %course_id,
            amount,
            "Order issued"
        );

        Ok(OrderRef {
            gateway_order_id: order.id,
            amount: order.amount,
            currency: order.currency,
        })
    }
}
