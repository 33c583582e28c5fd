/// Payment gateway port
///
/// Services talk to the payment provider only through [`PaymentGateway`].
/// Production uses [`super::razorpay::RazorpayGateway`]; tests substitute an
/// in-process fake.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreResult;

/// Metadata attached to a gateway order
///
/// Carries the user and course the order pays for. Webhook events recover the
/// entitlement to grant from these; client confirmations are checked against
/// the locally recorded order instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderNotes {
    pub user_id: Uuid,
    pub course_id: Uuid,
}

/// Order creation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOrder {
    /// Amount in the currency's minor unit (paise, cents)
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
    pub notes: OrderNotes,
}

/// Order as reported by the gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub receipt: Option<String>,

    /// `created`, `attempted` or `paid`
    pub status: String,

    /// `None` when the order carries no readable user/course notes
    pub notes: Option<OrderNotes>,
}

impl GatewayOrder {
    pub fn is_paid(&self) -> bool {
        self.status == "paid"
    }
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates an order. Not retried: a retry could create a second order.
    async fn create_order(&self, request: CreateOrder) -> CoreResult<GatewayOrder>;

    /// Reads an order's current state from the gateway
    async fn fetch_order(&self, order_id: &str) -> CoreResult<GatewayOrder>;
}
