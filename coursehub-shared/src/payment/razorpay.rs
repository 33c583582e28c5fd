/// Razorpay Orders API client
///
/// Implements [`PaymentGateway`] over HTTPS:
///
/// - `POST {api_base}/v1/orders` creates an order with auto-capture enabled
/// - `GET {api_base}/v1/orders/{id}` reads it back
///
/// Requests use HTTP basic auth with the key id and key secret. Every call is
/// bounded by the client's request timeout. Transport failures, timeouts,
/// non-2xx responses and unreadable bodies all surface as
/// [`CoreError::Gateway`]; the upstream detail is logged, not returned.
///
/// ```no_run
/// use std::time::Duration;
/// use coursehub_shared::payment::razorpay::{RazorpayConfig, RazorpayGateway};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let gateway = RazorpayGateway::new(RazorpayConfig {
///     key_id: "rzp_test_123".to_string(),
///     key_secret: "secret".to_string(),
///     api_base: "https://api.razorpay.com".to_string(),
///     timeout: Duration::from_secs(10),
/// })?;
/// # Ok(())
/// # }
/// ```

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::gateway::{CreateOrder, GatewayOrder, OrderNotes, PaymentGateway};
use crate::error::{CoreError, CoreResult};

pub const DEFAULT_API_BASE: &str = "https://api.razorpay.com";

#[derive(Clone)]
pub struct RazorpayConfig {
    pub key_id: String,
    pub key_secret: String,
    pub api_base: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for RazorpayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RazorpayConfig")
            .field("key_id", &self.key_id)
            .field("key_secret", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("timeout", &self.timeout)
            .finish()
    }
}

pub struct RazorpayGateway {
    config: RazorpayConfig,
    http_client: reqwest::Client,
}

#[derive(Serialize)]
struct OrderRequest<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
    payment_capture: bool,
    notes: &'a OrderNotes,
}

/// Wire shape of an order. `notes` is an object when set and `[]` when empty.
#[derive(Deserialize)]
struct RazorpayOrder {
    id: String,
    amount: i64,
    currency: String,
    #[serde(default)]
    receipt: Option<String>,
    status: String,
    #[serde(default)]
    notes: serde_json::Value,
}

impl From<RazorpayOrder> for GatewayOrder {
    fn from(order: RazorpayOrder) -> Self {
        GatewayOrder {
            id: order.id,
            amount: order.amount,
            currency: order.currency,
            receipt: order.receipt,
            status: order.status,
            notes: serde_json::from_value(order.notes).ok(),
        }
    }
}

impl RazorpayGateway {
    pub fn new(config: RazorpayConfig) -> CoreResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CoreError::Gateway(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base.trim_end_matches('/'), path)
    }

    async fn read_order(
        &self,
        operation: &'static str,
        response: Result<reqwest::Response, reqwest::Error>,
    ) -> CoreResult<GatewayOrder> {
        let response = response.map_err(|e| {
            warn!(operation, timeout = e.is_timeout(), error = %e, "Gateway request failed");
            CoreError::Gateway(format!("{} request failed", operation))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(operation, status = status.as_u16(), body = %body, "Gateway returned an error");
            return Err(CoreError::Gateway(format!(
                "{} rejected with status {}",
                operation, status
            )));
        }

        let order: RazorpayOrder = response.json().await.map_err(|e| {
            warn!(operation, error = %e, "Gateway response could not be parsed");
            CoreError::Gateway(format!("{} returned an unreadable body", operation))
        })?;

        Ok(order.into())
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    async fn create_order(&self, request: CreateOrder) -> CoreResult<GatewayOrder> {
        if request.amount <= 0 {
            return Err(CoreError::invalid("amount", "must be a positive integer"));
        }

        let body = OrderRequest {
            amount: request.amount,
            currency: &request.currency,
            receipt: &request.receipt,
            payment_capture: true,
            notes: &request.notes,
        };

        let response = self
            .http_client
            .post(self.url("/v1/orders"))
            .basic_auth(&self.config.key_id, Some(&self.config.key_secret))
            .json(&body)
            .send()
            .await;

        let order = self.read_order("create_order", response).await?;
        info!(
            order_id = %order.id,
            amount = order.amount,
            currency = %order.currency,
            "Gateway order created"
        );
        Ok(order)
    }

    async fn fetch_order(&self, order_id: &str) -> CoreResult<GatewayOrder> {
        let response = self
            .http_client
            .get(self.url(&format!("/v1/orders/{}", order_id)))
            .basic_auth(&self.config.key_id, Some(&self.config.key_secret))
            .send()
            .await;

        self.read_order("fetch_order", response).await
    }
}
