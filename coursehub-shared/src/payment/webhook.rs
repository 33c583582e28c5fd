/// Gateway webhook processing
///
/// Webhooks are the authoritative confirmation path: the gateway calls the
/// server directly and signs the raw body with a webhook secret that is
/// distinct from the API key secret. The signature is checked over the exact
/// bytes received, before the body is parsed.
///
/// `order.paid` and `payment.captured` grant the entitlement named in the
/// payment's notes (falling back to the order's notes). Every other event is
/// reported as [`WebhookOutcome::Ignored`] so the gateway stops retrying it.
///
/// A Razorpay `order.paid` body looks like:
///
/// ```json
/// {
///   "event": "order.paid",
///   "payload": {
///     "payment": { "entity": { "id": "pay_1", "order_id": "order_1",
///                              "notes": { "userId": "...", "courseId": "..." } } },
///     "order":   { "entity": { "id": "order_1", "notes": { ... } } }
///   }
/// }
/// ```

use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};

use super::gateway::OrderNotes;
use super::signature::verify;
use crate::entitlement::{EntitlementService, Grant, GrantRequest};
use crate::error::{CoreError, CoreResult, FieldError};
use crate::models::purchase::GrantSource;

/// Events that mean money has been collected
pub const GRANTING_EVENTS: [&str; 2] = ["order.paid", "payment.captured"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    Granted(Grant),

    /// Verified but not an event this service acts on
    Ignored(String),
}

#[derive(Debug, Deserialize)]
struct WebhookEvent {
    event: String,
    #[serde(default)]
    payload: WebhookPayload,
}

#[derive(Debug, Default, Deserialize)]
struct WebhookPayload {
    payment: Option<Envelope<PaymentEntity>>,
    order: Option<Envelope<OrderEntity>>,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    entity: T,
}

#[derive(Debug, Deserialize)]
struct PaymentEntity {
    id: String,
    order_id: Option<String>,
    #[serde(default)]
    notes: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct OrderEntity {
    id: String,
    #[serde(default)]
    notes: serde_json::Value,
}

fn read_notes(notes: &serde_json::Value) -> Option<OrderNotes> {
    serde_json::from_value(notes.clone()).ok()
}

pub struct WebhookService {
    entitlements: Arc<EntitlementService>,
    webhook_secret: String,
}

impl WebhookService {
    pub fn new(entitlements: Arc<EntitlementService>, webhook_secret: impl Into<String>) -> Self {
        Self {
            entitlements,
            webhook_secret: webhook_secret.into(),
        }
    }

    /// Verifies and applies one webhook delivery
    ///
    /// `raw_body` must be the request body exactly as received.
    ///
    /// # Errors
    ///
    /// - `Validation` if the signature header is absent, or a verified body is
    ///   not JSON or lacks the payment entity or its notes
    /// - `Verification` if the signature does not match
    /// - `NotFound` if the referenced course or user does not exist
    pub async fn handle(&self, raw_body: &[u8], signature: Option<&str>) -> CoreResult<WebhookOutcome> {
        if !verify(&self.webhook_secret, raw_body, signature.unwrap_or_default())? {
            warn!("Webhook rejected: signature mismatch");
            return Err(CoreError::Verification("Invalid signature".to_string()));
        }

        let event: WebhookEvent = serde_json::from_slice(raw_body)
            .map_err(|_| CoreError::invalid("body", "is not a valid webhook event"))?;

        if !GRANTING_EVENTS.contains(&event.event.as_str()) {
            info!(event = %event.event, "Webhook event ignored");
            return Ok(WebhookOutcome::Ignored(event.event));
        }

        let payment = event
            .payload
            .payment
            .map(|p| p.entity)
            .ok_or_else(|| CoreError::invalid("payload.payment.entity", "is required"))?;
        let order = event.payload.order.map(|o| o.entity);

        let notes = read_notes(&payment.notes)
            .or_else(|| order.as_ref().and_then(|o| read_notes(&o.notes)))
            .ok_or_else(|| {
                CoreError::Validation(vec![
                    FieldError::missing("notes.userId"),
                    FieldError::missing("notes.courseId"),
                ])
            })?;

        let order_id = payment.order_id.or_else(|| order.map(|o| o.id));

        let grant = self
            .entitlements
            .grant(GrantRequest {
                user_id: notes.user_id,
                course_id: notes.course_id,
                gateway_order_id: order_id,
                gateway_payment_id: payment.id,
                source: GrantSource::Webhook,
            })
            .await?;

        info!(
            event = %event.event,
            purchase_id = %grant.purchase.id,
            created = grant.created,
            "Webhook processed"
        );
        Ok(WebhookOutcome::Granted(grant))
    }
}
