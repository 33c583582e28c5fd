/// Client-reported payment confirmation
///
/// After checkout the client posts the gateway's order id, payment id and
/// signature. The signature is an HMAC over `"{order_id}|{payment_id}"` with
/// the API key secret, which the client never sees, so a forged report cannot
/// carry a valid one. Nothing is granted unless it matches.
///
/// The signature says nothing about who paid or for what. The order it names
/// must be one this service issued, for the same user and course the client
/// reports; otherwise nothing is granted.
///
/// Two modes are supported:
///
/// - [`ConfirmationMode::Signature`]: a matching signature on a matching
///   issued order grants access
/// - [`ConfirmationMode::GatewayPoll`]: additionally fetches the order from
///   the gateway and requires it to be `paid` for the issued amount, with
///   notes naming the same user and course

use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use super::gateway::{OrderNotes, PaymentGateway};
use super::signature::{payment_message, verify};
use crate::entitlement::{EntitlementService, Grant, GrantRequest};
use crate::error::{CoreError, CoreResult, FieldError};
use crate::models::order::IssuedOrder;
use crate::models::purchase::GrantSource;
use crate::store::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfirmationMode {
    #[default]
    Signature,
    GatewayPoll,
}

impl FromStr for ConfirmationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "signature" => Ok(ConfirmationMode::Signature),
            "gateway_poll" => Ok(ConfirmationMode::GatewayPoll),
            other => Err(format!(
                "unknown confirmation mode '{}', expected 'signature' or 'gateway_poll'",
                other
            )),
        }
    }
}

/// Confirmation as posted by the client; every field is required
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PaymentConfirmation {
    pub gateway_order_id: Option<String>,
    pub gateway_payment_id: Option<String>,
    pub gateway_signature: Option<String>,
    pub course_id: Option<String>,
    pub user_id: Option<String>,
}

struct Confirmed<'a> {
    order_id: &'a str,
    payment_id: &'a str,
    signature: &'a str,
    notes: OrderNotes,
}

fn present<'a>(value: &'a Option<String>, field: &str, errors: &mut Vec<FieldError>) -> &'a str {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => {
            errors.push(FieldError::missing(field));
            ""
        }
    }
}

fn parse_id(raw: &str, field: &str, errors: &mut Vec<FieldError>) -> Uuid {
    if raw.is_empty() {
        return Uuid::nil();
    }
    Uuid::parse_str(raw).unwrap_or_else(|_| {
        errors.push(FieldError::new(field, "must be a valid UUID"));
        Uuid::nil()
    })
}

impl PaymentConfirmation {
    fn validate(&self) -> CoreResult<Confirmed<'_>> {
        let mut errors = Vec::new();

        let order_id = present(&self.gateway_order_id, "gatewayOrderId", &mut errors);
        let payment_id = present(&self.gateway_payment_id, "gatewayPaymentId", &mut errors);
        let signature = present(&self.gateway_signature, "gatewaySignature", &mut errors);
        let course_raw = present(&self.course_id, "courseId", &mut errors);
        let user_raw = present(&self.user_id, "userId", &mut errors);

        let course_id = parse_id(course_raw, "courseId", &mut errors);
        let user_id = parse_id(user_raw, "userId", &mut errors);

        if !errors.is_empty() {
            return Err(CoreError::Validation(errors));
        }

        Ok(Confirmed {
            order_id,
            payment_id,
            signature,
            notes: OrderNotes { user_id, course_id },
        })
    }
}

pub struct ConfirmationService {
    store: Arc<dyn Store>,
    entitlements: Arc<EntitlementService>,
    gateway: Arc<dyn PaymentGateway>,
    key_secret: String,
    mode: ConfirmationMode,
}

impl ConfirmationService {
    pub fn new(
        store: Arc<dyn Store>,
        entitlements: Arc<EntitlementService>,
        gateway: Arc<dyn PaymentGateway>,
        key_secret: impl Into<String>,
        mode: ConfirmationMode,
    ) -> Self {
        Self {
            store,
            entitlements,
            gateway,
            key_secret: key_secret.into(),
            mode,
        }
    }

    pub fn mode(&self) -> ConfirmationMode {
        self.mode
    }

    /// Verifies a client confirmation and grants the entitlement
    ///
    /// # Errors
    ///
    /// - `Validation` listing every missing or malformed field
    /// - `Verification` on a signature mismatch, when the order was not issued
    ///   here or was issued for a different user or course, or in gateway-poll
    ///   mode when the gateway does not report it paid
    /// - `NotFound` if the course or user does not exist
    pub async fn confirm(&self, input: &PaymentConfirmation) -> CoreResult<Grant> {
        let confirmed = input.validate()?;

        let message = payment_message(confirmed.order_id, confirmed.payment_id);
        if !verify(&self.key_secret, message.as_bytes(), confirmed.signature)? {
            warn!(
                order_id = %confirmed.order_id,
                "Payment confirmation rejected: signature mismatch"
            );
            return Err(CoreError::Verification(
                "Payment verification failed".to_string(),
            ));
        }

        let issued = self.issued_order(&confirmed).await?;

        if self.mode == ConfirmationMode::GatewayPoll {
            self.check_with_gateway(&issued).await?;
        }

        self.entitlements
            .grant(GrantRequest {
                user_id: confirmed.notes.user_id,
                course_id: confirmed.notes.course_id,
                gateway_order_id: Some(confirmed.order_id.to_string()),
                gateway_payment_id: confirmed.payment_id.to_string(),
                source: GrantSource::Confirmation,
            })
            .await
    }

    async fn issued_order(&self, confirmed: &Confirmed<'_>) -> CoreResult<IssuedOrder> {
        let order = self.store.find_order(confirmed.order_id).await?;

        match order {
            Some(order) if order.notes() == confirmed.notes => Ok(order),
            Some(_) => {
                warn!(
                    order_id = %confirmed.order_id,
                    "Payment confirmation rejected: order issued for another user or course"
                );
                Err(CoreError::Verification(
                    "Order does not match this purchase".to_string(),
                ))
            }
            None => {
                warn!(
                    order_id = %confirmed.order_id,
                    "Payment confirmation rejected: order was not issued here"
                );
                Err(CoreError::Verification(
                    "Order does not match this purchase".to_string(),
                ))
            }
        }
    }

    async fn check_with_gateway(&self, issued: &IssuedOrder) -> CoreResult<()> {
        let order = self.gateway.fetch_order(&issued.gateway_order_id).await?;

        if !order.is_paid() {
            warn!(
                order_id = %order.id,
                status = %order.status,
                "Payment confirmation rejected: order not paid"
            );
            return Err(CoreError::Verification(
                "Payment has not been settled".to_string(),
            ));
        }

        if order.notes != Some(issued.notes()) || order.amount != issued.amount {
            warn!(
                order_id = %order.id,
                "Payment confirmation rejected: gateway order does not match issued order"
            );
            return Err(CoreError::Verification(
                "Order does not match this purchase".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parsing() {
        assert_eq!(
            "signature".parse::<ConfirmationMode>().unwrap(),
            ConfirmationMode::Signature
        );
        assert_eq!(
            "GATEWAY_POLL".parse::<ConfirmationMode>().unwrap(),
            ConfirmationMode::GatewayPoll
        );
        assert!("webhook_only".parse::<ConfirmationMode>().is_err());
    }

    #[test]
    fn test_validation_lists_every_missing_field() {
        let input = PaymentConfirmation {
            gateway_order_id: Some("order_1".to_string()),
            gateway_payment_id: Some("   ".to_string()),
            ..Default::default()
        };

        match input.validate() {
            Err(CoreError::Validation(errors)) => {
                let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(
                    fields,
                    vec!["gatewayPaymentId", "gatewaySignature", "courseId", "userId"]
                );
            }
            _ => panic!("expected validation error"),
        }
    }

    #[test]
    fn test_validation_rejects_malformed_ids() {
        let input = PaymentConfirmation {
            gateway_order_id: Some("order_1".to_string()),
            gateway_payment_id: Some("pay_1".to_string()),
            gateway_signature: Some("abc".to_string()),
            course_id: Some("not-a-uuid".to_string()),
            user_id: Some(Uuid::new_v4().to_string()),
        };

        match input.validate() {
            Err(CoreError::Validation(errors)) => {
                assert_eq!(errors, vec![FieldError::new("courseId", "must be a valid UUID")]);
            }
            _ => panic!("expected validation error"),
        }
    }

    #[test]
    fn test_deserializes_camel_case_with_missing_fields() {
        let input: PaymentConfirmation =
            serde_json::from_str(r#"{"gatewayOrderId":"order_1"}"#).unwrap();
        assert_eq!(input.gateway_order_id.as_deref(), Some("order_1"));
        assert!(input.gateway_signature.is_none());
    }
}
