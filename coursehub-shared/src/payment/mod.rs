/// Payment flow: order issuance, confirmation and webhooks
///
/// ```text
/// client ──► OrderService::issue ──► gateway order (notes: userId, courseId)
///        ──► gateway checkout (external)
///        ──► ConfirmationService::confirm ─┐
/// gateway ──► WebhookService::handle ───────┴─► EntitlementService::grant
/// ```
///
/// Both confirmation paths verify an HMAC signature before touching the
/// entitlement store, and both grant through the same idempotent operation.

pub mod confirmation;
pub mod gateway;
pub mod orders;
pub mod razorpay;
pub mod signature;
pub mod webhook;
