/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: liveness and database connectivity
/// - `auth`: signup, login, token refresh
/// - `courses`: catalog and entitlement-gated course pages
/// - `orders`: gateway order issuance
/// - `payments`: client payment confirmation
/// - `webhooks`: gateway webhook receiver
/// - `purchases`: the caller's purchase history
/// - `progress`: lesson completion
/// - `admin`: catalog authoring and media uploads

pub mod admin;
pub mod auth;
pub mod courses;
pub mod health;
pub mod orders;
pub mod payments;
pub mod progress;
pub mod purchases;
pub mod webhooks;
