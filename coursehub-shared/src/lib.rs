//! # CourseHub Shared Library
//!
//! Domain logic for the CourseHub API: course catalog, payment verification,
//! time-bounded entitlements, content gating and lesson progress.
//!
//! ## Module Organization
//!
//! - `models`: row types and their SQL
//! - `store`: persistence port with Postgres and in-memory adapters
//! - `db`: connection pool and migrations
//! - `auth`: passwords, JWTs and bearer identity verification
//! - `payment`: signature verification, gateway client, orders, confirmation, webhooks
//! - `entitlement`: idempotent grants and access status
//! - `access`: course views gated by entitlement
//! - `progress`: per-lesson completion tracking
//! - `uploads`: presigned media uploads
//! - `error`: service error taxonomy

pub mod access;
pub mod auth;
pub mod db;
pub mod entitlement;
pub mod error;
pub mod models;
pub mod payment;
pub mod progress;
pub mod store;
pub mod uploads;

/// Current version of the CourseHub shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
