//! # CourseHub API Server Library
//!
//! HTTP surface for the CourseHub course platform: accounts, catalog,
//! gateway orders, payment confirmation, webhooks, gated course pages and
//! lesson progress.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Request extractors with API-shaped rejections
//! - `middleware`: Bearer auth, admin guard and security headers
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
