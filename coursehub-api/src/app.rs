//! Application state and router builder
//!
//! This module defines the shared application state and builds the Axum
//! router with all routes and middleware.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use coursehub_api::{app::{build_router, AppState}, config::Config};
//! use coursehub_shared::payment::razorpay::RazorpayGateway;
//! use coursehub_shared::store::postgres::PgStore;
//! use coursehub_shared::uploads::S3UploadSigner;
//! use sqlx::PgPool;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//! let pool = PgPool::connect(&config.database.url).await?;
//! let store = Arc::new(PgStore::new(pool, config.database.statement_timeout()));
//! let gateway = Arc::new(RazorpayGateway::new(config.payments.razorpay())?);
//! let uploads = Arc::new(S3UploadSigner::new(config.storage.s3()));
//!
//! let app = build_router(AppState::new(config, store, gateway, uploads));
//! # Ok(())
//! # }
//! ```

use crate::{
    config::Config,
    middleware::{
        auth::{require_admin, require_auth},
        security::SecurityHeadersLayer,
    },
};
use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use coursehub_shared::{
    access::AccessGate,
    auth::identity::{IdentityVerifier, JwtIdentityVerifier},
    entitlement::{EntitlementPolicy, EntitlementService},
    payment::{
        confirmation::ConfirmationService, gateway::PaymentGateway, orders::OrderService,
        webhook::WebhookService,
    },
    progress::ProgressTracker,
    store::Store,
    uploads::UploadSigner,
};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned into every handler via Axum's `State` extractor; every field is an
/// `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn Store>,
    pub identity: Arc<dyn IdentityVerifier>,
    pub entitlements: Arc<EntitlementService>,
    pub orders: Arc<OrderService>,
    pub confirmations: Arc<ConfirmationService>,
    pub webhooks: Arc<WebhookService>,
    pub access: Arc<AccessGate>,
    pub progress: Arc<ProgressTracker>,
    pub uploads: Arc<dyn UploadSigner>,
}

impl AppState {
    /// Wires the services over the given adapters
    pub fn new(
        config: Config,
        store: Arc<dyn Store>,
        gateway: Arc<dyn PaymentGateway>,
        uploads: Arc<dyn UploadSigner>,
    ) -> Self {
        let entitlements = Arc::new(EntitlementService::new(
            store.clone(),
            EntitlementPolicy::from_days(config.entitlement.access_days),
        ));

        Self {
            identity: Arc::new(JwtIdentityVerifier::new(config.jwt.secret.clone())),
            orders: Arc::new(OrderService::new(
                store.clone(),
                gateway.clone(),
                config.payments.currency.clone(),
            )),
            confirmations: Arc::new(ConfirmationService::new(
                store.clone(),
                entitlements.clone(),
                gateway,
                config.payments.key_secret.clone(),
                config.payments.confirmation_mode,
            )),
            webhooks: Arc::new(WebhookService::new(
                entitlements.clone(),
                config.payments.webhook_secret.clone(),
            )),
            access: Arc::new(AccessGate::new(store.clone(), entitlements.clone())),
            progress: Arc::new(ProgressTracker::new(store.clone(), entitlements.clone())),
            entitlements,
            store,
            uploads,
            config: Arc::new(config),
        }
    }

    /// Secret used to issue and validate JWTs
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// ```text
/// /
/// ├── GET  /health
/// └── /v1
///     ├── POST /auth/{signup,login,refresh}
///     ├── GET  /courses
///     ├── GET  /courses/:course_id                 (bearer)
///     ├── GET  /courses/by-title/:title            (bearer)
///     ├── POST /orders
///     ├── POST /payments/confirm
///     ├── POST /webhooks/payment                   (HMAC over raw body)
///     ├── GET  /purchases                          (bearer)
///     ├── POST /progress                           (bearer)
///     ├── GET  /progress/:course_id                (bearer)
///     └── /admin                                   (bearer + admin)
///         ├── POST /courses
///         ├── POST /courses/:course_id/lessons
///         ├── POST /uploads
///         └── POST /uploads/verify
/// ```
///
/// Layers, outermost first: security headers, CORS, request tracing.
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let auth_routes = Router::new()
        .route("/signup", post(routes::auth::signup))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    let public_routes = Router::new()
        .route("/courses", get(routes::courses::list_courses))
        .route("/orders", post(routes::orders::create_order))
        .route("/payments/confirm", post(routes::payments::confirm_payment))
        .route("/webhooks/payment", post(routes::webhooks::payment_webhook));

    let member_routes = Router::new()
        .route("/courses/:course_id", get(routes::courses::get_course))
        .route("/courses/by-title/:title", get(routes::courses::get_course_by_title))
        .route("/purchases", get(routes::purchases::list_purchases))
        .route("/progress", post(routes::progress::record_progress))
        .route("/progress/:course_id", get(routes::progress::course_progress))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    // Layers run bottom-up: authentication before the admin check
    let admin_routes = Router::new()
        .route("/courses", post(routes::admin::create_course))
        .route("/courses/:course_id/lessons", post(routes::admin::create_lesson))
        .route("/uploads", post(routes::admin::create_upload_url))
        .route("/uploads/verify", post(routes::admin::verify_upload))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_admin,
        ))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/admin", admin_routes)
        .merge(public_routes)
        .merge(member_routes);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config.api.cors_origins))
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        // Development mode: permissive CORS
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-signature"),
        ])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}
