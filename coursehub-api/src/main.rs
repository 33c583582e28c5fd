//! # CourseHub API Server
//!
//! Serves the CourseHub HTTP API over Postgres, Razorpay and S3.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p coursehub-api
//! ```
//!
//! Set `LOG_FORMAT=json` for JSON log lines and `RUST_LOG` to override the
//! default filter.

use std::sync::Arc;

use anyhow::Context;
use coursehub_api::{
    app::{build_router, AppState},
    config::Config,
};
use coursehub_shared::{
    db::{
        migrations::run_migrations,
        pool::{close_pool, create_pool},
    },
    payment::razorpay::RazorpayGateway,
    store::postgres::PgStore,
    uploads::S3UploadSigner,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "coursehub_api=debug,coursehub_shared=info,tower_http=debug";

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);

    if std::env::var("LOG_FORMAT").map(|f| f == "json").unwrap_or(false) {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received, draining connections...");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    tracing::info!(
        "CourseHub API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env().context("failed to load configuration")?;

    let pool = create_pool(&config.database)
        .await
        .context("failed to connect to the database")?;
    run_migrations(&pool)
        .await
        .context("failed to run database migrations")?;

    let store = Arc::new(PgStore::new(
        pool.clone(),
        config.database.statement_timeout(),
    ));
    let gateway = Arc::new(RazorpayGateway::new(config.payments.razorpay())?);
    let uploads = Arc::new(S3UploadSigner::new(config.storage.s3()));

    tracing::info!(
        confirmation_mode = ?config.payments.confirmation_mode,
        access_days = config.entitlement.access_days,
        "Payment flow configured"
    );

    let bind_address = config.bind_address();
    let app = build_router(AppState::new(config, store, gateway, uploads));

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {}", bind_address))?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    close_pool(pool).await;
    tracing::info!("Server stopped");

    Ok(())
}
