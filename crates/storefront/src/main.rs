//! Barbaro Storefront - Product catalog and cart API.
//!
//! Serves the storefront JSON API on port 3000 by default.
//!
//! # Architecture
//!
//! - Axum web framework
//! - Product catalog loaded from a YAML file at startup
//! - Per-visitor carts persisted write-through to a key-value backend
//!   (directory of JSON files, or memory when no directory is configured)
//! - Sessions stored in the same backend, carrying only the cart token

#![cfg_attr(not(test), forbid(unsafe_code))]

use barbaro_storefront::config::StorefrontConfig;
use barbaro_storefront::middleware::{EXPIRED_SWEEP_INTERVAL, KvSessionStore};
use barbaro_storefront::routes;
use barbaro_storefront::state::AppState;
use sentry::integrations::tracing as sentry_tracing;
use tower_sessions::session_store::ExpiredDeletion;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "barbaro_storefront=info,tower_http=debug";

/// Start Sentry when a DSN is configured. The guard flushes events on drop.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_deref()?;

    let options = sentry::ClientOptions {
        release: sentry::release_name!(),
        environment: config
            .sentry_environment
            .clone()
            .map(std::borrow::Cow::Owned),
        sample_rate: config.sentry_sample_rate,
        traces_sample_rate: config.sentry_traces_sample_rate,
        attach_stacktrace: true,
        ..Default::default()
    };

    Some(sentry::init((dsn, options)))
}

/// Warnings and errors become Sentry events; info and debug ride along as breadcrumbs.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let config = StorefrontConfig::from_env().expect("Failed to load configuration");

    // Sentry must be up before the subscriber so its layer has a client
    let sentry_guard = init_sentry(&config);
    init_tracing();
    if sentry_guard.is_some() {
        tracing::info!("Sentry initialized");
    }

    let addr = config.socket_addr();
    let state = AppState::from_config(config).expect("Failed to initialize application state");
    tracing::info!(
        products = state.catalog().len(),
        currency = %state.catalog().currency(),
        checkout = state.config().checkout_url.is_some(),
        "Catalog loaded"
    );

    // Expired sessions and the carts they own are swept in the background
    let sessions = KvSessionStore::new(state.carts());
    let sweeper = tokio::spawn(async move {
        if let Err(err) = sessions
            .continuously_delete_expired(EXPIRED_SWEEP_INTERVAL)
            .await
        {
            tracing::error!("Expired session sweep stopped: {err}");
        }
    });

    let app = routes::app(state)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");
    tracing::info!("storefront listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    sweeper.abort();
    drop(sentry_guard);
}

/// Resolve on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to install SIGTERM handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}
