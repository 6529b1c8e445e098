//! Application entry point for the `leafmealone-diary` backend service.
//!
//! This binary orchestrates the full startup sequence for the plant diary API,
//! including:
//! - Loading configuration from environment variables or `.env`
//! - Initializing structured logging/tracing
//! - Establishing the PostgreSQL-backed store and creating the schema
//! - Constructing the text-generation and feed-publishing clients
//! - Mounting all API routes via the `routes` gateway
//! - Binding the Axum HTTP server and serving until Ctrl-C, then closing the pool
//!
//! # Environment Variables
//! - `DATABASE_URL` (**required**) – PostgreSQL connection string
//! - `DB_POOL_MAX`, `LISTEN_PORT` (optional)
//! - `OPENROUTER_*`, `BLUESKY_*`, `DIARY_PERSONA` (optional, see `config`)
//! - `AXUM_LOG_LEVEL` (optional) – log verbosity (default: `debug`)
//! - `AXUM_SPAN_EVENTS` (optional) – span event mode for tracing
use std::{env, net::SocketAddr, sync::Arc};

use axum::Router;
use dotenvy::dotenv;
use is_terminal::IsTerminal;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use anyhow::Result;

mod config;
mod diary;
mod engagement;
mod error;
mod generation;
mod models;
mod mood;
mod prompt;
mod publisher;
mod routes;
mod schema;
mod store;
#[cfg(test)]
mod testing;

pub use config::Config;
pub use diary::DiaryService;
pub use error::DiaryError;
pub use models::{DiaryPost, Interaction, InteractionKind, RawReading, Reading};
pub use publisher::FeedPublisher;
pub use store::PlantStore;

use generation::OpenRouterClient;
use publisher::BlueskyClient;
use store::PgStore;

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    init_tracing();
    dotenv().ok();

    let cfg = config::load_from_env()?;
    cfg.log_config();

    let store = PgStore::connect(&cfg).await?;
    schema::create_schema(store.pool()).await?;

    let http = reqwest::Client::builder()
        .user_agent(concat!("leafmealone-diary/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let generator = OpenRouterClient::new(
        http.clone(),
        cfg.openrouter_api_url.clone(),
        cfg.openrouter_api_key.clone(),
        cfg.openrouter_model.clone(),
    );
    tracing::info!("Text generation model: {}", generator.model());

    let publisher = BlueskyClient::new(
        http,
        cfg.bluesky_service.clone(),
        cfg.bluesky_identifier.clone(),
        cfg.bluesky_password.clone(),
    );

    let shared_store: Arc<dyn PlantStore> = Arc::new(store.clone());
    let state = routes::AppState {
        store: shared_store.clone(),
        diary: DiaryService::new(shared_store, Arc::new(generator), cfg.persona),
        publisher: Arc::new(publisher),
    };

    let app: Router = routes::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.listen_port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    Ok(())
}

// ---

async fn shutdown_signal() {
    // ---
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received");
}

/// Initialize the global tracing subscriber for structured logging.
///
/// This function configures the [`tracing_subscriber`] with:
/// - Log target, file, and line number output enabled
/// - Color output controlled by TTY detection and `FORCE_COLOR` env var:
///   - `FORCE_COLOR=1|true|yes`: force colors on
///   - `FORCE_COLOR=0|false|no`: force colors off
///   - unset or other values: auto-detect TTY
/// - Span event emission mode controlled by the `AXUM_SPAN_EVENTS` env var:
///   - `"full"`       : emit ENTER, EXIT, and CLOSE events with timing
///   - `"enter_exit"` : emit ENTER and EXIT only
///   - unset or other values: emit CLOSE events only (default)
/// - Log level controlled by the `AXUM_LOG_LEVEL` env var
///
/// Call once at startup, before any logging.
fn init_tracing() {
    // ---
    let span_events = match env::var("AXUM_SPAN_EVENTS").as_deref() {
        Ok("full") => FmtSpan::FULL,
        Ok("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::CLOSE,
    };

    let use_color = match env::var("FORCE_COLOR").as_deref() {
        Ok("1") | Ok("true") | Ok("yes") => true,
        Ok("0") | Ok("false") | Ok("no") => false,
        _ => std::io::stdout().is_terminal(),
    };

    // RUST_LOG wins over AXUM_LOG_LEVEL
    let env_filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match env::var("AXUM_LOG_LEVEL").ok().as_deref() {
            Some("trace") => "trace",
            Some("debug") => "debug",
            Some("info") => "info",
            Some("warn") => "warn",
            Some("error") => "error",
            _ => "debug",
        };
        EnvFilter::new(format!("{level},sqlx::query=warn,hyper=info,reqwest=info"))
    };

    tracing_subscriber::fmt()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(span_events)
        .with_env_filter(env_filter)
        .with_ansi(use_color)
        .compact()
        .init();
}
