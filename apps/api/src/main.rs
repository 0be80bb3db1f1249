mod config;
mod detail;
mod errors;
mod intake;
mod llm_client;
mod models;
mod processing;
mod qa;
mod results;
mod routes;
mod shell;
mod state;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, QaBackend};
use crate::detail::download::DownloadHandles;
use crate::llm_client::LlmClient;
use crate::processing::{DocumentProcessor, MockProcessor};
use crate::qa::{LlmAnswerer, MockAnswerer, QuestionAnswerer};
use crate::routes::build_router;
use crate::shell::SessionStore;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={},tower_http=info",
                env!("CARGO_CRATE_NAME"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CV Analyzer API v{}", env!("CARGO_PKG_VERSION"));

    // Extraction/scoring backend (mock only; a real extractor plugs in behind the same trait)
    let processor: Arc<dyn DocumentProcessor> = Arc::new(MockProcessor::new(
        config.processing_delay,
        config.mock_seed,
    ));

    // Question answerer: MockAnswerer by default, swap via QA_BACKEND=llm
    let answerer: Arc<dyn QuestionAnswerer> = match config.qa_backend {
        QaBackend::Mock => Arc::new(MockAnswerer::new(config.answer_delay)),
        QaBackend::Llm => {
            let api_key = config
                .anthropic_api_key
                .clone()
                .context("ANTHROPIC_API_KEY is required when QA_BACKEND=llm")?;
            let llm = LlmClient::new(api_key)?;
            info!("LLM client initialized (model: {})", llm_client::MODEL);
            Arc::new(LlmAnswerer(llm))
        }
    };
    info!(
        processor = processor.backend(),
        answerer = answerer.backend(),
        "Collaborators ready"
    );

    // Session store, swept for idle sessions in the background
    let sessions = SessionStore::new();
    sessions.spawn_sweeper(config.session_ttl);
    info!("Session TTL: {}s", config.session_ttl.as_secs());

    // Build app state
    let state = AppState {
        config: config.clone(),
        sessions,
        processor,
        answerer,
        downloads: DownloadHandles::new(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
