use std::sync::Arc;

use crate::config::Config;
use crate::detail::download::DownloadHandles;
use crate::processing::DocumentProcessor;
use crate::qa::QuestionAnswerer;
use crate::shell::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub sessions: SessionStore,
    /// Pluggable extraction/scoring backend. Default: MockProcessor.
    pub processor: Arc<dyn DocumentProcessor>,
    /// Pluggable question answerer. Swap via QA_BACKEND.
    pub answerer: Arc<dyn QuestionAnswerer>,
    pub downloads: DownloadHandles,
}
