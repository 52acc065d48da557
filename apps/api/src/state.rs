use std::sync::Arc;

use crate::analysis::analyzer::Analyzer;
use crate::config::Config;
use crate::roles::RoleCatalog;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Heuristic or LLM backend, chosen via `ANALYZER_BACKEND`.
    pub analyzer: Arc<dyn Analyzer>,
    pub roles: Arc<RoleCatalog>,
}
