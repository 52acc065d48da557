mod analysis;
mod config;
mod errors;
mod llm_client;
mod roles;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::analyzer::{Analyzer, HeuristicAnalyzer, LlmAnalyzer};
use crate::analysis::config::AnalysisConfig;
use crate::analysis::models::AnalyzerBackend;
use crate::config::Config;
use crate::llm_client::{LlmClient, LlmSettings};
use crate::roles::RoleCatalog;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Draft analysis API v{}", env!("CARGO_PKG_VERSION"));

    let analysis_config = Arc::new(AnalysisConfig::load(config.analysis_config_path.as_deref())?);
    let roles = Arc::new(RoleCatalog::load(config.role_catalog_path.as_deref())?);
    let analyzer = build_analyzer(&config, analysis_config)?;
    info!("Analyzer backend: {}", analyzer.backend());

    let state = AppState {
        config: config.clone(),
        analyzer,
        roles,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the web client's host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Selects the analyzer backend from `ANALYZER_BACKEND`.
fn build_analyzer(config: &Config, analysis: Arc<AnalysisConfig>) -> Result<Arc<dyn Analyzer>> {
    match config.analyzer_backend {
        AnalyzerBackend::Heuristic => Ok(Arc::new(HeuristicAnalyzer::new(analysis))),
        AnalyzerBackend::Llm => {
            let api_key = config
                .anthropic_api_key
                .clone()
                .context("ANTHROPIC_API_KEY is required for the llm analyzer")?;
            let llm = LlmClient::new(LlmSettings::new(
                api_key,
                config.llm_timeout,
                config.llm_max_attempts,
            ))
            .context("Failed to build LLM client")?;
            info!(
                "LLM client initialized (model: {}, attempts: {})",
                llm_client::MODEL,
                llm.max_attempts()
            );
            Ok(Arc::new(LlmAnalyzer::new(llm, analysis)))
        }
    }
}
