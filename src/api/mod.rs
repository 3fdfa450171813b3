//! HTTP API server for the Unmute relay

pub mod health;
pub mod speech;

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::{ContextRepo, DbPool};
use crate::gemini::GeminiClient;
use crate::intent::{GeminiModel, IntentPipeline};
use crate::speech::{SpeechSynthesizer, Transcriber};
use crate::Result;

/// Shared state for API handlers
pub struct ApiState {
    pub db: DbPool,
    pub context_repo: ContextRepo,
    pub transcriber: Transcriber,
    pub intent: IntentPipeline,
    pub synthesizer: SpeechSynthesizer,
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
    allowed_origins: Vec<String>,
}

impl ApiServer {
    /// Build the server from configuration
    ///
    /// Constructs the provider clients once here and injects them into the
    /// pipeline components; nothing else owns a client handle.
    ///
    /// # Errors
    ///
    /// Returns error if a required credential is missing
    pub fn from_config(config: &Config, db: DbPool) -> Result<Self> {
        let gemini = GeminiClient::new(config.api_keys.gemini.clone())?;

        let context_repo = ContextRepo::new(db.clone());
        let transcriber = Transcriber::new(gemini.clone(), config.llm_model.clone());
        let intent = IntentPipeline::new(Arc::new(GeminiModel::new(
            gemini.clone(),
            config.llm_model.clone(),
        )));
        let synthesizer = SpeechSynthesizer::from_config(config, gemini)?;

        let state = Arc::new(ApiState {
            db,
            context_repo,
            transcriber,
            intent,
            synthesizer,
        });

        Ok(Self {
            state,
            port: config.server.port,
            allowed_origins: config.server.allowed_origins.clone(),
        })
    }

    /// Build the router with all routes
    fn router(&self) -> Router {
        let router = Router::new()
            .nest("/api/speech", speech::router(self.state.clone()))
            .merge(health::router())
            .merge(health::ready_router(self.state.clone()));

        router
            .layer(cors_layer(&self.allowed_origins))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the API server
    ///
    /// # Errors
    ///
    /// Returns error if server fails to bind or run
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::Error::Config(format!("failed to bind API server: {e}")))?;

        tracing::info!(port = self.port, "API server listening");

        axum::serve(listener, self.router())
            .await
            .map_err(|e| crate::Error::Config(format!("API server error: {e}")))?;

        Ok(())
    }
}

/// CORS layer for cross-origin requests from the frontend
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.iter().any(|o| o == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<axum::http::HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
