pub mod frontend;
pub mod handlers;
pub mod types;

pub use frontend::FrontendBundle;
pub use handlers::AppState;

use crate::{
    Result,
    agent::SearchAgent,
    config::Config,
    llm::{LlmClient, OpenAiClient},
    search::SerpApiClient,
};
use axum::{
    Router,
    routing::{get, post},
};
use std::{net::SocketAddr, sync::Arc};
use tokio::signal;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

/// HTTP-facing component. Collaborators are injected so tests can swap the
/// provider for a stub.
pub struct Gateway {
    llm: Arc<dyn LlmClient>,
    agent: Option<Arc<SearchAgent>>,
    frontend: FrontendBundle,
}

impl Gateway {
    pub fn new(llm: Arc<dyn LlmClient>, frontend: FrontendBundle) -> Self {
        Self {
            llm,
            agent: None,
            frontend,
        }
    }

    pub fn with_agent(mut self, agent: Arc<SearchAgent>) -> Self {
        self.agent = Some(agent);
        self
    }

    /// Wires the production clients described by `config`. The agent is only
    /// built when a search API key is present.
    pub fn from_config(config: &Config) -> Self {
        if config.llm.api_key.is_empty() {
            warn!("No provider API key configured; /api/search will fail until GOOGLE_API_KEY is set");
        }

        let llm: Arc<dyn LlmClient> = Arc::new(OpenAiClient::new(config.llm.clone()));
        let gateway = Self::new(
            llm.clone(),
            FrontendBundle::new(&config.server.frontend_dir),
        );

        match SerpApiClient::from_config(&config.search) {
            Some(search) => {
                gateway.with_agent(Arc::new(SearchAgent::new(llm, Arc::new(search), &config.agent)))
            }
            None => {
                warn!("SERPAPI_API_KEY not set; /api/agent is disabled");
                gateway
            }
        }
    }

    pub fn router(self) -> Router {
        let state = AppState {
            llm: self.llm,
            agent: self.agent,
            frontend: Arc::new(self.frontend),
        };

        Router::new()
            .route("/api/search", post(handlers::search))
            .route("/api/agent", post(handlers::agent_search))
            .route("/health", get(handlers::health))
            .route("/", get(handlers::frontend_index))
            .route("/*path", get(handlers::frontend_asset))
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }
}

pub async fn run(config: Config) -> Result<()> {
    let gateway = Gateway::from_config(&config);
    info!(
        "Serving frontend bundle from {}",
        gateway.frontend.root().display()
    );

    let app = gateway.router();

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
