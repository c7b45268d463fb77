use crate::handlers;
use autopilot_agent_client::AgentClient;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub struct RelayServer {
    agent: Arc<AgentClient>,
}

impl RelayServer {
    #[must_use]
    pub const fn new(agent: Arc<AgentClient>) -> Self {
        Self { agent }
    }

    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .route("/api/status", get(handlers::get_status))
            .route("/api/control", post(handlers::post_control))
            .route("/api/config", post(handlers::post_config))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
            .with_state(self.agent.clone())
    }

    /// Starts the relay listening on the specified address.
    ///
    /// # Errors
    /// Returns an error if the server fails to bind to the address or serve
    /// requests.
    pub async fn serve(self, addr: &str) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Relay API listening on {}", addr);

        axum::serve(listener, self.router()).await?;

        Ok(())
    }
}
