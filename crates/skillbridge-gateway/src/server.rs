use crate::backend::BackendClient;
use crate::middleware::request_logging;
use crate::router::{
    backend_handler, count_letters_a2a_handler, count_letters_handler, health_handler,
    root_handler,
};
use axum::{
    middleware as axum_mw,
    routing::{get, post},
    Router,
};
use skillbridge_agent::{LlmClient, Orchestrator, OrchestratorConfig};
use skillbridge_core::{BridgeResult, HookChain};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tracing::info;

/// Shared application state.
pub struct AppState {
    pub backend: BackendClient,
    pub orchestrator: Orchestrator,
}

impl AppState {
    /// Wire the orchestrator to the agent endpoint the backend client names.
    pub fn new(
        backend: BackendClient,
        llm: LlmClient,
        config: OrchestratorConfig,
    ) -> BridgeResult<Self> {
        let (endpoint, http) = backend.agent_card_endpoint();
        let orchestrator = Orchestrator::new(&endpoint, http, llm, config)?;
        Ok(Self {
            backend,
            orchestrator,
        })
    }

    pub fn with_hooks(mut self, hooks: HookChain) -> Self {
        self.orchestrator = self.orchestrator.with_hooks(hooks);
        self
    }
}

/// The HTTP surface.
pub struct GatewayServer;

impl GatewayServer {
    pub fn build(state: AppState) -> Router {
        Router::new()
            .route("/", get(root_handler))
            .route("/health", get(health_handler))
            .route("/backend", get(backend_handler))
            .route("/countLetters", post(count_letters_handler))
            .route("/countLetters-a2a", post(count_letters_a2a_handler))
            .with_state(Arc::new(state))
            .layer(ServiceBuilder::new().layer(axum_mw::from_fn(request_logging)))
    }

    /// Bind `addr` and serve until `shutdown` resolves.
    pub async fn serve(
        router: Router,
        addr: SocketAddr,
        shutdown: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> std::io::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!(addr = %listener.local_addr()?, "skillbridge listening");
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
    }
}
