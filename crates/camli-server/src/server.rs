use std::sync::Arc;

use camli_store::DiskBlobStore;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;
use crate::state::AppState;

/// camli blob server over a disk store.
pub struct CamliServer {
    state: AppState,
}

impl CamliServer {
    /// Validate `config` and open its storage root.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        config.validate()?;
        let store = DiskBlobStore::open(&config.storage_root)?;
        Ok(Self {
            state: AppState::new(Arc::new(store), config),
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.state.config
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone())
    }

    /// Start serving requests.
    pub async fn serve(self) -> ServerResult<()> {
        let addr = self.state.config.listen;
        let app = build_router(self.state);
        let listener = TcpListener::bind(addr).await?;
        tracing::info!("camli server listening on {}", addr);
        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}
