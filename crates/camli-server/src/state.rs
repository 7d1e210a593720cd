use std::sync::Arc;

use camli_store::BlobStore;

use crate::auth::{AuthGate, AuthProvider};
use crate::config::ServerConfig;

/// Shared per-process handler state. Read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn BlobStore>,
    pub auth: Arc<dyn AuthProvider>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// State guarded by an [`AuthGate`] over the config's secret.
    pub fn new(store: Arc<dyn BlobStore>, config: ServerConfig) -> Self {
        let auth = Arc::new(AuthGate::new(config.secret.clone()));
        Self {
            store,
            auth,
            config: Arc::new(config),
        }
    }

    pub fn with_auth(mut self, auth: Arc<dyn AuthProvider>) -> Self {
        self.auth = auth;
        self
    }
}
