use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use camli_protocol::BasicCredentials;
use tracing::debug;

use crate::config::SharedSecret;
use crate::error::ServerError;
use crate::state::AppState;

/// Decides whether a request's `Authorization` header grants access.
pub trait AuthProvider: Send + Sync {
    fn authorize(&self, header: Option<&str>) -> bool;
}

/// Shared-secret gate over HTTP Basic credentials.
///
/// Only the password half is checked; the username is ignored.
#[derive(Clone, Debug)]
pub struct AuthGate {
    secret: SharedSecret,
}

impl AuthGate {
    pub fn new(secret: SharedSecret) -> Self {
        Self { secret }
    }
}

impl AuthProvider for AuthGate {
    fn authorize(&self, header: Option<&str>) -> bool {
        let Some(header) = header else {
            return false;
        };
        match BasicCredentials::parse(header) {
            Ok(creds) => self.secret.matches(&creds.password),
            Err(e) => {
                debug!(error = %e, "unusable authorization header");
                false
            }
        }
    }
}

/// Accepts every request. For tests and private deployments.
pub struct AllowAll;

impl AuthProvider for AllowAll {
    fn authorize(&self, _header: Option<&str>) -> bool {
        true
    }
}

/// Middleware that answers 401 unless the request is authorized.
pub async fn require_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    if !state.auth.authorize(header) {
        return ServerError::AuthRequired.into_response();
    }
    next.run(request).await
}
