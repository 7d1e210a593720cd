//! HTTP server for the camli blob store.
//!
//! Serves single-blob GET and PUT under `/camli/`, the preupload negotiation
//! endpoint, and streaming multipart upload, all behind a shared-secret
//! Basic auth gate.

pub mod auth;
pub mod body;
pub mod config;
pub mod error;
pub mod handler;
pub mod preupload;
pub mod router;
pub mod server;
pub mod state;
pub mod upload;

pub use auth::{AllowAll, AuthGate, AuthProvider};
pub use config::{ServerConfig, SharedSecret};
pub use error::{ServerError, ServerResult};
pub use preupload::PreuploadNegotiator;
pub use router::build_router;
pub use server::CamliServer;
pub use state::AppState;
pub use upload::{MultipartIngester, UploadReport};
