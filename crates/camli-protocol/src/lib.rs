//! Wire protocol for the camli blob server.
//!
//! Shared by the server and the upload client: endpoint paths, the preupload
//! request form and JSON response, and HTTP Basic credential encoding.

pub mod auth;
pub mod endpoint;
pub mod error;
pub mod message;

pub use auth::BasicCredentials;
pub use endpoint::{blob_path, endpoints, upload_url};
pub use error::{ProtocolError, ProtocolResult};
pub use message::{
    AlreadyHave, PreuploadRequest, PreuploadResponse, BLOB_FIELD_PREFIX,
    DEFAULT_MAX_UPLOAD_SIZE, DEFAULT_UPLOAD_URL_EXPIRATION_SECS, PROTOCOL_VERSION, VERSION_FIELD,
};
