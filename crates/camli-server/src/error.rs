use std::error::Error as _;

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use camli_store::StoreError;
use camli_types::{BlobRef, BlobRefError};
use http_body_util::LengthLimitError;
use thiserror::Error;

pub const AUTH_CHALLENGE: &str = "Basic realm=\"camlistored\"";

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("malformed blob reference: {0}")]
    MalformedReference(#[from] BlobRefError),

    #[error("unsupported object hash function: {0}")]
    UnsupportedAlgorithm(BlobRef),

    #[error("digest mismatch: body hashes to {computed}, not {blob}")]
    DigestMismatch { blob: BlobRef, computed: BlobRef },

    #[error("stored size of {blob} is {actual}, wrote {expected}")]
    SizeMismatch {
        blob: BlobRef,
        expected: u64,
        actual: u64,
    },

    #[error("authentication required")]
    AuthRequired,

    #[error("object not found: {0}")]
    NotFound(BlobRef),

    #[error("{0}")]
    BadRequest(String),

    #[error("request body exceeds the upload size limit")]
    PayloadTooLarge,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

impl From<StoreError> for ServerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UnsupportedAlgorithm(blob) => Self::UnsupportedAlgorithm(blob),
            StoreError::DigestMismatch { blob, computed } => Self::DigestMismatch { blob, computed },
            StoreError::SizeMismatch {
                blob,
                expected,
                actual,
            } => Self::SizeMismatch {
                blob,
                expected,
                actual,
            },
            StoreError::NotFound(blob) => Self::NotFound(blob),
            StoreError::InvalidRoot(path) => {
                Self::Config(format!("storage root {} is not a directory", path.display()))
            }
            StoreError::Io(e) if exceeds_body_limit(&e) => Self::PayloadTooLarge,
            StoreError::Io(e) => Self::Io(e),
        }
    }
}

/// Whether a body read failed because the request outgrew the router's
/// body limit.
pub fn exceeds_body_limit(err: &std::io::Error) -> bool {
    let mut cause = err
        .get_ref()
        .map(|inner| inner as &(dyn std::error::Error + 'static));
    while let Some(e) = cause {
        if e.is::<LengthLimitError>() {
            return true;
        }
        cause = e.source();
    }
    false
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MalformedReference(_)
            | Self::UnsupportedAlgorithm(_)
            | Self::DigestMismatch { .. }
            | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::AuthRequired => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::SizeMismatch { .. } | Self::Config(_) | Self::Io(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            Self::AuthRequired => (
                status,
                [(header::WWW_AUTHENTICATE, AUTH_CHALLENGE)],
                "Authentication required.\n",
            )
                .into_response(),
            Self::NotFound(_) => (status, "Object not found.\n").into_response(),
            err if status.is_server_error() => {
                tracing::error!(error = %err, "request failed");
                (status, format!("Server error: {err}\n")).into_response()
            }
            err => {
                tracing::warn!(error = %err, "rejected request");
                (status, format!("{err}\n")).into_response()
            }
        }
    }
}
