use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("unsupported authorization scheme")]
    UnsupportedAuthScheme,

    #[error("invalid base64 credentials: {0}")]
    InvalidBase64(String),

    #[error("credentials are not valid UTF-8")]
    InvalidUtf8,

    #[error("credentials missing ':' separator")]
    MissingSeparator,

    #[error("malformed response: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;
