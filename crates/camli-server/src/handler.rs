use std::collections::HashMap;
use std::io;

use axum::body::Body;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use bytes::Bytes;
use camli_protocol::{PreuploadRequest, PreuploadResponse};
use camli_types::BlobRef;
use futures::TryStreamExt;
use tokio_util::io::StreamReader;
use tracing::info;

use crate::body::BlobBody;
use crate::error::{ServerError, ServerResult};
use crate::preupload::PreuploadNegotiator;
use crate::state::AppState;
use crate::upload::MultipartIngester;

/// `GET /`
pub async fn root_handler(State(state): State<AppState>) -> String {
    if state.config.stealth {
        "Hi.\n".to_string()
    } else {
        format!(
            "This is camli {}, a content-addressed blob server.\n",
            env!("CARGO_PKG_VERSION")
        )
    }
}

/// `GET /camli/{blobref}`
pub async fn get_blob(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> ServerResult<Response> {
    let blob = BlobRef::parse(&raw)?;
    let opened = state.store.open(&blob).await?;
    let size = opened.size;
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::CONTENT_LENGTH, size)
        .body(Body::from_stream(BlobBody::new(blob, opened)))
        .map_err(|e| ServerError::Internal(e.to_string()))
}

/// `PUT /camli/{blobref}`
pub async fn put_blob(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    body: Body,
) -> ServerResult<&'static str> {
    let blob = BlobRef::parse(&raw)?;
    if !blob.is_supported() {
        return Err(ServerError::UnsupportedAlgorithm(blob));
    }
    let mut reader = StreamReader::new(body.into_data_stream().map_err(io::Error::other));
    let size = state.store.write(&blob, &mut reader).await?;
    info!(blob = %blob, size, "stored blob");
    Ok("OK")
}

/// `POST /camli/preupload`
///
/// Fields come from the query string and, for url-encoded bodies, from the
/// body. Body values win when both carry the same key.
pub async fn preupload(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(mut form): Query<HashMap<String, String>>,
    body: Bytes,
) -> ServerResult<Json<PreuploadResponse>> {
    if is_form_encoded(&headers) {
        let fields: Vec<(String, String)> = serde_urlencoded::from_bytes(&body)
            .map_err(|e| ServerError::BadRequest(format!("malformed form body: {e}")))?;
        form.extend(fields);
    }
    let request = PreuploadRequest::from_form(&form);
    let host = headers.get(header::HOST).and_then(|h| h.to_str().ok());
    let negotiator = PreuploadNegotiator::new(
        state.store.clone(),
        state.config.max_upload_size,
        state.config.upload_url_expiration_secs,
    );
    Ok(Json(negotiator.negotiate(&request, host).await?))
}

fn is_form_encoded(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|mime| {
            mime.trim()
                .eq_ignore_ascii_case("application/x-www-form-urlencoded")
        })
}

/// `POST /camli/upload`
pub async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> String {
    MultipartIngester::new(state.store.clone())
        .ingest(&mut multipart)
        .await
        .summary()
}

/// Any other path or method.
pub async fn unsupported() -> Response {
    (StatusCode::BAD_REQUEST, "Unsupported path or method.\n").into_response()
}
