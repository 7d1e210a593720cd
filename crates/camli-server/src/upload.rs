//! Streaming multipart ingestion.
//!
//! Each part whose field name is a blob reference is piped straight into the
//! store. Nothing is buffered beyond the multipart parser's own chunks.

use std::fmt::Write as _;
use std::io;
use std::sync::Arc;

use axum::extract::Multipart;
use camli_store::BlobStore;
use camli_types::BlobRef;
use futures::TryStreamExt;
use tokio_util::io::StreamReader;
use tracing::{debug, info, warn};

/// Form name recorded when the multipart body itself is unreadable.
pub const BODY_FORM_NAME: &str = "<body>";

/// Outcome of one upload request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UploadReport {
    pub received: Vec<(BlobRef, u64)>,
    /// `(form name, cause)` for every part that failed.
    pub errors: Vec<(String, String)>,
    /// Field names that were not blob references.
    pub skipped: Vec<String>,
}

impl UploadReport {
    /// Plain-text response body.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        for (blob, size) in &self.received {
            let _ = writeln!(out, "received {blob} ({size} bytes)");
        }
        for (name, cause) in &self.errors {
            let _ = writeln!(out, "error {name}: {cause}");
        }
        for name in &self.skipped {
            let _ = writeln!(out, "ignored {name}");
        }
        let _ = writeln!(
            out,
            "{} received, {} failed, {} ignored",
            self.received.len(),
            self.errors.len(),
            self.skipped.len()
        );
        out
    }
}

pub struct MultipartIngester {
    store: Arc<dyn BlobStore>,
}

impl MultipartIngester {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    /// Consume every part of `multipart`.
    ///
    /// A failed part is recorded and the next part is processed. A broken
    /// multipart stream ends ingestion with whatever was stored so far.
    pub async fn ingest(&self, multipart: &mut Multipart) -> UploadReport {
        let mut report = UploadReport::default();
        loop {
            let field = match multipart.next_field().await {
                Ok(Some(field)) => field,
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "error reading multipart body");
                    report.errors.push((BODY_FORM_NAME.to_string(), e.to_string()));
                    break;
                }
            };
            let name = field.name().unwrap_or_default().to_string();
            let blob = match BlobRef::parse(&name) {
                Ok(blob) => blob,
                Err(e) => {
                    debug!(field = %name, reason = %e, "ignoring non-blob form field");
                    report.skipped.push(name);
                    continue;
                }
            };

            let reader = StreamReader::new(field.map_err(io::Error::other));
            tokio::pin!(reader);
            match self.store.write(&blob, &mut reader).await {
                Ok(size) => {
                    info!(blob = %blob, size, "received blob");
                    report.received.push((blob, size));
                }
                Err(e) => {
                    warn!(blob = %blob, error = %e, "failed to receive blob");
                    report.errors.push((name, e.to_string()));
                }
            }
        }
        debug!(
            received = report.received.len(),
            failed = report.errors.len(),
            "done reading multipart body"
        );
        report
    }
}
