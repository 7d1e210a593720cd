//! Preupload negotiation: tell a client which of its candidate blobs the
//! server already holds so it can skip sending them.

use std::sync::Arc;

use camli_protocol::{upload_url, AlreadyHave, PreuploadRequest, PreuploadResponse};
use camli_store::BlobStore;
use camli_types::BlobRef;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::error::{ServerError, ServerResult};

pub struct PreuploadNegotiator {
    store: Arc<dyn BlobStore>,
    max_upload_size: u64,
    upload_url_expiration_secs: u64,
}

impl PreuploadNegotiator {
    pub fn new(store: Arc<dyn BlobStore>, max_upload_size: u64, upload_url_expiration_secs: u64) -> Self {
        Self {
            store,
            max_upload_size,
            upload_url_expiration_secs,
        }
    }

    /// Validate the whole batch, then stat every candidate concurrently and
    /// answer once all checks have finished.
    ///
    /// Any malformed or unsupported candidate rejects the batch before any
    /// check runs. A candidate whose check fails is reported as absent.
    pub async fn negotiate(
        &self,
        request: &PreuploadRequest,
        host: Option<&str>,
    ) -> ServerResult<PreuploadResponse> {
        if request.version.is_none() {
            return Err(ServerError::BadRequest("No camliversion".into()));
        }
        let candidates = request
            .blobs
            .iter()
            .map(|raw| {
                let blob = BlobRef::parse(raw)?;
                if !blob.is_supported() {
                    return Err(ServerError::UnsupportedAlgorithm(blob));
                }
                Ok(blob)
            })
            .collect::<ServerResult<Vec<_>>>()?;

        let mut checks = JoinSet::new();
        for blob in candidates {
            let store = Arc::clone(&self.store);
            checks.spawn(async move {
                let size = store.stat(&blob).await;
                (blob, size)
            });
        }

        let mut already_have = Vec::new();
        while let Some(joined) = checks.join_next().await {
            let (blob, size) = joined.map_err(|e| ServerError::Internal(e.to_string()))?;
            match size {
                Ok(Some(size)) => {
                    debug!(blob = %blob, size, "already have blob");
                    already_have.push(AlreadyHave {
                        blob_ref: blob,
                        size,
                    });
                }
                Ok(None) => debug!(blob = %blob, "blob missing"),
                Err(e) => warn!(blob = %blob, error = %e, "stat failed during preupload"),
            }
        }

        Ok(PreuploadResponse {
            already_have,
            max_upload_size: self.max_upload_size,
            upload_url: upload_url(host),
            upload_url_expiration_seconds: self.upload_url_expiration_secs,
        })
    }
}
