//! HTTP client side of the blob protocol: preupload negotiation followed by a
//! single multipart upload of whatever the server is missing.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use camli_crypto::BlobHasher;
use camli_protocol::{endpoints, BasicCredentials, PreuploadRequest, PreuploadResponse};
use camli_types::{BlobRef, HashAlgorithm};
use reqwest::header::AUTHORIZATION;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, RequestBuilder};
use tokio_util::io::ReaderStream;
use tracing::debug;

/// A local file and the reference its content hashes to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalBlob {
    pub path: PathBuf,
    pub blob: BlobRef,
    pub size: u64,
}

/// Hash `path` without loading it into memory.
pub fn hash_file(path: &Path) -> anyhow::Result<LocalBlob> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let (blob, size) = BlobHasher::hash_reader(HashAlgorithm::Sha1, BufReader::new(file))
        .with_context(|| format!("reading {}", path.display()))?;
    Ok(LocalBlob {
        path: path.to_path_buf(),
        blob,
        size,
    })
}

pub struct UploadClient {
    http: reqwest::Client,
    server: String,
    auth: BasicCredentials,
}

impl UploadClient {
    pub fn new(server: &str, auth: BasicCredentials) -> Self {
        Self {
            http: reqwest::Client::new(),
            server: server.trim_end_matches('/').to_string(),
            auth,
        }
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(AUTHORIZATION, self.auth.encode())
    }

    /// Absolute form of the upload URL a server advertised.
    pub fn resolve_upload_url(&self, advertised: &str) -> String {
        if advertised.starts_with("http://") || advertised.starts_with("https://") {
            advertised.to_string()
        } else {
            format!("{}{}", self.server, advertised)
        }
    }

    pub async fn preupload(&self, blobs: &[BlobRef]) -> anyhow::Result<PreuploadResponse> {
        let url = format!("{}{}", self.server, endpoints::PREUPLOAD);
        let form = PreuploadRequest::new(blobs).to_form();
        debug!(%url, count = blobs.len(), "sending preupload");
        let response = self.authorized(self.http.post(&url).form(&form)).send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        if !status.is_success() {
            bail!(
                "preupload failed with {status}: {}",
                String::from_utf8_lossy(&body).trim_end()
            );
        }
        let parsed = PreuploadResponse::from_json(&body).context("parsing preupload response")?;
        if parsed.upload_url.is_empty() {
            bail!("no uploadUrl in preupload response");
        }
        Ok(parsed)
    }

    /// Send `blobs` as one multipart request, streaming each file. Returns
    /// the server's plain-text summary.
    pub async fn upload(&self, upload_url: &str, blobs: &[LocalBlob]) -> anyhow::Result<String> {
        let mut form = Form::new();
        for local in blobs {
            let file = tokio::fs::File::open(&local.path)
                .await
                .with_context(|| format!("opening {}", local.path.display()))?;
            let body = Body::wrap_stream(ReaderStream::new(file));
            let file_name = local
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| local.blob.to_string());
            let part = Part::stream_with_length(body, local.size)
                .file_name(file_name)
                .mime_str("application/octet-stream")?;
            form = form.part(local.blob.to_string(), part);
        }
        let url = self.resolve_upload_url(upload_url);
        debug!(%url, count = blobs.len(), "sending upload");
        let response = self
            .authorized(self.http.post(&url).multipart(form))
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            bail!("upload failed with {status}: {}", text.trim_end());
        }
        Ok(text)
    }
}
