use camli_types::BlobRef;

/// HTTP endpoint paths for the camli protocol.
pub mod endpoints {
    pub const ROOT: &str = "/";
    pub const BLOB_PREFIX: &str = camli_types::PATH_PREFIX;
    /// Router pattern for single-blob GET and PUT.
    pub const BLOB: &str = "/camli/:blobref";
    pub const PREUPLOAD: &str = "/camli/preupload";
    pub const UPLOAD: &str = "/camli/upload";
}

/// Request path for a single blob: `/camli/{algorithm}-{digest}`.
pub fn blob_path(blob: &BlobRef) -> String {
    format!("{}{}", endpoints::BLOB_PREFIX, blob)
}

/// Absolute upload URL when the request named a host, else the bare path.
pub fn upload_url(host: Option<&str>) -> String {
    match host.filter(|h| !h.is_empty()) {
        Some(host) => format!("http://{host}{}", endpoints::UPLOAD),
        None => endpoints::UPLOAD.to_string(),
    }
}
