use std::collections::HashMap;

use camli_types::BlobRef;
use serde::{Deserialize, Serialize};

use crate::error::ProtocolResult;

pub const PROTOCOL_VERSION: &str = "1";
pub const VERSION_FIELD: &str = "camliversion";
/// Candidate references are sent as `blob1`, `blob2`, ...
pub const BLOB_FIELD_PREFIX: &str = "blob";
pub const DEFAULT_MAX_UPLOAD_SIZE: u64 = 2_147_483_647;
pub const DEFAULT_UPLOAD_URL_EXPIRATION_SECS: u64 = 86_400;

/// Form body of a preupload request.
///
/// Candidate references are kept as raw strings: validating them is the
/// negotiator's job, and a single bad candidate rejects the whole batch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PreuploadRequest {
    pub version: Option<String>,
    pub blobs: Vec<String>,
}

impl PreuploadRequest {
    /// Request for the given references at the current protocol version.
    pub fn new<'a>(blobs: impl IntoIterator<Item = &'a BlobRef>) -> Self {
        Self {
            version: Some(PROTOCOL_VERSION.to_string()),
            blobs: blobs.into_iter().map(BlobRef::to_string).collect(),
        }
    }

    /// Read `camliversion` and `blob1..N`, stopping at the first missing or
    /// empty `blobN`.
    pub fn from_form(form: &HashMap<String, String>) -> Self {
        let version = form
            .get(VERSION_FIELD)
            .filter(|v| !v.is_empty())
            .cloned();
        let blobs = (1..)
            .map(|n| form.get(&format!("{BLOB_FIELD_PREFIX}{n}")))
            .take_while(|v| v.is_some_and(|v| !v.is_empty()))
            .flatten()
            .cloned()
            .collect();
        Self { version, blobs }
    }

    /// Form pairs in submission order.
    pub fn to_form(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.blobs.len() + 1);
        if let Some(version) = &self.version {
            pairs.push((VERSION_FIELD.to_string(), version.clone()));
        }
        for (i, blob) in self.blobs.iter().enumerate() {
            pairs.push((format!("{BLOB_FIELD_PREFIX}{}", i + 1), blob.clone()));
        }
        pairs
    }
}

/// A blob the server already holds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlreadyHave {
    pub blob_ref: BlobRef,
    pub size: u64,
}

/// JSON body of a preupload response.
///
/// `already_have` has no meaningful order; match entries by reference.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreuploadResponse {
    pub already_have: Vec<AlreadyHave>,
    pub max_upload_size: u64,
    pub upload_url: String,
    pub upload_url_expiration_seconds: u64,
}

impl PreuploadResponse {
    /// Size reported for `blob`, if the server has it.
    pub fn size_of(&self, blob: &BlobRef) -> Option<u64> {
        self.already_have
            .iter()
            .find(|have| have.blob_ref == *blob)
            .map(|have| have.size)
    }

    pub fn from_json(data: &[u8]) -> ProtocolResult<Self> {
        Ok(serde_json::from_slice(data)?)
    }
}
