use std::fmt;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use camli_protocol::{DEFAULT_MAX_UPLOAD_SIZE, DEFAULT_UPLOAD_URL_EXPIRATION_SECS};
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

pub const DEFAULT_PORT: u16 = 3179;
pub const DEFAULT_STORAGE_ROOT: &str = "/tmp/camliroot";

/// The password every authenticated request must present.
///
/// Never read from a config file and never printed.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SharedSecret(String);

impl SharedSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn matches(&self, candidate: &str) -> bool {
        !self.0.is_empty() && self.0 == candidate
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret(<redacted>)")
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: SocketAddr,
    pub storage_root: PathBuf,
    pub max_upload_size: u64,
    pub upload_url_expiration_secs: u64,
    /// Let preupload answer without credentials. Every other blob endpoint
    /// always requires them.
    pub allow_anonymous_preupload: bool,
    /// Serve a blank root page.
    pub stealth: bool,
    #[serde(skip)]
    pub secret: SharedSecret,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            storage_root: PathBuf::from(DEFAULT_STORAGE_ROOT),
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
            upload_url_expiration_secs: DEFAULT_UPLOAD_URL_EXPIRATION_SECS,
            allow_anonymous_preupload: false,
            stealth: true,
            secret: SharedSecret::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_toml_str(text: &str) -> ServerResult<Self> {
        toml::from_str(text).map_err(|e| ServerError::Config(e.to_string()))
    }

    pub fn from_toml_file(path: &Path) -> ServerResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = SharedSecret::new(secret);
        self
    }

    /// Startup checks: the storage root must already be a directory and a
    /// secret must be configured.
    pub fn validate(&self) -> ServerResult<()> {
        if !self.storage_root.is_dir() {
            return Err(ServerError::Config(format!(
                "storage root {} is not a directory",
                self.storage_root.display()
            )));
        }
        if self.secret.is_empty() {
            return Err(ServerError::Config(
                "no password configured; set CAMLI_PASSWORD".into(),
            ));
        }
        Ok(())
    }

    /// Request body limit, saturated to the platform's address space.
    pub fn body_limit(&self) -> usize {
        usize::try_from(self.max_upload_size).unwrap_or(usize::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = ServerConfig::default();
        assert_eq!(c.listen, "0.0.0.0:3179".parse::<SocketAddr>().unwrap());
        assert_eq!(c.storage_root, PathBuf::from("/tmp/camliroot"));
        assert_eq!(c.max_upload_size, 2_147_483_647);
        assert_eq!(c.upload_url_expiration_secs, 86_400);
        assert!(!c.allow_anonymous_preupload);
        assert!(c.stealth);
        assert!(c.secret.is_empty());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = ServerConfig::from_toml_str(
            r#"
            listen = "127.0.0.1:8080"
            stealth = false
            "#,
        )
        .unwrap();
        assert_eq!(c.listen.port(), 8080);
        assert!(!c.stealth);
        assert_eq!(c.max_upload_size, DEFAULT_MAX_UPLOAD_SIZE);
    }

    #[test]
    fn secret_is_not_read_from_toml() {
        let c = ServerConfig::from_toml_str(r#"secret = "leaked""#).unwrap();
        assert!(c.secret.is_empty());
    }

    #[test]
    fn bad_toml_is_config_error() {
        assert!(matches!(
            ServerConfig::from_toml_str("listen = 12"),
            Err(ServerError::Config(_))
        ));
    }

    #[test]
    fn validate_requires_dir_and_secret() {
        let dir = tempfile::tempdir().unwrap();
        let mut c = ServerConfig {
            storage_root: dir.path().to_path_buf(),
            ..ServerConfig::default()
        };
        assert!(c.validate().is_err());
        c = c.with_secret("pw");
        c.validate().unwrap();

        c.storage_root = dir.path().join("missing");
        assert!(c.validate().is_err());
    }

    #[test]
    fn secret_debug_is_redacted() {
        let c = ServerConfig::default().with_secret("hunter2");
        assert!(!format!("{c:?}").contains("hunter2"));
        assert!(c.secret.matches("hunter2"));
        assert!(!c.secret.matches(""));
        assert!(!SharedSecret::default().matches(""));
    }
}
