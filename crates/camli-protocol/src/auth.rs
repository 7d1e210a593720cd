use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{ProtocolError, ProtocolResult};

/// HTTP Basic credentials. The password is never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

impl BasicCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// `Authorization` header value: `Basic base64(user:password)`.
    pub fn encode(&self) -> String {
        let raw = format!("{}:{}", self.username, self.password);
        format!("Basic {}", STANDARD.encode(raw))
    }

    /// Parse an `Authorization` header value.
    ///
    /// The scheme must be `Basic` followed by a single space. The token is the
    /// longest run of base64 alphabet characters after it. The decoded text is
    /// split on its first `:`, so passwords may themselves contain colons.
    pub fn parse(header: &str) -> ProtocolResult<Self> {
        let rest = header
            .strip_prefix("Basic ")
            .ok_or(ProtocolError::UnsupportedAuthScheme)?;
        let end = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '=')))
            .unwrap_or(rest.len());
        let token = &rest[..end];
        if token.is_empty() {
            return Err(ProtocolError::InvalidBase64("empty token".into()));
        }
        let decoded = STANDARD
            .decode(token)
            .map_err(|e| ProtocolError::InvalidBase64(e.to_string()))?;
        let text = String::from_utf8(decoded).map_err(|_| ProtocolError::InvalidUtf8)?;
        let (username, password) = text
            .split_once(':')
            .ok_or(ProtocolError::MissingSeparator)?;
        Ok(Self::new(username, password))
    }
}

impl fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_matches_rfc_example() {
        let creds = BasicCredentials::new("Aladdin", "open sesame");
        assert_eq!(creds.encode(), "Basic QWxhZGRpbjpvcGVuIHNlc2FtZQ==");
    }

    #[test]
    fn parse_roundtrips_encode() {
        let creds = BasicCredentials::new("", "s3cret");
        assert_eq!(BasicCredentials::parse(&creds.encode()).unwrap(), creds);
    }

    #[test]
    fn password_may_contain_colons() {
        let header = format!("Basic {}", STANDARD.encode("user:pa:ss"));
        let creds = BasicCredentials::parse(&header).unwrap();
        assert_eq!(creds.username, "user");
        assert_eq!(creds.password, "pa:ss");
    }

    #[test]
    fn trailing_garbage_after_token_is_ignored() {
        let header = format!("Basic {} extra", STANDARD.encode(":pw"));
        assert_eq!(BasicCredentials::parse(&header).unwrap().password, "pw");
    }

    #[test]
    fn rejects_other_schemes() {
        assert!(matches!(
            BasicCredentials::parse("Bearer abc"),
            Err(ProtocolError::UnsupportedAuthScheme)
        ));
        assert!(matches!(
            BasicCredentials::parse("basic abc"),
            Err(ProtocolError::UnsupportedAuthScheme)
        ));
    }

    #[test]
    fn rejects_bad_tokens() {
        assert!(matches!(
            BasicCredentials::parse("Basic "),
            Err(ProtocolError::InvalidBase64(_))
        ));
        assert!(matches!(
            BasicCredentials::parse("Basic abc"),
            Err(ProtocolError::InvalidBase64(_))
        ));
        let no_colon = format!("Basic {}", STANDARD.encode("nocolon"));
        assert!(matches!(
            BasicCredentials::parse(&no_colon),
            Err(ProtocolError::MissingSeparator)
        ));
        let not_utf8 = format!("Basic {}", STANDARD.encode([0xff, 0xfe, b':']));
        assert!(matches!(
            BasicCredentials::parse(&not_utf8),
            Err(ProtocolError::InvalidUtf8)
        ));
    }

    #[test]
    fn debug_redacts_password() {
        let printed = format!("{:?}", BasicCredentials::new("u", "hunter2"));
        assert!(printed.contains("\"u\""));
        assert!(!printed.contains("hunter2"));
    }

    #[test]
    fn empty_username_still_has_separator() {
        let creds = BasicCredentials::new("", "pw");
        assert_eq!(creds.encode(), format!("Basic {}", STANDARD.encode(":pw")));
    }
}
