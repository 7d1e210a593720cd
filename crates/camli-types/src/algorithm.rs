use std::fmt;

/// Digest lengths (in hex characters) for algorithm names we recognise.
///
/// Recognising a name is not the same as supporting it: `md5` references are
/// length-checked here but no [`HashAlgorithm`] exists for them.
const KNOWN_DIGEST_LENGTHS: &[(&str, usize)] = &[("md5", 32), ("sha1", 40)];

/// A digest scheme this server can compute and verify.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HashAlgorithm {
    /// SHA-1, 160 bits, 40 lowercase hex characters.
    Sha1,
}

impl HashAlgorithm {
    /// All supported schemes.
    pub const ALL: &'static [HashAlgorithm] = &[HashAlgorithm::Sha1];

    /// Name used in the `{algorithm}-{digest}` form.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sha1 => "sha1",
        }
    }

    /// Raw digest size in bytes.
    pub const fn digest_len(self) -> usize {
        match self {
            Self::Sha1 => 20,
        }
    }

    /// Digest size in hex characters.
    pub const fn hex_len(self) -> usize {
        self.digest_len() * 2
    }

    /// Look up a supported scheme by name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|alg| alg.name() == name)
    }

    /// Expected hex digest length for any recognised algorithm name,
    /// supported or not.
    pub fn expected_hex_len(name: &str) -> Option<usize> {
        KNOWN_DIGEST_LENGTHS
            .iter()
            .find(|(known, _)| *known == name)
            .map(|(_, len)| *len)
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
