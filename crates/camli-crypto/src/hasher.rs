use std::fmt;
use std::io::{self, Read, Write};

use camli_types::{BlobRef, HashAlgorithm};
use sha1::{Digest, Sha1};

/// Incremental digest accumulator for one supported [`HashAlgorithm`].
///
/// Feed bytes with [`update`](Self::update) (or through its [`Write`] impl)
/// and call [`finalize`](Self::finalize) to get the [`BlobRef`] naming them.
#[derive(Clone)]
pub struct BlobHasher {
    state: State,
}

#[derive(Clone)]
enum State {
    Sha1(Sha1),
}

impl BlobHasher {
    /// Fresh accumulator for the given scheme.
    pub fn new(algorithm: HashAlgorithm) -> Self {
        let state = match algorithm {
            HashAlgorithm::Sha1 => State::Sha1(Sha1::new()),
        };
        Self { state }
    }

    /// Accumulator matching a reference's algorithm, or `None` if the server
    /// does not implement it.
    pub fn for_blob(blob: &BlobRef) -> Option<Self> {
        blob.hash_algorithm().map(Self::new)
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        match self.state {
            State::Sha1(_) => HashAlgorithm::Sha1,
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        match &mut self.state {
            State::Sha1(h) => h.update(data),
        }
    }

    /// Consume the accumulator and name the bytes it has seen.
    pub fn finalize(self) -> BlobRef {
        match self.state {
            State::Sha1(h) => BlobRef::for_digest(HashAlgorithm::Sha1, &h.finalize()),
        }
    }

    /// One-shot digest of an in-memory buffer.
    pub fn hash(algorithm: HashAlgorithm, data: &[u8]) -> BlobRef {
        let mut hasher = Self::new(algorithm);
        hasher.update(data);
        hasher.finalize()
    }

    /// Stream a reader to exhaustion. Returns the reference and the number of
    /// bytes read.
    pub fn hash_reader<R: Read>(algorithm: HashAlgorithm, mut reader: R) -> io::Result<(BlobRef, u64)> {
        let mut hasher = Self::new(algorithm);
        let n = io::copy(&mut reader, &mut hasher)?;
        Ok((hasher.finalize(), n))
    }
}

impl Write for BlobHasher {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl fmt::Debug for BlobHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobHasher")
            .field("algorithm", &self.algorithm())
            .finish()
    }
}
