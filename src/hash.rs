//! Content hash of an archive stream.

use std::fmt;
use std::io;
use std::str::FromStr;

use base64::Engine;
use sha2::{Digest, Sha256};

use crate::FetchError;

const SRI_PREFIX: &str = "sha256-";

/// SHA-256 digest of a canonical archive stream.
///
/// Displays in SRI form (`sha256-<base64>`), which is also the form stored in
/// the `narHash` input attribute.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NarHash([u8; 32]);

impl NarHash {
    /// Wrap raw digest bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hash a complete archive held in memory.
    pub fn compute(data: &[u8]) -> Self {
        Self(Sha256::digest(data).into())
    }

    /// Create an incremental hasher that can be used as an `io::Write` sink.
    pub fn hasher() -> NarHasher {
        NarHasher(Sha256::new())
    }

    /// Parse the SRI form `sha256-<base64>`.
    pub fn parse_sri(s: &str) -> Result<Self, FetchError> {
        let invalid = |details: String| FetchError::InvalidAttribute {
            name: "narHash".into(),
            details,
        };
        let encoded = s
            .strip_prefix(SRI_PREFIX)
            .ok_or_else(|| invalid(format!("'{s}' is not a sha256 SRI hash")))?;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| invalid(e.to_string()))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|b: Vec<u8>| invalid(format!("expected 32 bytes, got {}", b.len())))?;
        Ok(Self(bytes))
    }

    /// Encode in SRI form.
    pub fn to_sri(&self) -> String {
        format!(
            "{SRI_PREFIX}{}",
            base64::engine::general_purpose::STANDARD.encode(self.0)
        )
    }

    /// Encode as lowercase hex.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for NarHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sri())
    }
}

impl fmt::Debug for NarHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NarHash({})", self.to_sri())
    }
}

impl FromStr for NarHash {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_sri(s)
    }
}

/// Incremental SHA-256 over an archive stream.
pub struct NarHasher(Sha256);

impl NarHasher {
    /// Feed bytes into the hasher.
    pub fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    /// Finish and return the digest.
    pub fn finalize(self) -> NarHash {
        NarHash(self.0.finalize().into())
    }
}

impl io::Write for NarHasher {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_input_hash() {
        assert_eq!(
            NarHash::compute(b"").to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn sri_roundtrip() {
        let h = NarHash::compute(b"hello");
        let parsed: NarHash = h.to_sri().parse().unwrap();
        assert_eq!(parsed, h);
        assert!(h.to_string().starts_with("sha256-"));
    }

    #[test]
    fn incremental_matches_one_shot() {
        let mut hasher = NarHash::hasher();
        hasher.write_all(b"hel").unwrap();
        hasher.update(b"lo");
        assert_eq!(hasher.finalize(), NarHash::compute(b"hello"));
    }

    #[test]
    fn parse_rejects_wrong_prefix_and_length() {
        assert!(NarHash::parse_sri("md5-AAAA").is_err());
        assert!(NarHash::parse_sri("sha256-AAAA").is_err());
        assert!(NarHash::parse_sri("sha256-!!!").is_err());
    }
}
