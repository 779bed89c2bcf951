//! Content digests.
//!
//! A digest has the form `algorithm:encoded`, e.g.
//! `sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855`.
//! Parsing only checks the general grammar; algorithm-specific checks happen
//! when content is actually hashed or stored.

use std::fmt;
use std::io::Read;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256, Sha512};

use crate::error::{Error, Result};

/// The algorithm used for newly prepared content.
pub const CANONICAL_ALGORITHM: &str = "sha256";

fn grammar() -> &'static Regex {
    static GRAMMAR: OnceLock<Regex> = OnceLock::new();
    GRAMMAR.get_or_init(|| {
        Regex::new(r"^[a-z0-9]+(?:[+._-][a-z0-9]+)*:[a-zA-Z0-9=_-]+$").expect("valid digest regex")
    })
}

/// A content digest, the sole identity key of stored content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Digest(String);

impl Digest {
    /// Parse a digest string, checking the `algorithm:encoded` grammar.
    pub fn parse(s: &str) -> Result<Self> {
        if !grammar().is_match(s) {
            return Err(Error::invalid(format!("invalid digest '{s}'")));
        }
        Ok(Digest(s.to_string()))
    }

    /// Compute the SHA-256 digest of the given data.
    pub fn sha256(data: &[u8]) -> Self {
        Digest(format!("{CANONICAL_ALGORITHM}:{}", hex_encode(&Sha256::digest(data))))
    }

    /// Stream a reader through SHA-256, returning the digest and byte count.
    pub fn sha256_reader(reader: &mut dyn Read) -> std::io::Result<(Self, u64)> {
        let mut hasher = Sha256::new();
        let mut buf = [0u8; 8192];
        let mut total = 0u64;
        loop {
            let n = reader.read(&mut buf)?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
            total += n as u64;
        }
        let digest = Digest(format!(
            "{CANONICAL_ALGORITHM}:{}",
            hex_encode(&hasher.finalize())
        ));
        Ok((digest, total))
    }

    /// The algorithm part, e.g. `sha256`.
    pub fn algorithm(&self) -> &str {
        self.split().0
    }

    /// The encoded part after the colon.
    pub fn encoded(&self) -> &str {
        self.split().1
    }

    /// Get the full string representation.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check the encoded part against the algorithm's expected format.
    ///
    /// Only algorithms this crate can compute are accepted.
    pub fn validate_encoding(&self) -> Result<()> {
        let expected_len = match self.algorithm() {
            "sha256" => 64,
            "sha512" => 128,
            other => {
                return Err(Error::invalid(format!(
                    "unsupported digest algorithm '{other}'"
                )))
            }
        };
        let encoded = self.encoded();
        let lower_hex = encoded
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if encoded.len() != expected_len || !lower_hex {
            return Err(Error::invalid(format!(
                "malformed {} digest '{}'",
                self.algorithm(),
                self.0
            )));
        }
        Ok(())
    }

    /// Verify that the given data hashes to this digest.
    pub fn verify(&self, data: &[u8]) -> Result<()> {
        self.validate_encoding()?;
        let computed = match self.algorithm() {
            "sha512" => hex_encode(&Sha512::digest(data)),
            _ => hex_encode(&Sha256::digest(data)),
        };
        if computed != self.encoded() {
            return Err(Error::DigestMismatch {
                expected: self.0.clone(),
                actual: format!("{}:{computed}", self.algorithm()),
            });
        }
        Ok(())
    }

    fn split(&self) -> (&str, &str) {
        // The grammar guarantees exactly one separator.
        self.0.split_once(':').unwrap_or((&self.0, ""))
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Digest {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Digest::parse(s)
    }
}

impl TryFrom<String> for Digest {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Digest::parse(&s)
    }
}

impl From<Digest> for String {
    fn from(digest: Digest) -> Self {
        digest.0
    }
}

/// Encode bytes as lowercase hex string.
fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
