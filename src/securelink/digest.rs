//! Link digest computation and comparison.
//!
//! # Responsibilities
//! - Hash `expire ‖ real path ‖ secret` with the configured algorithm
//! - Render digests as lowercase hex
//! - Compare claimed and computed tokens without timing leaks
//!
//! # Design Decisions
//! - MD5 stays the default so links issued by existing deployments keep working
//! - Comparison pre-hashes both sides before a constant-time equality check

use md5::Md5;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Digest used to fingerprint a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    /// Legacy 128-bit digest (32 hex chars).
    #[default]
    Md5,
    /// 256-bit digest (64 hex chars).
    Sha256,
}

impl DigestAlgorithm {
    /// Hash the concatenation of `parts` and return lowercase hex.
    pub fn hex_digest(&self, parts: &[&[u8]]) -> String {
        match self {
            DigestAlgorithm::Md5 => hex::encode(digest_parts::<Md5>(parts)),
            DigestAlgorithm::Sha256 => hex::encode(digest_parts::<Sha256>(parts)),
        }
    }

    /// Length of the hex token this algorithm produces.
    pub fn hex_len(&self) -> usize {
        match self {
            DigestAlgorithm::Md5 => 32,
            DigestAlgorithm::Sha256 => 64,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DigestAlgorithm::Md5 => "md5",
            DigestAlgorithm::Sha256 => "sha256",
        }
    }
}

impl std::fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DigestAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "md5" => Ok(DigestAlgorithm::Md5),
            "sha256" => Ok(DigestAlgorithm::Sha256),
            other => Err(format!("unknown digest algorithm: {}", other)),
        }
    }
}

fn digest_parts<D: Digest>(parts: &[&[u8]]) -> Vec<u8> {
    let mut hasher = D::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().to_vec()
}

/// Constant-time token comparison.
///
/// Both inputs are reduced to SHA-256 digests first, so neither content nor
/// length affects timing.
pub fn tokens_match(claimed: &[u8], computed: &[u8]) -> bool {
    let a = Sha256::digest(claimed);
    let b = Sha256::digest(computed);
    a.ct_eq(&b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn md5_matches_known_link_token() {
        let token = DigestAlgorithm::Md5.hex_digest(&[b"/foo/bar", b"enigma"]);
        assert_eq!(token, "26d001f85813609efb213b28fae45950");
        assert_eq!(token.len(), DigestAlgorithm::Md5.hex_len());
    }

    #[test]
    fn parts_are_concatenated() {
        let split = DigestAlgorithm::Md5.hex_digest(&[b"1700000000", b"/foo/bar", b"enigma"]);
        let joined = DigestAlgorithm::Md5.hex_digest(&[b"1700000000/foo/barenigma"]);
        assert_eq!(split, joined);
        assert_eq!(split, "756f3fb1463dcc06c9b6a7bfb9d6ddfe");
    }

    #[test]
    fn sha256_is_lowercase_hex() {
        let token = DigestAlgorithm::Sha256.hex_digest(&[b"/foo/bar", b"enigma"]);
        assert_eq!(
            token,
            "973effdc97dc5404a57f7b044bcc240d1168015399cff62cfc37d10f499e4148"
        );
        assert_eq!(token.len(), DigestAlgorithm::Sha256.hex_len());
    }

    #[test]
    fn algorithm_parses_case_insensitively() {
        assert_eq!("MD5".parse::<DigestAlgorithm>(), Ok(DigestAlgorithm::Md5));
        assert_eq!("sha256".parse::<DigestAlgorithm>(), Ok(DigestAlgorithm::Sha256));
        assert!("crc32".parse::<DigestAlgorithm>().is_err());
    }

    #[test]
    fn token_comparison() {
        assert!(tokens_match(b"abc", b"abc"));
        assert!(!tokens_match(b"abc", b"abd"));
        assert!(!tokens_match(b"abc", b"abcd"));
        // Hex case matters: tokens are always issued lowercase.
        assert!(!tokens_match(
            b"26D001F85813609EFB213B28FAE45950",
            b"26d001f85813609efb213b28fae45950"
        ));
    }
}
