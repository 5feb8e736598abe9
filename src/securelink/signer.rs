//! Link issuance.
//!
//! Produces URLs that a [`SecureLink`](crate::securelink::SecureLink) with the
//! same secret and algorithm admits. Paths are taken decoded and signed as
//! such; the returned link is percent-encoded.

use url::form_urlencoded;

use crate::securelink::digest::DigestAlgorithm;
use crate::securelink::encoding::encode_path;
use crate::securelink::transport::{EXPIRE_PARAM, HASH_PARAM};

/// Issues signed links for one secret.
#[derive(Clone)]
pub struct Signer {
    secret: Vec<u8>,
    algorithm: DigestAlgorithm,
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer")
            .field("secret", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

impl Signer {
    pub fn new(secret: impl Into<Vec<u8>>, algorithm: DigestAlgorithm) -> Self {
        Self {
            secret: secret.into(),
            algorithm,
        }
    }

    /// Token over `expire ‖ real_path ‖ secret`.
    pub fn token(&self, expire: Option<i64>, real_path: &str) -> String {
        let expire = expire.map(|e| e.to_string()).unwrap_or_default();
        self.algorithm
            .hex_digest(&[expire.as_bytes(), real_path.as_bytes(), self.secret.as_slice()])
    }

    /// `<prefix>/<token><real_path>` for path-embedded links.
    pub fn path_link(&self, prefix: &str, real_path: &str) -> String {
        let prefix = prefix.trim().trim_end_matches('/');
        encode_path(&format!("{}/{}{}", prefix, self.token(None, real_path), real_path))
    }

    /// `<prefix><real_path>?md5=<token>[&expire=<expire>]` for query links.
    pub fn query_link(&self, prefix: &str, real_path: &str, expire: Option<i64>) -> String {
        let prefix = prefix.trim_end_matches('/');
        let mut query = form_urlencoded::Serializer::new(String::new());
        query.append_pair(HASH_PARAM, &self.token(expire, real_path));
        if let Some(expire) = expire {
            query.append_pair(EXPIRE_PARAM, &expire.to_string());
        }
        format!("{}?{}", encode_path(&format!("{}{}", prefix, real_path)), query.finish())
    }

    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }
}

/// Expiry timestamp `ttl_secs` after `issued_at`.
pub fn expire_after(issued_at: i64, ttl_secs: u64) -> i64 {
    issued_at.saturating_add(ttl_secs as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_link_layout() {
        let signer = Signer::new("enigma", DigestAlgorithm::Md5);
        assert_eq!(
            signer.path_link("/video/", "/foo/bar"),
            "/video/26d001f85813609efb213b28fae45950/foo/bar"
        );
    }

    #[test]
    fn query_link_layout() {
        let signer = Signer::new("enigma", DigestAlgorithm::Md5);
        assert_eq!(
            signer.query_link("/playlist", "/foo/bar", None),
            "/playlist/foo/bar?md5=26d001f85813609efb213b28fae45950"
        );
        assert_eq!(
            signer.query_link("/playlist", "/foo/bar", Some(1_700_000_000)),
            "/playlist/foo/bar?md5=756f3fb1463dcc06c9b6a7bfb9d6ddfe&expire=1700000000"
        );
    }

    #[test]
    fn links_are_signed_decoded_and_sent_encoded() {
        let signer = Signer::new("enigma", DigestAlgorithm::Md5);
        assert_eq!(
            signer.path_link("/video/", "/foo bar"),
            "/video/d939cd1dc9c9341f974cc393e5022bab/foo%20bar"
        );
        assert_eq!(
            signer.path_link("/video", "/naïve"),
            "/video/9f9ece20b711e5be9f54df3d7843d90a/na%C3%AFve"
        );
        assert_eq!(
            signer.query_link("/playlist", "/foo bar", None),
            "/playlist/foo%20bar?md5=d939cd1dc9c9341f974cc393e5022bab"
        );
    }

    #[test]
    fn ttl_window() {
        assert_eq!(expire_after(1_000, 120), 1_120);
        assert_eq!(expire_after(i64::MAX - 1, 120), i64::MAX);
    }

    #[test]
    fn debug_hides_secret() {
        let signer = Signer::new("enigma", DigestAlgorithm::Md5);
        assert!(!format!("{signer:?}").contains("enigma"));
    }
}
