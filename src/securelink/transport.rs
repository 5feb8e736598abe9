//! Where a link carries its token.
//!
//! # Responsibilities
//! - Normalize configured prefixes for the active mode
//! - Pull the claimed token (and expiry) out of a request
//! - Derive the real path that is hashed and, in path mode, forwarded
//!
//! # Design Decisions
//! - The mode is fixed at construction; the evaluator never branches on flags
//! - Path mode keeps two legacy quirks: whitespace-trimmed prefixes and a
//!   `/favicon.ico` bypass. Query mode has neither.

use url::form_urlencoded;

/// Path that is always let through in path mode.
pub const FAVICON_PATH: &str = "/favicon.ico";

/// Query parameter carrying the token.
pub const HASH_PARAM: &str = "md5";

/// Query parameter carrying the expiry timestamp.
pub const EXPIRE_PARAM: &str = "expire";

/// Token transport strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// `<prefix>/<token>/<real path>`; the token segment is removed before forwarding.
    PathEmbedded,
    /// `<prefix><real path>?md5=<token>[&expire=<unix>]`; forwarded unchanged.
    Query { check_expire: bool },
}

/// Token material extracted from one request for one prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    /// Token as sent by the client.
    pub hash: String,
    /// Path portion that was signed.
    pub real_path: String,
    /// Raw `expire` value, present only when expiry is checked.
    pub expire: Option<String>,
    /// Path to forward downstream, when it differs from the request path.
    pub rewritten_path: Option<String>,
}

/// Why a claim could not be extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractError {
    /// Path mode: fewer than `/<token>/<rest>` segments after the prefix.
    MissingSegments,
    /// Query mode: no `md5` parameter.
    MissingHash,
    /// Query mode with expiry: no `expire` parameter.
    MissingExpire,
}

impl Transport {
    pub fn from_flags(query: bool, check_expire: bool) -> Self {
        if query {
            Transport::Query { check_expire }
        } else {
            Transport::PathEmbedded
        }
    }

    pub fn checks_expire(&self) -> bool {
        matches!(self, Transport::Query { check_expire: true })
    }

    /// Normalize a configured prefix for matching.
    pub fn normalize_prefix(&self, raw: &str) -> String {
        match self {
            Transport::PathEmbedded => raw.trim().trim_end_matches('/').to_string(),
            Transport::Query { .. } => raw.trim_end_matches('/').to_string(),
        }
    }

    /// Whether `path` skips protection entirely.
    pub fn bypasses(&self, path: &str) -> bool {
        matches!(self, Transport::PathEmbedded) && path == FAVICON_PATH
    }

    /// Extract the claim for a request whose `path` starts with `prefix`.
    pub fn extract(&self, path: &str, query: Option<&str>, prefix: &str) -> Result<Claim, ExtractError> {
        let prefix_chars = prefix.chars().count();
        match self {
            Transport::PathEmbedded => {
                let remainder = &path[prefix.len()..];
                let segments: Vec<&str> = remainder.split('/').collect();
                if segments.len() < 3 {
                    return Err(ExtractError::MissingSegments);
                }
                let hash = segments[1];
                // Offset is counted in characters from the start of the path.
                let skip = prefix_chars + hash.chars().count() + 1;
                let real_path: String = path.chars().skip(skip).collect();
                let rewritten = format!("{}{}", prefix, real_path);
                Ok(Claim {
                    hash: hash.to_string(),
                    real_path,
                    expire: None,
                    rewritten_path: Some(rewritten),
                })
            }
            Transport::Query { check_expire } => {
                let query = query.unwrap_or_default();
                let hash = first_param(query, HASH_PARAM).ok_or(ExtractError::MissingHash)?;
                let expire = if *check_expire {
                    Some(first_param(query, EXPIRE_PARAM).ok_or(ExtractError::MissingExpire)?)
                } else {
                    None
                };
                Ok(Claim {
                    hash,
                    real_path: path.chars().skip(prefix_chars).collect(),
                    expire,
                    rewritten_path: None,
                })
            }
        }
    }
}

/// First value of `key` in a raw query string.
fn first_param(query: &str, key: &str) -> Option<String> {
    form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_normalization_differs_by_mode() {
        assert_eq!(Transport::PathEmbedded.normalize_prefix(" /video/ "), "/video");
        assert_eq!(Transport::PathEmbedded.normalize_prefix("/video//"), "/video");
        let query = Transport::Query { check_expire: false };
        assert_eq!(query.normalize_prefix("/video/"), "/video");
        assert_eq!(query.normalize_prefix(" /video/ "), " /video/ ");
    }

    #[test]
    fn favicon_bypass_only_in_path_mode() {
        assert!(Transport::PathEmbedded.bypasses("/favicon.ico"));
        assert!(!Transport::PathEmbedded.bypasses("/favicon.ico/x"));
        assert!(!Transport::Query { check_expire: false }.bypasses("/favicon.ico"));
    }

    #[test]
    fn path_mode_extracts_token_and_rewrites() {
        let claim = Transport::PathEmbedded
            .extract("/video/abc/foo/bar", None, "/video")
            .unwrap();
        assert_eq!(claim.hash, "abc");
        assert_eq!(claim.real_path, "/foo/bar");
        assert_eq!(claim.rewritten_path.as_deref(), Some("/video/foo/bar"));
        assert_eq!(claim.expire, None);
    }

    #[test]
    fn path_mode_requires_three_segments() {
        let t = Transport::PathEmbedded;
        assert_eq!(t.extract("/video", None, "/video"), Err(ExtractError::MissingSegments));
        assert_eq!(t.extract("/video/", None, "/video"), Err(ExtractError::MissingSegments));
        assert_eq!(t.extract("/video/foo", None, "/video"), Err(ExtractError::MissingSegments));
        // A trailing slash is enough to form the third segment.
        let claim = t.extract("/video/foo/", None, "/video").unwrap();
        assert_eq!(claim.hash, "foo");
        assert_eq!(claim.real_path, "/");
    }

    #[test]
    fn path_mode_slices_by_character() {
        let claim = Transport::PathEmbedded
            .extract("/vidéo/hash/naïve/ß", None, "/vidéo")
            .unwrap();
        assert_eq!(claim.hash, "hash");
        assert_eq!(claim.real_path, "/naïve/ß");
        assert_eq!(claim.rewritten_path.as_deref(), Some("/vidéo/naïve/ß"));
    }

    #[test]
    fn query_mode_reads_parameters() {
        let t = Transport::Query { check_expire: true };
        let claim = t
            .extract("/playlist/foo/bar", Some("expire=123&md5=abc&md5=def"), "/playlist")
            .unwrap();
        assert_eq!(claim.hash, "abc");
        assert_eq!(claim.expire.as_deref(), Some("123"));
        assert_eq!(claim.real_path, "/foo/bar");
        assert_eq!(claim.rewritten_path, None);
    }

    #[test]
    fn query_mode_missing_parameters() {
        let t = Transport::Query { check_expire: true };
        assert_eq!(t.extract("/p/x", None, "/p"), Err(ExtractError::MissingHash));
        assert_eq!(t.extract("/p/x", Some("md5=abc"), "/p"), Err(ExtractError::MissingExpire));

        let t = Transport::Query { check_expire: false };
        let claim = t.extract("/p/x", Some("md5=abc&expire=1"), "/p").unwrap();
        assert_eq!(claim.expire, None);
    }
}
