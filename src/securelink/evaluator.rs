//! Per-request link evaluation.
//!
//! # Responsibilities
//! - Validate configuration once, at construction
//! - Match request paths against protected prefixes
//! - Recompute and compare link tokens
//! - Enforce expiry windows in query mode
//!
//! # Design Decisions
//! - Immutable after construction; shared by reference across requests
//! - Every matching prefix is checked in declaration order, first rejection wins
//! - A path-mode rewrite is visible to the prefixes checked after it

use std::borrow::Cow;

use crate::config::SecureLinkConfig;
use crate::securelink::digest::{tokens_match, DigestAlgorithm};
use crate::securelink::error::SecureLinkError;
use crate::securelink::expiry::{self, ExpiryCheck};
use crate::securelink::signer::Signer;
use crate::securelink::transport::{ExtractError, Transport};

/// Decision for a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Forward the request, optionally under a new path.
    Admit {
        rewritten_path: Option<String>,
        /// At least one protected prefix matched and verified.
        verified: bool,
    },
    /// Reject as forbidden.
    Forbid(ForbidReason),
    /// Token is valid but its expiry has passed.
    Expired { expire: i64, now: i64 },
}

/// Diagnostic reason for a forbidden request. Never sent to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForbidReason {
    MissingSegments,
    MissingHash,
    MissingExpire,
    HashMismatch,
    MalformedExpire,
}

impl ForbidReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ForbidReason::MissingSegments => "missing_segments",
            ForbidReason::MissingHash => "missing_hash",
            ForbidReason::MissingExpire => "missing_expire",
            ForbidReason::HashMismatch => "hash_mismatch",
            ForbidReason::MalformedExpire => "malformed_expire",
        }
    }
}

impl From<ExtractError> for ForbidReason {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::MissingSegments => ForbidReason::MissingSegments,
            ExtractError::MissingHash => ForbidReason::MissingHash,
            ExtractError::MissingExpire => ForbidReason::MissingExpire,
        }
    }
}

impl Outcome {
    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Admit { verified: true, .. } => "admit",
            Outcome::Admit { verified: false, .. } => "unprotected",
            Outcome::Forbid(_) => "forbid",
            Outcome::Expired { .. } => "expired",
        }
    }
}

/// A validated secure link filter.
#[derive(Clone)]
pub struct SecureLink {
    secret: Vec<u8>,
    prefixes: Vec<String>,
    transport: Transport,
    algorithm: DigestAlgorithm,
}

impl std::fmt::Debug for SecureLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecureLink")
            .field("prefixes", &self.prefixes)
            .field("transport", &self.transport)
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

impl SecureLink {
    /// Build a filter, rejecting incomplete or contradictory settings.
    pub fn new(config: &SecureLinkConfig) -> Result<Self, SecureLinkError> {
        if config.secret.is_empty() {
            return Err(SecureLinkError::MissingSecret);
        }
        if config.protected_paths.is_empty() {
            return Err(SecureLinkError::MissingProtectedPaths);
        }
        if config.check_expire && !config.query {
            return Err(SecureLinkError::InvalidExpireConfig);
        }

        let transport = Transport::from_flags(config.query, config.check_expire);
        let prefixes = config
            .protected_paths
            .iter()
            .map(|p| transport.normalize_prefix(p))
            .collect();

        Ok(Self {
            secret: config.secret.as_bytes().to_vec(),
            prefixes,
            transport,
            algorithm: config.algorithm,
        })
    }

    /// Evaluate a request against the current wall clock.
    pub fn evaluate(&self, path: &str, query: Option<&str>) -> Outcome {
        let now = if self.transport.checks_expire() {
            expiry::unix_now()
        } else {
            0
        };
        self.evaluate_at(path, query, now)
    }

    /// Evaluate a request as if the clock read `now` (Unix seconds).
    pub fn evaluate_at(&self, path: &str, query: Option<&str>, now: i64) -> Outcome {
        if self.transport.bypasses(path) {
            return Outcome::Admit {
                rewritten_path: None,
                verified: false,
            };
        }

        let mut current: Cow<'_, str> = Cow::Borrowed(path);
        let mut verified = false;

        for prefix in &self.prefixes {
            if !current.starts_with(prefix.as_str()) {
                continue;
            }

            let claim = match self.transport.extract(&current, query, prefix) {
                Ok(claim) => claim,
                Err(err) => return Outcome::Forbid(err.into()),
            };

            // A token of the wrong length can never match.
            let expected = self.token(claim.expire.as_deref(), &claim.real_path);
            if claim.hash.len() != self.algorithm.hex_len()
                || !tokens_match(claim.hash.as_bytes(), expected.as_bytes())
            {
                return Outcome::Forbid(ForbidReason::HashMismatch);
            }

            if let Some(raw) = claim.expire.as_deref() {
                match expiry::check(raw, now) {
                    ExpiryCheck::Valid => {}
                    ExpiryCheck::Stale { expire } => return Outcome::Expired { expire, now },
                    ExpiryCheck::Malformed => return Outcome::Forbid(ForbidReason::MalformedExpire),
                }
            }

            if let Some(rewritten) = claim.rewritten_path {
                current = Cow::Owned(rewritten);
            }
            verified = true;
        }

        let rewritten_path = match current {
            Cow::Owned(path) => Some(path),
            Cow::Borrowed(_) => None,
        };
        Outcome::Admit {
            rewritten_path,
            verified,
        }
    }

    /// Expected token for a real path and optional expiry.
    pub fn token(&self, expire: Option<&str>, real_path: &str) -> String {
        let expire = expire.unwrap_or_default();
        self.algorithm
            .hex_digest(&[expire.as_bytes(), real_path.as_bytes(), self.secret.as_slice()])
    }

    /// A signer issuing links this filter accepts.
    pub fn signer(&self) -> Signer {
        Signer::new(self.secret.clone(), self.algorithm)
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }

    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    /// Normalized prefixes in declaration order.
    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }
}
