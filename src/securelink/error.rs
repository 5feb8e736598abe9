//! Construction-time errors.

use thiserror::Error;

/// Reasons a secure link filter cannot be built from its configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SecureLinkError {
    #[error("secret is required")]
    MissingSecret,

    #[error("at least one protected path is required")]
    MissingProtectedPaths,

    #[error("check expire is only supported with queries")]
    InvalidExpireConfig,
}
