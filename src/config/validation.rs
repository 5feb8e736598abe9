//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and value ranges (timeouts > 0)
//! - Apply the secure link construction checks before anything starts
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::uri::Authority;
use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::securelink::{SecureLink, SecureLinkError};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid listener bind address: {0}")]
    BindAddress(String),

    #[error("invalid upstream address: {0:?}")]
    UpstreamAddress(String),

    #[error("timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("invalid metrics address: {0}")]
    MetricsAddress(String),

    #[error("securelink: {0}")]
    SecureLink(#[from] SecureLinkError),
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    // `host:port`; hostnames are resolved when the listener binds
    let bind_ok = config
        .listener
        .bind_address
        .parse::<Authority>()
        .map(|a| a.port_u16().is_some() && !a.host().is_empty())
        .unwrap_or(false);
    if !bind_ok {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    let upstream = config.upstream.address.trim();
    if upstream.is_empty() || upstream.parse::<Authority>().is_err() {
        errors.push(ValidationError::UpstreamAddress(
            config.upstream.address.clone(),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("request_secs"));
    }
    if config.timeouts.idle_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("idle_secs"));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if let Err(e) = SecureLink::new(&config.securelink) {
        errors.push(e.into());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
