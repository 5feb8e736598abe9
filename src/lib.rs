//! Secure link reverse proxy library.
//!
//! Admits or rejects requests to protected path prefixes based on a keyed
//! hash carried in the URL, then forwards admitted requests upstream.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod securelink;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use securelink::{Outcome, SecureLink, Signer};
