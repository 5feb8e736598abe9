//! Secure link subsystem.
//!
//! # Data Flow
//! ```text
//! SecureLinkConfig
//!     → evaluator.rs (validate once, pick transport)
//!     → SecureLink (immutable, shared via Arc)
//!
//! Per request (decoded path, query):
//!     → encoding.rs (percent-decode the path; re-encode rewrites)
//!     → transport.rs (favicon bypass, prefix normalization, token extraction)
//!     → digest.rs (recompute token, constant-time compare)
//!     → expiry.rs (query mode with expiry only)
//!     → Outcome: Admit | Forbid | Expired
//! ```
//!
//! # Design Decisions
//! - No HTTP types here; the middleware maps outcomes to status codes
//! - The wall clock is read per evaluation, never cached
//! - signer.rs issues links with the same hashing rules

pub mod digest;
pub mod encoding;
pub mod error;
pub mod evaluator;
pub mod expiry;
pub mod signer;
pub mod transport;

pub use digest::DigestAlgorithm;
pub use encoding::{decode_path, encode_path};
pub use error::SecureLinkError;
pub use evaluator::{ForbidReason, Outcome, SecureLink};
pub use signer::{expire_after, Signer};
pub use transport::Transport;
