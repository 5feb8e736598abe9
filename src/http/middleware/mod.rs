//! Request middleware.

pub mod secure_link;

pub use secure_link::{secure_link_middleware, SecureLinkState};
