//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup)
//!     → request.rs (assign request ID)
//!     → middleware/secure_link.rs (admit, rewrite, 403 or 410)
//!     → server.rs proxy handler (forward to upstream)
//!     → Send upstream response to client
//! ```

pub mod middleware;
pub mod request;
pub mod server;

pub use request::{request_id_layers, RequestIdExt, X_REQUEST_ID};
pub use server::HttpServer;
