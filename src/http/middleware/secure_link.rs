//! Secure Link Middleware.
//! Admits, rewrites or rejects requests to protected paths.
//!
//! Links are checked against the percent-decoded path; a rewritten path is
//! re-encoded before it is forwarded.

use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::{uri::PathAndQuery, Request, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::request::RequestIdExt;
use crate::observability::metrics;
use crate::securelink::{decode_path, encode_path, Outcome, SecureLink};

/// State required for link checks.
///
/// The filter sits behind an `ArcSwap` so a reload can replace it while
/// requests in flight finish against the snapshot they loaded.
#[derive(Clone)]
pub struct SecureLinkState {
    link: Arc<ArcSwap<SecureLink>>,
}

impl SecureLinkState {
    pub fn new(link: SecureLink) -> Self {
        Self {
            link: Arc::new(ArcSwap::from_pointee(link)),
        }
    }

    /// Snapshot of the active filter.
    pub fn current(&self) -> Arc<SecureLink> {
        self.link.load_full()
    }

    /// Replace the active filter.
    pub fn replace(&self, link: SecureLink) {
        self.link.store(Arc::new(link));
    }
}

pub async fn secure_link_middleware(
    State(state): State<SecureLinkState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let link = state.current();
    let outcome = {
        let path = decode_path(req.uri().path());
        link.evaluate(&path, req.uri().query())
    };
    metrics::record_decision(&outcome);

    let request_id = req
        .request_id()
        .map(|id| id.to_string())
        .unwrap_or_default();

    match outcome {
        Outcome::Admit {
            rewritten_path,
            verified,
        } => {
            if let Some(path) = rewritten_path {
                match rewrite_path(req.uri(), &encode_path(&path)) {
                    Some(uri) => {
                        tracing::debug!(
                            request_id = %request_id,
                            from = %req.uri().path(),
                            to = %path,
                            "Rewrote secure link path"
                        );
                        *req.uri_mut() = uri;
                    }
                    None => {
                        tracing::warn!(request_id = %request_id, path = %path, "Rewritten path is not a valid URI");
                        return StatusCode::FORBIDDEN.into_response();
                    }
                }
            }
            if verified {
                tracing::debug!(request_id = %request_id, "Secure link verified");
            }
            next.run(req).await
        }
        Outcome::Forbid(reason) => {
            tracing::info!(
                request_id = %request_id,
                path = %req.uri().path(),
                reason = reason.as_str(),
                "Secure link rejected"
            );
            StatusCode::FORBIDDEN.into_response()
        }
        Outcome::Expired { expire, now } => {
            tracing::info!(
                request_id = %request_id,
                path = %req.uri().path(),
                expire,
                now,
                "Secure link expired"
            );
            StatusCode::GONE.into_response()
        }
    }
}

/// Replace the path of `uri`, keeping its query.
fn rewrite_path(uri: &Uri, path: &str) -> Option<Uri> {
    let path_and_query = match uri.query() {
        Some(query) => format!("{}?{}", path, query),
        None => path.to_string(),
    };
    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(path_and_query.parse::<PathAndQuery>().ok()?);
    Uri::from_parts(parts).ok()
}
