//! Request identification.
//!
//! # Responsibilities
//! - Assign a request ID (UUID v4) unless the client sent one
//! - Echo it on the response
//! - Expose it to handlers and middleware for log correlation
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - An incoming `x-request-id` is kept so IDs survive proxy chains

use axum::http::{HeaderName, Request};
use tower::ServiceBuilder;
use tower::layer::util::{Identity, Stack};
use tower_http::request_id::{
    MakeRequestUuid, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};

/// Header carrying the request ID.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Layers that set the request ID on the way in and copy it to the response.
pub type RequestIdLayers =
    Stack<PropagateRequestIdLayer, Stack<SetRequestIdLayer<MakeRequestUuid>, Identity>>;

pub fn request_id_layers() -> ServiceBuilder<RequestIdLayers> {
    ServiceBuilder::new()
        .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
        .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
}

/// Read access to the request ID.
pub trait RequestIdExt {
    fn request_id(&self) -> Option<&str>;
}

impl<B> RequestIdExt for Request<B> {
    fn request_id(&self) -> Option<&str> {
        self.extensions()
            .get::<RequestId>()
            .and_then(|id| id.header_value().to_str().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Response;
    use std::convert::Infallible;
    use tower::{service_fn, ServiceExt};

    async fn echo_id(req: Request<Body>) -> Result<Response<Body>, Infallible> {
        let id = req.request_id().unwrap_or_default().to_string();
        Ok(Response::new(Body::from(id)))
    }

    async fn call(req: Request<Body>) -> (String, Option<String>) {
        let svc = request_id_layers().service(service_fn(echo_id));
        let res = svc.oneshot(req).await.unwrap();
        let header = res
            .headers()
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let body = axum::body::to_bytes(res.into_body(), 1024).await.unwrap();
        (String::from_utf8(body.to_vec()).unwrap(), header)
    }

    #[tokio::test]
    async fn generates_id_when_absent() {
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let (ext, header) = call(req).await;

        assert!(uuid::Uuid::parse_str(&ext).is_ok());
        assert_eq!(header.as_deref(), Some(ext.as_str()));
    }

    #[tokio::test]
    async fn keeps_incoming_id() {
        let req = Request::builder()
            .uri("/")
            .header("x-request-id", "abc-123")
            .body(Body::empty())
            .unwrap();
        let (ext, header) = call(req).await;

        assert_eq!(ext, "abc-123");
        assert_eq!(header.as_deref(), Some("abc-123"));
    }
}
