//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all proxy handler
//! - Wire up middleware (secure link, timeout, request ID, tracing)
//! - Forward admitted requests to the upstream
//! - Apply reloaded secure link settings
//! - Shut down gracefully on signal

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{uri::Scheme, Request, StatusCode, Uri},
    middleware,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::{TokioExecutor, TokioTimer},
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ProxyConfig;
use crate::http::middleware::{secure_link_middleware, SecureLinkState};
use crate::http::request::{request_id_layers, RequestIdExt};
use crate::observability::metrics;
use crate::securelink::{SecureLink, SecureLinkError};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub client: Client<HttpConnector, Body>,
    /// Upstream authority, e.g. `127.0.0.1:3000`.
    pub upstream: Arc<str>,
}

/// HTTP server for the secure link proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    link_state: SecureLinkState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    ///
    /// Fails if the secure link settings are invalid; nothing is bound yet.
    pub fn new(config: ProxyConfig) -> Result<Self, SecureLinkError> {
        let link = SecureLink::new(&config.securelink)?;
        tracing::info!(
            prefixes = ?link.prefixes(),
            transport = ?link.transport(),
            algorithm = %link.algorithm(),
            "Secure link filter ready"
        );
        let link_state = SecureLinkState::new(link);

        let client = Client::builder(TokioExecutor::new())
            .pool_timer(TokioTimer::new())
            .pool_idle_timeout(Duration::from_secs(config.timeouts.idle_secs))
            .build(HttpConnector::new());

        let state = AppState {
            client,
            upstream: Arc::from(config.upstream.address.trim()),
        };

        let router = Self::build_router(&config, state, link_state.clone());
        Ok(Self {
            router,
            config,
            link_state,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ProxyConfig, state: AppState, link_state: SecureLinkState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(middleware::from_fn_with_state(
                link_state,
                secure_link_middleware,
            ))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(request_id_layers())
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Configs arriving on `config_updates` replace the secure link filter;
    /// the server stops when `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<ProxyConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.address,
            "HTTP server starting"
        );

        let link_state = self.link_state.clone();
        let reloader = tokio::spawn(async move {
            while let Some(new_config) = config_updates.recv().await {
                match SecureLink::new(&new_config.securelink) {
                    Ok(link) => {
                        tracing::info!(prefixes = ?link.prefixes(), "Secure link settings reloaded");
                        link_state.replace(link);
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Rejected secure link reload, keeping current settings");
                    }
                }
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        reloader.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

/// Main proxy handler.
/// Forwards the (possibly rewritten) request to the upstream.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request
        .request_id()
        .map(|id| id.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let method = request.method().to_string();

    let (mut parts, body) = request.into_parts();
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string());

    parts.uri = match Uri::builder()
        .scheme(Scheme::HTTP)
        .authority(state.upstream.as_ref())
        .path_and_query(path_and_query)
        .build()
    {
        Ok(uri) => uri,
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Failed to build upstream URI");
            metrics::record_request(&method, 502, start_time);
            return (StatusCode::BAD_GATEWAY, "Bad upstream address").into_response();
        }
    };

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        uri = %parts.uri,
        "Proxying request"
    );

    let req = Request::from_parts(parts, body);
    match state.client.request(req).await {
        Ok(response) => {
            let response: Response<hyper::body::Incoming> = response;
            metrics::record_request(&method, response.status().as_u16(), start_time);
            let (parts, body) = response.into_parts();
            Response::from_parts(parts, Body::new(body))
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Upstream error");
            metrics::record_request(&method, 502, start_time);
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    }
}
