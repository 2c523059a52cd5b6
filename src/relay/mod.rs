//! Same-origin relay for the upstream API.
//!
//! `GET /api-proxy?<query>` is forwarded to the configured upstream with the
//! query string copied verbatim, and the upstream status, headers and body are
//! streamed back with permissive CORS headers. Every other path is handed to the
//! static asset directory when one is configured.

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::body::Body;
use axum::extract::State;
use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::Router;
use serde_json::json;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::client::ACCEPT;
use crate::request::{DEFAULT_API_BASE, PROXY_PATH};

pub const DEFAULT_BIND: &str = "127.0.0.1:8787";

const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
];

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("invalid upstream URL: {url}")]
    InvalidUpstream { url: String },

    #[error("failed to build HTTP client: {source}")]
    HttpClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("relay server failed: {source}")]
    Serve {
        #[source]
        source: std::io::Error,
    },
}

#[derive(Clone, Debug)]
pub struct RelayConfig {
    pub bind: SocketAddr,
    pub upstream: String,
    pub assets_dir: Option<PathBuf>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.parse().unwrap_or(SocketAddr::from(([127, 0, 0, 1], 8787))),
            upstream: DEFAULT_API_BASE.to_string(),
            assets_dir: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct RelayState {
    http: reqwest::Client,
    upstream: reqwest::Url,
}

impl RelayState {
    pub fn new(upstream: &str) -> Result<Self, RelayError> {
        let upstream = reqwest::Url::parse(upstream).map_err(|_| RelayError::InvalidUpstream {
            url: upstream.to_string(),
        })?;
        let http = reqwest::Client::builder()
            .build()
            .map_err(|source| RelayError::HttpClientBuild { source })?;
        Ok(Self { http, upstream })
    }

    /// The upstream URL with its query replaced by `query`.
    pub fn upstream_url(&self, query: Option<&str>) -> reqwest::Url {
        let mut url = self.upstream.clone();
        url.set_query(query.filter(|q| !q.is_empty()));
        url
    }
}

fn with_cors(headers: &mut HeaderMap, origin: Option<&HeaderValue>) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        origin
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static("*")),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    headers.insert(header::VARY, HeaderValue::from_static("Origin"));
}

fn json_response(
    status: StatusCode,
    payload: serde_json::Value,
    origin: Option<&HeaderValue>,
) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json; charset=utf-8"),
    );
    with_cors(&mut headers, origin);
    (status, headers, payload.to_string()).into_response()
}

fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(&name.as_str())
}

async fn forward(state: &RelayState, uri: &Uri, origin: Option<&HeaderValue>) -> Response {
    let upstream_url = state.upstream_url(uri.query());
    debug!(upstream = %upstream_url.as_str().split('?').next().unwrap_or(""), "forwarding");

    let upstream = match state
        .http
        .get(upstream_url)
        .header(reqwest::header::ACCEPT, ACCEPT)
        .send()
        .await
    {
        Ok(resp) => resp,
        Err(e) => {
            warn!(error = %e, "upstream request failed");
            return json_response(
                StatusCode::BAD_GATEWAY,
                json!({ "error": "Proxy request failed", "detail": e.to_string() }),
                origin,
            );
        }
    };

    let status = upstream.status();
    let mut headers = HeaderMap::new();
    for (name, value) in upstream.headers() {
        if !is_hop_by_hop(name) {
            headers.append(name.clone(), value.clone());
        }
    }
    with_cors(&mut headers, origin);
    debug!(status = status.as_u16(), "upstream responded");

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

async fn api_proxy(
    State(state): State<RelayState>,
    method: Method,
    request_headers: HeaderMap,
    uri: Uri,
) -> Response {
    let origin = request_headers.get(header::ORIGIN);
    match method {
        Method::OPTIONS => {
            let mut headers = HeaderMap::new();
            with_cors(&mut headers, origin);
            (StatusCode::NO_CONTENT, headers).into_response()
        }
        Method::GET => forward(&state, &uri, origin).await,
        _ => json_response(
            StatusCode::METHOD_NOT_ALLOWED,
            json!({ "error": "Method not allowed" }),
            origin,
        ),
    }
}

async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not found").into_response()
}

pub fn router(state: RelayState, assets_dir: Option<PathBuf>) -> Router {
    let app = Router::new()
        .route(PROXY_PATH, any(api_proxy))
        .with_state(state);
    let app = match assets_dir {
        Some(dir) => app.fallback_service(ServeDir::new(dir)),
        None => app.fallback(not_found),
    };
    app.layer(TraceLayer::new_for_http())
}

/// Runs the relay until `shutdown` resolves.
pub async fn serve<F>(config: RelayConfig, shutdown: F) -> Result<(), RelayError>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let state = RelayState::new(&config.upstream)?;
    let app = router(state, config.assets_dir.clone());

    let listener = TcpListener::bind(config.bind)
        .await
        .map_err(|source| RelayError::Bind {
            addr: config.bind,
            source,
        })?;
    let local = listener.local_addr().unwrap_or(config.bind);
    info!(
        "relay listening on http://{}{} -> {}",
        local, PROXY_PATH, config.upstream
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|source| RelayError::Serve { source })?;
    info!("relay stopped");
    Ok(())
}
