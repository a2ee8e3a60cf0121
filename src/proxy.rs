//! HTTP Reverse Proxy Server

use axum::{
    body::Body,
    extract::State,
    http::{Request, Response, StatusCode},
    response::IntoResponse,
    routing::any,
    Router,
};
use hyper_util::{client::legacy::Client, rt::TokioExecutor};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use crate::config::ProxyConfig;
use crate::error::{ProxyError, Result};
use crate::router::{Router as PathRouter, RuleTable};

/// HTTP client type for forwarding requests
type HttpClient = Client<hyper_util::client::legacy::connect::HttpConnector, Body>;

/// Shared proxy state
pub struct ProxyState {
    /// Request router
    pub router: PathRouter,
    /// HTTP client for forwarding
    pub client: HttpClient,
}

/// Proxy server
pub struct ProxyServer {
    config: ProxyConfig,
    state: Arc<ProxyState>,
}

impl std::fmt::Debug for ProxyServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyServer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ProxyServer {
    /// Create a new proxy server.
    ///
    /// Compiles the mapping strings into the rule table; any mapping or
    /// pattern error aborts construction before a listener exists.
    pub fn new(config: ProxyConfig) -> Result<Self> {
        config.validate()?;

        let table = RuleTable::compile(&config.mappings)?;
        let router = PathRouter::new(table);

        // Create HTTP client
        let client: HttpClient = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(Duration::from_secs(30))
            .build_http();

        let state = Arc::new(ProxyState { router, client });

        Ok(Self { config, state })
    }

    /// Build the Axum router
    pub fn router(&self) -> Router {
        Router::new()
            .route("/*path", any(proxy_handler))
            .route("/", any(proxy_handler))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Run the proxy server.
    ///
    /// A bind or serve failure propagates to the caller; an unservable proxy
    /// must terminate rather than linger without a listener.
    pub async fn run(&self) -> Result<()> {
        let router = self.router();
        let addr = format!("0.0.0.0:{}", self.config.http_port);

        info!("Starting proxy server on {}", addr);
        info!("Configured mappings:");
        for rule in self.state.router.table().iter() {
            info!("  {} -> {}", rule.pattern(), rule.target());
        }

        let listener = TcpListener::bind(&addr).await?;
        axum::serve(listener, router)
            .await
            .map_err(|e| ProxyError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?;

        Ok(())
    }
}

/// Main proxy handler - rewrites each request toward its matched backend and
/// forwards it
async fn proxy_handler(
    State(state): State<Arc<ProxyState>>,
    mut req: Request<Body>,
) -> impl IntoResponse {
    debug!("Routing request: {} {}", req.method(), req.uri().path());

    // Remove hop-by-hop headers; the rewrite below sets the Host header
    let headers = req.headers_mut();
    headers.remove("connection");
    headers.remove("keep-alive");
    headers.remove("proxy-authenticate");
    headers.remove("proxy-authorization");
    headers.remove("te");
    headers.remove("trailers");
    headers.remove("transfer-encoding");
    headers.remove("upgrade");

    let target = match state.router.rewrite(&mut req) {
        Ok(target) => target.to_string(),
        Err(e) => {
            error!("Failed to rewrite request: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Internal Error").into_response();
        }
    };

    // Send request to backend
    match state.client.request(req).await {
        Ok(response) => {
            let (parts, body) = response.into_parts();
            Response::from_parts(parts, Body::new(body)).into_response()
        }
        Err(e) => {
            error!("Backend {} error: {}", target, e);
            (StatusCode::BAD_GATEWAY, "Bad Gateway").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderMap};
    use axum::routing::get;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_config(mappings: Vec<String>) -> ProxyConfig {
        ProxyConfig {
            http_port: 0,
            mappings,
        }
    }

    #[test]
    fn test_proxy_server_creation() {
        let config = test_config(vec![".* -> 127.0.0.1:8080".to_string()]);
        let server = ProxyServer::new(config);
        assert!(server.is_ok());
    }

    #[test]
    fn test_proxy_server_rejects_empty_mappings() {
        let server = ProxyServer::new(test_config(vec![]));
        assert!(server.is_err());
    }

    #[test]
    fn test_proxy_server_rejects_bad_pattern() {
        let server = ProxyServer::new(test_config(vec!["[[[[[ -> 127.0.0.1:8080".to_string()]));
        assert!(matches!(server.unwrap_err(), ProxyError::InvalidPattern(_)));
    }

    #[test]
    fn test_proxy_server_router() {
        let config = test_config(vec![".* -> 127.0.0.1:8080".to_string()]);
        let server = ProxyServer::new(config).unwrap();
        let _router = server.router();
        // Router builds successfully
    }

    #[tokio::test]
    async fn test_forwards_to_matched_backend() {
        // backend that echoes the Host header it received
        let backend = axum::Router::new().route(
            "/api/users",
            get(|headers: HeaderMap| async move {
                headers
                    .get(header::HOST)
                    .and_then(|h| h.to_str().ok())
                    .unwrap_or("")
                    .to_string()
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, backend).await.unwrap();
        });

        let config = test_config(vec![
            format!("/api/.* -> {}", addr),
            format!(".* -> {}", addr),
        ]);
        let server = ProxyServer::new(config).unwrap();

        let response = server
            .router()
            .oneshot(
                Request::builder()
                    .uri("/api/users")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        // the backend saw the rewritten Host header
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], addr.to_string().as_bytes());
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_bad_gateway() {
        // nothing listens on port 1
        let config = test_config(vec![".* -> 127.0.0.1:1".to_string()]);
        let server = ProxyServer::new(config).unwrap();

        let response = server
            .router()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
