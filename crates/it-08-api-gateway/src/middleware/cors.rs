//! CORS from gateway configuration.

use crate::domain::config::CorsConfig;
use axum::http::{HeaderName, HeaderValue, Method};
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

pub fn create_cors_layer(config: &CorsConfig) -> CorsLayer {
    if !config.enabled {
        return CorsLayer::new();
    }

    let mut cors = CorsLayer::new();

    if config.allowed_origins.iter().any(|o| o == "*") {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors = cors.allow_origin(origins);
    }

    let methods: Vec<Method> = config
        .allowed_methods
        .iter()
        .filter_map(|m| m.parse().ok())
        .collect();
    cors = cors.allow_methods(methods);

    if config.allowed_headers.iter().any(|h| h == "*") {
        cors = cors.allow_headers(Any);
    } else {
        let headers: Vec<HeaderName> = config
            .allowed_headers
            .iter()
            .filter_map(|h| h.parse().ok())
            .collect();
        cors = cors.allow_headers(headers);
    }

    // Browsers need this to read the assigned object identifier.
    if !config.expose_headers.is_empty() {
        let expose: Vec<HeaderName> = config
            .expose_headers
            .iter()
            .filter_map(|h| h.parse().ok())
            .collect();
        cors = cors.expose_headers(expose);
    }

    cors.max_age(Duration::from_secs(config.max_age))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, routing::get, Router};
    use tower::ServiceExt;

    async fn preflight(config: &CorsConfig) -> axum::response::Response {
        Router::new()
            .route("/generate-url", get(|| async { "ok" }))
            .layer(create_cors_layer(config))
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/generate-url")
                    .header("origin", "https://app.example")
                    .header("access-control-request-method", "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_default_allows_any_origin() {
        let response = preflight(&CorsConfig::default()).await;
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn test_specific_origins() {
        let config = CorsConfig {
            allowed_origins: vec!["https://other.example".to_string()],
            ..Default::default()
        };
        let response = preflight(&config).await;
        assert!(response.headers().get("access-control-allow-origin").is_none());
    }
}
