//! API gateway service: router assembly and the HTTP server.

use crate::domain::config::GatewayConfig;
use crate::domain::error::GatewayError;
use crate::handlers::{self, AppState};
use crate::middleware::{
    create_cors_layer, AuthorizerLayer, IdentityLayer, TimeoutLayer, TracingLayer,
};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put, MethodRouter},
    Router,
};
use it_02_object_storage::{CapabilitySigner, ObjectStore};
use it_03_capability_issuer::CapabilityIssuer;
use it_06_access_authorizer::AccessAuthorizer;
use it_07_access_resolver::AccessResolver;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::info;

/// Components the gateway fronts, built once per process.
#[derive(Clone)]
pub struct GatewayComponents {
    pub issuer: Arc<CapabilityIssuer>,
    pub authorizer: Arc<AccessAuthorizer>,
    pub resolver: Arc<AccessResolver>,
    pub signer: CapabilitySigner,
    pub objects: Arc<dyn ObjectStore>,
}

pub struct ApiGatewayService {
    config: GatewayConfig,
    components: GatewayComponents,
}

impl ApiGatewayService {
    pub fn new(config: GatewayConfig, components: GatewayComponents) -> Result<Self, GatewayError> {
        config.validate()?;
        Ok(Self { config, components })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// The complete router with middleware applied.
    pub fn router(&self) -> Router {
        let state = AppState {
            issuer: Arc::clone(&self.components.issuer),
            resolver: Arc::clone(&self.components.resolver),
            signer: self.components.signer.clone(),
            objects: Arc::clone(&self.components.objects),
            max_object_bytes: self.config.limits.max_object_bytes,
        };

        let middleware = ServiceBuilder::new()
            .layer(create_cors_layer(&self.config.cors))
            .layer(TracingLayer::new())
            .layer(IdentityLayer::new(self.config.security.clone()));

        // Object transfers stream up to the upload limit and carry no budget.
        let timeout = TimeoutLayer::new(&self.config.timeouts);
        let objects: MethodRouter<AppState> = put(handlers::put_object)
            .get(handlers::get_object)
            .layer::<_, Infallible>(DefaultBodyLimit::disable())
            .layer::<_, Infallible>(RequestBodyLimitLayer::new(
                self.config.limits.max_object_bytes,
            ));

        Router::new()
            .route(
                "/generate-url",
                post(handlers::generate_url)
                    .layer::<_, Infallible>(DefaultBodyLimit::max(
                        self.config.limits.max_request_bytes,
                    ))
                    .route_layer(timeout.clone()),
            )
            .route(
                "/access-object",
                get(handlers::access_object)
                    .route_layer(AuthorizerLayer::new(Arc::clone(&self.components.authorizer)))
                    .route_layer(timeout),
            )
            .route("/objects/:bucket/:key", objects)
            .route("/health", get(handlers::health))
            .layer(middleware)
            .with_state(state)
    }

    /// Bind the configured address and serve until `shutdown` flips to `true`.
    pub async fn serve(self, shutdown: watch::Receiver<bool>) -> Result<(), GatewayError> {
        let addr = self.config.http_addr();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| GatewayError::Bind { addr, source })?;
        self.serve_on(listener, shutdown).await
    }

    /// Serve on an already bound listener.
    pub async fn serve_on(
        self,
        listener: TcpListener,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), GatewayError> {
        let local = listener.local_addr().map_err(GatewayError::Serve)?;
        info!(addr = %local, "Starting HTTP server");

        let app = self
            .router()
            .into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                while !*shutdown.borrow() {
                    if shutdown.changed().await.is_err() {
                        break;
                    }
                }
            })
            .await
            .map_err(GatewayError::Serve)?;

        info!("HTTP server stopped");
        Ok(())
    }
}
