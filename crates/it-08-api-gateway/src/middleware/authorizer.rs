//! Authorizer gate.
//!
//! Runs the access authorizer before the wrapped handler. The identity
//! source is the `object-name` query parameter plus the [`ClientIdentity`]
//! extension. Anything but an Allow policy ends the request with 403.

use crate::domain::error::ApiError;
use crate::middleware::identity::ClientIdentity;
use axum::{
    body::Body,
    extract::Query,
    http::Request,
    response::{IntoResponse, Response},
};
use it_06_access_authorizer::AccessAuthorizer;
use serde::Deserialize;
use std::sync::Arc;
use tower::{Layer, Service};
use tracing::warn;

pub const OBJECT_NAME_PARAM: &str = "object-name";

/// Query string of `GET /access-object`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ObjectNameQuery {
    #[serde(rename = "object-name")]
    pub object_name: Option<String>,
}

#[derive(Clone)]
pub struct AuthorizerLayer {
    authorizer: Arc<AccessAuthorizer>,
}

impl AuthorizerLayer {
    pub fn new(authorizer: Arc<AccessAuthorizer>) -> Self {
        Self { authorizer }
    }
}

impl<S> Layer<S> for AuthorizerLayer {
    type Service = AuthorizerService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthorizerService {
            inner,
            authorizer: Arc::clone(&self.authorizer),
        }
    }
}

#[derive(Clone)]
pub struct AuthorizerService<S> {
    inner: S,
    authorizer: Arc<AccessAuthorizer>,
}

impl<S> Service<Request<Body>> for AuthorizerService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let authorizer = Arc::clone(&self.authorizer);
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let Some(ClientIdentity(caller)) = req.extensions().get::<ClientIdentity>().cloned()
            else {
                warn!(path = %req.uri().path(), "Denied request without client identity");
                return Ok(ApiError::access_denied().into_response());
            };

            let object_name = Query::<ObjectNameQuery>::try_from_uri(req.uri())
                .map(|Query(q)| q.object_name)
                .unwrap_or_default();
            let resource = req.uri().path().to_string();

            let policy = authorizer
                .authorize(object_name.as_deref(), &caller, &resource)
                .await;
            if !policy.is_allowed() {
                return Ok(ApiError::access_denied().into_response());
            }

            inner.call(req).await
        })
    }
}
