//! Request spans.
//!
//! Every request runs inside an `api_request` span carrying method, path and
//! the final status. An incoming W3C `traceparent` is linked as follows-from.

use axum::{body::Body, http::Request, response::Response};
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::{field, info_span, Instrument, Span};

#[derive(Clone, Default)]
pub struct TracingLayer;

impl TracingLayer {
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for TracingLayer {
    type Service = TracingService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TracingService { inner }
    }
}

#[derive(Clone)]
pub struct TracingService<S> {
    inner: S,
}

impl<S> Service<Request<Body>> for TracingService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let mut inner = self.inner.clone();

        let span = info_span!(
            "api_request",
            http.method = %req.method(),
            http.target = %req.uri().path(),
            http.status_code = field::Empty,
            otel.kind = "server",
            otel.status_code = field::Empty,
        );
        if let Some(parent) = extract_trace_context(&req) {
            span.follows_from(parent);
        }

        Box::pin(
            async move {
                let result = inner.call(req).await;
                let current = Span::current();
                match &result {
                    Ok(response) => {
                        let status = response.status();
                        current.record("http.status_code", status.as_u16());
                        current.record("otel.status_code", status_class(status.as_u16()));
                    }
                    Err(_) => {
                        current.record("otel.status_code", "ERROR");
                    }
                }
                result
            }
            .instrument(span),
        )
    }
}

fn status_class(status: u16) -> &'static str {
    match status {
        100..=399 => "OK",
        400..=499 => "CLIENT_ERROR",
        _ => "ERROR",
    }
}

/// W3C `traceparent`: version-trace_id-parent_id-flags.
fn extract_trace_context<B>(req: &Request<B>) -> Option<Span> {
    let traceparent = req.headers().get("traceparent")?.to_str().ok()?;
    let parts: Vec<&str> = traceparent.split('-').collect();
    if parts.len() != 4 || parts[1].len() != 32 || parts[2].len() != 16 {
        return None;
    }

    Some(info_span!(
        "parent_trace",
        trace_id = parts[1],
        parent_span_id = parts[2]
    ))
}
