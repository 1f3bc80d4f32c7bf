//! Client identity middleware.
//!
//! Resolves the caller's network identity once per request and stores it as
//! a [`ClientIdentity`] extension. `X-Forwarded-For` is only believed when
//! the TCP peer is a trusted proxy; otherwise the peer address is the
//! identity. Requests without peer information get no identity at all.

use crate::domain::config::SecurityConfig;
use axum::{
    body::Body,
    extract::ConnectInfo,
    http::Request,
    response::Response,
};
use shared_types::SourceIdentity;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tower::{Layer, Service};
use tracing::{debug, warn};

const FORWARDED_FOR: &str = "x-forwarded-for";

/// Identity of the caller, as recorded at issuance and compared at access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity(pub SourceIdentity);

#[derive(Clone)]
pub struct IdentityLayer {
    config: Arc<SecurityConfig>,
}

impl IdentityLayer {
    pub fn new(config: SecurityConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Always use the direct connection address.
    pub fn direct_only() -> Self {
        Self::new(SecurityConfig::default())
    }
}

impl<S> Layer<S> for IdentityLayer {
    type Service = IdentityService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        IdentityService {
            inner,
            config: Arc::clone(&self.config),
        }
    }
}

#[derive(Clone)]
pub struct IdentityService<S> {
    inner: S,
    config: Arc<SecurityConfig>,
}

impl<S> Service<Request<Body>> for IdentityService<S>
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

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let config = Arc::clone(&self.config);
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let direct_ip = req
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ci| ci.0.ip());

            match direct_ip {
                Some(direct_ip) => {
                    let client_ip = determine_client_ip(&req, direct_ip, &config);
                    req.extensions_mut()
                        .insert(ClientIdentity(SourceIdentity::from(client_ip)));
                }
                None => debug!("No peer address; request has no client identity"),
            }

            inner.call(req).await
        })
    }
}

/// Resolve the client IP for a request that arrived from `direct_ip`.
fn determine_client_ip<B>(req: &Request<B>, direct_ip: IpAddr, config: &SecurityConfig) -> IpAddr {
    let forwarded = req
        .headers()
        .get(FORWARDED_FOR)
        .and_then(|v| v.to_str().ok());

    if !is_trusted_proxy(direct_ip, config) {
        if let Some(forwarded) = forwarded {
            warn!(
                direct_ip = %direct_ip,
                forwarded,
                "Ignoring X-Forwarded-For from untrusted source"
            );
        }
        return direct_ip;
    }

    let Some(value) = forwarded else {
        return direct_ip;
    };

    // client, proxy1, proxy2: take the Nth from the right.
    let ips: Vec<&str> = value.split(',').map(str::trim).collect();
    let index = ips.len().saturating_sub(config.proxy_count + 1);
    match ips.get(index).and_then(|ip| ip.parse::<IpAddr>().ok()) {
        Some(ip) => {
            debug!(value, extracted_ip = %ip, "Extracted client IP from header");
            ip
        }
        None => direct_ip,
    }
}

fn is_trusted_proxy(ip: IpAddr, config: &SecurityConfig) -> bool {
    config.trusted_proxies.contains(&ip)
        || (config.trust_localhost && ip.is_loopback())
        || (config.trust_private_ips && is_private_ip(ip))
}

fn is_private_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(ipv4) => ipv4.is_private() || ipv4.is_link_local(),
        // fc00::/7
        IpAddr::V6(ipv6) => (ipv6.octets()[0] & 0xfe) == 0xfc,
    }
}
