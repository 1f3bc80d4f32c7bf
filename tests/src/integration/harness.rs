//! Full pipeline fixture.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    extract::ConnectInfo,
    http::{Method, Request, StatusCode},
    response::Response,
    Router,
};
use image::{Rgba, RgbaImage};
use tower::ServiceExt;

use it_01_job_store::InMemoryMetadataStore;
use it_02_object_storage::{MockTimeSource, ObjectStore};
use it_04_transform_worker::{decode_bounded, encode, DimensionLimits};
use it_08_api_gateway::{ApiGatewayService, OBJECT_NAME_HEADER};
use node_runtime::{Container, NodeConfig};
use shared_bus::{BatchHandler, BatchOutcome, PollerConfig, QueuePoller};
use shared_types::{ContentType, JobStatus, ObjectId};

pub const BASE: &str = "http://node.test";
pub const OWNER: &str = "203.0.113.10:41000";
pub const STRANGER: &str = "198.51.100.77:41000";
pub const EPOCH: u64 = 1_700_000_000;

pub struct Pipeline {
    pub container: Arc<Container>,
    pub router: Router,
    pub time: Arc<MockTimeSource>,
    transform: QueuePoller,
    dead_letter: QueuePoller,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::with_config(NodeConfig::default())
    }

    pub fn with_config(mut config: NodeConfig) -> Self {
        config.security.signing_secret = [0x42; 32];
        config.security.public_base_url = BASE.to_string();

        let time = Arc::new(MockTimeSource::new(EPOCH));
        let container = Arc::new(
            Container::assemble(config, Arc::new(InMemoryMetadataStore::new()), time.clone())
                .unwrap(),
        );
        let router = ApiGatewayService::new(
            container.config.gateway_config(),
            container.gateway_components(),
        )
        .unwrap()
        .router();

        let poller_config = PollerConfig {
            wait_time: Duration::from_millis(20),
            invocation_timeout: Duration::from_secs(30),
        };
        let worker: Arc<dyn BatchHandler> = container.worker.clone();
        let dlq: Arc<dyn BatchHandler> = container.dlq_handler.clone();
        let transform = QueuePoller::new(
            Arc::clone(&container.transform_queue),
            worker,
            poller_config.clone(),
        );
        let dead_letter = QueuePoller::new(
            Arc::clone(&container.dead_letter_queue),
            dlq,
            poller_config,
        );

        Self {
            container,
            router,
            time,
            transform,
            dead_letter,
        }
    }

    pub async fn send(&self, req: Request<Body>) -> Response {
        tokio::time::timeout(Duration::from_secs(10), self.router.clone().oneshot(req))
            .await
            .unwrap()
            .unwrap()
    }

    /// `POST /generate-url` from `peer`; panics unless it succeeds.
    pub async fn issue(&self, object_name: &str, transforms: &str, peer: &str) -> (ObjectId, String) {
        let body = format!(r#"{{"ObjectName":"{object_name}","Transforms":{transforms}}}"#);
        let response = self
            .send(request(Method::POST, "/generate-url", Some(peer), Body::from(body)))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let id = response
            .headers()
            .get(OBJECT_NAME_HEADER)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        (ObjectId::new(id), body_text(response).await)
    }

    /// `PUT` `bytes` through a write capability URL.
    pub async fn upload(&self, url: &str, bytes: Vec<u8>) -> StatusCode {
        self.send(request(Method::PUT, path_of(url), None, Body::from(bytes)))
            .await
            .status()
    }

    pub async fn access(&self, id: &ObjectId, peer: &str) -> Response {
        let uri = format!("/access-object?object-name={id}");
        self.send(request(Method::GET, &uri, Some(peer), Body::empty()))
            .await
    }

    /// Run one transform batch, if anything is queued.
    pub async fn run_transform(&self) -> Option<BatchOutcome> {
        tokio::time::timeout(Duration::from_secs(30), self.transform.poll_once())
            .await
            .unwrap()
    }

    /// Run one dead-letter batch, if anything is queued.
    pub async fn run_dead_letter(&self) -> Option<BatchOutcome> {
        tokio::time::timeout(Duration::from_secs(30), self.dead_letter.poll_once())
            .await
            .unwrap()
    }

    /// Drain both queues until neither has work.
    pub async fn settle(&self) {
        loop {
            let transformed = self.run_transform().await.is_some();
            let quarantined = self.run_dead_letter().await.is_some();
            if !transformed
                && !quarantined
                && self.container.transform_queue.is_empty()
                && self.container.dead_letter_queue.is_empty()
            {
                break;
            }
        }
    }

    pub async fn status(&self, id: &ObjectId) -> Option<JobStatus> {
        self.container
            .jobs
            .fetch(id)
            .await
            .unwrap()
            .and_then(|job| job.status())
    }

    pub async fn output(&self, id: &ObjectId) -> Option<Vec<u8>> {
        let bucket = self.container.config.buckets.output.clone();
        self.container
            .objects
            .get_object(&bucket, id.as_str())
            .await
            .ok()
            .map(|object| object.body.to_vec())
    }
}

pub fn request(method: Method, uri: &str, peer: Option<&str>, body: Body) -> Request<Body> {
    let mut req = Request::builder().method(method).uri(uri).body(body).unwrap();
    if let Some(peer) = peer {
        let addr: SocketAddr = peer.parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
    }
    req
}

pub async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

/// Path and query of a capability URL.
pub fn path_of(url: &str) -> &str {
    url.strip_prefix(BASE).unwrap()
}

/// A small image with a distinct colour in every pixel.
pub fn test_image(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x * 37 % 256) as u8, (y * 59 % 256) as u8, ((x + y) * 11 % 256) as u8, 255])
    })
}

pub fn png(image: &RgbaImage) -> Vec<u8> {
    encode(image.clone(), ContentType::Png).unwrap()
}

pub fn decode(bytes: &[u8]) -> RgbaImage {
    decode_bounded(bytes, DimensionLimits::default()).unwrap()
}
