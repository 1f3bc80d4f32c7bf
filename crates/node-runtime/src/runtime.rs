//! Process lifecycle: queue pollers, HTTP server, graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use it_08_api_gateway::ApiGatewayService;
use shared_bus::{BatchHandler, PollerConfig, QueuePoller};

use crate::container::Container;

/// How long `shutdown` waits for each task.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// The running node.
pub struct NodeRuntime {
    container: Arc<Container>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    tasks: Vec<(&'static str, JoinHandle<()>)>,
}

impl NodeRuntime {
    pub fn new(container: Container) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            container: Arc::new(container),
            shutdown_tx,
            shutdown_rx,
            tasks: Vec::new(),
        }
    }

    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    /// Bind the configured HTTP address and start every task.
    pub async fn start(&mut self) -> Result<std::net::SocketAddr> {
        let addr = self.container.config.gateway.http_addr();
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;
        self.start_on(listener)
    }

    /// Start every task, serving HTTP on `listener`.
    pub fn start_on(&mut self, listener: TcpListener) -> Result<std::net::SocketAddr> {
        let local = listener.local_addr().context("listener has no local address")?;

        self.spawn_pollers();

        let gateway = ApiGatewayService::new(
            self.container.config.gateway_config(),
            self.container.gateway_components(),
        )
        .context("invalid gateway configuration")?;
        let shutdown = self.shutdown_rx.clone();
        self.tasks.push((
            "api-gateway",
            tokio::spawn(async move {
                if let Err(e) = gateway.serve_on(listener, shutdown).await {
                    error!(error = %e, "HTTP server failed");
                }
            }),
        ));

        info!(addr = %local, tasks = self.tasks.len(), "Node started");
        Ok(local)
    }

    fn spawn_pollers(&mut self) {
        let c = &self.container;
        let wait_time = c.config.queue.poll_wait;

        let worker: Arc<dyn BatchHandler> = c.worker.clone();
        let transform = QueuePoller::new(
            Arc::clone(&c.transform_queue),
            worker,
            PollerConfig {
                wait_time,
                invocation_timeout: c.config.worker.transform_timeout,
            },
        );

        let dlq: Arc<dyn BatchHandler> = c.dlq_handler.clone();
        let dead_letter = QueuePoller::new(
            Arc::clone(&c.dead_letter_queue),
            dlq,
            PollerConfig {
                wait_time,
                invocation_timeout: c.config.worker.dead_letter_timeout,
            },
        );

        let rx = self.shutdown_rx.clone();
        self.tasks
            .push(("transform-poller", tokio::spawn(transform.run(rx))));
        let rx = self.shutdown_rx.clone();
        self.tasks
            .push(("dead-letter-poller", tokio::spawn(dead_letter.run(rx))));
    }

    /// Signal every task and wait for it to finish.
    pub async fn shutdown(self) {
        info!("Initiating graceful shutdown");
        let _ = self.shutdown_tx.send(true);

        for (name, task) in self.tasks {
            match tokio::time::timeout(SHUTDOWN_GRACE, task).await {
                Ok(Ok(())) => info!(task = name, "Task stopped"),
                Ok(Err(e)) => error!(task = name, error = %e, "Task panicked"),
                Err(_) => warn!(task = name, "Task did not stop in time"),
            }
        }
        info!("Shutdown complete");
    }
}
