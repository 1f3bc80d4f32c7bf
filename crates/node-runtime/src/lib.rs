//! # Image Transform Node Runtime
//!
//! Builds every pipeline component once and runs them in one process.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration from the environment
//! 2. Validate the signing secret is not default
//! 3. Build the container (job store, object store, queues, components)
//! 4. Start the transform and dead-letter pollers
//! 5. Serve the API gateway
//!
//! ## Modular Structure
//!
//! - `container/` - Configuration and component wiring
//! - `runtime.rs` - Task lifecycle and graceful shutdown

pub mod container;
pub mod runtime;

pub use container::{ConfigError, Container, ContainerError, NodeConfig};
pub use runtime::NodeRuntime;
