//! # Component Container
//!
//! Central container holding every pipeline component with lifetime
//! management and dependency injection.
//!
//! - Components are built once per process and shared through `Arc`
//! - Components talk through the job store, the object store and the queues

pub mod components;
pub mod config;

pub use components::{Container, ContainerError};
pub use config::{ConfigError, NodeConfig};
