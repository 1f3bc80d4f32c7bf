//! # Shared Bus - Notification Delivery
//!
//! Carries object-created notifications from object storage to the batch
//! consumers.
//!
//! ## Delivery Path
//!
//! ```text
//! ┌────────────────┐  publish()  ┌───────┐  fan-out  ┌─────────────────┐
//! │ Object Storage │ ──────────→ │ Topic │ ────────→ │ Transform Queue │
//! └────────────────┘             └───────┘           └────────┬────────┘
//!                                                             │ receive > max
//!                                                             ▼
//!                                                    ┌─────────────────┐
//!                                                    │ Dead-Letter Q.  │
//!                                                    └─────────────────┘
//! ```
//!
//! ## Semantics
//!
//! - **At-least-once:** a delivery stays hidden for the visibility timeout and
//!   reappears unless it is acknowledged.
//! - **Bounded redelivery:** a message that would be received more than
//!   `max_receive_count` times is moved to the dead-letter queue instead.
//! - **Partial batch failure:** consumers report failing items individually;
//!   the poller acknowledges the rest.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod poller;
pub mod queue;
pub mod topic;

pub use poller::{BatchHandler, BatchItemFailure, BatchOutcome, BatchResponse, PollerConfig, QueuePoller};
pub use queue::{Delivery, InMemoryQueue, QueueConfig, QueueError, QueueStats};
pub use topic::{MessagePublisher, Topic};

/// Maximum deliveries handed out per receive.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Seconds a received message stays hidden before it reappears.
pub const DEFAULT_VISIBILITY_TIMEOUT_SECS: u64 = 300;

/// Receives allowed before a message is dead-lettered.
pub const DEFAULT_MAX_RECEIVE_COUNT: u32 = 1;
