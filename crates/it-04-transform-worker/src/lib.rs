//! # Transform Worker (it-04)
//!
//! Consumes batches of object-created notifications and, per item:
//!
//! ```text
//! parse envelope ─→ bucket/size guard ─→ fetch bytes ─→ probe header ─→ decode
//!       ─→ load job record ─→ apply filter chain ─→ encode ─→ write output
//!       ─→ status = processed
//! ```
//!
//! Every item succeeds or fails on its own. Failures are reported per item so
//! the queue redelivers only those; the queue, not the worker, bounds
//! redelivery.
//!
//! ## Modules
//!
//! - `filters` - Filter registry: name → `(image, params) → image | error`
//! - `codec` - Bounded decode and content-type driven encode
//! - `worker` - Batch handler

pub mod codec;
pub mod errors;
pub mod filters;
pub mod worker;

pub use codec::{decode_bounded, encode, DimensionLimits};
pub use errors::{ChainError, FilterError, WorkerError};
pub use filters::{FilterFn, FilterRegistry, RESERVED_QUALITY};
pub use worker::{TransformWorker, WorkerConfig};
pub use shared_types::{MAX_IMAGE_HEIGHT, MAX_IMAGE_SIZE_BYTES, MAX_IMAGE_WIDTH};
