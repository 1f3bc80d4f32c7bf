//! # Adapters Layer
//!
//! - `memory` - In-memory buckets with creation notifications

pub mod memory;
