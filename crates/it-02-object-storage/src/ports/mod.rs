//! # Ports Layer
//!
//! - `outbound.rs` - Driven ports (object store, time source)

pub mod outbound;
