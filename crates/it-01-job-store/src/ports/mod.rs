//! # Ports Layer
//!
//! - `outbound.rs` - Driven ports (metadata store) and the in-memory adapter

pub mod outbound;
