//! # Domain Layer
//!
//! - `capability` - Capability signing and verification
//! - `errors` - Domain error types

pub mod capability;
pub mod errors;
