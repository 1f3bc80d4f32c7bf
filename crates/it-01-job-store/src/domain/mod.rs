//! # Domain Layer
//!
//! - `condition` - Items, read consistency and write conditions
//! - `item` - Typed view over a stored job record
//! - `errors` - Domain error types

pub mod condition;
pub mod errors;
pub mod item;
