//! # Image-Transform Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── harness.rs      # Full pipeline wired in memory
//!     ├── scenarios.rs    # Client-visible flows (issue, upload, access)
//!     ├── dead_letter.rs  # Redelivery exhaustion and quarantine
//!     └── invariants.rs   # Cross-component properties
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p it-tests
//! cargo test -p it-tests integration::dead_letter::
//!
//! # Benchmarks
//! cargo bench -p it-tests
//! ```

pub mod integration;
