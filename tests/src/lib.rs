//! # Cross-Chain Registry Test Suite
//!
//! Cross-crate flows that no single component can test on its own.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── fixtures.rs          # Paired L2/L1 nodes and commitment helpers
//!     ├── e2e_flow.rs          # Register → score → propagate → mirror
//!     ├── relay_ordering.rs    # Shuffled, duplicated and tampered delivery
//!     └── commit_reveal.rs     # Commitment binding properties
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p xcr-tests
//! cargo test -p xcr-tests integration::relay_ordering
//! ```

#![allow(dead_code)]

pub mod integration;
