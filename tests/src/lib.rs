//! # MetaID SDK Test Suite
//!
//! Unified test crate for cross-module flows.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/      # Facade-to-ports choreography
//!     ├── bootstrap_flow.rs   # root bootstrap end to end
//!     └── combo_writes.rs     # node creation and combined submissions
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p metaid-tests
//! cargo test -p metaid-tests integration::
//! ```

pub mod integration;
