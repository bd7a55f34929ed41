//! # glkit Common
//!
//! Logging configuration shared by the glkit crates.
//!
//! ## Features
//!
//! - Pretty, compact and JSON output
//! - `RUST_LOG` style filtering, defaulting to the glkit targets
//! - A capture-friendly subscriber for tests

pub mod logging;

pub use logging::{init_logging, init_test_logging, try_init_logging, LogConfig, LogFormat};
