//! Metrics for bol-mcp.
//!
//! Recording goes through the `metrics` crate facade, so every call site is a
//! no-op until a recorder is installed. With the `prometheus` feature the
//! recorder renders Prometheus text for the `/metrics` route.
//!
//! ```rust,ignore
//! use bolmcp_metrics::{counter, oauth};
//!
//! counter!(oauth::TOKEN_CACHE_HITS_TOTAL).increment(1);
//! ```

mod definitions;
mod recorder;

pub use {
    definitions::*,
    recorder::{MetricsHandle, MetricsRecorderConfig, init_metrics},
};

// Re-export metrics macros for convenience
pub use metrics::{counter, gauge, histogram};
