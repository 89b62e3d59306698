//! Shared error-context plumbing and small helpers used across all bol-mcp crates.

pub mod error;
pub mod text;
pub mod time;

pub use error::FromMessage;
