//! Toolkit configuration
//!
//! Settings a [`Context`](crate::app::Context) is created with. Values come
//! from code or from the environment; out-of-range values are rejected when
//! parsed and clamped when set programmatically.

pub mod toolkit;

pub use toolkit::{ConfigError, ToolkitConfig};
