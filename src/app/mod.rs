//! Application layer
//!
//! Everything that needs the whole [`Context`]: window lifecycle and
//! geometry, event routing and the run loop.

pub mod context;
mod routing;
mod run_loop;
mod windows;

pub use context::{Action, Context, MainThreadHandle};
