//! Structured logging with transaction context.
//!
//! Provides the sinks that scope lines are written to and the context-tagged
//! macros used for ambient messages.

pub mod sink;
pub mod structured;

pub use sink::*;
pub use structured::*;
