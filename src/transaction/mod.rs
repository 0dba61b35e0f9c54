//! Transaction scopes.
//!
//! One lifecycle (`scope`) serves both execution modes:
//! - `blocking` - enclosed logic is a closure run on the caller's thread
//! - `cooperative` - enclosed logic is a future that may suspend

pub mod blocking;
pub mod context;
pub mod cooperative;
pub mod guard;
pub mod scope;

pub use context::*;
pub use guard::TransactionGuard;
