//! Transaction identifiers.
//!
//! - `id` - the identifier value and its validity rule
//! - `local` - date-stamped local generation
//! - `remote` - client for the remote ID service
//! - `source` - the source abstraction with remote-then-local fallback

pub mod id;
pub mod local;
pub mod remote;
pub mod source;

pub use id::*;
pub use local::*;
pub use remote::RemoteIdClient;
pub use source::*;
