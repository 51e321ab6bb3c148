//! Account identifiers, redacted secrets, and per-platform credential documents.

pub mod credentials;
pub mod id;
pub mod secret;

pub use credentials::*;
pub use id::*;
pub use secret::*;
