//! Target (Brightspace) access
//!
//! - [`TargetClient`] - the operations the migration needs from the target system
//! - [`BrightspaceClient`] - Valence API plus WebDAV course storage
//! - [`TargetContext`] - per-request HMAC signing

mod brightspace;
mod context;
mod traits;
mod webdav;

pub use brightspace::BrightspaceClient;
pub use context::TargetContext;
pub use traits::TargetClient;
