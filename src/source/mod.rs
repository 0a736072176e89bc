//! Source system access
//!
//! The pipeline talks to the source through the [`SourceClient`] trait. [`SakaiClient`]
//! implements it over the Sakai `/direct` REST API.

mod sakai;
mod traits;

pub use sakai::SakaiClient;
pub use traits::SourceClient;
