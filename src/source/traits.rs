//! Trait for the system assignments are migrated from

use crate::types::{Assignment, Attachment, SessionToken};
use async_trait::async_trait;
use std::path::Path;

/// Read access to the source learning-management system
///
/// A run logs in once with [`authenticate`](SourceClient::authenticate) and passes the
/// token to every later call.
#[async_trait]
pub trait SourceClient: Send + Sync {
    /// Log in and obtain a session
    ///
    /// Returns `Ok(None)` when the system answers but refuses the credentials.
    ///
    /// # Errors
    ///
    /// Returns an error when the system cannot be reached at all.
    async fn authenticate(&self, user: &str, password: &str) -> crate::Result<Option<SessionToken>>;

    /// List every assignment in the course identified by `guid`, in source order
    ///
    /// The returned assignments carry no attachments yet; see
    /// [`fetch_attachment_metadata`](SourceClient::fetch_attachment_metadata).
    async fn list_assignments(
        &self,
        guid: &str,
        token: &SessionToken,
    ) -> crate::Result<Vec<Assignment>>;

    /// Name and retrieval locator of each attachment on `assignment`, in discovery order
    async fn fetch_attachment_metadata(
        &self,
        assignment: &Assignment,
        token: &SessionToken,
    ) -> crate::Result<Vec<Attachment>>;

    /// Stream the bytes behind `locator` into a file at `dest`
    ///
    /// The parent directory must already exist; an existing file is overwritten.
    async fn download_attachment(
        &self,
        locator: &str,
        dest: &Path,
        token: &SessionToken,
    ) -> crate::Result<()>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
