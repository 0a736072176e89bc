//! Trait for the system assignments are migrated to

use crate::types::{Assignment, ContainerId, CourseInfo};
use async_trait::async_trait;

/// Write access to the target learning-management system
///
/// Implementations hold their own signing context; every call is independently
/// authenticated and no session state is kept between calls.
#[async_trait]
pub trait TargetClient: Send + Sync {
    /// Create a submission container for `assignment` in the course `ouid`
    ///
    /// Not idempotent: each call creates a new container.
    async fn create_container(&self, assignment: &Assignment, ouid: &str)
    -> crate::Result<ContainerId>;

    /// Metadata of the course `ouid`
    async fn fetch_course_info(&self, ouid: &str) -> crate::Result<CourseInfo>;

    /// Push every staged attachment of `assignment` into the storage folder `folder`
    ///
    /// `folder` is a list of path segments below the storage host. On success each
    /// attachment's `remote_path` is set.
    async fn upload_to_storage(
        &self,
        assignment: &mut Assignment,
        folder: &[String],
    ) -> crate::Result<()>;

    /// Attach the uploaded files of `assignment` to its container
    async fn link_attachments(&self, assignment: &Assignment, ouid: &str) -> crate::Result<()>;

    /// Identify the account the client acts as
    async fn whoami(&self) -> crate::Result<String>;

    /// Root folder for course storage, as configured
    fn storage_root(&self) -> &str;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
