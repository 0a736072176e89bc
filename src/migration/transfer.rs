//! Per-assignment transfer: stage from the source, then create, upload and link on the target

use crate::error::Result;
use crate::source::SourceClient;
use crate::target::TargetClient;
use crate::types::{Assignment, SessionToken};
use crate::utils::{assignment_folder_segments, staging_path, unique_file_names};
use std::path::Path;
use tracing::{debug, info};

/// Moves one assignment and its attachments from the source to the target course
pub struct AttachmentTransfer<'a> {
    source: &'a dyn SourceClient,
    target: &'a dyn TargetClient,
    working_root: &'a Path,
}

impl<'a> AttachmentTransfer<'a> {
    /// Create a transfer that stages files under `working_root`
    pub fn new(
        source: &'a dyn SourceClient,
        target: &'a dyn TargetClient,
        working_root: &'a Path,
    ) -> Self {
        Self {
            source,
            target,
            working_root,
        }
    }

    /// Transfer `assignment` of course `guid` into the target course `ouid`
    ///
    /// Steps run in order and the first failure is returned as-is:
    /// 1. fetch attachment metadata, make the names distinct within the assignment, and
    ///    stream each file to `{working_root}/{guid}/{name}`
    /// 2. create the submission container (also for assignments without attachments)
    /// 3. with at least one attachment: fetch course info, upload, link
    ///
    /// On success `assignment` carries its staged paths, remote paths and container id.
    /// Files staged before a failure are left in place.
    pub async fn run(
        &self,
        assignment: &mut Assignment,
        guid: &str,
        ouid: &str,
        token: &SessionToken,
    ) -> Result<()> {
        assignment.attachments = self
            .source
            .fetch_attachment_metadata(assignment, token)
            .await?;
        let names = unique_file_names(assignment.attachments.iter().map(|a| a.name.as_str()))?;
        for (attachment, name) in assignment.attachments.iter_mut().zip(names) {
            attachment.name = name;
        }

        for attachment in &mut assignment.attachments {
            let dest = staging_path(self.working_root, guid, &attachment.name)?;
            if let Some(parent) = dest.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            self.source
                .download_attachment(&attachment.locator, &dest, token)
                .await?;
            debug!(guid, assignment_id = %assignment.id, path = %dest.display(), "staged attachment");
            attachment.save_path = Some(dest);
        }

        let container = self.target.create_container(assignment, ouid).await?;
        assignment.container_id = Some(container);

        if !assignment.has_attachments() {
            debug!(guid, ouid, assignment_id = %assignment.id, "no attachments to upload");
            return Ok(());
        }

        let course = self.target.fetch_course_info(ouid).await?;
        let folder = assignment_folder_segments(
            self.target.storage_root(),
            &course,
            ouid,
            &assignment.id,
        )?;
        self.target.upload_to_storage(assignment, &folder).await?;
        self.target.link_attachments(assignment, ouid).await?;

        info!(
            guid,
            ouid,
            assignment_id = %assignment.id,
            container_id = %container,
            attachments = assignment.attachments.len(),
            "transferred assignment"
        );
        Ok(())
    }
}
