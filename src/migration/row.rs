//! Per-row processing

use super::transfer::AttachmentTransfer;
use crate::error::Result;
use crate::source::SourceClient;
use crate::target::TargetClient;
use crate::types::{BatchRow, SessionToken};
use std::path::Path;
use tracing::{info, warn};

/// Runs every assignment of one batch row through [`AttachmentTransfer`]
pub struct RowProcessor<'a> {
    source: &'a dyn SourceClient,
    transfer: AttachmentTransfer<'a>,
}

impl<'a> RowProcessor<'a> {
    /// Create a processor that stages files under `working_root`
    pub fn new(
        source: &'a dyn SourceClient,
        target: &'a dyn TargetClient,
        working_root: &'a Path,
    ) -> Self {
        Self {
            source,
            transfer: AttachmentTransfer::new(source, target, working_root),
        }
    }

    /// Migrate all assignments of `row`, recording them in `row.assignments`
    ///
    /// A course without assignments succeeds without touching the target. Assignments
    /// run in listing order and the first failure stops the row.
    ///
    /// # Errors
    /// Returns [`Error::RowFailure`](crate::Error::RowFailure) wrapping the first failure
    pub async fn process(&self, row: &mut BatchRow, token: &SessionToken) -> Result<()> {
        let guid = row.guid().to_string();
        self.migrate(row, &guid, token)
            .await
            .map_err(|e| e.into_row_failure(guid))
    }

    async fn migrate(&self, row: &mut BatchRow, guid: &str, token: &SessionToken) -> Result<()> {
        let ouid = row.ouid().to_string();

        row.assignments = self.source.list_assignments(guid, token).await?;
        if row.assignments.is_empty() {
            info!(guid, ouid = %ouid, "course has no assignments");
            return Ok(());
        }

        for assignment in &mut row.assignments {
            if let Err(e) = self.transfer.run(assignment, guid, &ouid, token).await {
                warn!(guid, ouid = %ouid, assignment_id = %assignment.id, error = %e, "assignment transfer failed");
                return Err(e);
            }
        }

        for assignment in &row.assignments {
            if let Some(container) = assignment.container_id {
                info!(guid, assignment_id = %assignment.id, container_id = %container, "assignment migrated");
            }
        }
        Ok(())
    }
}
