//! The batch migration pipeline, split by granularity:
//! - [`transfer`] - one assignment: stage attachments, create container, upload, link
//! - [`row`] - one batch row: every assignment of a course, fail-fast
//! - [`batch`] - the whole input: authentication, sequential rows, ledgers, summary

pub mod batch;
pub mod row;
pub mod transfer;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

pub use batch::BatchRunner;
pub use row::RowProcessor;
pub use transfer::AttachmentTransfer;
