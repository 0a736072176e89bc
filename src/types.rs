//! Core types for lms-migrate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Column holding the source (Sakai site) course-mapping identifier
pub const GUID_FIELD: &str = "guid";

/// Column holding the target (Brightspace org unit) course-mapping identifier
pub const OUID_FIELD: &str = "ouid";

/// Column order captured once from the batch header
///
/// Every row is encoded in this order; the order of a row's own map is never consulted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldOrder(Vec<String>);

impl FieldOrder {
    /// Create a field order from header names
    pub fn new(fields: Vec<String>) -> Self {
        Self(fields)
    }

    /// Header names in output order
    pub fn fields(&self) -> &[String] {
        &self.0
    }

    /// Whether the header names `field` exactly (case-sensitive)
    pub fn contains(&self, field: &str) -> bool {
        self.0.iter().any(|f| f == field)
    }
}

/// One unit of migration work, decoded from one input record
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchRow {
    /// Original field values keyed by column name; the only data written to a ledger
    pub values: HashMap<String, Value>,

    /// Assignments discovered for this row; in-memory enrichment only, never persisted
    pub assignments: Vec<Assignment>,
}

impl BatchRow {
    /// Build a row from column/value pairs
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self {
            values: pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            assignments: Vec::new(),
        }
    }

    /// Source course-mapping identifier (empty when missing)
    pub fn guid(&self) -> &str {
        self.text(GUID_FIELD)
    }

    /// Target course-mapping identifier (empty when missing)
    pub fn ouid(&self) -> &str {
        self.text(OUID_FIELD)
    }

    /// Field value, if present
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    fn text(&self, field: &str) -> &str {
        self.values
            .get(field)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }
}

/// Opaque Sakai session identifier
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wrap a session id returned by the login call
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw session id
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

/// Identifier of a Brightspace dropbox folder (submission container)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerId(pub i64);

impl ContainerId {
    /// Get the inner i64 value
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl From<i64> for ContainerId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ContainerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A source assignment being moved to the target course
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Assignment {
    /// Sakai assignment id
    pub id: String,

    /// Assignment title
    pub title: String,

    /// HTML instructions, carried into the container's custom instructions
    pub instructions: Option<String>,

    /// Due date, when the source has one
    pub due: Option<DateTime<Utc>>,

    /// Attachments in discovery order
    pub attachments: Vec<Attachment>,

    /// Container created for this assignment in the target course
    pub container_id: Option<ContainerId>,
}

impl Assignment {
    /// Whether the upload and link steps have anything to do
    pub fn has_attachments(&self) -> bool {
        !self.attachments.is_empty()
    }
}

/// A file attached to an assignment
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Attachment {
    /// File name as shown in the source system
    pub name: String,

    /// URL the source system serves the bytes from
    pub locator: String,

    /// Where the bytes were staged locally
    pub save_path: Option<PathBuf>,

    /// Path of the uploaded file on target storage (absolute, starting with '/')
    pub remote_path: Option<String>,
}

/// Target course metadata
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseInfo {
    /// Short course code, used to name the storage folder
    #[serde(rename = "Code")]
    pub code: String,

    /// Display name
    #[serde(rename = "Name", default)]
    pub name: String,

    /// Course files path reported by the target, if any
    #[serde(rename = "Path", default)]
    pub path: Option<String>,
}

/// Lifecycle of one batch row
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowState {
    /// Not yet started
    Pending,
    /// Remote work in progress
    Processing,
    /// Written to the success ledger
    Succeeded,
    /// Written to the failure ledger
    Failed,
}

impl RowState {
    /// Whether the row has reached a ledger
    pub fn is_terminal(&self) -> bool {
        matches!(self, RowState::Succeeded | RowState::Failed)
    }
}

/// Aggregate result of a batch run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchSummary {
    /// Rows in the input batch
    pub total: usize,
    /// Rows written to the success ledger
    pub succeeded: usize,
    /// Rows written to the failure ledger
    pub failed: usize,
    /// Final state of each row, in input order
    pub states: Vec<RowState>,
    /// Wall time from decode to the last ledger write
    pub elapsed: Duration,
}

/// Progress events emitted by the batch runner
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A row moved to Processing
    RowStarted {
        /// Zero-based position in the batch
        index: usize,
        /// Source identifier
        guid: String,
    },
    /// A row reached the success ledger
    RowSucceeded {
        /// Zero-based position in the batch
        index: usize,
        /// Source identifier
        guid: String,
        /// Containers created for the row
        containers: usize,
    },
    /// A row reached the failure ledger
    RowFailed {
        /// Zero-based position in the batch
        index: usize,
        /// Source identifier
        guid: String,
        /// Rendered cause chain
        error: String,
    },
    /// All rows have been processed
    BatchComplete {
        /// Rows in the batch
        total: usize,
        /// Rows in the success ledger
        succeeded: usize,
        /// Rows in the failure ledger
        failed: usize,
    },
}
