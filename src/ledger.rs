//! Append-only output ledgers
//!
//! Each processed row lands as one complete line in exactly one of two files. The file is
//! opened in append mode for every write and never read back during a run.

use crate::codec::RowCodec;
use crate::error::Result;
use crate::types::{BatchRow, FieldOrder};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// One append-only ledger file
#[derive(Clone, Debug)]
pub struct OutputLedger {
    path: PathBuf,
}

impl OutputLedger {
    /// Create a ledger backed by `path`; nothing is touched until the first append
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the ledger file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one already-encoded line
    ///
    /// The line is written with a single `write_all` and flushed before returning.
    pub async fn append_line(&self, line: &str) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

/// Which ledger a row belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LedgerKind {
    /// Row migrated cleanly
    Success,
    /// Row failed and should be re-run
    Failure,
}

/// The success/failure pair written by a batch run
#[derive(Clone, Debug)]
pub struct Ledgers {
    /// Rows that migrated cleanly
    pub success: OutputLedger,
    /// Rows that failed
    pub failure: OutputLedger,
    codec: RowCodec,
}

impl Ledgers {
    /// Pair two ledgers that share one codec
    pub fn new(success: OutputLedger, failure: OutputLedger, codec: RowCodec) -> Self {
        Self {
            success,
            failure,
            codec,
        }
    }

    /// Encode the original fields of `row` and append them to the chosen ledger
    ///
    /// Encoding happens before the file is opened, so a row that cannot be encoded
    /// leaves no partial line behind.
    pub async fn record(&self, kind: LedgerKind, row: &BatchRow, order: &FieldOrder) -> Result<()> {
        let line = self.codec.encode(row, order)?;
        match kind {
            LedgerKind::Success => self.success.append_line(&line).await,
            LedgerKind::Failure => self.failure.append_line(&line).await,
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn order() -> FieldOrder {
        FieldOrder::new(vec!["guid".into(), "ouid".into()])
    }

    fn ledgers(dir: &TempDir) -> Ledgers {
        Ledgers::new(
            OutputLedger::new(dir.path().join("out").join("success.csv")),
            OutputLedger::new(dir.path().join("out").join("failure.csv")),
            RowCodec::default(),
        )
    }

    #[tokio::test]
    async fn test_append_creates_parent_and_appends() {
        let dir = TempDir::new().unwrap();
        let ledger = OutputLedger::new(dir.path().join("nested").join("ledger.csv"));

        ledger.append_line("G1,O1\n").await.unwrap();
        ledger.append_line("G2,O2\n").await.unwrap();

        let content = std::fs::read_to_string(ledger.path()).unwrap();
        assert_eq!(content, "G1,O1\nG2,O2\n");
    }

    #[tokio::test]
    async fn test_append_keeps_existing_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.csv");
        std::fs::write(&path, "G0,O0\n").unwrap();

        OutputLedger::new(&path).append_line("G1,O1\n").await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "G0,O0\nG1,O1\n");
    }

    #[tokio::test]
    async fn test_record_routes_by_kind() {
        let dir = TempDir::new().unwrap();
        let ledgers = ledgers(&dir);
        let ok = BatchRow::from_pairs([("guid", json!("G1")), ("ouid", json!("O1"))]);
        let bad = BatchRow::from_pairs([("guid", json!("G2")), ("ouid", json!("O2"))]);

        ledgers
            .record(LedgerKind::Success, &ok, &order())
            .await
            .unwrap();
        ledgers
            .record(LedgerKind::Failure, &bad, &order())
            .await
            .unwrap();

        assert_eq!(
            std::fs::read_to_string(ledgers.success.path()).unwrap(),
            "G1,O1\n"
        );
        assert_eq!(
            std::fs::read_to_string(ledgers.failure.path()).unwrap(),
            "G2,O2\n"
        );
    }

    #[tokio::test]
    async fn test_untouched_ledger_is_not_created() {
        let dir = TempDir::new().unwrap();
        let ledgers = ledgers(&dir);
        let row = BatchRow::from_pairs([("guid", json!("G1")), ("ouid", json!("O1"))]);

        ledgers
            .record(LedgerKind::Success, &row, &order())
            .await
            .unwrap();

        assert!(!ledgers.failure.path().exists());
    }
}
