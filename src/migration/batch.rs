//! Batch orchestration: decode, authenticate, process rows, write ledgers

use super::row::RowProcessor;
use crate::codec::RowCodec;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::ledger::{LedgerKind, Ledgers, OutputLedger};
use crate::source::SourceClient;
use crate::target::TargetClient;
use crate::types::{BatchSummary, Event, RowState};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Drives a whole batch through the migration pipeline
///
/// Rows are processed strictly one after another. Every decoded row ends up in exactly
/// one of the two ledgers; a failing row never stops the rows after it.
///
/// # Examples
///
/// ```no_run
/// use lms_migrate::config::Config;
/// use lms_migrate::migration::BatchRunner;
/// use lms_migrate::source::SakaiClient;
/// use lms_migrate::target::BrightspaceClient;
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Config::from_file(std::path::Path::new("config.json"))?;
/// let source = Arc::new(SakaiClient::new(&config.source)?);
/// let target = Arc::new(BrightspaceClient::new(&config.target, &config.webdav)?);
///
/// let runner = BatchRunner::new(config, source, target)?;
/// let summary = runner.run_file(std::path::Path::new("courses.csv")).await?;
/// println!("{} ok, {} failed", summary.succeeded, summary.failed);
/// # Ok(())
/// # }
/// ```
pub struct BatchRunner {
    config: Arc<Config>,
    source: Arc<dyn SourceClient>,
    target: Arc<dyn TargetClient>,
    codec: RowCodec,
    ledgers: Ledgers,
    event_tx: tokio::sync::broadcast::Sender<Event>,
}

impl BatchRunner {
    /// Create a runner from an explicit configuration and the two clients
    ///
    /// # Errors
    /// Returns [`Error::Config`] if the configured delimiter cannot be used
    pub fn new(
        config: Config,
        source: Arc<dyn SourceClient>,
        target: Arc<dyn TargetClient>,
    ) -> Result<Self> {
        let codec = RowCodec::new(config.delimiter_byte()?);
        let ledgers = Ledgers::new(
            OutputLedger::new(&config.ledger.success_path),
            OutputLedger::new(&config.ledger.failure_path),
            codec,
        );
        let (event_tx, _rx) = tokio::sync::broadcast::channel(1000);

        Ok(Self {
            config: Arc::new(config),
            source,
            target,
            codec,
            ledgers,
            event_tx,
        })
    }

    /// Subscribe to progress events
    ///
    /// Events sent before a receiver subscribes are not replayed.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Read the batch at `path` and run it
    pub async fn run_file(&self, path: &Path) -> Result<BatchSummary> {
        let raw = tokio::fs::read_to_string(path).await?;
        info!(path = %path.display(), "loaded batch input");
        self.run(&raw).await
    }

    /// Run a batch given as delimited text with a header line
    ///
    /// # Errors
    /// - [`Error::MalformedInput`] if the batch cannot be decoded
    /// - [`Error::FatalPrecondition`] if the target check or source login fails
    /// - any error from appending to a ledger
    ///
    /// In the first two cases no row is processed and no ledger is written. Row failures
    /// are not errors of the run: they are counted in the summary.
    pub async fn run(&self, raw: &str) -> Result<BatchSummary> {
        let started = Instant::now();

        let (order, mut rows) = self.codec.decode(raw)?;
        info!(rows = rows.len(), "decoded batch");

        if self.config.target.verify_on_start {
            match self.target.whoami().await {
                Ok(identity) => info!(system = self.target.name(), identity = %identity, "target credentials verified"),
                Err(e) => {
                    error!(system = self.target.name(), error = %e, "target credential check failed");
                    return Err(Error::FatalPrecondition(format!(
                        "{} credential check failed: {}",
                        self.target.name(),
                        e.chain()
                    )));
                }
            }
        }

        let source = &self.config.source;
        let token = match self.source.authenticate(&source.user_id, &source.password).await {
            Ok(Some(token)) => token,
            Ok(None) => {
                error!(system = self.source.name(), user = %source.user_id, "source login refused");
                return Err(Error::FatalPrecondition(format!(
                    "{} refused the login for '{}'",
                    self.source.name(),
                    source.user_id
                )));
            }
            Err(e) => {
                error!(system = self.source.name(), error = %e, "source login failed");
                return Err(Error::FatalPrecondition(format!(
                    "{} login failed: {}",
                    self.source.name(),
                    e.chain()
                )));
            }
        };
        info!(system = self.source.name(), "authenticated with source");

        let processor = RowProcessor::new(
            self.source.as_ref(),
            self.target.as_ref(),
            &self.config.working_root,
        );

        let total = rows.len();
        let mut succeeded = 0;
        let mut failed = 0;
        let mut states = vec![RowState::Pending; total];

        for (index, row) in rows.iter_mut().enumerate() {
            let guid = row.guid().to_string();
            states[index] = RowState::Processing;
            debug!(index, guid = %guid, state = ?states[index], "row started");
            self.emit(Event::RowStarted {
                index,
                guid: guid.clone(),
            });

            states[index] = match processor.process(row, &token).await {
                Ok(()) => {
                    self.ledgers.record(LedgerKind::Success, row, &order).await?;
                    succeeded += 1;
                    info!(index, guid = %guid, ouid = %row.ouid(), assignments = row.assignments.len(), "row succeeded");
                    self.emit(Event::RowSucceeded {
                        index,
                        guid,
                        containers: row
                            .assignments
                            .iter()
                            .filter(|a| a.container_id.is_some())
                            .count(),
                    });
                    RowState::Succeeded
                }
                Err(e) => {
                    self.ledgers.record(LedgerKind::Failure, row, &order).await?;
                    failed += 1;
                    let chain = e.chain();
                    error!(index, guid = %guid, ouid = %row.ouid(), error = %chain, "row failed");
                    self.emit(Event::RowFailed {
                        index,
                        guid,
                        error: chain,
                    });
                    RowState::Failed
                }
            };
            debug!(index, state = ?states[index], "row recorded");
        }

        let summary = BatchSummary {
            total,
            succeeded,
            failed,
            states,
            elapsed: started.elapsed(),
        };
        info!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            success_ledger = %self.ledgers.success.path().display(),
            failure_ledger = %self.ledgers.failure.path().display(),
            "batch complete"
        );
        self.emit(Event::BatchComplete {
            total,
            succeeded,
            failed,
        });

        Ok(summary)
    }

    fn emit(&self, event: Event) {
        // No subscribers is fine
        self.event_tx.send(event).ok();
    }
}
