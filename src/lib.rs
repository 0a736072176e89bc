//! # lms-migrate
//!
//! Batch migration of assignments and their attachments from Sakai to Brightspace.
//!
//! ## Design Philosophy
//!
//! lms-migrate is designed to be:
//! - **Row-isolated** - A failing course never stops the rest of the batch
//! - **Re-runnable** - Every input row lands in exactly one of two ledgers, and the failure
//!   ledger is a valid input for the next run
//! - **Explicitly configured** - A [`Config`] value is passed in; nothing is read from globals
//! - **Event-driven** - Consumers subscribe to progress events, no polling required
//!
//! ## Quick Start
//!
//! ```no_run
//! use lms_migrate::{BatchRunner, BrightspaceClient, Config, SakaiClient};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_file(std::path::Path::new("migrate.json"))?;
//!     config.validate()?;
//!
//!     let source = Arc::new(SakaiClient::new(&config.source)?);
//!     let target = Arc::new(BrightspaceClient::new(&config.target, &config.webdav)?);
//!     let runner = BatchRunner::new(config, source, target)?;
//!
//!     // Subscribe to events
//!     let mut events = runner.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let summary = runner.run_file(std::path::Path::new("courses.csv")).await?;
//!     println!("{} succeeded, {} failed", summary.succeeded, summary.failed);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Delimited-text row encoding
pub mod codec;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Append-only success/failure ledgers
pub mod ledger;
/// Migration pipeline (assignment transfer, row processing, batch runner)
pub mod migration;
/// Source system client
pub mod source;
/// Target system client
pub mod target;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use codec::RowCodec;
pub use config::{Config, LedgerConfig, SourceConfig, TargetConfig, WebDavConfig};
pub use error::{Error, ErrorKind, Result, TransportError};
pub use ledger::{LedgerKind, Ledgers, OutputLedger};
pub use migration::{AttachmentTransfer, BatchRunner, RowProcessor};
pub use source::{SakaiClient, SourceClient};
pub use target::{BrightspaceClient, TargetClient, TargetContext};
pub use types::{
    Assignment, Attachment, BatchRow, BatchSummary, ContainerId, CourseInfo, Event, FieldOrder,
    RowState, SessionToken,
};
