//! Error types for lms-migrate
//!
//! This module provides the error taxonomy for the migration pipeline:
//! - Fatal preconditions (malformed batch header, failed source login) that abort a run
//! - Row failures that are caught at the row boundary and routed to the failure ledger
//! - Transport errors raised by the Sakai and Brightspace clients
//!
//! Callers discriminate with [`Error::kind`] rather than by inspecting messages, and the
//! full cause chain stays reachable through [`std::error::Error::source`].

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for lms-migrate operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for lms-migrate
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "source.base_url")
        key: Option<String>,
    },

    /// The batch input could not be decoded (missing required column, ragged record)
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// A run-wide precondition failed; no row was attempted
    #[error("fatal precondition failed: {0}")]
    FatalPrecondition(String),

    /// A single batch row failed; wraps the first underlying failure
    #[error("row {guid} failed: {source}")]
    RowFailure {
        /// Source course-mapping identifier of the failed row
        guid: String,
        /// The failure that aborted the row
        #[source]
        source: Box<Error>,
    },

    /// Remote system answered with an error
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error (the request URL is stripped)
    #[error("network error: {0}")]
    Network(reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Delimited-text read/write error
    #[error("delimited text error: {0}")]
    Csv(#[from] csv::Error),

    /// Invalid URL built from configuration or remote metadata
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// A pipeline step ran before the step it depends on
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Invalid path for staging or upload
    #[error("invalid path {path}: {reason}")]
    InvalidPath {
        /// The path that was rejected
        path: PathBuf,
        /// Why it was rejected
        reason: String,
    },
}

/// Errors reported by the remote systems themselves
#[derive(Debug, Error)]
pub enum TransportError {
    /// Non-success HTTP status
    #[error("{system} returned status {status} for {url}: {body}")]
    Status {
        /// Which backend answered ("sakai", "brightspace", "webdav")
        system: &'static str,
        /// Request URL (signing parameters stripped)
        url: String,
        /// HTTP status code
        status: u16,
        /// Response body, truncated
        body: String,
    },

    /// Credentials or session rejected
    #[error("{system} rejected credentials for {url}")]
    Unauthorized {
        /// Which backend answered
        system: &'static str,
        /// Request URL (signing parameters stripped)
        url: String,
    },

    /// Request failed before a response arrived (connect, timeout, TLS)
    #[error("{system} request to {url} failed: {source}")]
    Request {
        /// Which backend was called
        system: &'static str,
        /// Request URL (signing parameters stripped)
        url: String,
        /// Underlying client error, without its URL
        source: reqwest::Error,
    },

    /// Response body did not have the expected shape
    #[error("unexpected response from {system} for {url}: {reason}")]
    UnexpectedResponse {
        /// Which backend answered
        system: &'static str,
        /// Request URL (signing parameters stripped)
        url: String,
        /// What was missing or malformed
        reason: String,
    },
}

/// Longest response body kept in a [`TransportError::Status`]
const MAX_ERROR_BODY: usize = 512;

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Network(e.without_url())
    }
}

impl TransportError {
    /// Wrap a failed send, keeping only the redacted URL
    pub(crate) fn request(system: &'static str, error: reqwest::Error) -> Error {
        let url = error
            .url()
            .map(|u| crate::utils::redact_query(u.as_str()))
            .unwrap_or_default();
        TransportError::Request {
            system,
            url,
            source: error.without_url(),
        }
        .into()
    }

    /// Pass a successful response through, or turn an error status into a `TransportError`
    pub(crate) async fn check(
        system: &'static str,
        response: reqwest::Response,
    ) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let url = crate::utils::redact_query(response.url().as_str());
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(TransportError::Unauthorized { system, url }.into());
        }

        let mut body = response.text().await.unwrap_or_default();
        if body.len() > MAX_ERROR_BODY {
            let mut cut = MAX_ERROR_BODY;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }
        Err(TransportError::Status {
            system,
            url,
            status: status.as_u16(),
            body,
        }
        .into())
    }
}

/// Coarse classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid or missing configuration
    Config,
    /// Batch input could not be decoded
    MalformedInput,
    /// Run-wide precondition failed
    FatalPrecondition,
    /// A single row failed
    RowFailure,
    /// Remote call failed (HTTP status, connection, unexpected body)
    Transport,
    /// Local filesystem or encoding problem
    Local,
}

impl Error {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Config { .. } => ErrorKind::Config,
            Error::MalformedInput(_) | Error::Csv(_) => ErrorKind::MalformedInput,
            Error::FatalPrecondition(_) => ErrorKind::FatalPrecondition,
            Error::RowFailure { .. } => ErrorKind::RowFailure,
            Error::Transport(_) | Error::Network(_) => ErrorKind::Transport,
            Error::Io(_)
            | Error::Serialization(_)
            | Error::Url(_)
            | Error::InvalidState(_)
            | Error::InvalidPath { .. } => ErrorKind::Local,
        }
    }

    /// Whether this error aborts the whole run rather than a single row
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Config | ErrorKind::MalformedInput | ErrorKind::FatalPrecondition
        )
    }

    /// Machine-readable error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::MalformedInput(_) => "malformed_input",
            Error::FatalPrecondition(_) => "fatal_precondition",
            Error::RowFailure { .. } => "row_failure",
            Error::Transport(e) => match e {
                TransportError::Status { .. } => "remote_status",
                TransportError::Unauthorized { .. } => "remote_unauthorized",
                TransportError::Request { .. } => "remote_unreachable",
                TransportError::UnexpectedResponse { .. } => "remote_unexpected_response",
            },
            Error::Io(_) => "io_error",
            Error::Network(_) => "network_error",
            Error::Serialization(_) => "serialization_error",
            Error::Csv(_) => "delimited_text_error",
            Error::Url(_) => "invalid_url",
            Error::InvalidState(_) => "invalid_state",
            Error::InvalidPath { .. } => "invalid_path",
        }
    }

    /// Process exit code for an error that ended the run
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::Config => 2,
            _ => 1,
        }
    }

    /// Wrap `self` as the cause of a failed row
    pub fn into_row_failure(self, guid: impl Into<String>) -> Self {
        Error::RowFailure {
            guid: guid.into(),
            source: Box::new(self),
        }
    }

    /// Render the full cause chain on one line ("a: b: c")
    pub fn chain(&self) -> String {
        let mut rendered = self.to_string();
        let mut current = std::error::Error::source(self);
        while let Some(cause) = current {
            let text = cause.to_string();
            if !rendered.ends_with(&text) {
                rendered.push_str(" <- ");
                rendered.push_str(&text);
            }
            current = cause.source();
        }
        rendered
    }
}
