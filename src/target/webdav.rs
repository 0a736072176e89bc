//! WebDAV course storage

use crate::config::WebDavConfig;
use crate::error::{Error, Result, TransportError};
use crate::utils::{redact_query, remote_url};
use reqwest::{Body, Method, StatusCode};
use std::path::Path;
use tokio_util::io::ReaderStream;
use tracing::debug;

const SYSTEM: &str = "webdav";

/// Uploads files into course storage with the service account
pub(crate) struct WebDavStorage {
    http: reqwest::Client,
    host: String,
    root: String,
    username: String,
    password: String,
}

impl WebDavStorage {
    pub(crate) fn new(http: reqwest::Client, config: &WebDavConfig) -> Self {
        Self {
            http,
            host: config.host.clone(),
            root: config.root.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
        }
    }

    pub(crate) fn root(&self) -> &str {
        &self.root
    }

    /// Create each folder along `segments`; folders that already exist are fine
    pub(crate) async fn ensure_folder(&self, segments: &[String]) -> Result<()> {
        let mkcol = Method::from_bytes(b"MKCOL").map_err(|e| {
            Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidInput, e))
        })?;

        for depth in 1..=segments.len() {
            let mut url = remote_url(&self.host, &segments[..depth])?;
            url.path_segments_mut()
                .map_err(|_| Error::Config {
                    message: format!("'{}' cannot be used as a base URL", self.host),
                    key: Some("webdav.host".to_string()),
                })?
                .push("");

            let response = self
                .http
                .request(mkcol.clone(), url)
                .basic_auth(&self.username, Some(&self.password))
                .send()
                .await
                .map_err(|e| TransportError::request(SYSTEM, e))?;

            // 405 Method Not Allowed is the WebDAV answer for an existing collection
            if response.status() == StatusCode::METHOD_NOT_ALLOWED {
                continue;
            }
            TransportError::check(SYSTEM, response).await?;
        }
        Ok(())
    }

    /// PUT the file at `local` to `segments` (the last segment is the file name)
    pub(crate) async fn put_file(&self, segments: &[String], local: &Path) -> Result<()> {
        let url = remote_url(&self.host, segments)?;
        let shown = redact_query(url.as_str());

        let file = tokio::fs::File::open(local).await?;
        let length = file.metadata().await?.len();
        let body = Body::wrap_stream(ReaderStream::new(file));

        let response = self
            .http
            .put(url)
            .basic_auth(&self.username, Some(&self.password))
            .header(reqwest::header::CONTENT_LENGTH, length)
            .body(body)
            .send()
            .await
            .map_err(|e| TransportError::request(SYSTEM, e))?;
        TransportError::check(SYSTEM, response).await?;

        debug!(url = %shown, bytes = length, "uploaded file to storage");
        Ok(())
    }
}
