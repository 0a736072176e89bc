//! Sakai `/direct` REST client

use super::traits::SourceClient;
use crate::config::SourceConfig;
use crate::error::{Error, Result, TransportError};
use crate::types::{Assignment, Attachment, SessionToken};
use crate::utils::{file_name_from_locator, redact_query};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use reqwest::header::COOKIE;
use serde::Deserialize;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use url::Url;

const SYSTEM: &str = "sakai";

/// Sakai client authenticating through `/direct/session`
///
/// # Examples
///
/// ```no_run
/// use lms_migrate::config::SourceConfig;
/// use lms_migrate::source::{SakaiClient, SourceClient};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = SourceConfig {
///     base_url: "https://sakai.example.edu".to_string(),
///     ..Default::default()
/// };
/// let sakai = SakaiClient::new(&config)?;
/// if let Some(token) = sakai.authenticate("admin", "secret").await? {
///     let assignments = sakai.list_assignments("site-id", &token).await?;
///     println!("{} assignments", assignments.len());
/// }
/// # Ok(())
/// # }
/// ```
pub struct SakaiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl SakaiClient {
    /// Create a client for the instance in `config`
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid or the HTTP client cannot be created
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| Error::Config {
            message: format!("invalid source.base_url '{}': {}", config.base_url, e),
            key: Some("source.base_url".to_string()),
        })?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("lms-migrate/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| Error::Config {
                message: format!("'{}' cannot be used as a base URL", self.base_url),
                key: Some("source.base_url".to_string()),
            })?;
            path.pop_if_empty();
            path.extend(segments);
        }
        Ok(url)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: Url,
        token: &SessionToken,
    ) -> Result<T> {
        let shown = redact_query(url.as_str());
        let response = self
            .http
            .get(url)
            .header(COOKIE, session_cookie(token))
            .send()
            .await
            .map_err(|e| TransportError::request(SYSTEM, e))?;
        let response = TransportError::check(SYSTEM, response).await?;
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| {
            TransportError::UnexpectedResponse {
                system: SYSTEM,
                url: shown,
                reason: e.to_string(),
            }
            .into()
        })
    }
}

fn session_cookie(token: &SessionToken) -> String {
    format!("JSESSIONID={}", token.as_str())
}

#[derive(Debug, Deserialize)]
struct AssignmentCollection {
    #[serde(default)]
    assignment_collection: Vec<SakaiAssignment>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SakaiAssignment {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    instructions: Option<String>,
    #[serde(default)]
    due_time: Option<SakaiTime>,
    #[serde(default)]
    attachments: Vec<SakaiAttachment>,
}

/// Sakai reports instants either as `epochSecond` or as millisecond `time`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SakaiTime {
    #[serde(default)]
    epoch_second: Option<i64>,
    #[serde(default)]
    time: Option<i64>,
}

impl SakaiTime {
    fn to_utc(&self) -> Option<DateTime<Utc>> {
        match (self.epoch_second, self.time) {
            (Some(secs), _) => DateTime::from_timestamp(secs, 0),
            (None, Some(millis)) => DateTime::from_timestamp_millis(millis),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SakaiAttachment {
    #[serde(default)]
    name: Option<String>,
    url: String,
}

impl From<SakaiAssignment> for Assignment {
    fn from(raw: SakaiAssignment) -> Self {
        Assignment {
            id: raw.id,
            title: raw.title,
            instructions: raw.instructions.filter(|s| !s.trim().is_empty()),
            due: raw.due_time.as_ref().and_then(SakaiTime::to_utc),
            attachments: Vec::new(),
            container_id: None,
        }
    }
}

impl From<SakaiAttachment> for Attachment {
    fn from(raw: SakaiAttachment) -> Self {
        let name = raw
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| file_name_from_locator(&raw.url));
        Attachment {
            name,
            locator: raw.url,
            save_path: None,
            remote_path: None,
        }
    }
}

#[async_trait]
impl SourceClient for SakaiClient {
    async fn authenticate(&self, user: &str, password: &str) -> Result<Option<SessionToken>> {
        let url = self.endpoint(&["direct", "session"])?;
        let response = self
            .http
            .post(url)
            .form(&[("_username", user), ("_password", password)])
            .send()
            .await
            .map_err(|e| TransportError::request(SYSTEM, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), user, "sakai login refused");
            return Ok(None);
        }

        let session = response.text().await?.trim().to_string();
        if session.is_empty() {
            warn!(user, "sakai login returned an empty session id");
            return Ok(None);
        }

        info!(user, "logged in to sakai");
        Ok(Some(SessionToken::new(session)))
    }

    async fn list_assignments(&self, guid: &str, token: &SessionToken) -> Result<Vec<Assignment>> {
        let resource = format!("{guid}.json");
        let url = self.endpoint(&["direct", "assignment", "site", &resource])?;
        let collection: AssignmentCollection = self.get_json(url, token).await?;

        let assignments: Vec<Assignment> = collection
            .assignment_collection
            .into_iter()
            .map(Assignment::from)
            .collect();
        info!(guid, count = assignments.len(), "retrieved sakai assignments");
        Ok(assignments)
    }

    async fn fetch_attachment_metadata(
        &self,
        assignment: &Assignment,
        token: &SessionToken,
    ) -> Result<Vec<Attachment>> {
        let resource = format!("{}.json", assignment.id);
        let url = self.endpoint(&["direct", "assignment", "item", &resource])?;
        let item: SakaiAssignment = self.get_json(url, token).await?;

        let attachments: Vec<Attachment> =
            item.attachments.into_iter().map(Attachment::from).collect();
        debug!(
            assignment_id = %assignment.id,
            count = attachments.len(),
            "retrieved attachment metadata"
        );
        Ok(attachments)
    }

    async fn download_attachment(
        &self,
        locator: &str,
        dest: &Path,
        token: &SessionToken,
    ) -> Result<()> {
        let response = self
            .http
            .get(locator)
            .header(COOKIE, session_cookie(token))
            .send()
            .await
            .map_err(|e| TransportError::request(SYSTEM, e))?;
        let response = TransportError::check(SYSTEM, response).await?;

        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        debug!(locator = %redact_query(locator), dest = ?dest, bytes = written, "downloaded attachment");
        Ok(())
    }

    fn name(&self) -> &'static str {
        SYSTEM
    }
}
