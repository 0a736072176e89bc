//! Brightspace Valence client

use super::context::TargetContext;
use super::traits::TargetClient;
use super::webdav::WebDavStorage;
use crate::config::{TargetConfig, WebDavConfig};
use crate::error::{Error, Result, TransportError};
use crate::types::{Assignment, ContainerId, CourseInfo};
use crate::utils::{redact_query, remote_path, sanitize_file_name};
use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const SYSTEM: &str = "brightspace";

/// Brightspace client: Valence API for containers and course metadata, WebDAV for files
///
/// # Examples
///
/// ```no_run
/// use lms_migrate::config::Config;
/// use lms_migrate::target::{BrightspaceClient, TargetClient};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Config::from_file(std::path::Path::new("config.json"))?;
/// let brightspace = BrightspaceClient::new(&config.target, &config.webdav)?;
/// println!("acting as {}", brightspace.whoami().await?);
/// # Ok(())
/// # }
/// ```
pub struct BrightspaceClient {
    http: reqwest::Client,
    context: TargetContext,
    link_context: TargetContext,
    le_version: String,
    lp_version: String,
    storage: WebDavStorage,
}

impl BrightspaceClient {
    /// Create a client from the target and WebDAV settings
    ///
    /// Attachment links are signed with the WebDAV service account's key pair when one is
    /// configured, otherwise with the main user pair.
    ///
    /// # Errors
    /// Returns an error if the host is invalid or the HTTP client cannot be created
    pub fn new(target: &TargetConfig, webdav: &WebDavConfig) -> Result<Self> {
        let context = TargetContext::new(
            &target.host,
            target.app_id.clone(),
            target.app_key.clone(),
            target.user_id.clone(),
            target.user_key.clone(),
        )?;
        let link_context = match (&webdav.service_user_id, &webdav.service_user_key) {
            (Some(id), Some(key)) => context.with_user(id.clone(), key.clone()),
            _ => context.clone(),
        };

        let http = reqwest::Client::builder()
            .timeout(target.timeout)
            .user_agent(concat!("lms-migrate/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            storage: WebDavStorage::new(http.clone(), webdav),
            http,
            context,
            link_context,
            le_version: target.le_version.clone(),
            lp_version: target.lp_version.clone(),
        })
    }

    fn le_route(&self, ouid: &str, rest: &[&str]) -> Vec<String> {
        let mut segments = vec![
            "d2l".to_string(),
            "api".to_string(),
            "le".to_string(),
            self.le_version.clone(),
            ouid.to_string(),
        ];
        segments.extend(rest.iter().map(|s| s.to_string()));
        segments
    }

    fn lp_route(&self, rest: &[&str]) -> Vec<String> {
        let mut segments = vec![
            "d2l".to_string(),
            "api".to_string(),
            "lp".to_string(),
            self.lp_version.clone(),
        ];
        segments.extend(rest.iter().map(|s| s.to_string()));
        segments
    }

    async fn send_json<B, T>(
        &self,
        context: &TargetContext,
        method: Method,
        segments: &[String],
        body: Option<&B>,
    ) -> Result<T>
    where
        B: Serialize + Sync + ?Sized,
        T: serde::de::DeserializeOwned,
    {
        let url = context.signed_url(&method, segments)?;
        let shown = redact_query(url.as_str());

        let mut request = self.http.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request
            .send()
            .await
            .map_err(|e| TransportError::request(SYSTEM, e))?;
        let response = TransportError::check(SYSTEM, response).await?;

        let bytes = response.bytes().await?;
        let bytes: &[u8] = if bytes.is_empty() { b"null" } else { &bytes };
        serde_json::from_slice(bytes).map_err(|e| {
            TransportError::UnexpectedResponse {
                system: SYSTEM,
                url: shown,
                reason: e.to_string(),
            }
            .into()
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct RichText<'a> {
    content: &'a str,
    #[serde(rename = "Type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct DropboxFolderUpdate<'a> {
    category_id: Option<i64>,
    name: &'a str,
    custom_instructions: RichText<'a>,
    availability: Option<serde_json::Value>,
    group_type_id: Option<i64>,
    due_date: Option<String>,
    display_in_calendar: bool,
    notification_email: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DropboxFolder {
    id: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct FileLink<'a> {
    file_name: &'a str,
    path: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WhoAmI {
    identifier: String,
    #[serde(default)]
    unique_name: Option<String>,
}

fn container_name(assignment: &Assignment) -> String {
    let title = assignment.title.trim();
    if title.is_empty() {
        format!("Assignment {}", assignment.id)
    } else {
        title.to_string()
    }
}

#[async_trait]
impl TargetClient for BrightspaceClient {
    async fn create_container(&self, assignment: &Assignment, ouid: &str) -> Result<ContainerId> {
        let name = container_name(assignment);
        let body = DropboxFolderUpdate {
            category_id: None,
            name: &name,
            custom_instructions: RichText {
                content: assignment.instructions.as_deref().unwrap_or_default(),
                kind: "Html",
            },
            availability: None,
            group_type_id: None,
            due_date: assignment
                .due
                .map(|d| d.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)),
            display_in_calendar: assignment.due.is_some(),
            notification_email: None,
        };

        let route = self.le_route(ouid, &["dropbox", "folders", ""]);
        let folder: DropboxFolder = self
            .send_json(&self.context, Method::POST, &route, Some(&body))
            .await?;

        info!(ouid, assignment_id = %assignment.id, container_id = folder.id, "created dropbox folder");
        Ok(ContainerId(folder.id))
    }

    async fn fetch_course_info(&self, ouid: &str) -> Result<CourseInfo> {
        let route = self.lp_route(&["courses", ouid]);
        let course: CourseInfo = self
            .send_json::<(), _>(&self.context, Method::GET, &route, None)
            .await?;
        debug!(ouid, code = %course.code, "fetched course info");
        Ok(course)
    }

    async fn upload_to_storage(&self, assignment: &mut Assignment, folder: &[String]) -> Result<()> {
        self.storage.ensure_folder(folder).await?;

        for attachment in &mut assignment.attachments {
            let local = attachment.save_path.clone().ok_or_else(|| {
                Error::InvalidState(format!(
                    "attachment '{}' of assignment {} was not staged",
                    attachment.name, assignment.id
                ))
            })?;

            let mut segments = folder.to_vec();
            segments.push(sanitize_file_name(&attachment.name)?);
            self.storage.put_file(&segments, &local).await?;
            attachment.remote_path = Some(remote_path(&segments));
        }

        info!(
            assignment_id = %assignment.id,
            files = assignment.attachments.len(),
            folder = %remote_path(folder),
            "uploaded attachments"
        );
        Ok(())
    }

    async fn link_attachments(&self, assignment: &Assignment, ouid: &str) -> Result<()> {
        let container = assignment.container_id.ok_or_else(|| {
            Error::InvalidState(format!(
                "assignment {} has no container to link into",
                assignment.id
            ))
        })?;
        let container = container.to_string();
        let route = self.le_route(ouid, &["dropbox", "folders", &container, "attachments", ""]);

        for attachment in &assignment.attachments {
            let path = attachment.remote_path.as_deref().ok_or_else(|| {
                Error::InvalidState(format!(
                    "attachment '{}' of assignment {} was not uploaded",
                    attachment.name, assignment.id
                ))
            })?;
            let link = FileLink {
                file_name: &attachment.name,
                path,
            };
            let _: serde_json::Value = self
                .send_json(&self.link_context, Method::POST, &route, Some(&link))
                .await?;
        }

        info!(
            ouid,
            assignment_id = %assignment.id,
            container_id = %container,
            files = assignment.attachments.len(),
            "linked attachments"
        );
        Ok(())
    }

    async fn whoami(&self) -> Result<String> {
        let route = self.lp_route(&["users", "whoami"]);
        let me: WhoAmI = self
            .send_json::<(), _>(&self.context, Method::GET, &route, None)
            .await?;
        Ok(match me.unique_name {
            Some(name) => format!("{} ({})", name, me.identifier),
            None => me.identifier,
        })
    }

    fn storage_root(&self) -> &str {
        self.storage.root()
    }

    fn name(&self) -> &'static str {
        SYSTEM
    }
}
