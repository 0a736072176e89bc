//! In-memory source and target clients for pipeline tests.

use crate::config::Config;
use crate::error::{Error, Result, TransportError};
use crate::source::SourceClient;
use crate::target::TargetClient;
use crate::types::{Assignment, Attachment, ContainerId, CourseInfo, SessionToken};
use crate::utils::remote_path;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};
use tempfile::TempDir;

pub(crate) const TOKEN: &str = "session-1";

/// How the fake source answers the login call
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Login {
    Accept,
    Refuse,
    Unreachable,
}

pub(crate) fn remote_error(system: &'static str, status: u16) -> Error {
    Error::Transport(TransportError::Status {
        system,
        url: format!("https://{system}.test/"),
        status,
        body: "injected".to_string(),
    })
}

pub(crate) fn assignment(id: &str) -> Assignment {
    Assignment {
        id: id.to_string(),
        title: format!("Assignment {id}"),
        ..Default::default()
    }
}

pub(crate) fn attachment(name: &str) -> Attachment {
    Attachment {
        name: name.to_string(),
        locator: format!("https://sakai.test/access/{name}"),
        ..Default::default()
    }
}

/// Source double keyed by course guid and assignment id
pub(crate) struct FakeSource {
    pub(crate) login: Login,
    pub(crate) courses: HashMap<String, Vec<Assignment>>,
    pub(crate) attachments: HashMap<String, Vec<Attachment>>,
    pub(crate) failing_courses: HashSet<String>,
    pub(crate) failing_downloads: HashSet<String>,
    pub(crate) calls: Mutex<Vec<String>>,
}

impl FakeSource {
    pub(crate) fn new() -> Self {
        Self {
            login: Login::Accept,
            courses: HashMap::new(),
            attachments: HashMap::new(),
            failing_courses: HashSet::new(),
            failing_downloads: HashSet::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_course(mut self, guid: &str, assignments: Vec<Assignment>) -> Self {
        self.courses.insert(guid.to_string(), assignments);
        self
    }

    pub(crate) fn with_attachments(mut self, assignment_id: &str, files: Vec<Attachment>) -> Self {
        self.attachments.insert(assignment_id.to_string(), files);
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn check_token(token: &SessionToken) -> Result<()> {
        if token.as_str() == TOKEN {
            Ok(())
        } else {
            Err(Error::Transport(TransportError::Unauthorized {
                system: "fake-source",
                url: "token".to_string(),
            }))
        }
    }
}

#[async_trait]
impl SourceClient for FakeSource {
    async fn authenticate(&self, user: &str, _password: &str) -> Result<Option<SessionToken>> {
        self.record(format!("login:{user}"));
        match self.login {
            Login::Accept => Ok(Some(SessionToken::new(TOKEN))),
            Login::Refuse => Ok(None),
            Login::Unreachable => Err(remote_error("fake-source", 503)),
        }
    }

    async fn list_assignments(&self, guid: &str, token: &SessionToken) -> Result<Vec<Assignment>> {
        Self::check_token(token)?;
        self.record(format!("list:{guid}"));
        if self.failing_courses.contains(guid) {
            return Err(remote_error("fake-source", 500));
        }
        Ok(self.courses.get(guid).cloned().unwrap_or_default())
    }

    async fn fetch_attachment_metadata(
        &self,
        assignment: &Assignment,
        token: &SessionToken,
    ) -> Result<Vec<Attachment>> {
        Self::check_token(token)?;
        self.record(format!("metadata:{}", assignment.id));
        Ok(self
            .attachments
            .get(&assignment.id)
            .cloned()
            .unwrap_or_default())
    }

    async fn download_attachment(
        &self,
        locator: &str,
        dest: &Path,
        token: &SessionToken,
    ) -> Result<()> {
        Self::check_token(token)?;
        self.record(format!("download:{locator}"));
        if self.failing_downloads.contains(locator) {
            return Err(remote_error("fake-source", 404));
        }
        tokio::fs::write(dest, locator.as_bytes()).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "fake-source"
    }
}

/// Target double that numbers containers from 100 and records every call
pub(crate) struct FakeTarget {
    pub(crate) next_container: AtomicI64,
    pub(crate) failing_creates: HashSet<String>,
    pub(crate) failing_links: HashSet<String>,
    pub(crate) failing_whoami: bool,
    pub(crate) calls: Mutex<Vec<String>>,
}

impl FakeTarget {
    pub(crate) fn new() -> Self {
        Self {
            next_container: AtomicI64::new(100),
            failing_creates: HashSet::new(),
            failing_links: HashSet::new(),
            failing_whoami: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing_link(mut self, assignment_id: &str) -> Self {
        self.failing_links.insert(assignment_id.to_string());
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl TargetClient for FakeTarget {
    async fn create_container(&self, assignment: &Assignment, ouid: &str) -> Result<ContainerId> {
        self.record(format!("create:{ouid}:{}", assignment.id));
        if self.failing_creates.contains(&assignment.id) {
            return Err(remote_error("fake-target", 500));
        }
        Ok(ContainerId(self.next_container.fetch_add(1, Ordering::SeqCst)))
    }

    async fn fetch_course_info(&self, ouid: &str) -> Result<CourseInfo> {
        self.record(format!("course:{ouid}"));
        Ok(CourseInfo {
            code: "CODE".to_string(),
            name: format!("Course {ouid}"),
            path: None,
        })
    }

    async fn upload_to_storage(&self, assignment: &mut Assignment, folder: &[String]) -> Result<()> {
        self.record(format!("upload:{}:{}", assignment.id, remote_path(folder)));
        for attachment in &mut assignment.attachments {
            let staged = attachment
                .save_path
                .as_ref()
                .ok_or_else(|| Error::InvalidState("not staged".to_string()))?;
            assert!(staged.exists(), "upload of missing file {}", staged.display());

            let mut segments = folder.to_vec();
            segments.push(attachment.name.clone());
            attachment.remote_path = Some(remote_path(&segments));
        }
        Ok(())
    }

    async fn link_attachments(&self, assignment: &Assignment, ouid: &str) -> Result<()> {
        self.record(format!("link:{ouid}:{}", assignment.id));
        if self.failing_links.contains(&assignment.id) {
            return Err(remote_error("fake-target", 500));
        }
        Ok(())
    }

    async fn whoami(&self) -> Result<String> {
        self.record("whoami".to_string());
        if self.failing_whoami {
            return Err(Error::Transport(TransportError::Unauthorized {
                system: "fake-target",
                url: "whoami".to_string(),
            }));
        }
        Ok("migration.bot".to_string())
    }

    fn storage_root(&self) -> &str {
        "content/enforced"
    }

    fn name(&self) -> &'static str {
        "fake-target"
    }
}

/// Config whose staging area and ledgers live inside a fresh temp dir.
/// Returns the config and the tempdir (which must be kept alive).
pub(crate) fn test_config() -> (Config, TempDir) {
    let temp_dir = tempfile::tempdir().unwrap();

    let mut config = Config::default();
    config.working_root = temp_dir.path().join("staging");
    config.ledger.success_path = temp_dir.path().join("success.csv");
    config.ledger.failure_path = temp_dir.path().join("failure.csv");
    config.source.user_id = "admin".to_string();
    config.source.password = "secret".to_string();

    (config, temp_dir)
}

/// Ledger content, or `None` if the run never created the file
pub(crate) fn read_ledger(path: &Path) -> Option<String> {
    std::fs::read_to_string(path).ok()
}
