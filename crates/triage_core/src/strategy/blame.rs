//! Version-control authorship attribution.
//!
//! The [`BlameProvider`] trait is the seam between the strategy and the VCS.
//! [`GitBlameProvider`] shells out to `git blame --porcelain`; tests and
//! alternative backends plug in their own provider.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::process::Command;
use tracing::{debug, warn};
use triage_db::Owner;

use super::{OwnershipStrategy, ResolutionSkip, StrategyKind};
use crate::Result;
use crate::directory::OwnerDirectory;
use crate::frame::Frame;

/// Author of a line according to the VCS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlameAuthor {
    pub name: String,
    pub email: String,
}

/// Source of per-line authorship.
#[async_trait]
pub trait BlameProvider: Send + Sync + std::fmt::Debug {
    /// Author of `line` in `path`, or `None` if it cannot be determined.
    ///
    /// Missing files, tool failures and unparseable output all map to `None`.
    async fn blame_line(&self, path: &str, line: u32) -> Option<BlameAuthor>;

    /// Cheap probe for whether the provider can answer at all.
    async fn is_available(&self) -> bool {
        true
    }

    /// Identifier of the content being blamed (e.g. the HEAD commit), used as
    /// part of cache keys. `None` disables caching.
    async fn revision(&self) -> Option<String> {
        None
    }

    /// Like [`blame_line`](Self::blame_line), with the revision already
    /// looked up by the caller.
    async fn blame_line_at(
        &self,
        path: &str,
        line: u32,
        _revision: Option<&str>,
    ) -> Option<BlameAuthor> {
        self.blame_line(path, line).await
    }
}

/// Extract the author from `git blame --porcelain` output.
///
/// Both the `author` and `author-mail` headers must be present; angle
/// brackets around the email are removed.
pub fn parse_porcelain(output: &str) -> Option<BlameAuthor> {
    let mut name = None;
    let mut email = None;
    for line in output.lines() {
        if let Some(rest) = line.strip_prefix("author-mail ") {
            email.get_or_insert_with(|| rest.trim().trim_start_matches('<').trim_end_matches('>'));
        } else if let Some(rest) = line.strip_prefix("author ") {
            name.get_or_insert_with(|| rest.trim());
        }
        if name.is_some() && email.is_some() {
            break;
        }
    }

    Some(BlameAuthor {
        name: name?.to_string(),
        email: email?.to_string(),
    })
}

/// Blame provider backed by the `git` command line.
#[derive(Debug, Clone)]
pub struct GitBlameProvider {
    binary: String,
    repository_root: PathBuf,
    timeout: Duration,
}

impl GitBlameProvider {
    pub fn new(
        binary: impl Into<String>,
        repository_root: impl Into<PathBuf>,
        timeout: Duration,
    ) -> Self {
        Self {
            binary: binary.into(),
            repository_root: repository_root.into(),
            timeout,
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.current_dir(&self.repository_root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        cmd
    }

    /// Run a git command, returning stdout on a zero exit within the timeout.
    async fn run(&self, mut cmd: Command, what: &str) -> Option<String> {
        match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) if output.status.success() => {
                Some(String::from_utf8_lossy(&output.stdout).into_owned())
            }
            Ok(Ok(output)) => {
                debug!(status = ?output.status.code(), "{what} exited unsuccessfully");
                None
            }
            Ok(Err(e)) => {
                debug!(error = %e, "{what} could not be spawned");
                None
            }
            Err(_) => {
                warn!(timeout = ?self.timeout, "{what} timed out");
                None
            }
        }
    }

    fn resolve_path(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.repository_root.join(path)
        }
    }
}

#[async_trait]
impl BlameProvider for GitBlameProvider {
    async fn blame_line(&self, path: &str, line: u32) -> Option<BlameAuthor> {
        let full_path = self.resolve_path(path);
        if !tokio::fs::try_exists(&full_path).await.unwrap_or(false) {
            debug!(path, "Skipping blame for missing file");
            return None;
        }

        let mut cmd = self.command();
        cmd.arg("blame")
            .arg("-L")
            .arg(format!("{line},{line}"))
            .arg("--porcelain")
            .arg("--")
            .arg(path);

        let output = self.run(cmd, "git blame").await?;
        let author = parse_porcelain(&output);
        if author.is_none() {
            debug!(path, line, "git blame output had no author");
        }
        author
    }

    async fn is_available(&self) -> bool {
        let mut cmd = self.command();
        cmd.arg("--version");
        self.run(cmd, "git --version").await.is_some()
    }

    async fn revision(&self) -> Option<String> {
        let mut cmd = self.command();
        cmd.args(["rev-parse", "HEAD"]);
        let output = self.run(cmd, "git rev-parse").await?;
        let revision = output.trim();
        (!revision.is_empty()).then(|| revision.to_string())
    }
}

type BlameKey = (String, u32, String);

#[derive(Debug, Default)]
struct BlameCache {
    entries: HashMap<BlameKey, Option<BlameAuthor>>,
    order: VecDeque<BlameKey>,
}

/// Bounded cache in front of another provider, keyed by (path, line, revision).
///
/// Lookups are only cached when the inner provider reports a revision.
/// Oldest entries are evicted first once `capacity` is reached.
#[derive(Debug)]
pub struct CachingBlameProvider {
    inner: Arc<dyn BlameProvider>,
    capacity: usize,
    cache: Mutex<BlameCache>,
}

impl CachingBlameProvider {
    pub fn new(inner: Arc<dyn BlameProvider>, capacity: usize) -> Self {
        Self {
            inner,
            capacity: capacity.max(1),
            cache: Mutex::new(BlameCache::default()),
        }
    }

    pub fn len(&self) -> usize {
        self.cache.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert(&self, key: BlameKey, value: Option<BlameAuthor>) {
        let mut cache = self.cache.lock();
        if cache.entries.contains_key(&key) {
            return;
        }
        while cache.entries.len() >= self.capacity {
            let Some(oldest) = cache.order.pop_front() else {
                break;
            };
            cache.entries.remove(&oldest);
        }
        cache.order.push_back(key.clone());
        cache.entries.insert(key, value);
    }
}

#[async_trait]
impl BlameProvider for CachingBlameProvider {
    async fn blame_line(&self, path: &str, line: u32) -> Option<BlameAuthor> {
        let revision = self.inner.revision().await;
        self.blame_line_at(path, line, revision.as_deref()).await
    }

    /// Serves from the cache without asking the inner provider for its revision.
    async fn blame_line_at(
        &self,
        path: &str,
        line: u32,
        revision: Option<&str>,
    ) -> Option<BlameAuthor> {
        let Some(revision) = revision else {
            return self.inner.blame_line(path, line).await;
        };

        let key = (path.to_string(), line, revision.to_string());
        let cached = self.cache.lock().entries.get(&key).cloned();
        if let Some(hit) = cached {
            return hit;
        }

        let author = self.inner.blame_line(path, line).await;
        self.insert(key, author.clone());
        author
    }

    async fn is_available(&self) -> bool {
        self.inner.is_available().await
    }

    async fn revision(&self) -> Option<String> {
        self.inner.revision().await
    }
}

/// Attributes frames to the last author of the failing line.
///
/// Email matches take precedence over display-name matches for the same
/// author. The first frame whose author resolves to an owner wins.
#[derive(Debug, Clone)]
pub struct BlameAttributor {
    directory: Arc<dyn OwnerDirectory>,
    provider: Arc<dyn BlameProvider>,
}

impl BlameAttributor {
    pub fn new(directory: Arc<dyn OwnerDirectory>, provider: Arc<dyn BlameProvider>) -> Self {
        Self {
            directory,
            provider,
        }
    }

    async fn owner_for_author(&self, author: &BlameAuthor) -> Result<Option<Owner>> {
        if !author.email.is_empty() {
            if let Some(owner) = self.directory.owner_by_email(&author.email).await? {
                return Ok(Some(owner));
            }
        }
        if !author.name.is_empty() {
            return self.directory.owner_by_name(&author.name).await;
        }
        Ok(None)
    }
}

#[async_trait]
impl OwnershipStrategy for BlameAttributor {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Blame
    }

    async fn resolve(&self, frames: &[Frame]) -> Result<Option<Owner>> {
        if !self.provider.is_available().await {
            debug!(skip = %ResolutionSkip::ToolUnavailable, "Blame tool unavailable, skipping strategy");
            return Ok(None);
        }

        // One revision lookup per resolution
        let revision = self.provider.revision().await;
        for frame in frames {
            let Some(author) = self
                .provider
                .blame_line_at(&frame.file_path, frame.line_number, revision.as_deref())
                .await
            else {
                continue;
            };

            if let Some(owner) = self.owner_for_author(&author).await? {
                debug!(%frame, author = %author.email, owner = %owner.name, "Blame matched");
                return Ok(Some(owner));
            }
            debug!(%frame, author = %author.email, skip = %ResolutionSkip::UnknownOwner, "Blame author is not a known owner");
        }

        Ok(None)
    }
}
