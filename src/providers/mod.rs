//! External collaborators the registry delegates to.
//!
//! The registry never shells out itself. Cloning and pulling go through
//! [`VersionControl`], text search through [`ContentSearch`], and directory
//! listings through [`FileEnumerator`]. The system implementations spawn `git`
//! and `rg`, and walk directories in-process.

mod files;
mod git;
mod search;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

pub use files::WalkEnumerator;
pub use git::GitCli;
pub use search::RipgrepSearch;

/// Status and captured text of an external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderOutput {
    pub success: bool,
    /// Combined stdout/stderr, trimmed.
    pub output: String,
}

impl ProviderOutput {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
        }
    }

    pub fn failed(output: impl Into<String>) -> Self {
        Self {
            success: false,
            output: output.into(),
        }
    }

    pub(crate) fn from_process(output: &std::process::Output) -> Self {
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let text = match (stdout.trim(), stderr.trim()) {
            ("", err) => err.to_string(),
            (out, "") => out.to_string(),
            (out, err) => format!("{}\n{}", out, err),
        };
        Self {
            success: output.status.success(),
            output: text,
        }
    }
}

/// A matching line as reported by the search provider. `path` is absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchMatch {
    pub path: PathBuf,
    pub line: u64,
    pub text: String,
}

/// A path found by the file enumerator. `path` is absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: PathBuf,
    pub is_dir: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiskUsage {
    pub bytes: u64,
    pub files: u64,
}

#[async_trait]
pub trait VersionControl: Send + Sync {
    /// Clone `url` at `branch` into `dest`. `dest` must not exist yet.
    async fn clone_repo(&self, url: &str, branch: &str, dest: &Path) -> Result<ProviderOutput>;

    /// Pull the latest changes into an existing working copy.
    async fn pull(&self, path: &Path) -> Result<ProviderOutput>;

    /// One-line summary of the most recent commit, if there is one.
    async fn last_commit(&self, path: &Path) -> Result<Option<String>>;
}

#[async_trait]
pub trait ContentSearch: Send + Sync {
    /// Recursive, case-insensitive search under `dir`, optionally limited to files
    /// matching the `include` glob. Stops after `limit` matching lines.
    async fn search(
        &self,
        dir: &Path,
        query: &str,
        include: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SearchMatch>>;
}

#[async_trait]
pub trait FileEnumerator: Send + Sync {
    /// Entries under `dir` at most `max_depth` levels deep, sorted by path.
    /// `dir` itself is not included.
    async fn list(&self, dir: &Path, max_depth: usize) -> Result<Vec<FileEntry>>;

    /// Total size and file count under `dir`.
    async fn usage(&self, dir: &Path) -> Result<DiskUsage>;
}

/// The set of providers a registry runs against.
#[derive(Clone)]
pub struct Providers {
    pub vcs: Arc<dyn VersionControl>,
    pub search: Arc<dyn ContentSearch>,
    pub files: Arc<dyn FileEnumerator>,
}

impl Providers {
    /// `git`, `rg` and the in-process directory walker.
    pub fn system() -> Self {
        Self {
            vcs: Arc::new(GitCli::new()),
            search: Arc::new(RipgrepSearch::new()),
            files: Arc::new(WalkEnumerator),
        }
    }
}

impl std::fmt::Debug for Providers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Providers").finish_non_exhaustive()
    }
}
