//! Stub providers and fixtures shared by the integration specs.

#![allow(dead_code)]

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tempfile::TempDir;

use docshelf::config::Layout;
use docshelf::models::*;
use docshelf::providers::*;
use docshelf::registry::ResourceRegistry;

pub const INTRO: &str = "# Introduction\nReactive declarations update automatically.\nStores hold state.\n";

/// Version control that writes a small fake checkout instead of running git.
#[derive(Default)]
pub struct StubVcs {
    pub clones: AtomicUsize,
    pub pulls: AtomicUsize,
    /// URLs whose clone fails after leaving a partial directory behind.
    pub failing_urls: Mutex<HashSet<String>>,
    /// Resource directory names whose pull fails.
    pub failing_pulls: Mutex<HashSet<String>>,
    pub cloned: Mutex<Vec<(String, String, PathBuf)>>,
}

impl StubVcs {
    pub fn fail_clone(&self, url: &str) {
        self.failing_urls.lock().unwrap().insert(url.to_string());
    }

    pub fn fail_pull(&self, name: &str) {
        self.failing_pulls.lock().unwrap().insert(name.to_string());
    }

    pub fn clone_count(&self) -> usize {
        self.clones.load(Ordering::SeqCst)
    }

    pub fn pull_count(&self) -> usize {
        self.pulls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VersionControl for StubVcs {
    async fn clone_repo(&self, url: &str, branch: &str, dest: &Path) -> Result<ProviderOutput> {
        self.clones.fetch_add(1, Ordering::SeqCst);
        self.cloned
            .lock()
            .unwrap()
            .push((url.to_string(), branch.to_string(), dest.to_path_buf()));

        std::fs::create_dir_all(dest)?;
        if self.failing_urls.lock().unwrap().contains(url) {
            return Ok(ProviderOutput::failed(format!(
                "fatal: repository '{}' not found",
                url
            )));
        }

        std::fs::create_dir_all(dest.join("docs"))?;
        std::fs::create_dir_all(dest.join(".git"))?;
        std::fs::write(dest.join(".git/HEAD"), "ref: refs/heads/main\n")?;
        std::fs::write(dest.join("README.md"), format!("# {}\n", url))?;
        std::fs::write(dest.join("docs/intro.md"), INTRO)?;
        Ok(ProviderOutput::ok(format!("Cloning into '{}'...", dest.display())))
    }

    async fn pull(&self, path: &Path) -> Result<ProviderOutput> {
        self.pulls.fetch_add(1, Ordering::SeqCst);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if self.failing_pulls.lock().unwrap().contains(&name) {
            return Ok(ProviderOutput::failed("fatal: unable to access remote"));
        }
        Ok(ProviderOutput::ok("Already up to date."))
    }

    async fn last_commit(&self, _path: &Path) -> Result<Option<String>> {
        Ok(Some("abc1234 Initial commit (2 days ago)".to_string()))
    }
}

/// Case-insensitive substring search over real files, counting invocations.
#[derive(Default)]
pub struct StubSearch {
    pub calls: AtomicUsize,
    pub last_limit: AtomicUsize,
}

impl StubSearch {
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_limit(&self) -> usize {
        self.last_limit.load(Ordering::SeqCst)
    }
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.file_name().is_some_and(|n| n == ".git") {
            continue;
        }
        if path.is_dir() {
            collect_files(&path, out);
        } else {
            out.push(path);
        }
    }
}

#[async_trait]
impl ContentSearch for StubSearch {
    async fn search(
        &self,
        dir: &Path,
        query: &str,
        include: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SearchMatch>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.last_limit.store(limit, Ordering::SeqCst);

        let mut files = Vec::new();
        collect_files(dir, &mut files);
        files.sort();

        let needle = query.to_lowercase();
        let extension = include.and_then(|glob| glob.strip_prefix("*."));
        let mut matches = Vec::new();
        for file in files {
            if let Some(ext) = extension {
                if file.extension().and_then(|e| e.to_str()) != Some(ext) {
                    continue;
                }
            }
            let contents = std::fs::read_to_string(&file)?;
            for (i, line) in contents.lines().enumerate() {
                if line.to_lowercase().contains(&needle) {
                    matches.push(SearchMatch {
                        path: file.clone(),
                        line: i as u64 + 1,
                        text: line.to_string(),
                    });
                    if matches.len() == limit {
                        return Ok(matches);
                    }
                }
            }
        }
        Ok(matches)
    }
}

pub struct Fixture {
    pub dir: TempDir,
    pub registry: ResourceRegistry,
    pub vcs: Arc<StubVcs>,
    pub search: Arc<StubSearch>,
}

pub fn setup() -> Fixture {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let layout = Layout::new(
        dir.path().join("home"),
        dir.path().join("project").join(".docshelf"),
    );
    let vcs = Arc::new(StubVcs::default());
    let search = Arc::new(StubSearch::default());
    let providers = Providers {
        vcs: vcs.clone(),
        search: search.clone(),
        files: Arc::new(WalkEnumerator),
    };

    Fixture {
        registry: ResourceRegistry::new(layout, providers),
        dir,
        vcs,
        search,
    }
}

pub fn old_timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()
}

pub fn record(name: &str, url: &str) -> ResourceRecord {
    ResourceRecord {
        name: name.to_string(),
        url: url.to_string(),
        branch: "main".to_string(),
        notes: String::new(),
        cloned_at: old_timestamp(),
        updated_at: old_timestamp(),
    }
}

/// Write records straight into a scope's registry file, bypassing `add`.
pub fn seed(fixture: &Fixture, scope: Scope, records: Vec<ResourceRecord>) {
    let mut registry = fixture.registry.store().load(scope);
    registry.resources.extend(records);
    fixture
        .registry
        .store()
        .save(scope, &registry)
        .expect("Failed to seed registry");
}
