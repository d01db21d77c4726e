//! The resource registry: scope merging, path resolution, and every operation
//! exposed to agents.
//!
//! Each operation reads the registry files fresh, computes, and writes back at
//! most one scope. Provider calls are awaited before any registry write, so a
//! timestamp is never recorded for work that did not happen.

mod error;

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use anyhow::Context;
use chrono::Utc;

pub use error::{RegistryError, Result};

use crate::config::Layout;
use crate::models::*;
use crate::providers::{ProviderOutput, Providers};
use crate::store::RegistryStore;

/// Matching lines kept per resource in a search.
pub const SEARCH_MATCH_LIMIT: usize = 50;
/// Entries returned by `tree` before the listing is truncated.
pub const TREE_ENTRY_LIMIT: usize = 100;
pub const DEFAULT_TREE_DEPTH: usize = 3;

#[derive(Debug, Clone)]
pub struct ResourceRegistry {
    store: RegistryStore,
    providers: Providers,
}

impl ResourceRegistry {
    pub fn new(layout: Layout, providers: Providers) -> Self {
        Self {
            store: RegistryStore::new(layout),
            providers,
        }
    }

    pub fn layout(&self) -> &Layout {
        self.store.layout()
    }

    pub fn store(&self) -> &RegistryStore {
        &self.store
    }

    // ============================================================
    // Resolution
    // ============================================================

    /// Union of both scopes keyed by name, sorted by name.
    ///
    /// A project record replaces a global record of the same name outright.
    pub fn merged_view(&self) -> Vec<Resource> {
        let mut merged: BTreeMap<String, Resource> = BTreeMap::new();
        for scope in [Scope::Global, Scope::Project] {
            for record in self.store.load(scope).resources {
                merged.insert(record.name.clone(), Resource::new(record, scope));
            }
        }
        merged.into_values().collect()
    }

    pub fn find_by_name(&self, name: &str) -> Option<Resource> {
        // Project wins, so check it first.
        for scope in [Scope::Project, Scope::Global] {
            if let Some(record) = self.store.load(scope).get(name) {
                return Some(Resource::new(record.clone(), scope));
            }
        }
        None
    }

    fn require(&self, name: &str) -> Result<Resource> {
        self.find_by_name(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    fn targets(&self, target: &Target) -> Result<Vec<Resource>> {
        match target {
            Target::All => Ok(self.merged_view()),
            Target::Named(name) => Ok(vec![self.require(name)?]),
        }
    }

    pub fn resource_path(&self, resource: &Resource) -> PathBuf {
        self.layout().resource_path(resource.scope, resource.name())
    }

    // ============================================================
    // Registry operations
    // ============================================================

    /// Clone a new resource and record it.
    ///
    /// Either the clone exists and the registry lists it, or neither happens.
    pub async fn add(&self, input: AddResourceInput) -> Result<Resource> {
        if !is_valid_name(&input.name) {
            return Err(RegistryError::InvalidName(input.name));
        }
        if self.find_by_name(&input.name).is_some() {
            return Err(RegistryError::DuplicateResource(input.name));
        }

        let scope = input.scope;
        let dest = self.layout().resource_path(scope, &input.name);
        if dest.exists() {
            return Err(RegistryError::ProviderFailure(format!(
                "Cannot clone '{}': {} already exists on disk",
                input.name,
                dest.display()
            )));
        }
        ensure_dir(&self.layout().repos_dir(scope))?;

        let branch = input
            .branch
            .filter(|b| !b.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BRANCH.to_string());

        tracing::info!("Adding {} resource '{}' from {}", scope, input.name, input.url);
        let cloned = self
            .providers
            .vcs
            .clone_repo(&input.url, &branch, &dest)
            .await;
        if let Err(message) = provider_result(cloned) {
            remove_quietly(&dest);
            return Err(RegistryError::ProviderFailure(format!(
                "Failed to clone '{}': {}",
                input.name, message
            )));
        }

        let now = Utc::now();
        let record = ResourceRecord {
            name: input.name,
            url: input.url,
            branch,
            notes: input.notes.unwrap_or_default(),
            cloned_at: now,
            updated_at: now,
        };

        let saved = self
            .store
            .modify(scope, |registry| registry.resources.push(record.clone()));
        if let Err(e) = saved {
            tracing::warn!("Rolling back clone of '{}': {:#}", record.name, e);
            remove_quietly(&dest);
            return Err(e.into());
        }

        Ok(Resource::new(record, scope))
    }

    /// Delete a resource's working copy and its record in the owning scope.
    pub async fn remove(&self, name: &str) -> Result<Resource> {
        let resource = self.require(name)?;
        let path = self.resource_path(&resource);

        match remove_path(&path) {
            Ok(()) => tracing::info!("Removed working copy {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("remove {}", path.display()))
                    .into())
            }
        }

        self.store.modify(resource.scope, |registry| {
            registry.remove(name);
        })?;

        tracing::info!("Removed {} resource '{}'", resource.scope, name);
        Ok(resource)
    }

    /// Pull every targeted resource that has a working copy.
    ///
    /// A failing pull is reported in the batch and does not stop the rest.
    pub async fn update(&self, target: Target) -> Result<BatchReport> {
        let mut report = BatchReport::default();

        for resource in self.targets(&target)? {
            let path = self.resource_path(&resource);
            if !is_cloned(&path) {
                report.push(resource.name(), ItemOutcome::NotCloned);
                continue;
            }

            let outcome = match provider_result(self.providers.vcs.pull(&path).await) {
                Ok(_) => self.touch(&resource, ItemOutcome::Updated),
                Err(message) => {
                    tracing::warn!("Pull failed for '{}': {}", resource.name(), message);
                    ItemOutcome::Failed(message)
                }
            };
            report.push(resource.name(), outcome);
        }

        Ok(report)
    }

    /// Re-clone every targeted resource whose working copy is missing.
    pub async fn restore(&self, target: Target) -> Result<BatchReport> {
        let mut report = BatchReport::default();

        for resource in self.targets(&target)? {
            let path = self.resource_path(&resource);
            if is_cloned(&path) {
                report.push(resource.name(), ItemOutcome::AlreadyCloned);
                continue;
            }
            // A stray file where the clone belongs would make the clone fail.
            remove_quietly(&path);

            if let Err(e) = ensure_dir(&self.layout().repos_dir(resource.scope)) {
                report.push(resource.name(), ItemOutcome::Failed(e.to_string()));
                continue;
            }

            let record = &resource.record;
            let cloned = self
                .providers
                .vcs
                .clone_repo(&record.url, &record.branch, &path)
                .await;
            let outcome = match provider_result(cloned) {
                Ok(_) => self.touch(&resource, ItemOutcome::Restored),
                Err(message) => {
                    tracing::warn!("Restore failed for '{}': {}", resource.name(), message);
                    remove_quietly(&path);
                    ItemOutcome::Failed(message)
                }
            };
            report.push(resource.name(), outcome);
        }

        Ok(report)
    }

    /// Refresh `updated_at` in the owning scope, returning `done` on success.
    fn touch(&self, resource: &Resource, done: ItemOutcome) -> ItemOutcome {
        let now = Utc::now();
        match self
            .store
            .modify(resource.scope, |registry| registry.touch(resource.name(), now))
        {
            Ok(_) => done,
            Err(e) => ItemOutcome::Failed(format!("{:#}", e)),
        }
    }

    pub async fn info(&self, name: &str) -> Result<ResourceInfo> {
        let resource = self.require(name)?;
        let path = self.resource_path(&resource);
        let cloned = is_cloned(&path);

        let mut info = ResourceInfo {
            resource,
            path,
            cloned,
            size_bytes: None,
            file_count: None,
            last_commit: None,
        };
        if !cloned {
            return Ok(info);
        }

        match self.providers.files.usage(&info.path).await {
            Ok(usage) => {
                info.size_bytes = Some(usage.bytes);
                info.file_count = Some(usage.files);
            }
            Err(e) => tracing::debug!("Disk usage unavailable for '{}': {:#}", name, e),
        }
        match self.providers.vcs.last_commit(&info.path).await {
            Ok(commit) => info.last_commit = commit,
            Err(e) => tracing::debug!("Last commit unavailable for '{}': {:#}", name, e),
        }

        Ok(info)
    }

    pub fn list(&self) -> Vec<ResourceListing> {
        self.merged_view()
            .into_iter()
            .map(|resource| {
                let cloned = is_cloned(&self.resource_path(&resource));
                ResourceListing { resource, cloned }
            })
            .collect()
    }

    // ============================================================
    // Content operations
    // ============================================================

    /// Search one resource, or all of them. Resources without a working copy are skipped.
    pub async fn search(
        &self,
        query: &str,
        name: Option<&str>,
        include: Option<&str>,
    ) -> Result<SearchReport> {
        let target = Target::from_name(name.map(str::to_string));
        let mut report = SearchReport {
            query: query.to_string(),
            sections: Vec::new(),
        };

        for resource in self.targets(&target)? {
            let root = self.resource_path(&resource);
            if !is_cloned(&root) {
                continue;
            }

            let found = self
                .providers
                .search
                .search(&root, query, include, SEARCH_MATCH_LIMIT)
                .await;
            match found {
                Ok(matches) => {
                    let hits: Vec<SearchHit> = matches
                        .into_iter()
                        .take(SEARCH_MATCH_LIMIT)
                        .map(|m| SearchHit {
                            path: relative_to(&root, &m.path),
                            line: m.line,
                            text: m.text,
                        })
                        .collect();
                    if !hits.is_empty() {
                        report.sections.push(SearchSection {
                            name: resource.name().to_string(),
                            hits,
                            error: None,
                        });
                    }
                }
                Err(e) => {
                    tracing::warn!("Search failed in '{}': {:#}", resource.name(), e);
                    report.sections.push(SearchSection {
                        name: resource.name().to_string(),
                        hits: Vec::new(),
                        error: Some(format!("{:#}", e)),
                    });
                }
            }
        }

        Ok(report)
    }

    /// Full contents of a file inside a resource. There is no size cap.
    pub async fn read(&self, name: &str, file_path: &str) -> Result<String> {
        let resource = self.require(name)?;
        let root = self.resource_path(&resource);
        if !is_cloned(&root) {
            return Err(RegistryError::NotCloned(name.to_string()));
        }

        let not_found = || RegistryError::FileNotFound(file_path.to_string());
        let target = join_within(&root, file_path).ok_or_else(not_found)?;
        if !target.exists() || !stays_within(&root, &target) {
            return Err(not_found());
        }
        if target.is_dir() {
            return Err(RegistryError::IsDirectory(file_path.to_string()));
        }

        let bytes = tokio::fs::read(&target)
            .await
            .with_context(|| format!("read {}", target.display()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Sorted listing under `subpath`, at most `depth` levels deep.
    pub async fn tree(&self, name: &str, subpath: &str, depth: usize) -> Result<TreeListing> {
        let resource = self.require(name)?;
        let root = self.resource_path(&resource);
        if !is_cloned(&root) {
            return Err(RegistryError::NotCloned(name.to_string()));
        }

        let not_found = || RegistryError::PathNotFound(subpath.to_string());
        let start = join_within(&root, subpath).ok_or_else(not_found)?;
        if !start.exists() || !stays_within(&root, &start) {
            return Err(not_found());
        }

        if !start.is_dir() {
            return Ok(TreeListing {
                name: name.to_string(),
                entries: vec![relative_to(&root, &start)],
                truncated: false,
            });
        }

        let entries = self
            .providers
            .files
            .list(&start, depth.max(1))
            .await
            .map_err(|e| RegistryError::ProviderFailure(format!("{:#}", e)))?;

        let truncated = entries.len() > TREE_ENTRY_LIMIT;
        let entries = entries
            .into_iter()
            .take(TREE_ENTRY_LIMIT)
            .map(|entry| {
                let mut rel = relative_to(&root, &entry.path);
                if entry.is_dir {
                    rel.push('/');
                }
                rel
            })
            .collect();

        Ok(TreeListing {
            name: name.to_string(),
            entries,
            truncated,
        })
    }
}

fn is_cloned(path: &Path) -> bool {
    path.is_dir()
}

/// Collapse provider output and spawn errors into one error message.
fn provider_result(
    result: anyhow::Result<ProviderOutput>,
) -> std::result::Result<String, String> {
    match result {
        Ok(out) if out.success => Ok(out.output),
        Ok(out) if out.output.is_empty() => Err("command exited with an error".to_string()),
        Ok(out) => Err(out.output),
        Err(e) => Err(format!("{:#}", e)),
    }
}

fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(())
}

/// Remove a directory tree, or a single file or symlink, at `path`.
fn remove_path(path: &Path) -> std::io::Result<()> {
    let metadata = std::fs::symlink_metadata(path)?;
    if metadata.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    }
}

fn remove_quietly(path: &Path) {
    if let Err(e) = remove_path(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!("Could not clean up {}: {}", path.display(), e);
        }
    }
}

/// Join a caller-supplied relative path onto `root`, refusing anything that
/// could point outside it lexically.
fn join_within(root: &Path, rel: &str) -> Option<PathBuf> {
    let mut joined = root.to_path_buf();
    for component in Path::new(rel).components() {
        match component {
            Component::Normal(part) => joined.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(joined)
}

/// Symlinks inside a clone must not lead out of it.
fn stays_within(root: &Path, target: &Path) -> bool {
    match (root.canonicalize(), target.canonicalize()) {
        (Ok(root), Ok(target)) => target.starts_with(root),
        _ => false,
    }
}

fn relative_to(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}
