use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use ignore::WalkBuilder;

use super::{DiskUsage, FileEntry, FileEnumerator};

const GIT_DIR: &str = ".git";

/// Directory enumeration with the `ignore` walker.
///
/// Hidden files and gitignored paths are included; only `.git` is skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct WalkEnumerator;

fn walker(dir: &Path, max_depth: Option<usize>) -> WalkBuilder {
    let mut builder = WalkBuilder::new(dir);
    builder
        .standard_filters(false)
        .follow_links(false)
        .max_depth(max_depth)
        .filter_entry(|entry| entry.file_name() != GIT_DIR);
    builder
}

fn list_blocking(dir: PathBuf, max_depth: usize) -> Vec<FileEntry> {
    let mut entries: Vec<FileEntry> = walker(&dir, Some(max_depth))
        .build()
        .filter_map(|result| match result {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.depth() > 0)
        .map(|entry| FileEntry {
            is_dir: entry.file_type().is_some_and(|t| t.is_dir()),
            path: entry.into_path(),
        })
        .collect();
    entries.sort_by(|a, b| a.path.cmp(&b.path));
    entries
}

fn usage_blocking(dir: PathBuf) -> DiskUsage {
    let mut usage = DiskUsage::default();
    for entry in walker(&dir, None).build().flatten() {
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        usage.files += 1;
        if let Ok(metadata) = entry.metadata() {
            usage.bytes += metadata.len();
        }
    }
    usage
}

#[async_trait]
impl FileEnumerator for WalkEnumerator {
    async fn list(&self, dir: &Path, max_depth: usize) -> Result<Vec<FileEntry>> {
        let dir = dir.to_path_buf();
        tokio::task::spawn_blocking(move || list_blocking(dir, max_depth))
            .await
            .context("directory walk panicked")
    }

    async fn usage(&self, dir: &Path) -> Result<DiskUsage> {
        let dir = dir.to_path_buf();
        tokio::task::spawn_blocking(move || usage_blocking(dir))
            .await
            .context("directory walk panicked")
    }
}
