use std::path::PathBuf;

use serde::Serialize;

use super::Resource;

/// A resource from the merged view plus whether its working copy exists.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceListing {
    #[serde(flatten)]
    pub resource: Resource,
    pub cloned: bool,
}

/// Detailed view of one resource.
///
/// The disk fields are only filled in when the working copy is present.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceInfo {
    #[serde(flatten)]
    pub resource: Resource,
    pub path: PathBuf,
    pub cloned: bool,
    pub size_bytes: Option<u64>,
    pub file_count: Option<u64>,
    pub last_commit: Option<String>,
}

/// What happened to a single resource during `update` or `restore`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum ItemOutcome {
    Updated,
    Restored,
    NotCloned,
    AlreadyCloned,
    Failed(String),
}

impl ItemOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Aggregated per-resource outcomes of a batch operation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub items: Vec<BatchItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchItem {
    pub name: String,
    pub outcome: ItemOutcome,
}

impl BatchReport {
    pub fn push(&mut self, name: impl Into<String>, outcome: ItemOutcome) {
        self.items.push(BatchItem {
            name: name.into(),
            outcome,
        });
    }

    pub fn outcome(&self, name: &str) -> Option<&ItemOutcome> {
        self.items
            .iter()
            .find(|item| item.name == name)
            .map(|item| &item.outcome)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// One matching line, with a path relative to the resource root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub path: String,
    pub line: u64,
    pub text: String,
}

/// Search results for a single resource.
#[derive(Debug, Clone, Serialize)]
pub struct SearchSection {
    pub name: String,
    pub hits: Vec<SearchHit>,
    /// Set when the search provider failed for this resource.
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchReport {
    pub query: String,
    pub sections: Vec<SearchSection>,
}

impl SearchReport {
    pub fn total_hits(&self) -> usize {
        self.sections.iter().map(|s| s.hits.len()).sum()
    }

    /// True when nothing matched and nothing failed.
    pub fn is_empty(&self) -> bool {
        self.sections
            .iter()
            .all(|s| s.hits.is_empty() && s.error.is_none())
    }
}

/// Directory listing for `tree`, relative to the resource root.
#[derive(Debug, Clone, Serialize)]
pub struct TreeListing {
    pub name: String,
    pub entries: Vec<String>,
    pub truncated: bool,
}
