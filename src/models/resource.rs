use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Branch used when a resource is added without one.
pub const DEFAULT_BRANCH: &str = "main";

/// A documentation repository as stored in a scope's registry file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRecord {
    /// Unique across both scopes. Also the name of the clone directory.
    pub name: String,
    /// Passed to the version-control provider untouched.
    pub url: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default)]
    pub notes: String,
    pub cloned_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_branch() -> String {
    DEFAULT_BRANCH.to_string()
}

/// A record in the merged view, tagged with the scope whose file it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(flatten)]
    pub record: ResourceRecord,
    pub scope: Scope,
}

impl Resource {
    pub fn new(record: ResourceRecord, scope: Scope) -> Self {
        Self { record, scope }
    }

    pub fn name(&self) -> &str {
        &self.record.name
    }
}

/// Which registry owns a resource, and therefore where its clone lives.
///
/// - `Global`: shared by every project, stored under the user's home directory
/// - `Project`: local to the current project directory
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    #[default]
    Global,
    Project,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Project => "project",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "global" => Ok(Self::Global),
            "project" => Ok(Self::Project),
            other => Err(format!(
                "Invalid scope '{}'. Must be: global or project",
                other
            )),
        }
    }
}

/// Input for adding a new resource.
#[derive(Debug, Clone)]
pub struct AddResourceInput {
    pub name: String,
    pub url: String,
    /// Defaults to [`DEFAULT_BRANCH`].
    pub branch: Option<String>,
    pub notes: Option<String>,
    pub scope: Scope,
}

impl AddResourceInput {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            branch: None,
            notes: None,
            scope: Scope::Global,
        }
    }

    pub fn branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }
}

/// Which resources a batch operation applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    All,
    Named(String),
}

impl Target {
    /// `None` means every resource in the merged view.
    pub fn from_name(name: Option<String>) -> Self {
        match name {
            Some(name) => Self::Named(name),
            None => Self::All,
        }
    }
}

/// Check that a name is usable as a single directory component.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\'])
        && name.chars().all(|c| !c.is_control())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_parses_case_insensitively() {
        assert_eq!("Project".parse::<Scope>(), Ok(Scope::Project));
        assert_eq!(" global ".parse::<Scope>(), Ok(Scope::Global));
        assert!("workspace".parse::<Scope>().is_err());
    }

    #[test]
    fn names_must_be_single_components() {
        assert!(is_valid_name("svelte"));
        assert!(is_valid_name("tokio-docs_v1"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name(".."));
        assert!(!is_valid_name(".hidden"));
        assert!(!is_valid_name("a/b"));
        assert!(!is_valid_name("a\\b"));
    }

    #[test]
    fn record_uses_camel_case_timestamps() {
        let now = Utc::now();
        let record = ResourceRecord {
            name: "svelte".into(),
            url: "https://example/svelte".into(),
            branch: "main".into(),
            notes: String::new(),
            cloned_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("clonedAt").is_some());
        assert!(json.get("updatedAt").is_some());
        assert!(json.get("scope").is_none());
    }

    #[test]
    fn missing_branch_and_notes_take_defaults() {
        let json = r#"{"name":"x","url":"u","clonedAt":"2024-01-01T00:00:00Z","updatedAt":"2024-01-01T00:00:00Z"}"#;
        let record: ResourceRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.branch, DEFAULT_BRANCH);
        assert_eq!(record.notes, "");
    }
}
