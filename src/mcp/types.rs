//! Request types for MCP tools.

use std::fmt;
use std::str::FromStr;

use rmcp::schemars::JsonSchema;
use serde::Deserialize;

// ============================================================
// Request Types
// ============================================================

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct ManageResourcesRequest {
    #[schemars(description = "What to do: 'add', 'remove', 'list', 'update', 'info', or 'restore'")]
    pub action: String,
    #[schemars(
        description = "Resource name. Required for add, remove and info. For update and restore, omit to apply to every resource."
    )]
    #[serde(default)]
    pub name: Option<String>,
    #[schemars(description = "Git URL to clone (add only)")]
    #[serde(default)]
    pub url: Option<String>,
    #[schemars(description = "Branch to clone (add only). Defaults to 'main'.")]
    #[serde(default)]
    pub branch: Option<String>,
    #[schemars(description = "Free-text notes about what this resource documents (add only)")]
    #[serde(default)]
    pub notes: Option<String>,
    #[schemars(
        description = "Where to register the resource (add only): 'global' (default, shared across projects) or 'project'"
    )]
    #[serde(default)]
    pub scope: Option<String>,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct SearchResourcesRequest {
    #[schemars(description = "Text to search for (case-insensitive, matched literally)")]
    pub query: String,
    #[schemars(description = "Limit the search to one resource. Omit to search all cloned resources.")]
    #[serde(default)]
    pub name: Option<String>,
    #[schemars(description = "Only search files matching this glob, e.g. '*.md'")]
    #[serde(default)]
    pub include: Option<String>,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct ReadResourceRequest {
    #[schemars(description = "Resource name")]
    pub name: String,
    #[schemars(description = "File path relative to the resource root, e.g. 'docs/intro.md'")]
    pub path: String,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct ResourceTreeRequest {
    #[schemars(description = "Resource name")]
    pub name: String,
    #[schemars(description = "Subdirectory relative to the resource root. Defaults to the root.")]
    #[serde(default)]
    pub path: Option<String>,
    #[schemars(description = "How many levels deep to list. Defaults to 3.")]
    #[serde(default)]
    pub depth: Option<usize>,
}

// ============================================================
// Actions
// ============================================================

/// The `action` argument of `manage_resources`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceAction {
    Add,
    Remove,
    List,
    Update,
    Info,
    Restore,
}

impl ResourceAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::List => "list",
            Self::Update => "update",
            Self::Info => "info",
            Self::Restore => "restore",
        }
    }
}

impl fmt::Display for ResourceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceAction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "add" => Ok(Self::Add),
            "remove" => Ok(Self::Remove),
            "list" => Ok(Self::List),
            "update" => Ok(Self::Update),
            "info" => Ok(Self::Info),
            "restore" => Ok(Self::Restore),
            _ => Err(()),
        }
    }
}
