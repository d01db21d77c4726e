//! Filesystem layout for both scopes.
//!
//! Configuration is via environment variables:
//! - `DOCSHELF_HOME` - Global root (default: `~/.docshelf`)
//! - `DOCSHELF_PROJECT_DIR` - Project directory (default: current directory).
//!   Project data lives in `<project>/.docshelf`.
//!
//! Each root holds a `resources.json` registry and a `repos/` directory with one
//! working copy per resource.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::models::Scope;

pub const HOME_ENV: &str = "DOCSHELF_HOME";
pub const PROJECT_DIR_ENV: &str = "DOCSHELF_PROJECT_DIR";

const DATA_DIR: &str = ".docshelf";
const REGISTRY_FILE: &str = "resources.json";
const REPOS_DIR: &str = "repos";

/// Resolved data roots for the global and project scopes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    global_root: PathBuf,
    project_root: PathBuf,
}

impl Layout {
    /// Create with explicit roots. Both are used as-is, without appending `.docshelf`.
    pub fn new(global_root: impl Into<PathBuf>, project_root: impl Into<PathBuf>) -> Self {
        Self {
            global_root: global_root.into(),
            project_root: project_root.into(),
        }
    }

    /// Build from optional overrides, falling back to the environment and then defaults.
    pub fn resolve(home: Option<PathBuf>, project_dir: Option<PathBuf>) -> Result<Self> {
        let global_root = match home.or_else(|| std::env::var_os(HOME_ENV).map(PathBuf::from)) {
            Some(root) => root,
            None => dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?
                .join(DATA_DIR),
        };

        let project_dir = match project_dir
            .or_else(|| std::env::var_os(PROJECT_DIR_ENV).map(PathBuf::from))
        {
            Some(dir) => dir,
            None => std::env::current_dir()?,
        };

        Ok(Self::new(global_root, project_dir.join(DATA_DIR)))
    }

    pub fn from_env() -> Result<Self> {
        Self::resolve(None, None)
    }

    pub fn root(&self, scope: Scope) -> &Path {
        match scope {
            Scope::Global => &self.global_root,
            Scope::Project => &self.project_root,
        }
    }

    pub fn registry_file(&self, scope: Scope) -> PathBuf {
        self.root(scope).join(REGISTRY_FILE)
    }

    pub fn repos_dir(&self, scope: Scope) -> PathBuf {
        self.root(scope).join(REPOS_DIR)
    }

    /// Where the working copy for `name` lives. Depends only on `scope` and `name`.
    pub fn resource_path(&self, scope: Scope, name: &str) -> PathBuf {
        self.repos_dir(scope).join(name)
    }
}
