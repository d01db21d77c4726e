//! JSON registry files, one per scope.
//!
//! Every call reads or writes the file directly; nothing is cached between
//! operations. There is no locking, so two processes saving the same scope at
//! once will lose one of the writes.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::Layout;
use crate::models::*;

#[derive(Debug, Clone)]
pub struct RegistryStore {
    layout: Layout,
}

impl RegistryStore {
    pub fn new(layout: Layout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn path(&self, scope: Scope) -> PathBuf {
        self.layout.registry_file(scope)
    }

    /// Load a scope's registry.
    ///
    /// Missing, unreadable, malformed and unknown-version files all come back as
    /// an empty registry. Records whose name is not a single directory name are
    /// dropped, since their clone path would resolve outside `repos/`.
    pub fn load(&self, scope: Scope) -> Registry {
        let path = self.path(scope);
        match read_registry(&path) {
            Ok(Some(mut registry)) if registry.version == REGISTRY_VERSION => {
                registry.resources.retain(|record| {
                    let valid = is_valid_name(&record.name);
                    if !valid {
                        tracing::warn!(
                            "Ignoring {} registry entry with invalid name {:?} in {}",
                            scope,
                            record.name,
                            path.display()
                        );
                    }
                    valid
                });
                registry
            }
            Ok(Some(registry)) => {
                tracing::warn!(
                    "Ignoring {} registry at {}: unsupported version {}",
                    scope,
                    path.display(),
                    registry.version
                );
                Registry::default()
            }
            Ok(None) => Registry::default(),
            Err(e) => {
                tracing::warn!(
                    "Treating {} registry at {} as empty: {:#}",
                    scope,
                    path.display(),
                    e
                );
                Registry::default()
            }
        }
    }

    /// Overwrite a scope's registry, creating parent directories as needed.
    pub fn save(&self, scope: Scope, registry: &Registry) -> Result<()> {
        let path = self.path(scope);
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Registry path has no parent directory"))?;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create registry dir: {}", parent.display()))?;

        let mut json = serde_json::to_string_pretty(registry)?;
        json.push('\n');
        std::fs::write(&path, json)
            .with_context(|| format!("write registry: {}", path.display()))?;

        tracing::debug!(
            "Saved {} registry with {} resources",
            scope,
            registry.resources.len()
        );
        Ok(())
    }

    /// Load, apply `f`, and save. The closure's return value is passed through.
    pub fn modify<T>(&self, scope: Scope, f: impl FnOnce(&mut Registry) -> T) -> Result<T> {
        let mut registry = self.load(scope);
        let result = f(&mut registry);
        self.save(scope, &registry)?;
        Ok(result)
    }
}

fn read_registry(path: &Path) -> Result<Option<Registry>> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).context("read registry"),
    };
    let registry = serde_json::from_str(&contents).context("parse registry")?;
    Ok(Some(registry))
}
