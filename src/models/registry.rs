use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ResourceRecord;

/// Schema version written by this build. Files with any other version load as empty.
pub const REGISTRY_VERSION: u32 = 1;

/// The persisted list of resources for one scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    pub version: u32,
    #[serde(default)]
    pub resources: Vec<ResourceRecord>,
}

impl Default for Registry {
    fn default() -> Self {
        Self {
            version: REGISTRY_VERSION,
            resources: Vec::new(),
        }
    }
}

impl Registry {
    pub fn get(&self, name: &str) -> Option<&ResourceRecord> {
        self.resources.iter().find(|r| r.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Remove a record by name, returning it if it was present.
    pub fn remove(&mut self, name: &str) -> Option<ResourceRecord> {
        let index = self.resources.iter().position(|r| r.name == name)?;
        Some(self.resources.remove(index))
    }

    /// Set `updated_at` on a record. Returns false when the name is not in this registry.
    pub fn touch(&mut self, name: &str, at: DateTime<Utc>) -> bool {
        match self.resources.iter_mut().find(|r| r.name == name) {
            Some(record) => {
                record.updated_at = at;
                true
            }
            None => false,
        }
    }
}
