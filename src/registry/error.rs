use thiserror::Error;

/// Expected failures of registry operations.
///
/// Everything except [`RegistryError::Storage`] is a normal outcome that callers show
/// to the user as text.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Resource '{0}' already exists")]
    DuplicateResource(String),

    #[error("Resource '{0}' not found")]
    NotFound(String),

    #[error("Resource '{0}' is not cloned. Run restore to clone it.")]
    NotCloned(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("'{0}' is a directory. Use tree to list its contents.")]
    IsDirectory(String),

    #[error("Path not found: {0}")]
    PathNotFound(String),

    #[error("Invalid resource name '{0}': use a single directory name without a leading '.' or slashes")]
    InvalidName(String),

    #[error("{0}")]
    ProviderFailure(String),

    #[error("Storage error: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl RegistryError {
    /// True for failures that are not the caller's doing.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;
