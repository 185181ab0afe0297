//! Error types for file access operations.

use thiserror::Error;

/// Result type for file access operations.
pub type FileIoResult<T> = Result<T, FileIoError>;

/// Errors that can occur while configuring or using a file io.
#[derive(Debug, Error)]
pub enum FileIoError {
    /// Required configuration is missing or blank.
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// An operation was attempted before the file io was initialized.
    #[error("file io is not initialized")]
    NotInitialized,

    /// An operation was attempted after `close`.
    #[error("file io is closed")]
    Closed,

    /// The location is not a URI we can address.
    #[error("invalid location '{location}': {reason}")]
    InvalidLocation { location: String, reason: String },

    /// No store is known for the location's scheme.
    #[error("unsupported scheme '{scheme}' for location {location}")]
    UnsupportedScheme { scheme: String, location: String },

    /// File not found.
    #[error("file not found: {location}")]
    NotFound { location: String },

    /// File already exists (conditional write failed).
    #[error("file already exists: {location}")]
    AlreadyExists { location: String },

    /// Local I/O error.
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Generic error from the underlying object store.
    #[error("object store error: {0}")]
    ObjectStore(object_store::Error),

    /// Other errors.
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl FileIoError {
    pub(crate) fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Returns true if this error indicates the file was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true if this error indicates the file already exists.
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }

    /// Returns true for configuration problems (bad keys, bad locations).
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfig { .. }
                | Self::InvalidLocation { .. }
                | Self::UnsupportedScheme { .. }
        )
    }

    /// Suggested exit code for CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotFound { .. } => 3,
            _ if self.is_config_error() => 2,
            _ => 1,
        }
    }

    /// Create from object_store error with context about the location.
    pub fn from_object_store(err: object_store::Error, location: &str) -> Self {
        match &err {
            object_store::Error::NotFound { .. } => Self::NotFound {
                location: location.to_string(),
            },
            object_store::Error::AlreadyExists { .. }
            | object_store::Error::Precondition { .. } => Self::AlreadyExists {
                location: location.to_string(),
            },
            _ => Self::ObjectStore(err),
        }
    }
}

impl From<object_store::Error> for FileIoError {
    fn from(err: object_store::Error) -> Self {
        Self::from_object_store(err, "unknown")
    }
}
