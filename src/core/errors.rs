//! Error types for project operations
//!
//! Library code returns [`ProjectResult`] so callers can match on the
//! failure category. Application code (the CLI runner) wraps these in
//! `anyhow` with extra context.

use thiserror::Error;

/// Result alias used throughout the project subsystem
pub type ProjectResult<T> = Result<T, ProjectError>;

/// Failure categories of the project subsystem
#[derive(Debug, Error)]
pub enum ProjectError {
    /// A master or glyph layer with this name is already registered
    #[error("{kind} \"{name}\" already exists")]
    AlreadyExists { kind: &'static str, name: String },

    /// Unknown master, layer, skeleton or rule source
    #[error("{kind} \"{name}\" not found")]
    NotFound { kind: &'static str, name: String },

    /// A persisted file exists but could not be parsed
    #[error("malformed {path}: {reason}")]
    Malformed { path: String, reason: String },

    /// An expected file is absent
    #[error("missing file: {path}")]
    MissingFile { path: String },

    /// A tree operation violated the element capability table
    #[error("invalid tree operation: {0}")]
    InvalidTree(String),

    /// Underlying I/O failure other than a missing file
    #[error("failed to {operation} {path}: {source}")]
    Io {
        operation: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The archive could not be opened or an entry could not be read
    #[error("archive error: {0}")]
    Archive(String),

    /// The filesystem watcher could not be set up
    #[error("watch error: {0}")]
    Watch(String),

    /// norad failed to load glyph sources
    #[error("failed to load glyph sources from {path}: {reason}")]
    GlyphSource { path: String, reason: String },
}

impl ProjectError {
    pub fn already_exists(kind: &'static str, name: impl Into<String>) -> Self {
        Self::AlreadyExists {
            kind,
            name: name.into(),
        }
    }

    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub fn malformed(path: impl Into<String>, reason: impl ToString) -> Self {
        Self::Malformed {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// True for errors that read paths are allowed to treat as "use the default"
    pub fn is_missing_file(&self) -> bool {
        matches!(self, Self::MissingFile { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Attach the operation and path to a raw I/O error
pub trait IoContext<T> {
    fn with_file_context(self, operation: &'static str, path: &str) -> ProjectResult<T>;
}

impl<T> IoContext<T> for std::io::Result<T> {
    fn with_file_context(self, operation: &'static str, path: &str) -> ProjectResult<T> {
        self.map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ProjectError::MissingFile {
                    path: path.to_string(),
                }
            } else {
                ProjectError::Io {
                    operation,
                    path: path.to_string(),
                    source,
                }
            }
        })
    }
}
