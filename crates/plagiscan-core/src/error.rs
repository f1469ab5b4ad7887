use std::path::PathBuf;

/// Errors that can occur across plagiscan.
///
/// Each variant wraps a specific error domain. Library crates use this type
/// directly; the binary crate converts to `miette::Report` at the boundary.
///
/// # Examples
///
/// ```
/// use plagiscan_core::PlagiscanError;
///
/// let err = PlagiscanError::Config("missing API key".into());
/// assert!(err.to_string().contains("missing API key"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum PlagiscanError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A collaborator service was unreachable or answered with a non-success status.
    #[error("transport error: {0}")]
    Transport(String),

    /// A collaborator answered without the expected fields.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Persisted index state that cannot be repaired by truncation.
    #[error("corrupt index: {0}")]
    #[diagnostic(help("rebuild the index with `plagiscan index`"))]
    CorruptIndex(String),

    /// An embedding does not have the dimensionality fixed for the index.
    #[error("embedding dimension mismatch: index expects {expected}, got {actual}")]
    #[diagnostic(help("an index holds a single embedding model; rebuild it after changing models"))]
    DimensionMismatch {
        /// Dimension recorded for the index.
        expected: usize,
        /// Dimension of the offending vector.
        actual: usize,
    },

    /// Vector store database failure.
    #[error("database error: {0}")]
    Database(String),

    /// Repository acquisition failure.
    #[error("git error: {0}")]
    Git(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A required file was not found.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Another writer holds the index.
    #[error("index is locked by another writer: {}", .0.display())]
    #[diagnostic(help("wait for the running indexing job, or remove a stale lock file"))]
    IndexLocked(PathBuf),
}

impl PlagiscanError {
    /// Whether this error came from talking to an external collaborator.
    ///
    /// # Examples
    ///
    /// ```
    /// use plagiscan_core::PlagiscanError;
    ///
    /// assert!(PlagiscanError::Transport("timeout".into()).is_transport());
    /// assert!(PlagiscanError::MalformedResponse("no field".into()).is_transport());
    /// assert!(!PlagiscanError::Config("bad".into()).is_transport());
    /// ```
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::MalformedResponse(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: PlagiscanError = io_err.into();
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn config_error_displays_message() {
        let err = PlagiscanError::Config("bad value".into());
        assert_eq!(err.to_string(), "configuration error: bad value");
    }

    #[test]
    fn dimension_mismatch_names_both_sizes() {
        let err = PlagiscanError::DimensionMismatch {
            expected: 768,
            actual: 1024,
        };
        let msg = err.to_string();
        assert!(msg.contains("768"));
        assert!(msg.contains("1024"));
    }

    #[test]
    fn index_locked_shows_path() {
        let err = PlagiscanError::IndexLocked(PathBuf::from("/tmp/index.db.lock"));
        assert!(err.to_string().contains("/tmp/index.db.lock"));
    }
}
