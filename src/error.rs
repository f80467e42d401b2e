//! Error types for the Lorekeeper library.
//!
//! All fallible operations return [`Result`], whose error side is the
//! [`LorekeeperError`] enum. Query-time failures are always surfaced as one of
//! these variants; an empty result list is never used to stand in for an error.
//!
//! # Examples
//!
//! ```
//! use lorekeeper::error::{LorekeeperError, Result};
//!
//! fn check_alpha(alpha: f32) -> Result<()> {
//!     if !(0.0..=1.0).contains(&alpha) {
//!         return Err(LorekeeperError::invalid_argument("alpha must be in [0, 1]"));
//!     }
//!     Ok(())
//! }
//!
//! assert!(check_alpha(0.2).is_ok());
//! assert!(check_alpha(1.5).is_err());
//! ```

use std::io;

use thiserror::Error;

/// The main error type for Lorekeeper operations.
#[derive(Error, Debug)]
pub enum LorekeeperError {
    /// A query was issued before any successful initialization.
    #[error("Retriever not initialized. Initialize it with passages first.")]
    NotInitialized,

    /// Initialization was attempted with zero passages.
    #[error("Cannot build indexes over an empty passage collection")]
    EmptyCorpus,

    /// The embedding source failed or could not be reached.
    #[error("Embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// A vector violated the index preconditions (dimension, unit norm).
    #[error("Vector error: {0}")]
    Vector(String),

    /// A caller-supplied argument was out of range.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A configuration value was rejected.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Index construction was aborted by the caller.
    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    /// A passage file line could not be parsed.
    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    /// I/O errors (passage files, config files).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),

    /// Errors raised by embedder implementations built on anyhow.
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with LorekeeperError.
pub type Result<T> = std::result::Result<T, LorekeeperError>;

impl LorekeeperError {
    /// Create a new embedding-unavailable error.
    pub fn embedding_unavailable<S: Into<String>>(msg: S) -> Self {
        LorekeeperError::EmbeddingUnavailable(msg.into())
    }

    /// Create a new vector precondition error.
    pub fn vector<S: Into<String>>(msg: S) -> Self {
        LorekeeperError::Vector(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        LorekeeperError::InvalidArgument(msg.into())
    }

    /// Create a new invalid config error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        LorekeeperError::InvalidConfig(msg.into())
    }

    /// Create a new cancelled error.
    pub fn cancelled<S: Into<String>>(msg: S) -> Self {
        LorekeeperError::Cancelled(msg.into())
    }

    /// Create a new parse error for a 1-based line number.
    pub fn parse<S: Into<String>>(line: usize, msg: S) -> Self {
        LorekeeperError::Parse {
            line,
            message: msg.into(),
        }
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LorekeeperError::Other(msg.into())
    }

    /// Whether a caller may reasonably retry the failed operation later.
    ///
    /// Only embedding outages qualify; retry policy itself belongs to the caller.
    pub fn is_transient(&self) -> bool {
        matches!(self, LorekeeperError::EmbeddingUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = LorekeeperError::embedding_unavailable("model offline");
        assert_eq!(error.to_string(), "Embedding unavailable: model offline");

        let error = LorekeeperError::vector("norm 2.0");
        assert_eq!(error.to_string(), "Vector error: norm 2.0");

        let error = LorekeeperError::parse(3, "missing field `text`");
        assert_eq!(error.to_string(), "Parse error on line 3: missing field `text`");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let error = LorekeeperError::from(io_error);

        match error {
            LorekeeperError::Io(_) => {} // Expected
            _ => panic!("Expected IO error variant"),
        }
    }

    #[test]
    fn test_anyhow_conversion() {
        fn remote_embed() -> anyhow::Result<()> {
            anyhow::bail!("connection refused")
        }
        fn call() -> Result<()> {
            remote_embed()?;
            Ok(())
        }

        let error = call().unwrap_err();
        assert!(matches!(error, LorekeeperError::Anyhow(_)));
        assert!(error.to_string().contains("connection refused"));
    }

    #[test]
    fn test_transient_classification() {
        assert!(LorekeeperError::embedding_unavailable("timeout").is_transient());
        assert!(!LorekeeperError::NotInitialized.is_transient());
        assert!(!LorekeeperError::EmptyCorpus.is_transient());
    }
}
