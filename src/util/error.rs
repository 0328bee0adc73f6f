//! Error types for the shadetree library.

use thiserror::Error;

/// Main error type for lowering operations.
///
/// Note that the lowering pass itself is best-effort and records
/// [`crate::diag::Diagnostics`] instead of failing; these errors surface at
/// the API edges (loading a tree or a table bundle, querying the in-memory
/// graph, parsing a literal).
#[derive(Error, Debug)]
pub enum Error {
    /// Node kind tag not in the closed set
    #[error("Unknown node kind: {0}")]
    UnknownNodeKind(String),

    /// Shading-model variant not in the closed set
    #[error("Unknown shading-model variant: {0}")]
    UnknownVariant(String),

    /// Literal text does not match the expected value kind
    #[error("Malformed {kind} literal: {text:?}")]
    MalformedLiteral { kind: String, text: String },

    /// Destination input has no entry in the value-kind table
    #[error("No value kind registered for input: {0}")]
    UnknownInput(String),

    /// Graph node not found by path
    #[error("Graph node not found: {0}")]
    NodeNotFound(String),

    /// Graph handle does not refer to a live entity
    #[error("Stale graph handle: {0}")]
    StaleHandle(String),

    /// Invalid mapping-table bundle
    #[error("Invalid mapping tables: {0}")]
    InvalidTables(String),

    /// JSON parse failure when loading a tree or table bundle
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an "other" error from a string.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Create a malformed-literal error.
    pub fn malformed(kind: impl Into<String>, text: impl Into<String>) -> Self {
        Self::MalformedLiteral {
            kind: kind.into(),
            text: text.into(),
        }
    }
}

/// Result type alias for shadetree operations.
pub type Result<T> = std::result::Result<T, Error>;
