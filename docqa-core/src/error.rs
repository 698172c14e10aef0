//! Error taxonomy shared by every stage of the pipeline.
//!
//! Each variant maps to an [`ErrorKind`] that crosses the request boundary as a
//! `{kind, message}` pair. Callers render `validation` and `precondition` as
//! client errors and everything else as a server error.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RagError {
    /// Malformed input: non-PDF upload, empty chunk set, bad chunking settings, `k == 0`.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A query was issued before any document was successfully ingested.
    #[error("{0}")]
    Precondition(String),

    /// The document could not be parsed or contained no extractable text.
    #[error("Ingestion failed: {0}")]
    Ingestion(String),

    /// An external model call failed permanently or exhausted its retries.
    ///
    /// The message stays generic; details are logged where the failure happens.
    #[error("{0}")]
    Service(String),
}

pub type Result<T> = std::result::Result<T, RagError>;

/// Boundary-facing category of a [`RagError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Validation,
    Precondition,
    Ingestion,
    Service,
}

impl ErrorKind {
    /// Whether the caller, not the service, is at fault.
    pub fn is_client_error(self) -> bool {
        matches!(self, ErrorKind::Validation | ErrorKind::Precondition)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Precondition => "precondition",
            ErrorKind::Ingestion => "ingestion",
            ErrorKind::Service => "service",
        };
        f.write_str(name)
    }
}

impl RagError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RagError::Validation(_) => ErrorKind::Validation,
            RagError::Precondition(_) => ErrorKind::Precondition,
            RagError::Ingestion(_) => ErrorKind::Ingestion,
            RagError::Service(_) => ErrorKind::Service,
        }
    }

    pub(crate) fn not_ready() -> Self {
        RagError::Precondition(
            "Vector index not initialized. Please process a document first.".to_string(),
        )
    }
}
