//! Error types for TblTransfer
//!
//! Defines all error types used throughout the library.

use thiserror::Error;

/// Maximum number of characters of an offending line kept in an error
const CONTENT_PREVIEW: usize = 100;

/// Errors raised by a coordinate translator or a length lookup
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    /// Reference sequence is outside the translator's domain
    #[error("Sequence not found in alignment: {0}")]
    UnknownSequence(String),

    /// Alternate sequence has no entry in the length table
    #[error("No length known for alternate sequence: {0}")]
    UnknownLength(String),
}

/// Fatal errors of a feature table transfer
///
/// Every variant carries the 1-based input line number; the ones raised
/// from a specific line also keep a preview of the raw content.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Malformed header or coordinate line, or a line out of place
    #[error("Invalid feature table at line {line}: {message} ({content:?})")]
    Format {
        line: usize,
        message: String,
        content: String,
    },

    /// Header accession unknown to the coordinate translator
    #[error("Cannot map sequence '{id}' at line {line} onto the alternate assembly ({content:?})")]
    UnmappableIdentifier {
        line: usize,
        id: String,
        content: String,
    },

    /// Header accession absent from the reference assembly
    #[error("Sequence '{id}' at line {line} is not part of the reference assembly")]
    ForeignAccession { line: usize, id: String },

    /// Clipping needed the length of an alternate sequence that is not known
    #[error("No length known for alternate sequence '{id}' (needed at line {line})")]
    MissingLength { line: usize, id: String },

    /// I/O error while reading or writing
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransferError {
    /// Create a format error with a preview of the offending line
    pub fn format(message: impl Into<String>, line: usize, content: &str) -> Self {
        TransferError::Format {
            line,
            message: message.into(),
            content: preview(content),
        }
    }

    /// Create an unmappable identifier error
    pub fn unmappable(id: impl Into<String>, line: usize, content: &str) -> Self {
        TransferError::UnmappableIdentifier {
            line,
            id: id.into(),
            content: preview(content),
        }
    }

    /// Attach line context to a translator failure
    pub fn from_mapping(err: MappingError, line: usize, content: &str) -> Self {
        match err {
            MappingError::UnknownSequence(id) => Self::unmappable(id, line, content),
            MappingError::UnknownLength(id) => TransferError::MissingLength { line, id },
        }
    }

    /// Line number the error refers to, if any
    pub fn line(&self) -> Option<usize> {
        match self {
            TransferError::Format { line, .. }
            | TransferError::UnmappableIdentifier { line, .. }
            | TransferError::ForeignAccession { line, .. }
            | TransferError::MissingLength { line, .. } => Some(*line),
            TransferError::Io(_) => None,
        }
    }
}

/// Errors that can occur while reading a FASTA file
#[derive(Debug, Error)]
pub enum FastaError {
    /// The same sequence id appears twice
    #[error("Duplicate sequence id in FASTA: {0}")]
    DuplicateSequence(String),

    /// I/O or record syntax error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn preview(content: &str) -> String {
    content.chars().take(CONTENT_PREVIEW).collect()
}

/// Result type alias for mapping operations
pub type MappingResult<T> = std::result::Result<T, MappingError>;

/// Result type alias for transfer operations
pub type TransferResult<T> = std::result::Result<T, TransferError>;
