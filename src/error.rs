//! Error types for osmbuf
//!
//! Provides a unified error type for all operations.

use std::fmt;

use thiserror::Error;

/// Result type alias using OsmError
pub type Result<T> = std::result::Result<T, OsmError>;

/// Unified error type for osmbuf operations
#[derive(Debug, Error)]
pub enum OsmError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Container Format Errors
    // -------------------------------------------------------------------------
    #[error("PBF format error: {0}")]
    Pbf(#[from] PbfError),

    // -------------------------------------------------------------------------
    // Builder Errors
    // -------------------------------------------------------------------------
    #[error("OSM {field} is too long ({length} bytes, max {max})")]
    LengthExceeded {
        field: StringField,
        length: usize,
        max: usize,
    },

    #[error("Invalid value for attribute '{name}': {value:?}")]
    InvalidAttribute { name: String, value: String },

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors found while scanning or reading a PBF container.
///
/// Any of these aborts the operation in progress: index construction
/// returns no table, a block read returns no buffer.
#[derive(Debug, Error)]
pub enum PbfError {
    #[error("invalid BlobHeader size {size} (> {max})")]
    HeaderSizeInvalid { size: u32, max: u32 },

    #[error("BlobHeader.datasize missing or zero")]
    MissingDataSize,

    #[error("blob has type {found:?}, expected {expected:?} (OSMHeader in first blob, OSMData in following blobs)")]
    UnexpectedType { expected: String, found: String },

    #[error("invalid block size {size} (> {max})")]
    BlockTooLarge { size: u64, max: u64 },

    #[error("unexpected EOF in {0}")]
    UnexpectedEof(&'static str),

    #[error("file ends at {file_size} but blocks run to {offset} (file changed or was truncated)")]
    Truncated { offset: u64, file_size: u64 },

    #[error("malformed BlobHeader: {0}")]
    InvalidHeader(String),

    #[error("block decode failed: {0}")]
    Decode(String),
}

/// String fields with a length limit, used to report which one overflowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringField {
    TagKey,
    TagValue,
    Role,
    User,
    CommentText,
}

impl fmt::Display for StringField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StringField::TagKey => "tag key",
            StringField::TagValue => "tag value",
            StringField::Role => "relation member role",
            StringField::User => "user name",
            StringField::CommentText => "changeset comment",
        };
        f.write_str(name)
    }
}

impl OsmError {
    /// Map an I/O error from a read that was expected to fill its buffer.
    ///
    /// A short read becomes `PbfError::UnexpectedEof(context)`; anything
    /// else stays an I/O error.
    pub(crate) fn from_read(err: std::io::Error, context: &'static str) -> Self {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            OsmError::Pbf(PbfError::UnexpectedEof(context))
        } else {
            OsmError::Io(err)
        }
    }

    /// True for container format errors.
    pub fn is_format_error(&self) -> bool {
        matches!(self, OsmError::Pbf(_))
    }
}
