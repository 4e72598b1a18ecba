//! Error type shared by every stage of the logger.

use std::io;

use thiserror::Error;

use crate::field_registry::FieldId;

/// Everything that can go wrong while registering, logging, writing or
/// reading a timestep log.
///
/// Variants fall into two groups. Usage mistakes (`SizeMismatch`,
/// `UnknownField`, `InvalidWidth`, `RegistryFull`, `BufferCapacity`,
/// `SchemaFrozen`) leave the logger untouched and can be recovered from.
/// Integrity failures (`Io`, `Compression`) mean the output stream can no
/// longer be trusted; see [`LoggerError::is_fatal`].
#[derive(Error, Debug)]
pub enum LoggerError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("compression engine fault: {0}")]
    Compression(String),

    #[error("field {field} expects {expected} values, got {actual}")]
    SizeMismatch {
        field: FieldId,
        expected: usize,
        actual: usize,
    },

    #[error("field {0} is not registered")]
    UnknownField(FieldId),

    #[error("field width must be positive")]
    InvalidWidth,

    #[error("field registry is full ({capacity} fields)")]
    RegistryFull { capacity: usize },

    #[error("timestep needs {required} bytes but the buffer holds {capacity}")]
    BufferCapacity { required: usize, capacity: usize },

    #[error("schema is frozen once the header has been written")]
    SchemaFrozen,

    #[error("logger is faulted after an earlier write failure")]
    Faulted,

    #[error("logger is closed")]
    Closed,

    #[error("unsupported format version {0}")]
    UnsupportedVersion(u32),

    #[error("header truncated: needed {needed} bytes, found {available}")]
    TruncatedHeader { needed: usize, available: usize },

    #[error("timestep truncated: expected {expected} bytes, found {actual}")]
    TruncatedTimestep { expected: usize, actual: usize },
}

impl LoggerError {
    /// True for errors after which the on-disk stream is presumed corrupt.
    pub fn is_fatal(&self) -> bool {
        matches!(self, LoggerError::Io(_) | LoggerError::Compression(_))
    }
}

impl From<flate2::CompressError> for LoggerError {
    fn from(e: flate2::CompressError) -> Self {
        LoggerError::Compression(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LoggerError>;
