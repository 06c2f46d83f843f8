// src/error.rs
//
// Unified error handling for webp-batch
// Uses thiserror for simple, type-safe error handling
//
// Error Taxonomy:
// - UserError: Invalid input, recoverable
// - CodecError: Format/encoding issues
// - ResourceLimit: Storage/dimension limits
// - InternalBug: Library bugs (should not happen)

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use thiserror::Error;

/// Coarse error classification, used by callers to pick a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Invalid input, recoverable by user
    UserError,
    /// Format/encoding issues
    CodecError,
    /// Storage/dimension limits
    ResourceLimit,
    /// Library bugs (should not happen)
    InternalBug,
}

/// Which stage of the transcode failed.
///
/// Every `TranscodeError` maps onto exactly one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UnsupportedType,
    DecodeError,
    EncodeError,
    StorageError,
    InvalidArgument,
    Internal,
}

/// Per-item transcode errors.
///
/// These never cross a worker boundary as a panic: a worker captures them and
/// carries them through the result channel like any other result.
#[derive(Debug, Error)]
pub enum TranscodeError {
    // Validation Errors
    #[error("unsupported file type: {content_type}")]
    UnsupportedType { content_type: Cow<'static, str> },

    // Upload I/O Errors
    #[error("couldn't read upload '{name}': {source}")]
    FileReadFailed {
        name: Cow<'static, str>,
        #[source]
        source: std::io::Error,
    },

    // Decode Errors
    #[error("couldn't decode image: {message}")]
    DecodeFailed { message: Cow<'static, str> },

    #[error("image dimension {dimension} exceeds maximum {max}")]
    DimensionExceedsLimit { dimension: u32, max: u32 },

    #[error("image pixel count {pixels} exceeds maximum {max}")]
    PixelCountExceedsLimit { pixels: u64, max: u64 },

    // Encode Errors
    #[error("couldn't encode to {format}: {message}")]
    EncodeFailed {
        format: Cow<'static, str>,
        message: Cow<'static, str>,
    },

    // Storage Errors
    #[error("couldn't write output file '{path}': {source}")]
    StorageFailed {
        path: Cow<'static, str>,
        #[source]
        source: std::io::Error,
    },

    #[error("file not found: {path}")]
    FileNotFound { path: Cow<'static, str> },

    // Configuration Errors
    #[error("invalid value for {name}: {value}. {reason}")]
    InvalidArgument {
        name: Cow<'static, str>,
        value: Cow<'static, str>,
        reason: Cow<'static, str>,
    },

    // Internal Errors
    #[error("internal error: {message}")]
    InternalPanic { message: Cow<'static, str> },
}

// Constructor Helpers
impl TranscodeError {
    pub fn unsupported_type(content_type: impl Into<Cow<'static, str>>) -> Self {
        Self::UnsupportedType {
            content_type: content_type.into(),
        }
    }

    pub fn file_read_failed(name: impl Into<Cow<'static, str>>, source: std::io::Error) -> Self {
        Self::FileReadFailed {
            name: name.into(),
            source,
        }
    }

    pub fn decode_failed(message: impl Into<Cow<'static, str>>) -> Self {
        Self::DecodeFailed {
            message: message.into(),
        }
    }

    pub fn dimension_exceeds_limit(dimension: u32, max: u32) -> Self {
        Self::DimensionExceedsLimit { dimension, max }
    }

    pub fn pixel_count_exceeds_limit(pixels: u64, max: u64) -> Self {
        Self::PixelCountExceedsLimit { pixels, max }
    }

    pub fn encode_failed(
        format: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::EncodeFailed {
            format: format.into(),
            message: message.into(),
        }
    }

    pub fn storage_failed(path: impl Into<Cow<'static, str>>, source: std::io::Error) -> Self {
        Self::StorageFailed {
            path: path.into(),
            source,
        }
    }

    pub fn file_not_found(path: impl Into<Cow<'static, str>>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    pub fn invalid_argument(
        name: impl Into<Cow<'static, str>>,
        value: impl Into<Cow<'static, str>>,
        reason: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::InvalidArgument {
            name: name.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub fn internal_panic(message: impl Into<Cow<'static, str>>) -> Self {
        Self::InternalPanic {
            message: message.into(),
        }
    }

    /// Check if this error is recoverable (user can fix it)
    ///
    /// Consistent with category(): UserError and ResourceLimit are recoverable.
    pub fn is_recoverable(&self) -> bool {
        match self.category() {
            ErrorCategory::UserError | ErrorCategory::ResourceLimit => true,
            ErrorCategory::CodecError | ErrorCategory::InternalBug => false,
        }
    }

    /// Get the error category for this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UnsupportedType { .. }
            | Self::FileNotFound { .. }
            | Self::InvalidArgument { .. } => ErrorCategory::UserError,

            Self::DecodeFailed { .. } | Self::EncodeFailed { .. } => ErrorCategory::CodecError,

            // Upload reads and output writes usually fail because of disk
            // pressure or permissions, both fixable outside the library.
            Self::DimensionExceedsLimit { .. }
            | Self::PixelCountExceedsLimit { .. }
            | Self::FileReadFailed { .. }
            | Self::StorageFailed { .. } => ErrorCategory::ResourceLimit,

            Self::InternalPanic { .. } => ErrorCategory::InternalBug,
        }
    }

    /// Get the transcode stage this error belongs to
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedType { .. } => ErrorKind::UnsupportedType,
            Self::FileReadFailed { .. }
            | Self::DecodeFailed { .. }
            | Self::DimensionExceedsLimit { .. }
            | Self::PixelCountExceedsLimit { .. } => ErrorKind::DecodeError,
            Self::EncodeFailed { .. } => ErrorKind::EncodeError,
            Self::StorageFailed { .. } | Self::FileNotFound { .. } => ErrorKind::StorageError,
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Self::InternalPanic { .. } => ErrorKind::Internal,
        }
    }
}

/// Batch-level failure.
///
/// A batch is all-or-nothing: the first failing item (in submission order)
/// turns the whole batch into a failure. Outputs already persisted for other
/// items are left in temporary storage.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("no images provided")]
    EmptyBatch,

    #[error("{source}")]
    ItemFailed {
        index: usize,
        name: String,
        #[source]
        source: TranscodeError,
    },
}

impl BatchError {
    /// Submission index of the failing item, if the failure is item-level
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::EmptyBatch => None,
            Self::ItemFailed { index, .. } => Some(*index),
        }
    }

    /// The per-item error behind an item-level failure
    pub fn item_error(&self) -> Option<&TranscodeError> {
        match self {
            Self::EmptyBatch => None,
            Self::ItemFailed { source, .. } => Some(source),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::EmptyBatch => ErrorCategory::UserError,
            Self::ItemFailed { source, .. } => source.category(),
        }
    }

    /// Serializable body for the request-handling collaborator
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            error: self.to_string(),
            index: self.index(),
            filename: match self {
                Self::EmptyBatch => None,
                Self::ItemFailed { name, .. } => Some(name.clone()),
            },
        }
    }
}

/// JSON error payload: `{"error": "...", "index": 2, "filename": "..."}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

// Result type alias
pub type Result<T> = std::result::Result<T, TranscodeError>;
