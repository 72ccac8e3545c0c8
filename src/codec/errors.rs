//! Codec errors
//!
//! Every variant aborts the record decode that raised it; no partially
//! assembled record is ever returned.

use thiserror::Error;

use crate::schema::SchemaError;

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;

/// Field value decode and encode errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    #[error("Field '{field}': cannot parse {value:?} as {expected}")]
    InvalidScalar {
        field: String,
        expected: &'static str,
        value: String,
    },

    #[error("Field '{field}': expected {expected} in stored document, found {found}")]
    UnexpectedRaw {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Enum '{name}' has no symbol '{symbol}'")]
    UnknownEnumSymbol { name: String, symbol: String },

    #[error("Field '{0}': fixed-type fields cannot be decoded from a document")]
    UnsupportedFixed(String),

    #[error("Field '{field}': invalid base64 payload: {reason}")]
    InvalidEncoding { field: String, reason: String },

    #[error("Malformed blob: {0}")]
    MalformedBlob(String),

    #[error("Value of kind {found} does not match schema kind {expected}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("No structured decoder exists for schema kind {0}")]
    NotStructured(&'static str),

    #[error("Unknown field '{0}'")]
    UnknownField(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl CodecError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            CodecError::InvalidScalar { .. } => "COUCHMAP_DECODE_INVALID_SCALAR",
            CodecError::UnexpectedRaw { .. } => "COUCHMAP_DECODE_UNEXPECTED_RAW",
            CodecError::UnknownEnumSymbol { .. } => "COUCHMAP_DECODE_UNKNOWN_SYMBOL",
            CodecError::UnsupportedFixed(_) => "COUCHMAP_DECODE_UNSUPPORTED_FIXED",
            CodecError::InvalidEncoding { .. } => "COUCHMAP_DECODE_INVALID_ENCODING",
            CodecError::MalformedBlob(_) => "COUCHMAP_DECODE_MALFORMED_BLOB",
            CodecError::TypeMismatch { .. } => "COUCHMAP_ENCODE_TYPE_MISMATCH",
            CodecError::NotStructured(_) => "COUCHMAP_CODEC_NOT_STRUCTURED",
            CodecError::UnknownField(_) => "COUCHMAP_CODEC_UNKNOWN_FIELD",
            CodecError::Schema(e) => e.code(),
        }
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        CodecError::MalformedBlob(reason.into())
    }
}
