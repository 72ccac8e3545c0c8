//! Schema error types
//!
//! Error codes:
//! - COUCHMAP_SCHEMA_UNION_ARITY
//! - COUCHMAP_SCHEMA_UNION_NULLS
//! - COUCHMAP_SCHEMA_NESTED_UNION
//! - COUCHMAP_SCHEMA_EMPTY_ENUM
//! - COUCHMAP_SCHEMA_DUPLICATE_SYMBOL
//! - COUCHMAP_SCHEMA_DUPLICATE_FIELD

use thiserror::Error;

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Malformed schema errors.
///
/// Raised when a schema is constructed or when a structured decoder is
/// built for it. A schema that fails here never reaches the decoder cache.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("Union must declare at least 2 branches, found {0}")]
    UnionArity(usize),

    #[error("Union declares more than one null branch")]
    DuplicateNullBranch,

    #[error("Union may not directly contain another union")]
    NestedUnion,

    #[error("Enum '{0}' declares no symbols")]
    EmptyEnum(String),

    #[error("Enum '{name}' declares symbol '{symbol}' twice")]
    DuplicateSymbol { name: String, symbol: String },

    #[error("Record '{record}' declares field '{field}' twice")]
    DuplicateField { record: String, field: String },
}

impl SchemaError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaError::UnionArity(_) => "COUCHMAP_SCHEMA_UNION_ARITY",
            SchemaError::DuplicateNullBranch => "COUCHMAP_SCHEMA_UNION_NULLS",
            SchemaError::NestedUnion => "COUCHMAP_SCHEMA_NESTED_UNION",
            SchemaError::EmptyEnum(_) => "COUCHMAP_SCHEMA_EMPTY_ENUM",
            SchemaError::DuplicateSymbol { .. } => "COUCHMAP_SCHEMA_DUPLICATE_SYMBOL",
            SchemaError::DuplicateField { .. } => "COUCHMAP_SCHEMA_DUPLICATE_FIELD",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(SchemaError::UnionArity(1).code(), "COUCHMAP_SCHEMA_UNION_ARITY");
        assert_eq!(SchemaError::NestedUnion.code(), "COUCHMAP_SCHEMA_NESTED_UNION");
        assert_eq!(
            SchemaError::DuplicateField {
                record: "User".into(),
                field: "age".into()
            }
            .code(),
            "COUCHMAP_SCHEMA_DUPLICATE_FIELD"
        );
    }

    #[test]
    fn test_display_names_offender() {
        let err = SchemaError::DuplicateSymbol {
            name: "Color".into(),
            symbol: "RED".into(),
        };
        let display = format!("{}", err);
        assert!(display.contains("Color"));
        assert!(display.contains("RED"));
    }
}
