//! Schema subsystem
//!
//! Schemas are immutable, closed descriptions of a record's shape. They are
//! supplied by the caller and never mutated after construction.
//!
//! # Design Principles
//!
//! - Closed sum type over every declared kind
//! - Field positions fixed at construction
//! - Structural identity via canonical form
//! - Malformed schemas rejected before any decoder is built

mod errors;
mod resolver;
mod types;

pub use errors::{SchemaError, SchemaResult};
pub use resolver::{is_nullable, resolve_union, UnionResolution};
pub use types::{EnumSchema, Field, FieldDef, FixedSchema, RecordSchema, Schema, SchemaKind};
