//! couchmap - schema-driven record mapping for revision-fenced document stores
//!
//! Records are described by an immutable schema. Scalar fields are stored as
//! document values; arrays, maps, records and tagged unions are stored as
//! base64 binary blobs decoded through one shared decoder per schema.
//! Writes are optimistic and resolve revision conflicts by clearing the
//! stale document and writing again.

pub mod codec;
pub mod document;
pub mod observability;
pub mod persistent;
pub mod schema;
pub mod store;
