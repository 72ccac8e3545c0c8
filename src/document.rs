//! Raw stored documents
//!
//! A document is an untyped JSON object holding exactly what the store
//! keeps. The store owns two reserved fields: the document identifier and
//! the revision token. Neither is ever a schema field.

use serde_json::{Map, Value};

/// An untyped stored document
pub type RawDocument = Map<String, Value>;

/// Reserved identifier field
pub const ID_FIELD: &str = "_id";

/// Reserved revision token field
pub const REV_FIELD: &str = "_rev";

/// Identifier of a document, if present
pub fn document_id(doc: &RawDocument) -> Option<&str> {
    doc.get(ID_FIELD).and_then(Value::as_str)
}

/// Revision token of a document, if present
pub fn revision(doc: &RawDocument) -> Option<&str> {
    doc.get(REV_FIELD).and_then(Value::as_str)
}

/// Whether a field name is owned by the store
pub fn is_reserved(name: &str) -> bool {
    name.starts_with('_')
}
