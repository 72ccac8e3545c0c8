//! # Document Client Trait
//!
//! Boundary to the document database. One client is bound to one database.
//! Calls are blocking; timeouts and network retry belong to the
//! implementation.

use super::errors::StoreResult;
use crate::document::RawDocument;

/// One row of an all-documents scan
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRow {
    pub id: String,
    /// The document body, when documents are included in the scan
    pub doc: Option<RawDocument>,
}

/// Client for a revision-fenced document database
pub trait DocumentClient: Send + Sync {
    /// Fetch the current document, `None` if absent or deleted
    fn get(&self, id: &str) -> StoreResult<Option<RawDocument>>;

    /// Create or update a document, returning its new revision token.
    ///
    /// Fails with `StoreError::Conflict` when the document's `_rev` does not
    /// match the stored revision.
    fn put(&self, doc: &RawDocument) -> StoreResult<String>;

    /// Delete the document at `rev`, returning the acknowledgment token
    fn delete(&self, id: &str, rev: &str) -> StoreResult<String>;

    /// Scan all documents in id order, bodies included
    fn all_docs(&self, limit: Option<u32>) -> StoreResult<Vec<DocumentRow>>;

    /// Whether the bound database exists
    fn database_exists(&self) -> StoreResult<bool>;

    /// Create the bound database
    fn create_database(&self) -> StoreResult<()>;

    /// Drop the bound database and every document in it
    fn delete_database(&self) -> StoreResult<()>;

    /// Push any buffered writes to the server
    fn flush(&self) -> StoreResult<()> {
        Ok(())
    }
}
