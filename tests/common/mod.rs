//! Shared helpers for integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use couchmap::document::{self, RawDocument};
use couchmap::schema::{FieldDef, RecordSchema, Schema};
use couchmap::store::{DocumentClient, DocumentRow, MemoryDocumentClient, StoreError, StoreResult};

/// Schema used across the integration tests
pub fn user_schema() -> Arc<RecordSchema> {
    Arc::new(
        RecordSchema::new(
            "User",
            vec![
                FieldDef::new("name", Schema::String),
                FieldDef::new("age", Schema::Int),
                FieldDef::new("tags", Schema::array(Schema::String)),
                FieldDef::new("email", Schema::optional(Schema::String)),
            ],
        )
        .unwrap(),
    )
}

pub fn doc(value: serde_json::Value) -> RawDocument {
    value.as_object().unwrap().clone()
}

/// Memory client that can reject puts with injected conflicts and records
/// every call made against it.
pub struct ScriptedClient {
    pub inner: MemoryDocumentClient,
    injected_conflicts: AtomicUsize,
    vanish_on_delete: AtomicBool,
    pub puts: AtomicUsize,
    pub deletes: AtomicUsize,
    pub last_put: Mutex<Option<RawDocument>>,
}

impl ScriptedClient {
    pub fn new(inner: MemoryDocumentClient) -> Self {
        Self {
            inner,
            injected_conflicts: AtomicUsize::new(0),
            vanish_on_delete: AtomicBool::new(false),
            puts: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
            last_put: Mutex::new(None),
        }
    }

    /// Reject the next `n` puts with a conflict
    pub fn inject_conflicts(&self, n: usize) {
        self.injected_conflicts.store(n, Ordering::SeqCst);
    }

    /// Make deletes behave as if another writer removed the document first:
    /// the document is removed and the call reports not-found.
    pub fn vanish_on_delete(&self) {
        self.vanish_on_delete.store(true, Ordering::SeqCst);
    }

    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn delete_count(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    pub fn last_put(&self) -> Option<RawDocument> {
        self.last_put.lock().unwrap().clone()
    }
}

impl DocumentClient for ScriptedClient {
    fn get(&self, id: &str) -> StoreResult<Option<RawDocument>> {
        self.inner.get(id)
    }

    fn put(&self, doc: &RawDocument) -> StoreResult<String> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        *self.last_put.lock().unwrap() = Some(doc.clone());

        let injected = self
            .injected_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if injected.is_ok() {
            let id = document::document_id(doc).unwrap_or_default().to_string();
            return Err(StoreError::Conflict(id));
        }
        self.inner.put(doc)
    }

    fn delete(&self, id: &str, rev: &str) -> StoreResult<String> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if self.vanish_on_delete.load(Ordering::SeqCst) {
            self.inner.delete(id, rev)?;
            return Err(StoreError::NotFound(id.to_string()));
        }
        self.inner.delete(id, rev)
    }

    fn all_docs(&self, limit: Option<u32>) -> StoreResult<Vec<DocumentRow>> {
        self.inner.all_docs(limit)
    }

    fn database_exists(&self) -> StoreResult<bool> {
        self.inner.database_exists()
    }

    fn create_database(&self) -> StoreResult<()> {
        self.inner.create_database()
    }

    fn delete_database(&self) -> StoreResult<()> {
        self.inner.delete_database()
    }
}
