//! # In-Memory Document Client
//!
//! Revision-fenced document database held in process memory. Follows the
//! CouchDB update rules:
//!
//! - updating an existing document requires its current `_rev`
//! - creating a document must not carry a `_rev`
//! - a deleted document may be recreated without a `_rev`
//! - revision tokens are `<generation>-<digest>` and change on every write

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::client::{DocumentClient, DocumentRow};
use super::errors::{StoreError, StoreResult};
use crate::document::{self, RawDocument, ID_FIELD, REV_FIELD};

/// Stored revision of one document id
#[derive(Debug, Clone)]
struct Entry {
    generation: u64,
    rev: String,
    /// `None` once deleted
    body: Option<RawDocument>,
}

#[derive(Debug, Default)]
struct Database {
    exists: bool,
    docs: BTreeMap<String, Entry>,
}

/// In-process document client bound to one database
#[derive(Debug)]
pub struct MemoryDocumentClient {
    name: String,
    db: Mutex<Database>,
}

impl MemoryDocumentClient {
    /// Client for a database that does not exist yet
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            db: Mutex::new(Database::default()),
        }
    }

    /// Client for an existing, empty database
    pub fn with_database(name: impl Into<String>) -> Self {
        let client = Self::new(name);
        client.lock().exists = true;
        client
    }

    /// Name of the bound database
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of live documents
    pub fn len(&self) -> usize {
        self.lock().docs.values().filter(|e| e.body.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Database> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn open(&self) -> StoreResult<MutexGuard<'_, Database>> {
        let db = self.lock();
        if !db.exists {
            return Err(StoreError::DatabaseNotFound(self.name.clone()));
        }
        Ok(db)
    }
}

/// Revision token for a new generation of a document
fn next_revision(generation: u64, id: &str, body: Option<&RawDocument>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(id.as_bytes());
    if let Some(body) = body {
        for (key, value) in body.iter().filter(|(k, _)| !document::is_reserved(k)) {
            hasher.update(key.as_bytes());
            hasher.update(value.to_string().as_bytes());
        }
    } else {
        hasher.update(b"deleted");
    }
    let digest = hasher.finalize();
    let hex: String = digest[..16].iter().map(|b| format!("{:02x}", b)).collect();
    format!("{}-{}", generation, hex)
}

impl DocumentClient for MemoryDocumentClient {
    fn get(&self, id: &str) -> StoreResult<Option<RawDocument>> {
        let db = self.open()?;
        Ok(db.docs.get(id).and_then(|e| e.body.clone()))
    }

    fn put(&self, doc: &RawDocument) -> StoreResult<String> {
        let id = document::document_id(doc)
            .ok_or_else(|| StoreError::Client(format!("document has no string {}", ID_FIELD)))?
            .to_string();
        let supplied = document::revision(doc);

        let mut db = self.open()?;
        let generation = match db.docs.get(&id) {
            Some(entry) if entry.body.is_some() => {
                if supplied != Some(entry.rev.as_str()) {
                    return Err(StoreError::Conflict(id));
                }
                entry.generation + 1
            }
            Some(tombstone) => {
                if supplied.is_some_and(|rev| rev != tombstone.rev) {
                    return Err(StoreError::Conflict(id));
                }
                tombstone.generation + 1
            }
            None => {
                if supplied.is_some() {
                    return Err(StoreError::Conflict(id));
                }
                1
            }
        };

        let rev = next_revision(generation, &id, Some(doc));
        let mut body = doc.clone();
        body.insert(REV_FIELD.to_string(), rev.clone().into());

        db.docs.insert(
            id,
            Entry {
                generation,
                rev: rev.clone(),
                body: Some(body),
            },
        );
        Ok(rev)
    }

    fn delete(&self, id: &str, rev: &str) -> StoreResult<String> {
        let mut db = self.open()?;
        let entry = db
            .docs
            .get_mut(id)
            .filter(|e| e.body.is_some())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        if entry.rev != rev {
            return Err(StoreError::Conflict(id.to_string()));
        }

        entry.generation += 1;
        entry.rev = next_revision(entry.generation, id, None);
        entry.body = None;
        Ok(entry.rev.clone())
    }

    fn all_docs(&self, limit: Option<u32>) -> StoreResult<Vec<DocumentRow>> {
        let db = self.open()?;
        let live = db.docs.iter().filter_map(|(id, e)| {
            e.body.as_ref().map(|body| DocumentRow {
                id: id.clone(),
                doc: Some(body.clone()),
            })
        });
        Ok(match limit {
            Some(limit) => live.take(limit as usize).collect(),
            None => live.collect(),
        })
    }

    fn database_exists(&self) -> StoreResult<bool> {
        Ok(self.lock().exists)
    }

    fn create_database(&self) -> StoreResult<()> {
        let mut db = self.lock();
        if db.exists {
            return Err(StoreError::Client(format!("database '{}' already exists", self.name)));
        }
        db.exists = true;
        Ok(())
    }

    fn delete_database(&self) -> StoreResult<()> {
        let mut db = self.lock();
        if !db.exists {
            return Err(StoreError::DatabaseNotFound(self.name.clone()));
        }
        *db = Database::default();
        Ok(())
    }
}
