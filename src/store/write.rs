//! Optimistic write path
//!
//! A commit serializes a record's dirty, non-null fields into one document
//! and writes it once. A revision conflict is resolved by fetching the
//! stored document, deleting it at its current revision, and writing
//! again with the stored fields the record did not touch carried over. The
//! number of such recoveries is bounded; once exhausted the conflict
//! surfaces to the caller.
//!
//! The fetch, delete and retry run without any lock, so a third concurrent
//! writer can interleave. Callers needing stronger guarantees must ensure
//! at most one committer per key.

use std::fmt::Display;

use super::client::DocumentClient;
use super::errors::{StoreError, StoreResult};
use crate::codec::{CodecResult, DecoderCache, FieldCodec};
use crate::document::{self, RawDocument, ID_FIELD};
use crate::observability::{log_event_with_fields, Event, MetricsRegistry};
use crate::persistent::Persistent;

/// Result of a commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Record was neither new nor dirty; nothing was written
    Skipped,
    /// Document written at this revision
    Written { rev: String },
}

/// Commits records to a document client
pub struct WriteCoordinator<'a, C: DocumentClient + ?Sized> {
    client: &'a C,
    codec: FieldCodec<'a>,
    metrics: &'a MetricsRegistry,
    conflict_retries: u32,
}

impl<'a, C: DocumentClient + ?Sized> WriteCoordinator<'a, C> {
    pub fn new(client: &'a C, cache: &'a DecoderCache, metrics: &'a MetricsRegistry) -> Self {
        Self {
            client,
            codec: FieldCodec::new(cache),
            metrics,
            conflict_retries: 1,
        }
    }

    /// Set how many fetch-delete-retry cycles a commit may run
    pub fn with_conflict_retries(mut self, retries: u32) -> Self {
        self.conflict_retries = retries;
        self
    }

    /// Build the outgoing document: the identifier plus every field that is
    /// both dirty and non-null.
    pub fn build_document<P: Persistent + ?Sized>(&self, id: &str, record: &P) -> CodecResult<RawDocument> {
        let mut doc = RawDocument::new();
        doc.insert(ID_FIELD.to_string(), id.into());

        let schema = record.schema();
        for field in schema.fields() {
            if !record.is_dirty_at(field.position()) {
                continue;
            }
            match record.get(field.position()) {
                Some(value) if !value.is_null() => {
                    let stored = self.codec.encode(field, field.schema(), value)?;
                    doc.insert(field.name().to_string(), stored);
                }
                _ => {}
            }
        }
        Ok(doc)
    }

    /// Persist `record` under `key`.
    ///
    /// On success the record's dirty bits and new flag are cleared. On any
    /// error the record is left untouched so the caller can retry.
    pub fn commit<K, P>(&self, key: &K, record: &mut P) -> StoreResult<CommitOutcome>
    where
        K: Display + ?Sized,
        P: Persistent + ?Sized,
    {
        let id = key.to_string();

        if !record.needs_write() {
            self.metrics.increment_puts_skipped();
            log_event_with_fields(Event::PutSkipped, &[("id", &id)]);
            return Ok(CommitOutcome::Skipped);
        }

        let doc = self.build_document(&id, record)?;

        let mut outgoing = doc.clone();
        let mut recoveries = 0;
        loop {
            match self.client.put(&outgoing) {
                Ok(rev) => {
                    record.mark_clean();
                    self.metrics.increment_writes();
                    if recoveries > 0 {
                        self.metrics.increment_conflicts_recovered();
                    }
                    log_event_with_fields(Event::DocumentWritten, &[("id", &id), ("rev", &rev)]);
                    return Ok(CommitOutcome::Written { rev });
                }
                Err(err) if err.is_conflict() => {
                    self.metrics.increment_conflicts();
                    if recoveries >= self.conflict_retries {
                        log_event_with_fields(Event::ConflictUnrecovered, &[("id", &id)]);
                        return Err(err);
                    }
                    recoveries += 1;
                    log_event_with_fields(Event::WriteConflict, &[("id", &id)]);

                    // a vanished document keeps what the last attempt carried
                    if let Some(stale) = self.clear_stale(&id)? {
                        outgoing = doc.clone();
                        carry_untouched(&mut outgoing, stale, record);
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Delete the stored document at its current revision, returning what
    /// was stored.
    ///
    /// A document that vanished since the conflict needs no clearing.
    fn clear_stale(&self, id: &str) -> StoreResult<Option<RawDocument>> {
        let Some(current) = self.client.get(id)? else {
            return Ok(None);
        };
        let rev = document::revision(&current)
            .ok_or_else(|| StoreError::Client(format!("stored document '{}' has no revision", id)))?;
        match self.client.delete(id, rev) {
            Ok(_) => log_event_with_fields(Event::StaleDocumentCleared, &[("id", id), ("rev", rev)]),
            // removed between the fetch and the delete
            Err(err) if err.is_not_found() => {}
            Err(err) => return Err(err),
        }
        Ok(Some(current))
    }
}

/// Copy stored fields the record left untouched into `outgoing`.
///
/// Dirty fields are never copied, so a field the caller cleared stays
/// absent. Reserved fields and fields already present are skipped.
fn carry_untouched<P: Persistent + ?Sized>(outgoing: &mut RawDocument, stale: RawDocument, record: &P) {
    let schema = record.schema();
    for (name, value) in stale {
        if document::is_reserved(&name) || outgoing.contains_key(&name) {
            continue;
        }
        if schema.position(&name).is_some_and(|pos| record.is_dirty_at(pos)) {
            continue;
        }
        outgoing.insert(name, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Datum;
    use crate::persistent::PersistentRecord;
    use crate::schema::{FieldDef, RecordSchema, Schema};
    use crate::store::MemoryDocumentClient;
    use serde_json::json;
    use std::sync::Arc;

    fn schema() -> Arc<RecordSchema> {
        Arc::new(
            RecordSchema::new(
                "User",
                vec![
                    FieldDef::new("name", Schema::String),
                    FieldDef::new("age", Schema::Int),
                    FieldDef::new("tags", Schema::array(Schema::String)),
                ],
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_build_document_only_dirty_non_null() {
        let client = MemoryDocumentClient::with_database("users");
        let cache = DecoderCache::new();
        let metrics = MetricsRegistry::new();
        let writer = WriteCoordinator::new(&client, &cache, &metrics);

        let mut record = PersistentRecord::new(schema());
        record.put_named("age", Datum::Int(42)).unwrap();
        record.put_named("name", Datum::Null).unwrap();

        let doc = writer.build_document("u1", &record).unwrap();
        assert_eq!(serde_json::Value::Object(doc), json!({"_id": "u1", "age": "42"}));
    }

    #[test]
    fn test_clean_record_skipped() {
        let client = MemoryDocumentClient::with_database("users");
        let cache = DecoderCache::new();
        let metrics = MetricsRegistry::new();
        let writer = WriteCoordinator::new(&client, &cache, &metrics);

        let mut record = PersistentRecord::new(schema());
        record.mark_clean();

        assert_eq!(writer.commit("u1", &mut record).unwrap(), CommitOutcome::Skipped);
        assert!(client.is_empty());
        assert_eq!(metrics.snapshot().puts_skipped, 1);
    }

    #[test]
    fn test_new_record_written_and_cleaned() {
        let client = MemoryDocumentClient::with_database("users");
        let cache = DecoderCache::new();
        let metrics = MetricsRegistry::new();
        let writer = WriteCoordinator::new(&client, &cache, &metrics);

        let mut record = PersistentRecord::new(schema());
        record.put_named("tags", Datum::from(vec!["a", "b"])).unwrap();

        let outcome = writer.commit("u1", &mut record).unwrap();
        assert!(matches!(outcome, CommitOutcome::Written { ref rev } if rev.starts_with("1-")));
        assert!(!record.needs_write());
        assert!(client.get("u1").unwrap().unwrap()["tags"].is_string());
    }

    #[test]
    fn test_conflict_recovered_once() {
        let client = MemoryDocumentClient::with_database("users");
        client
            .put(json!({"_id": "u1", "name": "old"}).as_object().unwrap())
            .unwrap();
        let cache = DecoderCache::new();
        let metrics = MetricsRegistry::new();
        let writer = WriteCoordinator::new(&client, &cache, &metrics);

        let mut record = PersistentRecord::new(schema());
        record.put_named("name", Datum::from("new")).unwrap();

        let outcome = writer.commit("u1", &mut record).unwrap();
        // delete bumps the generation, so the rewrite lands at generation 3
        assert!(matches!(outcome, CommitOutcome::Written { ref rev } if rev.starts_with("3-")));
        assert_eq!(client.get("u1").unwrap().unwrap()["name"], json!("new"));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.conflicts, 1);
        assert_eq!(snapshot.conflicts_recovered, 1);
        assert_eq!(snapshot.writes, 1);
    }

    #[test]
    fn test_zero_retries_surfaces_conflict() {
        let client = MemoryDocumentClient::with_database("users");
        client.put(json!({"_id": "u1"}).as_object().unwrap()).unwrap();
        let cache = DecoderCache::new();
        let metrics = MetricsRegistry::new();
        let writer = WriteCoordinator::new(&client, &cache, &metrics).with_conflict_retries(0);

        let mut record = PersistentRecord::new(schema());
        record.put_named("age", Datum::Int(1)).unwrap();

        assert!(writer.commit("u1", &mut record).unwrap_err().is_conflict());
        assert!(record.is_dirty_at(1));
        assert!(record.is_new());
    }

    #[test]
    fn test_conflict_carries_untouched_fields() {
        let client = MemoryDocumentClient::with_database("users");
        client
            .put(json!({"_id": "u1", "name": "Ada", "age": "36", "extra": "kept"}).as_object().unwrap())
            .unwrap();
        let cache = DecoderCache::new();
        let metrics = MetricsRegistry::new();
        let writer = WriteCoordinator::new(&client, &cache, &metrics);

        let mut record = PersistentRecord::new(schema());
        record.put_named("age", Datum::Int(37)).unwrap();
        writer.commit("u1", &mut record).unwrap();

        let stored = client.get("u1").unwrap().unwrap();
        assert_eq!(stored["age"], json!("37"));
        assert_eq!(stored["name"], json!("Ada"));
        assert_eq!(stored["extra"], json!("kept"));
    }

    #[test]
    fn test_cleared_field_not_carried() {
        let client = MemoryDocumentClient::with_database("users");
        client
            .put(json!({"_id": "u1", "name": "Ada", "age": "36"}).as_object().unwrap())
            .unwrap();
        let cache = DecoderCache::new();
        let metrics = MetricsRegistry::new();
        let writer = WriteCoordinator::new(&client, &cache, &metrics);

        let mut record = PersistentRecord::new(schema());
        record.put_named("name", Datum::Null).unwrap();
        writer.commit("u1", &mut record).unwrap();

        let stored = client.get("u1").unwrap().unwrap();
        assert!(stored.get("name").is_none());
        assert_eq!(stored["age"], json!("36"));
    }
}
