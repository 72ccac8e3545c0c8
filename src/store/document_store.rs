//! # Document Store
//!
//! Keyed record store over one document database. Keys are rendered with
//! `Display` to form document ids. Reads assemble records through the
//! shared decoder cache; writes and deletes go through the optimistic
//! coordinators.

use std::fmt::Display;
use std::marker::PhantomData;
use std::sync::Arc;

use super::client::DocumentClient;
use super::config::StoreConfig;
use super::delete::DeleteCoordinator;
use super::errors::{StoreError, StoreResult};
use super::query::{PartitionQuery, Query, QueryResult, QueryRow};
use super::write::{CommitOutcome, WriteCoordinator};
use crate::codec::{CodecError, DecoderCache, RecordAssembler};
use crate::document::RawDocument;
use crate::observability::{log_event_with_fields, Event, MetricsRegistry, MetricsSnapshot};
use crate::persistent::{Persistent, PersistentRecord};
use crate::schema::RecordSchema;

/// Id prefix of design documents, which hold no records
const DESIGN_PREFIX: &str = "_design/";

/// Record store bound to one schema and one database
pub struct DocumentStore<K, C: DocumentClient> {
    config: StoreConfig,
    schema: Arc<RecordSchema>,
    client: C,
    cache: Arc<DecoderCache>,
    metrics: Arc<MetricsRegistry>,
    _key: PhantomData<fn(&K)>,
}

impl<K: Display, C: DocumentClient> DocumentStore<K, C> {
    /// Open a store, creating the database if it does not exist.
    ///
    /// Uses the process-wide decoder cache.
    pub fn open(config: StoreConfig, schema: Arc<RecordSchema>, client: C) -> StoreResult<Self> {
        Self::open_with_cache(config, schema, client, DecoderCache::global())
    }

    /// Open a store with an explicit decoder cache
    pub fn open_with_cache(
        config: StoreConfig,
        schema: Arc<RecordSchema>,
        client: C,
        cache: Arc<DecoderCache>,
    ) -> StoreResult<Self> {
        config.validate()?;

        let store = Self {
            config,
            schema,
            client,
            cache,
            metrics: Arc::new(MetricsRegistry::new()),
            _key: PhantomData,
        };
        store.create_schema()?;

        log_event_with_fields(
            Event::StoreInitialized,
            &[
                ("database", &store.config.database),
                ("schema", store.schema.name()),
                ("mapping_file", &store.config.mapping_file),
            ],
        );
        Ok(store)
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn schema(&self) -> &Arc<RecordSchema> {
        &self.schema
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Counters for this store
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// An empty record of this store's schema
    pub fn new_record(&self) -> PersistentRecord {
        PersistentRecord::new(Arc::clone(&self.schema))
    }

    /// Load the record stored under `key`.
    ///
    /// `fields` selects the fields to populate; an empty slice loads all.
    /// Returns `Ok(None)` when no document exists.
    pub fn get<S: AsRef<str>>(&self, key: &K, fields: &[S]) -> StoreResult<Option<PersistentRecord>> {
        let id = key.to_string();
        let Some(raw) = self.client.get(&id)? else {
            self.metrics.increment_reads_missing();
            return Ok(None);
        };

        let record = self.assemble(&id, &raw, fields)?;
        self.metrics.increment_records_read();
        Ok(record)
    }

    /// Persist `record` under `key`
    pub fn put<P: Persistent + ?Sized>(&self, key: &K, record: &mut P) -> StoreResult<CommitOutcome> {
        WriteCoordinator::new(&self.client, &self.cache, &self.metrics)
            .with_conflict_retries(self.config.conflict_retries)
            .commit(key, record)
    }

    /// Delete the record under `key`; `false` if there was none
    pub fn delete(&self, key: &K) -> StoreResult<bool> {
        DeleteCoordinator::new(&self.client, &self.metrics).delete(key)
    }

    /// Delete the query's key, returning the number of records removed.
    ///
    /// A query without a key removes nothing.
    pub fn delete_by_query(&self, query: &Query<K>) -> StoreResult<u64> {
        match query.key() {
            Some(key) if self.delete(key)? => Ok(1),
            _ => Ok(0),
        }
    }

    /// A query selecting every schema field
    pub fn new_query(&self) -> Query<K> {
        Query::new().with_fields(self.schema.field_names())
    }

    /// Scan the database and assemble every record document.
    ///
    /// The scan ignores the query key. The limit caps the rows fetched
    /// from the database, design documents included.
    pub fn execute(&self, query: &Query<K>) -> StoreResult<QueryResult> {
        let limit = query
            .limit()
            .map(|limit| {
                u32::try_from(limit)
                    .map_err(|_| StoreError::Config(format!("query limit {} exceeds {}", limit, u32::MAX)))
            })
            .transpose()?;

        let fields: &[String] = query.fields().unwrap_or(&[]);

        let mut rows = Vec::new();
        for row in self.client.all_docs(limit)? {
            if row.id.starts_with(DESIGN_PREFIX) {
                continue;
            }
            let Some(raw) = row.doc else {
                continue;
            };
            if let Some(record) = self.assemble(&row.id, &raw, fields)? {
                self.metrics.increment_records_read();
                rows.push(QueryRow { id: row.id, record });
            }
        }

        self.metrics.increment_queries_executed();
        log_event_with_fields(
            Event::QueryExecuted,
            &[("database", &self.config.database), ("rows", &rows.len().to_string())],
        );
        Ok(QueryResult::new(rows))
    }

    /// Split a query for parallel execution; always a single partition
    pub fn get_partitions(&self, query: Query<K>) -> Vec<PartitionQuery<K>> {
        vec![PartitionQuery::new(query)]
    }

    /// Create the database if it does not exist
    pub fn create_schema(&self) -> StoreResult<()> {
        if self.client.database_exists()? {
            return Ok(());
        }
        self.client.create_database()?;
        log_event_with_fields(Event::DatabaseCreated, &[("database", &self.config.database)]);
        Ok(())
    }

    /// Drop the database if it exists
    pub fn delete_schema(&self) -> StoreResult<()> {
        if !self.client.database_exists()? {
            return Ok(());
        }
        self.client.delete_database()?;
        log_event_with_fields(Event::DatabaseDeleted, &[("database", &self.config.database)]);
        Ok(())
    }

    pub fn schema_exists(&self) -> StoreResult<bool> {
        self.client.database_exists()
    }

    /// Name of the backing database
    pub fn schema_name(&self) -> &str {
        &self.config.database
    }

    pub fn flush(&self) -> StoreResult<()> {
        self.client.flush()
    }

    /// Flush and release the store
    pub fn close(self) -> StoreResult<()> {
        self.flush()?;
        log_event_with_fields(Event::StoreClosed, &[("database", &self.config.database)]);
        Ok(())
    }

    fn assemble<S: AsRef<str>>(
        &self,
        id: &str,
        raw: &RawDocument,
        fields: &[S],
    ) -> StoreResult<Option<PersistentRecord>> {
        RecordAssembler::new(&self.schema, &self.cache)
            .assemble(Some(raw), fields)
            .map_err(|e: CodecError| {
                self.metrics.increment_decode_failures();
                log_event_with_fields(Event::DecodeFailed, &[("id", id), ("code", e.code())]);
                StoreError::from(e)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Datum;
    use crate::schema::{FieldDef, Schema};
    use crate::store::MemoryDocumentClient;
    use serde_json::json;

    fn schema() -> Arc<RecordSchema> {
        Arc::new(
            RecordSchema::new(
                "User",
                vec![
                    FieldDef::new("name", Schema::String),
                    FieldDef::new("age", Schema::Int),
                ],
            )
            .unwrap(),
        )
    }

    fn open() -> DocumentStore<String, MemoryDocumentClient> {
        DocumentStore::open_with_cache(
            StoreConfig::new("users"),
            schema(),
            MemoryDocumentClient::new("users"),
            Arc::new(DecoderCache::new()),
        )
        .unwrap()
    }

    #[test]
    fn test_open_creates_database() {
        let store = open();
        assert!(store.schema_exists().unwrap());
        assert_eq!(store.schema_name(), "users");
    }

    #[test]
    fn test_put_get_roundtrip() {
        let store = open();
        let mut record = store.new_record();
        record.put_named("name", Datum::from("Ada")).unwrap();
        record.put_named("age", Datum::Int(36)).unwrap();
        store.put(&"u1".to_string(), &mut record).unwrap();

        let loaded = store.get::<&str>(&"u1".to_string(), &[]).unwrap().unwrap();
        assert_eq!(loaded.get_named("name"), Some(&Datum::from("Ada")));
        assert_eq!(loaded.get_named("age"), Some(&Datum::Int(36)));
        assert!(!loaded.needs_write());
    }

    #[test]
    fn test_get_missing() {
        let store = open();
        assert!(store.get::<&str>(&"nope".to_string(), &[]).unwrap().is_none());
        assert_eq!(store.metrics().reads_missing, 1);
    }

    #[test]
    fn test_decode_failure_counted() {
        let store = open();
        store
            .client()
            .put(json!({"_id": "bad", "age": "old"}).as_object().unwrap())
            .unwrap();

        let err = store.get(&"bad".to_string(), &["age"]).unwrap_err();
        assert_eq!(err.code(), "COUCHMAP_DECODE_INVALID_SCALAR");
        assert_eq!(store.metrics().decode_failures, 1);
    }

    #[test]
    fn test_execute_skips_design_documents() {
        let store = open();
        store
            .client()
            .put(json!({"_id": "_design/views", "language": "javascript"}).as_object().unwrap())
            .unwrap();
        store
            .client()
            .put(json!({"_id": "u1", "name": "Ada"}).as_object().unwrap())
            .unwrap();

        let result = store.execute(&store.new_query()).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.rows()[0].id, "u1");
    }

    #[test]
    fn test_execute_rejects_oversized_limit() {
        let store = open();
        let query = store.new_query().with_limit(u64::from(u32::MAX) + 1);
        let err = store.execute(&query).unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));
    }

    #[test]
    fn test_delete_schema_then_recreate() {
        let store = open();
        store.delete_schema().unwrap();
        assert!(!store.schema_exists().unwrap());
        store.delete_schema().unwrap();
        store.create_schema().unwrap();
        assert!(store.schema_exists().unwrap());
    }

    #[test]
    fn test_close_flushes() {
        let store = open();
        assert!(store.close().is_ok());
    }
}
