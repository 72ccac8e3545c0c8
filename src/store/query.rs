//! Query values
//!
//! A query names an optional key, an optional field subset and a row
//! limit. Execution is a single unfiltered scan; the key only matters to
//! `delete_by_query`.

use crate::persistent::PersistentRecord;

/// Query over one document store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query<K> {
    key: Option<K>,
    fields: Option<Vec<String>>,
    limit: Option<u64>,
}

impl<K> Default for Query<K> {
    fn default() -> Self {
        Self {
            key: None,
            fields: None,
            limit: None,
        }
    }
}

impl<K> Query<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to a single key
    pub fn with_key(mut self, key: K) -> Self {
        self.key = Some(key);
        self
    }

    /// Load only these fields
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Cap the number of rows returned
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn key(&self) -> Option<&K> {
        self.key.as_ref()
    }

    /// Requested fields; `None` means every field
    pub fn fields(&self) -> Option<&[String]> {
        self.fields.as_deref()
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }
}

/// A slice of a query that can run independently.
///
/// Stores hand out exactly one partition covering the whole query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionQuery<K> {
    query: Query<K>,
}

impl<K> PartitionQuery<K> {
    pub fn new(query: Query<K>) -> Self {
        Self { query }
    }

    pub fn query(&self) -> &Query<K> {
        &self.query
    }

    pub fn into_query(self) -> Query<K> {
        self.query
    }
}

/// One assembled row of a query result
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRow {
    pub id: String,
    pub record: PersistentRecord,
}

/// Rows returned by `execute`, in document id order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryResult {
    rows: Vec<QueryRow>,
}

impl QueryResult {
    pub(crate) fn new(rows: Vec<QueryRow>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[QueryRow] {
        &self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueryRow> {
        self.rows.iter()
    }

    pub fn into_rows(self) -> Vec<QueryRow> {
        self.rows
    }
}

impl IntoIterator for QueryResult {
    type Item = QueryRow;
    type IntoIter = std::vec::IntoIter<QueryRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}
