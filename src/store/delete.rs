//! Delete path
//!
//! Deletes fetch the current revision first and delete at that revision.
//! A document that is already gone is reported, not raised.

use std::fmt::Display;

use super::client::DocumentClient;
use super::errors::{StoreError, StoreResult};
use crate::document;
use crate::observability::{log_event_with_fields, Event, MetricsRegistry};

/// Deletes documents by key
pub struct DeleteCoordinator<'a, C: DocumentClient + ?Sized> {
    client: &'a C,
    metrics: &'a MetricsRegistry,
}

impl<'a, C: DocumentClient + ?Sized> DeleteCoordinator<'a, C> {
    pub fn new(client: &'a C, metrics: &'a MetricsRegistry) -> Self {
        Self { client, metrics }
    }

    /// Delete the document stored under `key`.
    ///
    /// Returns `Ok(false)` when no document exists, otherwise whether the
    /// store acknowledged the delete with a non-empty token.
    pub fn delete<K: Display + ?Sized>(&self, key: &K) -> StoreResult<bool> {
        let id = key.to_string();

        let Some(current) = self.client.get(&id)? else {
            log_event_with_fields(Event::DeleteMissing, &[("id", &id)]);
            return Ok(false);
        };

        let rev = document::revision(&current)
            .ok_or_else(|| StoreError::Client(format!("stored document '{}' has no revision", id)))?;

        let ack = match self.client.delete(&id, rev) {
            Ok(ack) => ack,
            // removed between the fetch and the delete
            Err(err) if err.is_not_found() => {
                log_event_with_fields(Event::DeleteMissing, &[("id", &id)]);
                return Ok(false);
            }
            Err(err) => return Err(err),
        };

        self.metrics.increment_deletes();
        log_event_with_fields(Event::DocumentDeleted, &[("id", &id), ("rev", rev)]);
        Ok(!ack.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryDocumentClient;
    use serde_json::json;

    #[test]
    fn test_delete_existing() {
        let client = MemoryDocumentClient::with_database("users");
        client.put(json!({"_id": "u1", "name": "Ada"}).as_object().unwrap()).unwrap();
        let metrics = MetricsRegistry::new();

        let deleter = DeleteCoordinator::new(&client, &metrics);
        assert!(deleter.delete("u1").unwrap());
        assert!(client.get("u1").unwrap().is_none());
        assert_eq!(metrics.snapshot().deletes, 1);
    }

    #[test]
    fn test_delete_missing_is_false() {
        let client = MemoryDocumentClient::with_database("users");
        let metrics = MetricsRegistry::new();

        let deleter = DeleteCoordinator::new(&client, &metrics);
        assert!(!deleter.delete("ghost").unwrap());
        assert_eq!(metrics.snapshot().deletes, 0);
    }

    #[test]
    fn test_delete_twice() {
        let client = MemoryDocumentClient::with_database("users");
        client.put(json!({"_id": "u1"}).as_object().unwrap()).unwrap();
        let metrics = MetricsRegistry::new();

        let deleter = DeleteCoordinator::new(&client, &metrics);
        assert!(deleter.delete(&7_u32.to_string()).is_ok());
        assert!(deleter.delete("u1").unwrap());
        assert!(!deleter.delete("u1").unwrap());
    }

    #[test]
    fn test_missing_database_propagates() {
        let client = MemoryDocumentClient::new("users");
        let metrics = MetricsRegistry::new();

        let err = DeleteCoordinator::new(&client, &metrics).delete("u1").unwrap_err();
        assert_eq!(err, StoreError::DatabaseNotFound("users".into()));
    }
}
