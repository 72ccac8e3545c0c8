//! Document store subsystem
//!
//! Binds a record schema to one document database.
//!
//! # Components
//!
//! - `DocumentClient`: boundary to the database, with `MemoryDocumentClient`
//!   as the in-process implementation
//! - `WriteCoordinator`: write-once commit with bounded conflict recovery
//! - `DeleteCoordinator`: revision-fenced delete
//! - `DocumentStore`: keyed get/put/delete/query facade
//!
//! # Concurrency
//!
//! Conflict recovery is not atomic. Two writers racing on one key may each
//! clear the other's document; at most one committer per key is assumed.

mod client;
mod config;
mod delete;
mod document_store;
mod errors;
mod memory;
mod query;
mod write;

pub use client::{DocumentClient, DocumentRow};
pub use config::{
    StoreConfig, PROP_CONFLICT_RETRIES, PROP_DATABASE, PROP_MAPPING_FILE, PROP_URL,
};
pub use delete::DeleteCoordinator;
pub use document_store::DocumentStore;
pub use errors::{StoreError, StoreResult};
pub use memory::MemoryDocumentClient;
pub use query::{PartitionQuery, Query, QueryResult, QueryRow};
pub use write::{CommitOutcome, WriteCoordinator};
