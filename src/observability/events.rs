//! Observable events
//!
//! Events are explicit and typed. Each maps to one stable event name in the
//! structured log.

use std::fmt;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Store lifecycle
    /// Store opened against a database
    StoreInitialized,
    /// Database created on open or by `create_schema`
    DatabaseCreated,
    /// Database dropped by `delete_schema`
    DatabaseDeleted,
    /// Store closed
    StoreClosed,

    // Read path
    /// Record assembled from a stored document
    RecordAssembled,
    /// Record assembly aborted by a decode error
    DecodeFailed,
    /// Structured decoder built and installed
    DecoderBuilt,
    /// Structured decoder built but another caller installed first
    DecoderRaceLost,
    /// Document scan executed
    QueryExecuted,

    // Write path
    /// Put ignored: record neither new nor dirty
    PutSkipped,
    /// Document written
    DocumentWritten,
    /// Write rejected with a revision conflict
    WriteConflict,
    /// Stale document cleared after a conflict
    StaleDocumentCleared,
    /// Conflict survived every recovery attempt
    ConflictUnrecovered,

    // Delete path
    /// Document deleted
    DocumentDeleted,
    /// Delete requested for a missing document
    DeleteMissing,
}

impl Event {
    /// Returns the stable event name
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::StoreInitialized => "STORE_INITIALIZED",
            Event::DatabaseCreated => "DATABASE_CREATED",
            Event::DatabaseDeleted => "DATABASE_DELETED",
            Event::StoreClosed => "STORE_CLOSED",
            Event::RecordAssembled => "RECORD_ASSEMBLED",
            Event::DecodeFailed => "DECODE_FAILED",
            Event::DecoderBuilt => "DECODER_BUILT",
            Event::DecoderRaceLost => "DECODER_RACE_LOST",
            Event::QueryExecuted => "QUERY_EXECUTED",
            Event::PutSkipped => "PUT_SKIPPED",
            Event::DocumentWritten => "DOCUMENT_WRITTEN",
            Event::WriteConflict => "WRITE_CONFLICT",
            Event::StaleDocumentCleared => "STALE_DOCUMENT_CLEARED",
            Event::ConflictUnrecovered => "CONFLICT_UNRECOVERED",
            Event::DocumentDeleted => "DOCUMENT_DELETED",
            Event::DeleteMissing => "DELETE_MISSING",
        }
    }

    /// Whether this event reports a failed operation
    pub fn is_failure(&self) -> bool {
        matches!(self, Event::DecodeFailed | Event::ConflictUnrecovered)
    }

    /// Whether this event is per-record detail rather than a lifecycle step
    pub fn is_detail(&self) -> bool {
        matches!(
            self,
            Event::RecordAssembled
                | Event::DecoderBuilt
                | Event::DecoderRaceLost
                | Event::DocumentWritten
                | Event::DocumentDeleted
        )
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
