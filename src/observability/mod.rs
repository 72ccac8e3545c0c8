//! Observability subsystem
//!
//! - Structured logging (JSON, one line per event)
//! - Typed events
//! - Atomic counters
//!
//! # Usage
//!
//! ```ignore
//! use couchmap::observability::{log_event_with_fields, Event, MetricsRegistry};
//!
//! log_event_with_fields(Event::WriteConflict, &[("key", "user:1")]);
//!
//! let metrics = MetricsRegistry::new();
//! metrics.increment_conflicts();
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};

/// Severity an event is logged at
pub fn event_severity(event: Event) -> Severity {
    if event.is_failure() {
        Severity::Error
    } else if event == Event::WriteConflict || event == Event::DeleteMissing {
        Severity::Warn
    } else if event.is_detail() {
        Severity::Trace
    } else {
        Severity::Info
    }
}

/// Log an event
pub fn log_event(event: Event) {
    log_event_with_fields(event, &[]);
}

/// Log an event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    match event_severity(event) {
        Severity::Error => Logger::error(event.as_str(), fields),
        severity => Logger::log(severity, event.as_str(), fields),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_severity() {
        assert_eq!(event_severity(Event::DecodeFailed), Severity::Error);
        assert_eq!(event_severity(Event::WriteConflict), Severity::Warn);
        assert_eq!(event_severity(Event::RecordAssembled), Severity::Trace);
        assert_eq!(event_severity(Event::StoreInitialized), Severity::Info);
    }

    #[test]
    fn test_log_event() {
        // This just verifies no panic
        log_event(Event::StoreInitialized);
        log_event_with_fields(Event::PutSkipped, &[("key", "k1")]);
    }
}
