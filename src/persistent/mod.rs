//! Persistent records
//!
//! A record is an ordered vector of field slots paired with one dirty bit
//! per field and an "is new" flag. Dirty bits are cleared together once the
//! record is known to match storage, either freshly loaded or freshly
//! committed.

mod dirty;
mod record;

pub use dirty::DirtyBits;
pub use record::{Persistent, PersistentRecord};
