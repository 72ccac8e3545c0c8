//! Persistent record: typed field slots plus dirty tracking

use std::sync::Arc;

use crate::codec::{CodecError, CodecResult, Datum};
use crate::schema::RecordSchema;

use super::dirty::DirtyBits;

/// Per-position access to a record's values and dirty state.
///
/// Positions are the field positions of the record's schema. Writing a
/// value through [`Persistent::put`] marks the position dirty.
pub trait Persistent {
    /// Schema this record conforms to
    fn schema(&self) -> &Arc<RecordSchema>;

    /// Value at a position; `None` if out of range
    fn get(&self, position: usize) -> Option<&Datum>;

    /// Store a value and mark the position dirty
    fn put(&mut self, position: usize, value: Datum);

    /// Move the value out of a position, leaving null. Dirty state is untouched.
    fn take(&mut self, position: usize) -> Datum;

    /// Whether the position was written since the record was last clean
    fn is_dirty_at(&self, position: usize) -> bool;

    /// Whether any position is dirty
    fn is_dirty(&self) -> bool;

    /// Mark a position dirty
    fn set_dirty(&mut self, position: usize);

    /// Clear every dirty bit
    fn clear_dirty(&mut self);

    /// Whether the record has never been stored
    fn is_new(&self) -> bool;

    fn set_new(&mut self, is_new: bool);

    /// Record is known to match storage: no dirty bits, not new.
    fn mark_clean(&mut self) {
        self.clear_dirty();
        self.set_new(false);
    }

    /// Whether a store write would carry anything
    fn needs_write(&self) -> bool {
        self.is_new() || self.is_dirty()
    }
}

/// Generic schema-driven record.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistentRecord {
    schema: Arc<RecordSchema>,
    values: Vec<Datum>,
    dirty: DirtyBits,
    is_new: bool,
}

impl PersistentRecord {
    /// Fresh record: every field null, nothing dirty, new.
    pub fn new(schema: Arc<RecordSchema>) -> Self {
        let len = schema.len();
        Self {
            schema,
            values: vec![Datum::Null; len],
            dirty: DirtyBits::new(len),
            is_new: true,
        }
    }

    /// Value of the named field
    pub fn get_named(&self, name: &str) -> Option<&Datum> {
        self.schema.position(name).and_then(|pos| self.values.get(pos))
    }

    /// Store a value in the named field and mark it dirty
    pub fn put_named(&mut self, name: &str, value: Datum) -> CodecResult<()> {
        let position = self
            .schema
            .position(name)
            .ok_or_else(|| CodecError::UnknownField(name.to_string()))?;
        self.put(position, value);
        Ok(())
    }

    /// All values in position order
    pub fn values(&self) -> &[Datum] {
        &self.values
    }

    /// Dirty positions in ascending order
    pub fn dirty_positions(&self) -> Vec<usize> {
        self.dirty.iter().collect()
    }
}

impl Persistent for PersistentRecord {
    fn schema(&self) -> &Arc<RecordSchema> {
        &self.schema
    }

    fn get(&self, position: usize) -> Option<&Datum> {
        self.values.get(position)
    }

    fn put(&mut self, position: usize, value: Datum) {
        if let Some(slot) = self.values.get_mut(position) {
            *slot = value;
            self.dirty.set(position);
        }
    }

    fn take(&mut self, position: usize) -> Datum {
        self.values
            .get_mut(position)
            .map(std::mem::take)
            .unwrap_or_default()
    }

    fn is_dirty_at(&self, position: usize) -> bool {
        self.dirty.get(position)
    }

    fn is_dirty(&self) -> bool {
        self.dirty.any()
    }

    fn set_dirty(&mut self, position: usize) {
        self.dirty.set(position);
    }

    fn clear_dirty(&mut self) {
        self.dirty.clear_all();
    }

    fn is_new(&self) -> bool {
        self.is_new
    }

    fn set_new(&mut self, is_new: bool) {
        self.is_new = is_new;
    }
}
