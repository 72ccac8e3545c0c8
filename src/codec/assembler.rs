//! Record assembly from stored documents

use std::sync::Arc;

use super::cache::DecoderCache;
use super::errors::{CodecError, CodecResult};
use super::field::FieldCodec;
use crate::document::RawDocument;
use crate::observability::{log_event_with_fields, Event};
use crate::persistent::{Persistent, PersistentRecord};
use crate::schema::RecordSchema;

/// Builds records of one schema from raw documents.
pub struct RecordAssembler<'a> {
    schema: &'a Arc<RecordSchema>,
    codec: FieldCodec<'a>,
}

impl<'a> RecordAssembler<'a> {
    pub fn new(schema: &'a Arc<RecordSchema>, cache: &'a DecoderCache) -> Self {
        Self {
            schema,
            codec: FieldCodec::new(cache),
        }
    }

    /// Assemble a record holding every schema field.
    pub fn assemble_all(&self, raw: Option<&RawDocument>) -> CodecResult<Option<PersistentRecord>> {
        self.assemble::<&str>(raw, &[])
    }

    /// Assemble a record from `raw`, populating only `fields`.
    ///
    /// An absent document yields `Ok(None)`. An empty field list means
    /// every schema field. Fields not requested stay null and clean, so
    /// writing the record back never touches them.
    ///
    /// # Errors
    ///
    /// Any decode error aborts the whole assembly; no partial record is
    /// returned. A requested name that is not a schema field is
    /// `CodecError::UnknownField`.
    pub fn assemble<S: AsRef<str>>(
        &self,
        raw: Option<&RawDocument>,
        fields: &[S],
    ) -> CodecResult<Option<PersistentRecord>> {
        let Some(raw) = raw else {
            return Ok(None);
        };

        let mut record = PersistentRecord::new(Arc::clone(self.schema));

        let names: Vec<&str> = if fields.is_empty() {
            self.schema.field_names()
        } else {
            fields.iter().map(AsRef::as_ref).collect()
        };

        for name in names {
            let field = self
                .schema
                .field(name)
                .ok_or_else(|| CodecError::UnknownField(name.to_string()))?;
            let value = self
                .codec
                .decode(field, field.schema(), raw.get(field.name()), &mut record)?;
            record.put(field.position(), value);
        }

        record.mark_clean();

        if let Some(id) = crate::document::document_id(raw) {
            log_event_with_fields(Event::RecordAssembled, &[("id", id)]);
        }
        Ok(Some(record))
    }
}
