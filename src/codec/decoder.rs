//! Schema-bound structured decoder

use super::binary;
use super::datum::Datum;
use super::errors::{CodecError, CodecResult};
use crate::schema::{Schema, SchemaKind};

/// Immutable decoder for one structured schema (array, map, record or
/// union).
///
/// Building validates the schema; a decoder that exists is always usable.
#[derive(Debug)]
pub struct StructuredDecoder {
    schema: Schema,
    canonical: String,
}

impl StructuredDecoder {
    /// Build a decoder for `schema`.
    ///
    /// Side-effect free: building twice yields two interchangeable decoders.
    pub fn build(schema: &Schema) -> CodecResult<Self> {
        let kind = schema.kind();
        if !(kind.is_structured() || kind == SchemaKind::Union) {
            return Err(CodecError::NotStructured(kind.type_name()));
        }
        schema.validate()?;
        Ok(Self {
            schema: schema.clone(),
            canonical: schema.canonical_form(),
        })
    }

    /// Schema this decoder is bound to
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Structural identity of the bound schema
    pub fn canonical_form(&self) -> &str {
        &self.canonical
    }

    /// Decode a blob.
    ///
    /// `reuse` is the value currently held by the target; its allocations
    /// are recycled where the decoded shape matches. Pass `Datum::Null` to
    /// decode fresh.
    pub fn decode(&self, blob: &[u8], reuse: Datum) -> CodecResult<Datum> {
        binary::decode(&self.schema, blob, reuse)
    }

    /// Encode a value into the blob format this decoder reads
    pub fn encode(&self, datum: &Datum) -> CodecResult<Vec<u8>> {
        binary::encode(&self.schema, datum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaError;

    #[test]
    fn test_build_rejects_primitive() {
        let err = StructuredDecoder::build(&Schema::Int).unwrap_err();
        assert_eq!(err, CodecError::NotStructured("int"));
    }

    #[test]
    fn test_build_rejects_malformed_schema() {
        let schema = Schema::array(Schema::union(vec![Schema::Int]));
        let err = StructuredDecoder::build(&schema).unwrap_err();
        assert_eq!(err, CodecError::Schema(SchemaError::UnionArity(1)));
    }

    #[test]
    fn test_decode_encode_roundtrip() {
        let decoder = StructuredDecoder::build(&Schema::array(Schema::String)).unwrap();
        let blob = decoder.encode(&Datum::from(vec!["a", "b"])).unwrap();
        let value = decoder.decode(&blob, Datum::Null).unwrap();
        assert_eq!(value, Datum::from(vec!["a", "b"]));
        assert_eq!(decoder.encode(&value).unwrap(), blob);
    }

    #[test]
    fn test_union_decoder() {
        let schema = Schema::union(vec![Schema::Int, Schema::String]);
        let decoder = StructuredDecoder::build(&schema).unwrap();
        let blob = decoder.encode(&Datum::String("hi".into())).unwrap();
        assert_eq!(decoder.decode(&blob, Datum::Null).unwrap(), Datum::String("hi".into()));
        assert_eq!(decoder.canonical_form(), r#"["int","string"]"#);
    }
}
