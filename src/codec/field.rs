//! Field value codec
//!
//! Converts between a field's stored document value and its typed value.
//!
//! Stored representation:
//! - scalars (boolean, numbers, string) as their string form; native JSON
//!   booleans, numbers and strings are also accepted on read
//! - enums as their symbol
//! - bytes as standard base64
//! - arrays, maps, records and general unions as a base64 blob produced by
//!   the structured decoder for the field's schema
//! - a stored null or a missing key decodes to null for every kind
//!
//! Fixed-type fields are not supported in either direction.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::Value;
use std::str::FromStr;

use super::cache::DecoderCache;
use super::datum::Datum;
use super::errors::{CodecError, CodecResult};
use crate::persistent::Persistent;
use crate::schema::{resolve_union, Field, Schema, UnionResolution};

/// Returns the JSON type name of a stored value
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Schema-driven field codec, backed by a decoder cache for structured kinds.
pub struct FieldCodec<'a> {
    cache: &'a DecoderCache,
}

impl<'a> FieldCodec<'a> {
    pub fn new(cache: &'a DecoderCache) -> Self {
        Self { cache }
    }

    /// Decode a stored value for `field` under `schema`.
    ///
    /// `schema` is the field's declared schema, or a union branch of it
    /// while recursing. The record's current value at the field's position
    /// is moved out and used as the reuse hint for structured decodes.
    pub fn decode<P: Persistent + ?Sized>(
        &self,
        field: &Field,
        schema: &Schema,
        raw: Option<&Value>,
        record: &mut P,
    ) -> CodecResult<Datum> {
        let raw = match raw {
            None | Some(Value::Null) => return Ok(Datum::Null),
            Some(raw) => raw,
        };

        match schema {
            Schema::Null => Ok(Datum::Null),
            Schema::Boolean => match raw {
                Value::Bool(b) => Ok(Datum::Boolean(*b)),
                other => parse_scalar(field, "boolean", other).map(Datum::Boolean),
            },
            Schema::Int => parse_scalar(field, "int", raw).map(Datum::Int),
            Schema::Long => parse_scalar(field, "long", raw).map(Datum::Long),
            Schema::Float => parse_scalar(field, "float", raw).map(Datum::Float),
            Schema::Double => parse_scalar(field, "double", raw).map(Datum::Double),
            Schema::String => scalar_text(field, "string", raw).map(Datum::String),
            Schema::Bytes => decode_base64(field, raw).map(Datum::Bytes),
            Schema::Enum(e) => {
                let symbol = scalar_text(field, "enum symbol", raw)?;
                if e.ordinal(&symbol).is_none() {
                    return Err(CodecError::UnknownEnumSymbol {
                        name: e.name.clone(),
                        symbol,
                    });
                }
                Ok(Datum::Enum(symbol))
            }
            Schema::Fixed(_) => Err(CodecError::UnsupportedFixed(field.name().to_string())),
            Schema::Array { .. } | Schema::Map { .. } | Schema::Record(_) => {
                self.decode_blob(field, schema, raw, record)
            }
            Schema::Union { branches } => match resolve_union(branches) {
                UnionResolution::Optional(branch) => self.decode(field, branch, Some(raw), record),
                UnionResolution::Tagged => self.decode_blob(field, schema, raw, record),
            },
        }
    }

    fn decode_blob<P: Persistent + ?Sized>(
        &self,
        field: &Field,
        schema: &Schema,
        raw: &Value,
        record: &mut P,
    ) -> CodecResult<Datum> {
        let blob = decode_base64(field, raw)?;
        let decoder = self.cache.get_or_build(schema)?;
        let reuse = record.take(field.position());
        decoder.decode(&blob, reuse)
    }

    /// Encode a typed value into its stored document form.
    ///
    /// Mirrors [`FieldCodec::decode`]: anything this produces decodes back
    /// to an equal value.
    pub fn encode(&self, field: &Field, schema: &Schema, datum: &Datum) -> CodecResult<Value> {
        let value = match (schema, datum) {
            (_, Datum::Null) => Value::Null,
            (Schema::Boolean, Datum::Boolean(v)) => Value::String(v.to_string()),
            (Schema::Int, Datum::Int(v)) => Value::String(v.to_string()),
            (Schema::Long, Datum::Long(v)) => Value::String(v.to_string()),
            (Schema::Float, Datum::Float(v)) => Value::String(v.to_string()),
            (Schema::Double, Datum::Double(v)) => Value::String(v.to_string()),
            (Schema::String, Datum::String(s)) => Value::String(s.clone()),
            (Schema::Bytes, Datum::Bytes(b)) => Value::String(STANDARD.encode(b)),
            (Schema::Enum(e), Datum::Enum(symbol)) => {
                if e.ordinal(symbol).is_none() {
                    return Err(CodecError::UnknownEnumSymbol {
                        name: e.name.clone(),
                        symbol: symbol.clone(),
                    });
                }
                Value::String(symbol.clone())
            }
            (Schema::Fixed(_), _) => {
                return Err(CodecError::UnsupportedFixed(field.name().to_string()))
            }
            (Schema::Array { .. } | Schema::Map { .. } | Schema::Record(_), datum) => {
                self.encode_blob(schema, datum)?
            }
            (Schema::Union { branches }, datum) => match resolve_union(branches) {
                UnionResolution::Optional(branch) => return self.encode(field, branch, datum),
                UnionResolution::Tagged => self.encode_blob(schema, datum)?,
            },
            (schema, datum) => {
                return Err(CodecError::TypeMismatch {
                    expected: schema.type_name(),
                    found: datum.type_name(),
                })
            }
        };
        Ok(value)
    }

    fn encode_blob(&self, schema: &Schema, datum: &Datum) -> CodecResult<Value> {
        let decoder = self.cache.get_or_build(schema)?;
        let blob = decoder.encode(datum)?;
        Ok(Value::String(STANDARD.encode(blob)))
    }
}

/// Textual form of a stored scalar
fn scalar_text(field: &Field, expected: &'static str, raw: &Value) -> CodecResult<String> {
    match raw {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(CodecError::UnexpectedRaw {
            field: field.name().to_string(),
            expected,
            found: json_type_name(other),
        }),
    }
}

fn parse_scalar<T: FromStr>(field: &Field, expected: &'static str, raw: &Value) -> CodecResult<T> {
    let text = scalar_text(field, expected, raw)?;
    text.parse::<T>().map_err(|_| CodecError::InvalidScalar {
        field: field.name().to_string(),
        expected,
        value: text,
    })
}

fn decode_base64(field: &Field, raw: &Value) -> CodecResult<Vec<u8>> {
    let text = raw.as_str().ok_or_else(|| CodecError::UnexpectedRaw {
        field: field.name().to_string(),
        expected: "base64 string",
        found: json_type_name(raw),
    })?;
    STANDARD.decode(text).map_err(|e| CodecError::InvalidEncoding {
        field: field.name().to_string(),
        reason: e.to_string(),
    })
}
