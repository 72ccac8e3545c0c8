//! Field value codec subsystem
//!
//! Converts stored document values into typed record values and back.
//!
//! # Components
//!
//! - `Datum`: the typed in-memory value
//! - `binary`: the blob format for structured values
//! - `StructuredDecoder` / `DecoderCache`: one shared decoder per schema
//! - `FieldCodec`: per-field decode and encode
//! - `RecordAssembler`: whole-record assembly with a clean baseline

pub mod binary;
mod assembler;
mod cache;
mod datum;
mod decoder;
mod errors;
mod field;

pub use assembler::RecordAssembler;
pub use cache::{CacheStats, DecoderCache};
pub use datum::Datum;
pub use decoder::StructuredDecoder;
pub use errors::{CodecError, CodecResult};
pub use field::{json_type_name, FieldCodec};
