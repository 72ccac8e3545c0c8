//! Binary blob format for structured values
//!
//! Layout, driven entirely by the schema (no type tags in the data):
//!
//! ```text
//! null           0 bytes
//! boolean        1 byte (0 | 1)
//! int, long      zig-zag varint
//! float, double  IEEE-754 little endian (4 | 8 bytes)
//! string, bytes  varint length + raw bytes
//! enum           varint symbol index
//! fixed          `size` raw bytes
//! array, map     blocks of (varint count, items...) ended by count 0;
//!                map items are (string key, value) in key order
//! record         field values in position order
//! union          varint branch index + branch value
//! ```
//!
//! A negative block count is followed by the block's byte size, which is
//! read and ignored.

use std::collections::BTreeMap;
use std::mem;

use super::datum::Datum;
use super::errors::{CodecError, CodecResult};
use crate::schema::Schema;

/// Most items a single array may hold when each encodes to zero bytes
pub const MAX_ZERO_WIDTH_ITEMS: usize = 1 << 16;

/// Encode a value as a blob
pub fn encode(schema: &Schema, datum: &Datum) -> CodecResult<Vec<u8>> {
    let mut buf = Vec::with_capacity(64);
    write_datum(schema, datum, &mut buf)?;
    Ok(buf)
}

/// Decode a complete blob, rejecting trailing bytes
pub fn decode(schema: &Schema, data: &[u8], reuse: Datum) -> CodecResult<Datum> {
    let mut reader = BlobReader::new(data);
    let datum = read_datum(schema, &mut reader, reuse)?;
    reader.finish()?;
    Ok(datum)
}

fn mismatch(schema: &Schema, datum: &Datum) -> CodecError {
    CodecError::TypeMismatch {
        expected: schema.type_name(),
        found: datum.type_name(),
    }
}

fn write_long(buf: &mut Vec<u8>, value: i64) {
    let mut n = ((value << 1) ^ (value >> 63)) as u64;
    while n & !0x7f != 0 {
        buf.push(((n & 0x7f) | 0x80) as u8);
        n >>= 7;
    }
    buf.push(n as u8);
}

fn write_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    write_long(buf, bytes.len() as i64);
    buf.extend_from_slice(bytes);
}

fn write_datum(schema: &Schema, datum: &Datum, buf: &mut Vec<u8>) -> CodecResult<()> {
    match (schema, datum) {
        (Schema::Null, Datum::Null) => {}
        (Schema::Boolean, Datum::Boolean(v)) => buf.push(u8::from(*v)),
        (Schema::Int, Datum::Int(v)) => write_long(buf, i64::from(*v)),
        (Schema::Long, Datum::Long(v)) => write_long(buf, *v),
        (Schema::Float, Datum::Float(v)) => buf.extend_from_slice(&v.to_le_bytes()),
        (Schema::Double, Datum::Double(v)) => buf.extend_from_slice(&v.to_le_bytes()),
        (Schema::String, Datum::String(s)) => write_bytes(buf, s.as_bytes()),
        (Schema::Bytes, Datum::Bytes(b)) => write_bytes(buf, b),
        (Schema::Enum(e), Datum::Enum(symbol)) => {
            let ordinal = e.ordinal(symbol).ok_or_else(|| CodecError::UnknownEnumSymbol {
                name: e.name.clone(),
                symbol: symbol.clone(),
            })?;
            write_long(buf, ordinal as i64);
        }
        (Schema::Fixed(f), Datum::Fixed(b)) => {
            if b.len() != f.size {
                return Err(CodecError::malformed(format!(
                    "fixed '{}' expects {} bytes, value has {}",
                    f.name,
                    f.size,
                    b.len()
                )));
            }
            buf.extend_from_slice(b);
        }
        (Schema::Array { items }, Datum::Array(values)) => {
            if !values.is_empty() {
                write_long(buf, values.len() as i64);
                for value in values {
                    write_datum(items, value, buf)?;
                }
            }
            write_long(buf, 0);
        }
        (Schema::Map { values }, Datum::Map(entries)) => {
            if !entries.is_empty() {
                write_long(buf, entries.len() as i64);
                for (key, value) in entries {
                    write_bytes(buf, key.as_bytes());
                    write_datum(values, value, buf)?;
                }
            }
            write_long(buf, 0);
        }
        (Schema::Record(record), Datum::Record(values)) => {
            if values.len() != record.len() {
                return Err(CodecError::malformed(format!(
                    "record '{}' expects {} fields, value has {}",
                    record.name(),
                    record.len(),
                    values.len()
                )));
            }
            for (field, value) in record.fields().iter().zip(values) {
                write_datum(field.schema(), value, buf)?;
            }
        }
        (Schema::Union { branches }, value) => {
            let index = branch_for(branches, value).ok_or_else(|| mismatch(schema, value))?;
            write_long(buf, index as i64);
            write_datum(&branches[index], value, buf)?;
        }
        (schema, datum) => return Err(mismatch(schema, datum)),
    }
    Ok(())
}

/// Smallest encoded size of any value of `schema`
fn min_width(schema: &Schema) -> usize {
    match schema {
        Schema::Null => 0,
        Schema::Float => 4,
        Schema::Double => 8,
        Schema::Fixed(f) => f.size,
        Schema::Record(record) => record.fields().iter().map(|f| min_width(f.schema())).sum(),
        // one varint byte: tag, length, ordinal, branch index or block end
        _ => 1,
    }
}

/// First union branch able to hold the value
fn branch_for(branches: &[Schema], datum: &Datum) -> Option<usize> {
    branches.iter().position(|branch| match (branch, datum) {
        (Schema::Enum(e), Datum::Enum(symbol)) => e.ordinal(symbol).is_some(),
        (Schema::Fixed(f), Datum::Fixed(b)) => f.size == b.len(),
        (Schema::Record(r), Datum::Record(values)) => r.len() == values.len(),
        (branch, datum) => branch.type_name() == datum.type_name(),
    })
}

/// Cursor over a blob
pub(crate) struct BlobReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BlobReader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_slice(&mut self, len: usize) -> CodecResult<&'a [u8]> {
        if len > self.remaining() {
            return Err(CodecError::malformed(format!(
                "need {} bytes at offset {}, {} remain",
                len,
                self.pos,
                self.remaining()
            )));
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn read_byte(&mut self) -> CodecResult<u8> {
        Ok(self.read_slice(1)?[0])
    }

    fn read_long(&mut self) -> CodecResult<i64> {
        let mut value: u64 = 0;
        let mut shift = 0u32;
        loop {
            if shift >= 64 {
                return Err(CodecError::malformed("varint longer than 10 bytes"));
            }
            let byte = self.read_byte()?;
            value |= u64::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                break;
            }
            shift += 7;
        }
        Ok(((value >> 1) as i64) ^ -((value & 1) as i64))
    }

    fn read_int(&mut self) -> CodecResult<i32> {
        let value = self.read_long()?;
        i32::try_from(value).map_err(|_| CodecError::malformed(format!("int out of range: {}", value)))
    }

    fn read_len(&mut self) -> CodecResult<usize> {
        let len = self.read_long()?;
        usize::try_from(len).map_err(|_| CodecError::malformed(format!("negative length: {}", len)))
    }

    /// Item count of the next block; 0 ends the sequence
    fn read_block_count(&mut self) -> CodecResult<usize> {
        let count = self.read_long()?;
        if count < 0 {
            // Block byte size follows a negative count
            self.read_long()?;
        }
        usize::try_from(count.unsigned_abs())
            .map_err(|_| CodecError::malformed(format!("block count too large: {}", count)))
    }

    fn read_string_into(&mut self, mut target: String) -> CodecResult<String> {
        let len = self.read_len()?;
        let bytes = self.read_slice(len)?;
        let text = std::str::from_utf8(bytes)
            .map_err(|e| CodecError::malformed(format!("invalid UTF-8: {}", e)))?;
        target.clear();
        target.push_str(text);
        Ok(target)
    }

    fn read_bytes_into(&mut self, mut target: Vec<u8>) -> CodecResult<Vec<u8>> {
        let len = self.read_len()?;
        let bytes = self.read_slice(len)?;
        target.clear();
        target.extend_from_slice(bytes);
        Ok(target)
    }

    fn read_array<const N: usize>(&mut self) -> CodecResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_slice(N)?);
        Ok(out)
    }

    /// Reject a block that cannot fit in the remaining input.
    ///
    /// Items of zero width consume no input, so their total is capped instead.
    fn check_block(&self, count: usize, width: usize, decoded: usize) -> CodecResult<()> {
        if width == 0 {
            if count > MAX_ZERO_WIDTH_ITEMS.saturating_sub(decoded) {
                return Err(CodecError::malformed(format!(
                    "block of {} zero-width items exceeds limit of {}",
                    count, MAX_ZERO_WIDTH_ITEMS
                )));
            }
        } else if count > self.remaining() / width {
            return Err(CodecError::malformed(format!(
                "block of {} items needs at least {} bytes per item, {} remain",
                count,
                width,
                self.remaining()
            )));
        }
        Ok(())
    }

    pub(crate) fn finish(&self) -> CodecResult<()> {
        if self.remaining() != 0 {
            return Err(CodecError::malformed(format!(
                "{} trailing bytes after value",
                self.remaining()
            )));
        }
        Ok(())
    }
}

/// Read one value, reusing allocations held by `reuse` where the shapes match.
pub(crate) fn read_datum(schema: &Schema, r: &mut BlobReader<'_>, reuse: Datum) -> CodecResult<Datum> {
    let datum = match schema {
        Schema::Null => Datum::Null,
        Schema::Boolean => match r.read_byte()? {
            0 => Datum::Boolean(false),
            1 => Datum::Boolean(true),
            other => return Err(CodecError::malformed(format!("invalid boolean byte {}", other))),
        },
        Schema::Int => Datum::Int(r.read_int()?),
        Schema::Long => Datum::Long(r.read_long()?),
        Schema::Float => Datum::Float(f32::from_le_bytes(r.read_array::<4>()?)),
        Schema::Double => Datum::Double(f64::from_le_bytes(r.read_array::<8>()?)),
        Schema::String => {
            let target = match reuse {
                Datum::String(s) => s,
                _ => String::new(),
            };
            Datum::String(r.read_string_into(target)?)
        }
        Schema::Bytes => {
            let target = match reuse {
                Datum::Bytes(b) => b,
                _ => Vec::new(),
            };
            Datum::Bytes(r.read_bytes_into(target)?)
        }
        Schema::Enum(e) => {
            let ordinal = r.read_len()?;
            let symbol = e.symbols.get(ordinal).ok_or_else(|| {
                CodecError::malformed(format!("enum '{}' has no ordinal {}", e.name, ordinal))
            })?;
            Datum::Enum(symbol.clone())
        }
        Schema::Fixed(f) => Datum::Fixed(r.read_slice(f.size)?.to_vec()),
        Schema::Array { items } => {
            let mut values = match reuse {
                Datum::Array(v) => v,
                _ => Vec::new(),
            };
            let width = min_width(items);
            let mut filled = 0;
            loop {
                let count = r.read_block_count()?;
                if count == 0 {
                    break;
                }
                r.check_block(count, width, filled)?;
                for _ in 0..count {
                    if filled < values.len() {
                        let hint = mem::take(&mut values[filled]);
                        values[filled] = read_datum(items, r, hint)?;
                    } else {
                        values.push(read_datum(items, r, Datum::Null)?);
                    }
                    filled += 1;
                }
            }
            values.truncate(filled);
            Datum::Array(values)
        }
        Schema::Map { values } => {
            let mut previous = match reuse {
                Datum::Map(m) => m,
                _ => BTreeMap::new(),
            };
            // every entry carries at least its key length
            let width = 1 + min_width(values);
            let mut entries = BTreeMap::new();
            loop {
                let count = r.read_block_count()?;
                if count == 0 {
                    break;
                }
                r.check_block(count, width, entries.len())?;
                for _ in 0..count {
                    let key = r.read_string_into(String::new())?;
                    let hint = previous.remove(&key).unwrap_or_default();
                    let value = read_datum(values, r, hint)?;
                    entries.insert(key, value);
                }
            }
            Datum::Map(entries)
        }
        Schema::Record(record) => {
            let mut slots = match reuse {
                Datum::Record(v) if v.len() == record.len() => v,
                _ => vec![Datum::Null; record.len()],
            };
            for (field, slot) in record.fields().iter().zip(slots.iter_mut()) {
                let hint = mem::take(slot);
                *slot = read_datum(field.schema(), r, hint)?;
            }
            Datum::Record(slots)
        }
        Schema::Union { branches } => {
            let index = r.read_len()?;
            let branch = branches.get(index).ok_or_else(|| {
                CodecError::malformed(format!(
                    "union branch {} out of range ({} branches)",
                    index,
                    branches.len()
                ))
            })?;
            let hint = if reuse.type_name() == branch.type_name() {
                reuse
            } else {
                Datum::Null
            };
            read_datum(branch, r, hint)?
        }
    };
    Ok(datum)
}
