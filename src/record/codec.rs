//! Fixed-width record encoding.
//!
//! ```text
//! +-----------------+-----------------+-----+-----------------+
//! | field 0         | field 1         | ... | field n-1       |
//! | (width 0 bytes) | (width 1 bytes) |     | (width n-1)     |
//! +-----------------+-----------------+-----+-----------------+
//! ```
//!
//! Strings are left-justified and zero-padded to 32 bytes, integers are 8-byte
//! big-endian two's complement. There is no header and no null bitmap: every
//! encoded record of a schema is exactly `record_width` bytes.

use bytes::{Buf, BufMut, BytesMut};

use crate::common::{ArchiveError, Result};

use super::{FieldType, Schema, Value};

/// Encodes `values` according to `schema`.
pub fn encode(schema: &Schema, values: &[Value]) -> Result<Vec<u8>> {
    if values.len() != schema.field_count() {
        return Err(ArchiveError::FieldCountMismatch {
            type_name: schema.type_name().to_string(),
            expected: schema.field_count(),
            actual: values.len(),
        });
    }

    let mut buf = BytesMut::with_capacity(schema.record_width());
    for (field, value) in schema.fields().iter().zip(values) {
        let mismatch = || ArchiveError::FieldTypeMismatch {
            type_name: schema.type_name().to_string(),
            field: field.name().to_string(),
            expected: field.field_type().to_string(),
            value: value.to_string(),
        };

        match (field.field_type(), value) {
            (FieldType::String, Value::String(s)) => {
                let bytes = s.as_bytes();
                // A NUL would end the string early on decode
                if bytes.contains(&0) {
                    return Err(mismatch());
                }
                if bytes.len() > field.width() {
                    return Err(ArchiveError::FieldTooLong {
                        type_name: schema.type_name().to_string(),
                        field: field.name().to_string(),
                        len: bytes.len(),
                        max: field.width(),
                    });
                }
                buf.put_slice(bytes);
                buf.put_bytes(0, field.width() - bytes.len());
            }
            (FieldType::Integer, Value::Integer(v)) => buf.put_i64(*v),
            (FieldType::String, Value::Integer(_)) | (FieldType::Integer, Value::String(_)) => {
                return Err(mismatch());
            }
        }
    }

    debug_assert_eq!(buf.len(), schema.record_width());
    Ok(buf.to_vec())
}

/// Decodes a full record.
///
/// # Panics
/// Panics if `data` is not exactly `record_width` bytes. Blocks always come
/// from a page slot of the same schema, so a mismatch is a caller bug.
pub fn decode(schema: &Schema, data: &[u8]) -> Vec<Value> {
    assert_eq!(
        data.len(),
        schema.record_width(),
        "Record block must be record_width bytes"
    );
    (0..schema.field_count())
        .map(|i| decode_field(schema, data, i))
        .collect()
}

/// Decodes the single field at `index` without touching the others.
pub fn decode_field(schema: &Schema, data: &[u8], index: usize) -> Value {
    let field = &schema.fields()[index];
    let mut raw = &data[field.span()];
    match field.field_type() {
        FieldType::String => {
            let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
            Value::String(String::from_utf8_lossy(&raw[..end]).into_owned())
        }
        FieldType::Integer => Value::Integer(raw.get_i64()),
    }
}
