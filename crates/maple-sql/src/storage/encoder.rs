//! Row payload codec.
//!
//! Rows are stored in tree leaves as a compact self-describing binary
//! format, positional against the table schema's column order:
//!
//! ```text
//! num_cols: u16 LE
//! repeated num_cols times:
//!   type_tag: u8   (Null = 0, Bool = 1, Int = 2, Float = 3, String = 4)
//!   payload        (Bool: 1 byte; Int/Float: 8 bytes LE;
//!                   String: u32 LE length + bytes; Null: nothing)
//! ```

use crate::executor::{Row, Value};

use super::error::{StorageError, StorageResult};

/// Type tag for NULL.
const TAG_NULL: u8 = 0;
/// Type tag for booleans.
const TAG_BOOL: u8 = 1;
/// Type tag for integers.
const TAG_INT: u8 = 2;
/// Type tag for floats.
const TAG_FLOAT: u8 = 3;
/// Type tag for strings.
const TAG_STRING: u8 = 4;

/// Encodes a row into its stored payload.
pub fn encode_row(row: &Row) -> Vec<u8> {
    let mut buf = Vec::with_capacity(2 + row.num_columns() * 9);
    buf.extend_from_slice(&(row.num_columns() as u16).to_le_bytes());

    for value in row.values() {
        match value {
            Value::Null => buf.push(TAG_NULL),
            Value::Boolean(b) => {
                buf.push(TAG_BOOL);
                buf.push(u8::from(*b));
            }
            Value::Int(i) => {
                buf.push(TAG_INT);
                buf.extend_from_slice(&i.to_le_bytes());
            }
            Value::Float(f) => {
                buf.push(TAG_FLOAT);
                buf.extend_from_slice(&f.to_le_bytes());
            }
            Value::String(s) => {
                buf.push(TAG_STRING);
                buf.extend_from_slice(&(s.len() as u32).to_le_bytes());
                buf.extend_from_slice(s.as_bytes());
            }
        }
    }

    buf
}

/// Decodes a stored payload back into a row.
pub fn decode_row(data: &[u8]) -> StorageResult<Row> {
    if data.len() < 2 {
        return Err(StorageError::decode("row payload shorter than its header"));
    }
    let num_cols = u16::from_le_bytes(data[..2].try_into().unwrap()) as usize;
    let mut offset = 2usize;

    let mut values = Vec::with_capacity(num_cols);
    for col in 0..num_cols {
        let tag = *data
            .get(offset)
            .ok_or_else(|| StorageError::decode(format!("row truncated at column {col}")))?;
        offset += 1;

        let value = match tag {
            TAG_NULL => Value::Null,
            TAG_BOOL => {
                let byte = *data.get(offset).ok_or_else(|| {
                    StorageError::decode(format!("row truncated at column {col}"))
                })?;
                offset += 1;
                Value::Boolean(byte != 0)
            }
            TAG_INT => {
                let bytes = fixed::<8>(data, offset, col)?;
                offset += 8;
                Value::Int(i64::from_le_bytes(bytes))
            }
            TAG_FLOAT => {
                let bytes = fixed::<8>(data, offset, col)?;
                offset += 8;
                Value::Float(f64::from_le_bytes(bytes))
            }
            TAG_STRING => {
                let len_bytes = fixed::<4>(data, offset, col)?;
                offset += 4;
                let len = u32::from_le_bytes(len_bytes) as usize;
                if offset + len > data.len() {
                    return Err(StorageError::decode(format!(
                        "row string truncated at column {col}"
                    )));
                }
                let s = std::str::from_utf8(&data[offset..offset + len])
                    .map_err(|_| StorageError::decode("row string is not UTF-8"))?;
                offset += len;
                Value::String(s.to_string())
            }
            other => {
                return Err(StorageError::decode(format!(
                    "unknown row type tag {other} at column {col}"
                )))
            }
        };
        values.push(value);
    }

    Ok(Row::new(values))
}

fn fixed<const N: usize>(data: &[u8], offset: usize, col: usize) -> StorageResult<[u8; N]> {
    data.get(offset..offset + N)
        .and_then(|slice| slice.try_into().ok())
        .ok_or_else(|| StorageError::decode(format!("row truncated at column {col}")))
}
