//! Row-id codec.
//!
//! A row-id is the byte key under which a row is stored in its table's
//! B+-tree. The tree compares keys lexicographically on raw bytes, so
//! this codec is the sole authority for making byte order match
//! semantic order:
//!
//! - Integers are big-endian with the sign bit flipped, so
//!   `bytes(a) < bytes(b) ⇔ a < b` across the full i64 range.
//! - Floats go through the total-order transform: negative values have
//!   all bits flipped, non-negative values only the sign bit.
//! - Strings are length-prefixed (u32 BE) UTF-8.
//! - Booleans are one byte, false before true.
//!
//! A composite row-id encodes the primary-key tuple in declaration
//! order:
//!
//! ```text
//! count: u8
//! repeated count times:
//!   type_tag: u8   (Int = 1, Float = 2, String = 3, Bool = 4)
//!   payload        (per-type encoding above)
//! ```
//!
//! Tables without a primary key use an auto row-id: a bare 8-byte
//! big-endian counter starting at 1.

use maple_common::types::Key;

use crate::executor::Value;

use super::error::{StorageError, StorageResult};

/// Type tag for integer components.
const TAG_INT: u8 = 1;
/// Type tag for float components.
const TAG_FLOAT: u8 = 2;
/// Type tag for string components.
const TAG_STRING: u8 = 3;
/// Type tag for boolean components.
const TAG_BOOL: u8 = 4;

/// Encodes an i64 so that byte order matches numeric order.
#[inline]
fn order_preserving_i64(value: i64) -> [u8; 8] {
    ((value as u64) ^ (1 << 63)).to_be_bytes()
}

#[inline]
fn decode_order_preserving_i64(bytes: [u8; 8]) -> i64 {
    (u64::from_be_bytes(bytes) ^ (1 << 63)) as i64
}

/// Encodes an f64 via the total-order transform.
#[inline]
fn order_preserving_f64(value: f64) -> [u8; 8] {
    let bits = value.to_bits();
    let flipped = if bits & (1 << 63) != 0 {
        !bits
    } else {
        bits | (1 << 63)
    };
    flipped.to_be_bytes()
}

#[inline]
fn decode_order_preserving_f64(bytes: [u8; 8]) -> f64 {
    let flipped = u64::from_be_bytes(bytes);
    let bits = if flipped & (1 << 63) != 0 {
        flipped ^ (1 << 63)
    } else {
        !flipped
    };
    f64::from_bits(bits)
}

/// Encodes a primary-key tuple into a composite row-id.
///
/// NULL components are rejected; primary-key columns are implicitly
/// NOT NULL.
pub fn encode_composite(values: &[Value]) -> StorageResult<Key> {
    let mut buf = Vec::with_capacity(1 + values.len() * 9);
    buf.push(values.len() as u8);

    for value in values {
        match value {
            Value::Int(i) => {
                buf.push(TAG_INT);
                buf.extend_from_slice(&order_preserving_i64(*i));
            }
            Value::Float(f) => {
                buf.push(TAG_FLOAT);
                buf.extend_from_slice(&order_preserving_f64(*f));
            }
            Value::String(s) => {
                buf.push(TAG_STRING);
                buf.extend_from_slice(&(s.len() as u32).to_be_bytes());
                buf.extend_from_slice(s.as_bytes());
            }
            Value::Boolean(b) => {
                buf.push(TAG_BOOL);
                buf.push(u8::from(*b));
            }
            Value::Null => {
                return Err(StorageError::decode(
                    "NULL cannot be part of a primary key",
                ))
            }
        }
    }

    Ok(Key::from_vec(buf))
}

/// Decodes a composite row-id back into its primary-key tuple.
pub fn decode_composite(data: &[u8]) -> StorageResult<Vec<Value>> {
    if data.is_empty() {
        return Err(StorageError::decode("empty composite row-id"));
    }
    let count = data[0] as usize;
    let mut offset = 1usize;

    let mut values = Vec::with_capacity(count);
    for i in 0..count {
        let tag = *data
            .get(offset)
            .ok_or_else(|| StorageError::decode(format!("row-id truncated at component {i}")))?;
        offset += 1;

        let value = match tag {
            TAG_INT => {
                let bytes = fixed::<8>(data, offset, i)?;
                offset += 8;
                Value::Int(decode_order_preserving_i64(bytes))
            }
            TAG_FLOAT => {
                let bytes = fixed::<8>(data, offset, i)?;
                offset += 8;
                Value::Float(decode_order_preserving_f64(bytes))
            }
            TAG_STRING => {
                let len_bytes = fixed::<4>(data, offset, i)?;
                offset += 4;
                let len = u32::from_be_bytes(len_bytes) as usize;
                if offset + len > data.len() {
                    return Err(StorageError::decode(format!(
                        "row-id string truncated at component {i}"
                    )));
                }
                let s = std::str::from_utf8(&data[offset..offset + len])
                    .map_err(|_| StorageError::decode("row-id string is not UTF-8"))?;
                offset += len;
                Value::String(s.to_string())
            }
            TAG_BOOL => {
                let byte = fixed::<1>(data, offset, i)?[0];
                offset += 1;
                Value::Boolean(byte != 0)
            }
            other => {
                return Err(StorageError::decode(format!(
                    "unknown row-id type tag {other}"
                )))
            }
        };
        values.push(value);
    }

    Ok(values)
}

/// Encodes an auto-increment row-id.
pub fn encode_auto(id: u64) -> Key {
    Key::from_vec(id.to_be_bytes().to_vec())
}

/// Decodes an auto-increment row-id, if the bytes are one.
pub fn decode_auto(data: &[u8]) -> Option<u64> {
    let bytes: [u8; 8] = data.try_into().ok()?;
    Some(u64::from_be_bytes(bytes))
}

fn fixed<const N: usize>(data: &[u8], offset: usize, component: usize) -> StorageResult<[u8; N]> {
    data.get(offset..offset + N)
        .and_then(|slice| slice.try_into().ok())
        .ok_or_else(|| StorageError::decode(format!("row-id truncated at component {component}")))
}
