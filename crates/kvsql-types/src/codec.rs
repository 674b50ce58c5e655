//! Value encoding.
//!
//! Two modes:
//!
//! - [`EncodingMode::AsKey`] produces bytes whose lexicographic order matches
//!   the SQL order of the values. Integers and timestamps are big-endian with
//!   the sign bit flipped; variable-length values escape `0x00` as `0x00 0xFF`
//!   and end with `0x00 0x01`, so a value never compares as a prefix of a
//!   longer one.
//! - [`EncodingMode::AsValue`] produces `len (u32 BE) ‖ payload` and is
//!   reversible with [`decode_value`].
//!
//! `NULL` has no encoding in either mode; row codecs omit null columns.

use kvsql_error::{KvSqlError, Result};

use crate::value::{SqlType, TypedValue};

const SIGN_BIT: u64 = 1 << 63;
const ESCAPE: u8 = 0x00;
const ESCAPED_ZERO: u8 = 0xFF;
const TERMINATOR: u8 = 0x01;

/// How a value is being encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingMode {
    AsKey,
    AsValue,
}

/// Encode `value`, declared as `ty`, in the requested mode.
///
/// # Errors
/// [`KvSqlError::InvalidValue`] when the value is `NULL`, does not match the
/// declared type, or is too large to length-prefix.
pub fn encode_value(value: &TypedValue, ty: SqlType, mode: EncodingMode) -> Result<Vec<u8>> {
    if value.is_null() {
        return Err(KvSqlError::InvalidValue(format!(
            "NULL cannot be encoded as {ty}"
        )));
    }
    value.check_type(ty)?;

    match mode {
        EncodingMode::AsKey => Ok(encode_key(value)),
        EncodingMode::AsValue => {
            let payload = value_payload(value);
            let len = u32::try_from(payload.len()).map_err(|_| {
                KvSqlError::InvalidValue(format!("value of {} bytes is too large", payload.len()))
            })?;
            let mut buf = Vec::with_capacity(4 + payload.len());
            buf.extend_from_slice(&len.to_be_bytes());
            buf.extend_from_slice(&payload);
            Ok(buf)
        }
    }
}

fn encode_key(value: &TypedValue) -> Vec<u8> {
    match value {
        TypedValue::Integer(v) | TypedValue::Timestamp(v) => {
            ((*v as u64) ^ SIGN_BIT).to_be_bytes().to_vec()
        }
        TypedValue::Boolean(v) => vec![u8::from(*v)],
        TypedValue::Varchar(v) => escape_bytes(v.as_bytes()),
        TypedValue::Blob(v) => escape_bytes(v),
        TypedValue::Null => Vec::new(),
    }
}

fn escape_bytes(bytes: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(bytes.len() + 2);
    for &b in bytes {
        if b == ESCAPE {
            buf.extend_from_slice(&[ESCAPE, ESCAPED_ZERO]);
        } else {
            buf.push(b);
        }
    }
    buf.extend_from_slice(&[ESCAPE, TERMINATOR]);
    buf
}

fn value_payload(value: &TypedValue) -> Vec<u8> {
    match value {
        TypedValue::Integer(v) | TypedValue::Timestamp(v) => v.to_be_bytes().to_vec(),
        TypedValue::Boolean(v) => vec![u8::from(*v)],
        TypedValue::Varchar(v) => v.as_bytes().to_vec(),
        TypedValue::Blob(v) => v.clone(),
        TypedValue::Null => Vec::new(),
    }
}

/// Decode one value-mode encoding from the front of `buf`.
///
/// Returns the value and the number of bytes consumed.
///
/// # Errors
/// [`KvSqlError::CorruptedData`] when `buf` is truncated or the payload does
/// not fit `ty`.
pub fn decode_value(buf: &[u8], ty: SqlType) -> Result<(TypedValue, usize)> {
    let len_bytes: [u8; 4] = buf
        .get(..4)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| KvSqlError::CorruptedData("truncated value length".to_owned()))?;
    let len = u32::from_be_bytes(len_bytes) as usize;
    let payload = buf
        .get(4..4 + len)
        .ok_or_else(|| KvSqlError::CorruptedData(format!("truncated {ty} payload")))?;

    let value = match ty {
        SqlType::Integer | SqlType::Timestamp => {
            let raw: [u8; 8] = payload.try_into().map_err(|_| {
                KvSqlError::CorruptedData(format!("{ty} payload must be 8 bytes, got {len}"))
            })?;
            let v = i64::from_be_bytes(raw);
            if ty == SqlType::Integer {
                TypedValue::Integer(v)
            } else {
                TypedValue::Timestamp(v)
            }
        }
        SqlType::Boolean => match payload {
            [0] => TypedValue::Boolean(false),
            [1] => TypedValue::Boolean(true),
            _ => {
                return Err(KvSqlError::CorruptedData(
                    "invalid BOOLEAN payload".to_owned(),
                ));
            }
        },
        SqlType::Varchar => TypedValue::Varchar(
            String::from_utf8(payload.to_vec())
                .map_err(|_| KvSqlError::CorruptedData("VARCHAR is not UTF-8".to_owned()))?,
        ),
        SqlType::Blob => TypedValue::Blob(payload.to_vec()),
    };
    Ok((value, 4 + len))
}
