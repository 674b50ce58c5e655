//! Storage layout of table rows.
//!
//! Key:   `prefix ‖ "R." ‖ db_id (u32 BE) ‖ table_id (u32 BE) ‖ pk (key mode)`
//! Value: `col_count (u32 BE)` followed by `col_id (u32 BE) ‖ value (value mode)`
//! for every non-null column, ascending by column id.

use std::collections::BTreeMap;

use kvsql_catalog::Table;
use kvsql_error::{KvSqlError, Result};
use kvsql_types::{EncodingMode, TypedValue, decode_value, encode_value};

/// Marker separating the engine prefix from row keys.
pub const ROW_PREFIX: &[u8] = b"R.";

/// Key prefix shared by every row of `table`.
pub fn table_prefix(engine_prefix: &[u8], table: &Table) -> Vec<u8> {
    let mut key = Vec::with_capacity(engine_prefix.len() + ROW_PREFIX.len() + 8);
    key.extend_from_slice(engine_prefix);
    key.extend_from_slice(ROW_PREFIX);
    key.extend_from_slice(&table.db_id().to_be_bytes());
    key.extend_from_slice(&table.id().to_be_bytes());
    key
}

/// Encode one row of `table` into its storage key and value.
///
/// # Errors
/// - [`KvSqlError::ColumnDoesNotExist`] for unknown column names.
/// - [`KvSqlError::IllegalArguments`] when a column is given twice.
/// - [`KvSqlError::InvalidValue`] for a missing or null primary key, a null in
///   a `NOT NULL` column, or a type mismatch.
pub fn encode_row(
    engine_prefix: &[u8],
    table: &Table,
    values: &[(&str, TypedValue)],
) -> Result<(Vec<u8>, Vec<u8>)> {
    let mut by_id: BTreeMap<u32, &TypedValue> = BTreeMap::new();
    for (name, value) in values {
        let col = table.column(name)?;
        if by_id.insert(col.id(), value).is_some() {
            return Err(KvSqlError::IllegalArguments);
        }
    }

    for col in table.columns() {
        let missing = by_id.get(&col.id()).is_none_or(|v| v.is_null());
        if missing && !col.is_nullable() {
            return Err(KvSqlError::InvalidValue(format!(
                "column {} of {} cannot be null",
                col.name(),
                table.name()
            )));
        }
    }

    let pk = table.primary_key();
    let pk_value = by_id
        .get(&pk.id())
        .ok_or_else(|| KvSqlError::InvalidValue(format!("missing primary key {}", pk.name())))?;

    let mut key = table_prefix(engine_prefix, table);
    key.extend_from_slice(&encode_value(pk_value, pk.col_type(), EncodingMode::AsKey)?);

    let present: Vec<(u32, &TypedValue)> = by_id
        .into_iter()
        .filter(|(_, v)| !v.is_null())
        .collect();
    let count = u32::try_from(present.len())
        .map_err(|_| KvSqlError::InvalidValue("too many columns".to_owned()))?;

    let mut value = Vec::with_capacity(64);
    value.extend_from_slice(&count.to_be_bytes());
    for (col_id, v) in present {
        let col = table
            .column_by_id(col_id)
            .ok_or_else(|| KvSqlError::internal(format!("column id {col_id} vanished")))?;
        value.extend_from_slice(&col_id.to_be_bytes());
        value.extend_from_slice(&encode_value(v, col.col_type(), EncodingMode::AsValue)?);
    }

    Ok((key, value))
}

/// Decode a stored row into column id → value, filling absent columns with
/// `NULL`.
///
/// # Errors
/// [`KvSqlError::CorruptedData`] for truncated input, unknown column ids, or
/// trailing bytes.
pub fn decode_row(table: &Table, buf: &[u8]) -> Result<BTreeMap<u32, TypedValue>> {
    let mut pos = 0;
    let count = read_u32(buf, &mut pos)?;

    let mut values: BTreeMap<u32, TypedValue> =
        table.columns().map(|c| (c.id(), TypedValue::Null)).collect();

    for _ in 0..count {
        let col_id = read_u32(buf, &mut pos)?;
        let col = table.column_by_id(col_id).ok_or_else(|| {
            KvSqlError::CorruptedData(format!("unknown column id {col_id} in {}", table.name()))
        })?;
        let (value, used) = decode_value(&buf[pos..], col.col_type())?;
        pos += used;
        values.insert(col_id, value);
    }

    if pos != buf.len() {
        return Err(KvSqlError::CorruptedData(format!(
            "{} trailing bytes after row of {}",
            buf.len() - pos,
            table.name()
        )));
    }
    Ok(values)
}

fn read_u32(buf: &[u8], pos: &mut usize) -> Result<u32> {
    let bytes: [u8; 4] = buf
        .get(*pos..*pos + 4)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| KvSqlError::CorruptedData("truncated row".to_owned()))?;
    *pos += 4;
    Ok(u32::from_be_bytes(bytes))
}
