//! Projection of engine-native values into portable JSON values.
//!
//! # Architecture
//!
//! Type conversion uses a two-phase approach:
//! 1. `TypeCategory` classifies column types into logical categories
//! 2. Engine-specific decoders handle the actual value extraction
//!
//! The portable value set is string, number, boolean and null. Exact
//! numerics, temporal values, UUIDs and JSON documents are rendered as text;
//! binary data is returned as UTF-8 text when valid and base64 otherwise. A
//! non-null value no decoder accepts is a `Serialization` error.

use crate::error::{DbError, DbResult};
use crate::models::{EngineKind, Row as JsonRow};
use serde_json::Value as JsonValue;
use sqlx::mysql::{MySqlRow, MySqlTypeInfo, MySqlValueRef};
use sqlx::postgres::{PgRow, PgTypeInfo, PgValueFormat, PgValueRef};
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Decode, Row, Type, TypeInfo, ValueRef};

// =============================================================================
// Type Classification
// =============================================================================

/// Logical category for database column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Integer,
    Float,
    Decimal,
    Boolean,
    Text,
    Temporal,
    Binary,
    Json,
    Uuid,
    Unknown,
}

/// Classify a database type name into a logical category.
pub fn categorize_type(type_name: &str, engine: EngineKind) -> TypeCategory {
    let lower = type_name.to_lowercase();

    // Decimal/Numeric - check first as it overlaps with "numeric" in float checks
    if lower.contains("decimal") || lower.contains("numeric") || lower == "money" {
        // SQLite's NUMERIC affinity holds plain numbers
        if engine == EngineKind::SQLite && lower == "numeric" {
            return TypeCategory::Float;
        }
        return TypeCategory::Decimal;
    }

    // Before integers: "interval" and "point" contain "int"
    if lower.contains("interval") || lower.contains("point") {
        return TypeCategory::Unknown;
    }

    if lower.contains("int") || lower.contains("serial") {
        return TypeCategory::Integer;
    }

    if lower == "bool" || lower == "boolean" {
        return TypeCategory::Boolean;
    }

    if lower.contains("float")
        || lower.contains("double")
        || lower == "real"
        || lower == "float4"
        || lower == "float8"
    {
        return TypeCategory::Float;
    }

    if lower == "json" || lower == "jsonb" {
        return TypeCategory::Json;
    }

    if lower == "uuid" {
        return TypeCategory::Uuid;
    }

    if lower.contains("blob") || lower.contains("binary") || lower == "bytea" {
        return TypeCategory::Binary;
    }

    if lower.contains("date") || lower.contains("time") || lower == "year" {
        return TypeCategory::Temporal;
    }

    if lower.contains("char") || lower.contains("text") || lower == "name" || lower == "enum" {
        return TypeCategory::Text;
    }

    TypeCategory::Unknown
}

// =============================================================================
// Decimal Type Support
// =============================================================================

/// Wrapper type for raw DECIMAL/NUMERIC values as strings.
/// This preserves the exact database representation.
#[derive(Debug)]
pub struct RawDecimal(pub String);

impl Type<sqlx::MySql> for RawDecimal {
    fn type_info() -> MySqlTypeInfo {
        <String as Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &MySqlTypeInfo) -> bool {
        let name = ty.name().to_lowercase();
        name.contains("decimal") || name.contains("numeric")
    }
}

impl<'r> Decode<'r, sqlx::MySql> for RawDecimal {
    fn decode(value: MySqlValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as Decode<sqlx::MySql>>::decode(value)?;
        Ok(RawDecimal(s.to_string()))
    }
}

/// Unprepared statements return NUMERIC as text; prepared ones use the packed
/// base-10000 binary form, which is rebuilt into exact decimal text.
impl Type<sqlx::Postgres> for RawDecimal {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("NUMERIC")
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        let name = ty.name().to_lowercase();
        name.contains("numeric") || name.contains("decimal")
    }
}

impl<'r> Decode<'r, sqlx::Postgres> for RawDecimal {
    fn decode(value: PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        match value.format() {
            PgValueFormat::Text => Ok(RawDecimal(value.as_str()?.to_string())),
            PgValueFormat::Binary => Ok(RawDecimal(pg_numeric_to_string(value.as_bytes()?)?)),
        }
    }
}

const PG_NUMERIC_NEG: u16 = 0x4000;
const PG_NUMERIC_NAN: u16 = 0xC000;
const PG_NUMERIC_PINF: u16 = 0xD000;
const PG_NUMERIC_NINF: u16 = 0xF000;

/// Render a PostgreSQL binary NUMERIC as decimal text.
pub fn pg_numeric_to_string(bytes: &[u8]) -> Result<String, sqlx::error::BoxDynError> {
    if bytes.len() < 8 {
        return Err("NUMERIC value is too short".into());
    }
    let read_u16 = |at: usize| u16::from_be_bytes([bytes[at], bytes[at + 1]]);
    let ndigits = read_u16(0) as usize;
    let weight = read_u16(2) as i16 as i32;
    let sign = read_u16(4);
    let dscale = read_u16(6) as usize;

    match sign {
        PG_NUMERIC_NAN => return Ok("NaN".to_string()),
        PG_NUMERIC_PINF => return Ok("Infinity".to_string()),
        PG_NUMERIC_NINF => return Ok("-Infinity".to_string()),
        _ => {}
    }
    if bytes.len() < 8 + ndigits * 2 {
        return Err("NUMERIC value is truncated".into());
    }
    let digits: Vec<u16> = (0..ndigits).map(|i| read_u16(8 + i * 2)).collect();

    let mut out = String::new();
    if sign == PG_NUMERIC_NEG {
        out.push('-');
    }

    // Integer part: groups 0..=weight
    if weight < 0 {
        out.push('0');
    } else {
        for i in 0..=weight {
            let group = digits.get(i as usize).copied().unwrap_or(0);
            if i == 0 {
                out.push_str(&group.to_string());
            } else {
                out.push_str(&format!("{:04}", group));
            }
        }
    }

    if dscale > 0 {
        out.push('.');
        let mut frac = String::new();
        let mut i = weight + 1;
        while frac.len() < dscale {
            let group = if i < 0 {
                0
            } else {
                digits.get(i as usize).copied().unwrap_or(0)
            };
            frac.push_str(&format!("{:04}", group));
            i += 1;
        }
        frac.truncate(dscale);
        out.push_str(&frac);
    }

    Ok(out)
}

// =============================================================================
// Shared helpers
// =============================================================================

/// Binary data as UTF-8 text when valid, otherwise base64.
pub fn decode_binary_value(bytes: &[u8]) -> JsonValue {
    use base64::{Engine as _, engine::general_purpose::STANDARD};

    match std::str::from_utf8(bytes) {
        Ok(s) => JsonValue::String(s.to_string()),
        Err(_) => JsonValue::String(STANDARD.encode(bytes)),
    }
}

/// Float to JSON number; non-finite values become text.
pub fn float_value(v: f64) -> JsonValue {
    serde_json::Number::from_f64(v)
        .map(JsonValue::Number)
        .unwrap_or_else(|| JsonValue::String(v.to_string()))
}

fn text(v: impl ToString) -> JsonValue {
    JsonValue::String(v.to_string())
}

// =============================================================================
// Row to JSON Trait
// =============================================================================

/// Converts a driver row into an ordered column-name to value map.
pub trait RowToJson {
    fn to_json_map(&self) -> DbResult<JsonRow>;
}

macro_rules! impl_row_to_json {
    ($row:ty, $module:ident, $engine:expr) => {
        impl RowToJson for $row {
            fn to_json_map(&self) -> DbResult<JsonRow> {
                let mut map = JsonRow::new();
                for (idx, col) in self.columns().iter().enumerate() {
                    let type_name = col.type_info().name();
                    let value = if self.try_get_raw(idx)?.is_null() {
                        JsonValue::Null
                    } else {
                        let category = categorize_type(type_name, $engine);
                        $module::decode_column(self, idx, category)
                            .ok_or_else(|| DbError::serialization(col.name(), type_name))?
                    };
                    map.insert(col.name().to_string(), value);
                }
                Ok(map)
            }
        }
    };
}

impl_row_to_json!(MySqlRow, mysql, EngineKind::MySql);
impl_row_to_json!(PgRow, postgres, EngineKind::Postgres);
impl_row_to_json!(SqliteRow, sqlite, EngineKind::SQLite);

// =============================================================================
// Engine-Specific Decoders
// =============================================================================
//
// Each decoder is only called for non-null values and returns `None` when no
// supported Rust type accepts the value.

mod mysql {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

    pub fn decode_column(row: &MySqlRow, idx: usize, category: TypeCategory) -> Option<JsonValue> {
        let primary = match category {
            TypeCategory::Decimal => row.try_get::<RawDecimal, _>(idx).ok().map(|v| text(v.0)),
            TypeCategory::Integer => decode_integer(row, idx),
            TypeCategory::Boolean => row.try_get::<bool, _>(idx).ok().map(JsonValue::Bool),
            TypeCategory::Float => decode_float(row, idx),
            TypeCategory::Json => row.try_get::<JsonValue, _>(idx).ok().map(text),
            TypeCategory::Temporal => decode_temporal(row, idx),
            _ => None,
        };
        primary.or_else(|| fallback(row, idx))
    }

    fn decode_integer(row: &MySqlRow, idx: usize) -> Option<JsonValue> {
        if let Ok(v) = row.try_get::<i64, _>(idx) {
            return Some(v.into());
        }
        if let Ok(v) = row.try_get::<u64, _>(idx) {
            return Some(v.into());
        }
        // TINYINT(1) is reported as BOOLEAN by some servers
        row.try_get::<bool, _>(idx).ok().map(|v| JsonValue::from(v as i64))
    }

    fn decode_float(row: &MySqlRow, idx: usize) -> Option<JsonValue> {
        if let Ok(v) = row.try_get::<f64, _>(idx) {
            return Some(float_value(v));
        }
        row.try_get::<f32, _>(idx).ok().map(|v| float_value(v as f64))
    }

    fn decode_temporal(row: &MySqlRow, idx: usize) -> Option<JsonValue> {
        if let Ok(v) = row.try_get::<NaiveDateTime, _>(idx) {
            return Some(text(v));
        }
        if let Ok(v) = row.try_get::<NaiveDate, _>(idx) {
            return Some(text(v));
        }
        if let Ok(v) = row.try_get::<NaiveTime, _>(idx) {
            return Some(text(v));
        }
        // YEAR
        row.try_get::<u16, _>(idx).ok().map(JsonValue::from)
    }

    fn fallback(row: &MySqlRow, idx: usize) -> Option<JsonValue> {
        if let Ok(v) = row.try_get::<String, _>(idx) {
            return Some(JsonValue::String(v));
        }
        row.try_get::<Vec<u8>, _>(idx)
            .ok()
            .map(|v| decode_binary_value(&v))
    }
}

mod postgres {
    use super::*;
    use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

    pub fn decode_column(row: &PgRow, idx: usize, category: TypeCategory) -> Option<JsonValue> {
        let primary = match category {
            TypeCategory::Decimal => row.try_get::<RawDecimal, _>(idx).ok().map(|v| text(v.0)),
            TypeCategory::Integer => decode_integer(row, idx),
            TypeCategory::Boolean => row.try_get::<bool, _>(idx).ok().map(JsonValue::Bool),
            TypeCategory::Float => decode_float(row, idx),
            TypeCategory::Json => row.try_get::<JsonValue, _>(idx).ok().map(text),
            TypeCategory::Uuid => row.try_get::<uuid::Uuid, _>(idx).ok().map(text),
            TypeCategory::Temporal => decode_temporal(row, idx),
            _ => None,
        };
        primary.or_else(|| fallback(row, idx))
    }

    fn decode_integer(row: &PgRow, idx: usize) -> Option<JsonValue> {
        if let Ok(v) = row.try_get::<i64, _>(idx) {
            return Some(v.into());
        }
        if let Ok(v) = row.try_get::<i32, _>(idx) {
            return Some(v.into());
        }
        row.try_get::<i16, _>(idx).ok().map(JsonValue::from)
    }

    fn decode_float(row: &PgRow, idx: usize) -> Option<JsonValue> {
        if let Ok(v) = row.try_get::<f64, _>(idx) {
            return Some(float_value(v));
        }
        row.try_get::<f32, _>(idx).ok().map(|v| float_value(v as f64))
    }

    fn decode_temporal(row: &PgRow, idx: usize) -> Option<JsonValue> {
        if let Ok(v) = row.try_get::<DateTime<Utc>, _>(idx) {
            return Some(text(v.to_rfc3339()));
        }
        if let Ok(v) = row.try_get::<NaiveDateTime, _>(idx) {
            return Some(text(v));
        }
        if let Ok(v) = row.try_get::<NaiveDate, _>(idx) {
            return Some(text(v));
        }
        row.try_get::<NaiveTime, _>(idx).ok().map(text)
    }

    fn fallback(row: &PgRow, idx: usize) -> Option<JsonValue> {
        if let Ok(v) = row.try_get::<String, _>(idx) {
            return Some(JsonValue::String(v));
        }
        row.try_get::<Vec<u8>, _>(idx)
            .ok()
            .map(|v| decode_binary_value(&v))
    }
}

mod sqlite {
    use super::*;

    /// SQLite is dynamically typed: the declared type is only a hint, so every
    /// storage class is tried after the category-specific decoder.
    pub fn decode_column(row: &SqliteRow, idx: usize, category: TypeCategory) -> Option<JsonValue> {
        let primary = match category {
            TypeCategory::Boolean => row.try_get::<bool, _>(idx).ok().map(JsonValue::Bool),
            TypeCategory::Float | TypeCategory::Decimal => {
                row.try_get::<f64, _>(idx).ok().map(float_value)
            }
            _ => None,
        };
        primary.or_else(|| fallback(row, idx))
    }

    fn fallback(row: &SqliteRow, idx: usize) -> Option<JsonValue> {
        if let Ok(v) = row.try_get::<i64, _>(idx) {
            return Some(v.into());
        }
        if let Ok(v) = row.try_get::<f64, _>(idx) {
            return Some(float_value(v));
        }
        if let Ok(v) = row.try_get::<String, _>(idx) {
            return Some(JsonValue::String(v));
        }
        row.try_get::<Vec<u8>, _>(idx)
            .ok()
            .map(|v| decode_binary_value(&v))
    }
}
