//! Dynamic cell values shared by bind lists and decoded rows.
//!
//! [`Value`] is the closed set of shapes a driver can hand back (or accept):
//! null, bool, the integer and float families, text, bytes, dates and
//! timestamps. [`FromValue`] performs checked coercion into static types.

use crate::error::ConvertError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Serialize, Serializer};

/// Date-only text format accepted by date coercion.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Full datetime text format accepted by timestamp coercion.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A dynamically typed SQL value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    String(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
}

impl Value {
    /// Check whether this is `Value::Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short name of the variant, used in conversion errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::I8(_) => "i8",
            Value::I16(_) => "i16",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::U8(_) => "u8",
            Value::U16(_) => "u16",
            Value::U32(_) => "u32",
            Value::U64(_) => "u64",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Date(_) => "date",
            Value::Timestamp(_) => "timestamp",
        }
    }

    /// Text view of string values and UTF-8 byte values.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            Value::Bytes(b) => std::str::from_utf8(b).ok(),
            _ => None,
        }
    }

    /// Any integer variant, widened.
    pub fn as_i128(&self) -> Option<i128> {
        match *self {
            Value::I8(n) => Some(n.into()),
            Value::I16(n) => Some(n.into()),
            Value::I32(n) => Some(n.into()),
            Value::I64(n) => Some(n.into()),
            Value::U8(n) => Some(n.into()),
            Value::U16(n) => Some(n.into()),
            Value::U32(n) => Some(n.into()),
            Value::U64(n) => Some(n.into()),
            _ => None,
        }
    }

    /// Any float variant, widened.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::F32(f) => Some(f.into()),
            Value::F64(f) => Some(f),
            _ => None,
        }
    }

    /// Coerce into a static type.
    pub fn convert<T: FromValue>(&self) -> Result<T, ConvertError> {
        T::from_value(self)
    }
}

macro_rules! impl_from_primitive {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from_primitive! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    String => String,
    Vec<u8> => Bytes,
    NaiveDate => Date,
    NaiveDateTime => Timestamp,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::String(v.clone())
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v.naive_utc())
    }
}

impl From<uuid::Uuid> for Value {
    fn from(v: uuid::Uuid) -> Self {
        Value::String(v.to_string())
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            other => Value::String(other.to_string()),
        }
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::I8(n) => serializer.serialize_i8(*n),
            Value::I16(n) => serializer.serialize_i16(*n),
            Value::I32(n) => serializer.serialize_i32(*n),
            Value::I64(n) => serializer.serialize_i64(*n),
            Value::U8(n) => serializer.serialize_u8(*n),
            Value::U16(n) => serializer.serialize_u16(*n),
            Value::U32(n) => serializer.serialize_u32(*n),
            Value::U64(n) => serializer.serialize_u64(*n),
            Value::F32(f) => serializer.serialize_f32(*f),
            Value::F64(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::Bytes(b) => match std::str::from_utf8(b) {
                Ok(text) => serializer.serialize_str(text),
                Err(_) => serializer.serialize_bytes(b),
            },
            Value::Date(d) => serializer.collect_str(&d.format(DATE_FORMAT)),
            Value::Timestamp(t) => serializer.collect_str(&t.format(DATETIME_FORMAT)),
        }
    }
}

/// Checked conversion from a [`Value`] into a static type.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self, ConvertError>;
}

fn type_error(value: &Value, to: &'static str) -> ConvertError {
    match value {
        Value::Null => ConvertError::Null,
        other => ConvertError::Type {
            from: other.type_name(),
            to,
        },
    }
}

fn parse_error(input: &str, to: &'static str) -> ConvertError {
    ConvertError::Parse {
        input: input.to_string(),
        to,
    }
}

fn out_of_range(value: &Value, shown: impl ToString, to: &'static str) -> ConvertError {
    ConvertError::OutOfRange {
        from: value.type_name(),
        value: shown.to_string(),
        to,
    }
}

macro_rules! impl_from_value_int {
    ($($t:ty),* $(,)?) => {
        $(
            impl FromValue for $t {
                fn from_value(value: &Value) -> Result<Self, ConvertError> {
                    const TO: &str = stringify!($t);
                    if let Some(n) = value.as_i128() {
                        return <$t>::try_from(n).map_err(|_| out_of_range(value, n, TO));
                    }
                    if let Some(f) = value.as_f64() {
                        let t = f.trunc();
                        // MAX as f64 may round up to the next power of two.
                        if f.is_finite() && t >= <$t>::MIN as f64 && t < <$t>::MAX as f64 + 1.0 {
                            return Ok(t as $t);
                        }
                        return Err(out_of_range(value, f, TO));
                    }
                    match value.as_text() {
                        Some(text) => text.trim().parse::<$t>().map_err(|_| parse_error(text, TO)),
                        None => Err(type_error(value, TO)),
                    }
                }
            }
        )*
    };
}

impl_from_value_int!(i8, i16, i32, i64, u8, u16, u32, u64);

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, ConvertError> {
        if let Some(f) = value.as_f64() {
            return Ok(f);
        }
        if let Some(n) = value.as_i128() {
            return Ok(n as f64);
        }
        match value.as_text() {
            Some(text) => text.trim().parse().map_err(|_| parse_error(text, "f64")),
            None => Err(type_error(value, "f64")),
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: &Value) -> Result<Self, ConvertError> {
        if let Value::F32(f) = *value {
            return Ok(f);
        }
        let wide = f64::from_value(value).map_err(|e| match e {
            ConvertError::Type { from, .. } => ConvertError::Type { from, to: "f32" },
            ConvertError::Parse { input, .. } => ConvertError::Parse { input, to: "f32" },
            other => other,
        })?;
        if wide.is_finite() && wide.abs() > f32::MAX as f64 {
            return Err(out_of_range(value, wide, "f32"));
        }
        Ok(wide as f32)
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, ConvertError> {
        if let Value::Bool(b) = *value {
            return Ok(b);
        }
        if let Some(n) = value.as_i128() {
            return Ok(n > 0);
        }
        match value.as_text() {
            Some(text) => match text.trim().to_ascii_lowercase().as_str() {
                "true" | "t" | "1" => Ok(true),
                "false" | "f" | "0" => Ok(false),
                _ => Err(parse_error(text, "bool")),
            },
            None => Err(type_error(value, "bool")),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, ConvertError> {
        Ok(match value {
            Value::Null => return Err(ConvertError::Null),
            Value::String(s) => s.clone(),
            Value::Bytes(b) => String::from_utf8(b.clone())
                .map_err(|_| parse_error(&String::from_utf8_lossy(b), "string"))?,
            Value::Bool(b) => b.to_string(),
            Value::F32(f) => f.to_string(),
            Value::F64(f) => f.to_string(),
            Value::Date(d) => d.format(DATE_FORMAT).to_string(),
            Value::Timestamp(t) => t.format(DATETIME_FORMAT).to_string(),
            other => match other.as_i128() {
                Some(n) => n.to_string(),
                None => return Err(type_error(other, "string")),
            },
        })
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> Result<Self, ConvertError> {
        match value {
            Value::Bytes(b) => Ok(b.clone()),
            other => String::from_value(other).map(String::into_bytes),
        }
    }
}

impl FromValue for NaiveDate {
    fn from_value(value: &Value) -> Result<Self, ConvertError> {
        match value {
            Value::Date(d) => Ok(*d),
            Value::Timestamp(t) => Ok(t.date()),
            other => match other.as_text() {
                Some(text) => {
                    let text = text.trim();
                    NaiveDate::parse_from_str(text, DATE_FORMAT)
                        .or_else(|_| {
                            NaiveDateTime::parse_from_str(text, DATETIME_FORMAT).map(|t| t.date())
                        })
                        .map_err(|_| parse_error(text, "date"))
                }
                None => Err(type_error(other, "date")),
            },
        }
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: &Value) -> Result<Self, ConvertError> {
        match value {
            Value::Timestamp(t) => Ok(*t),
            Value::Date(d) => Ok(d.and_time(NaiveTime::MIN)),
            other => match other.as_text() {
                Some(text) => {
                    let text = text.trim();
                    NaiveDateTime::parse_from_str(text, DATETIME_FORMAT)
                        .or_else(|_| {
                            NaiveDate::parse_from_str(text, DATE_FORMAT)
                                .map(|d| d.and_time(NaiveTime::MIN))
                        })
                        .map_err(|_| parse_error(text, "datetime"))
                }
                None => Err(type_error(other, "datetime")),
            },
        }
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: &Value) -> Result<Self, ConvertError> {
        NaiveDateTime::from_value(value).map(|t| t.and_utc())
    }
}

impl FromValue for uuid::Uuid {
    fn from_value(value: &Value) -> Result<Self, ConvertError> {
        match value {
            Value::Bytes(b) if b.len() == 16 => uuid::Uuid::from_slice(b)
                .map_err(|_| parse_error(&String::from_utf8_lossy(b), "uuid")),
            other => match other.as_text() {
                Some(text) => uuid::Uuid::parse_str(text.trim()).map_err(|_| parse_error(text, "uuid")),
                None => Err(type_error(other, "uuid")),
            },
        }
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, ConvertError> {
        Ok(value.clone())
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self, ConvertError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}
