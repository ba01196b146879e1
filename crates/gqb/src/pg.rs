//! Postgres executor adapter over tokio-postgres.
//!
//! Bind values are encoded according to the parameter type Postgres inferred
//! for each placeholder, so an `i32` literal can bind to a `BIGINT` column and
//! a text value can bind to `UUID`, `JSONB`, `DATE` or `TIMESTAMP` columns.
//! Returned cells are decoded into [`Value`] by column type. `NUMERIC` and
//! `TIME` come back as text; types without a mapping come back as text when
//! Postgres sends them textually (enums, `citext`) and as raw bytes otherwise.

use crate::error::{GqbError, GqbResult};
use crate::executor::{ExecResult, Executor, Rows};
use crate::value::{DATE_FORMAT, DATETIME_FORMAT, FromValue, Value};
use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use std::error::Error;
use tokio_postgres::Row;
use tokio_postgres::types::{FromSql, IsNull, Kind, ToSql, Type, to_sql_checked};

type BoxError = Box<dyn Error + Sync + Send>;

fn is_text(ty: &Type) -> bool {
    matches!(
        *ty,
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN
    ) || ty.name() == "citext"
}

fn mismatch(value: &Value, ty: &Type) -> BoxError {
    format!("cannot encode {} value as postgres type {}", value.type_name(), ty).into()
}

fn encode_int(value: &Value, n: i128, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    match *ty {
        Type::CHAR => i8::try_from(n)?.to_sql(ty, out),
        Type::INT2 => i16::try_from(n)?.to_sql(ty, out),
        Type::INT4 => i32::try_from(n)?.to_sql(ty, out),
        Type::INT8 => i64::try_from(n)?.to_sql(ty, out),
        Type::OID => u32::try_from(n)?.to_sql(ty, out),
        Type::FLOAT4 => (n as f32).to_sql(ty, out),
        Type::FLOAT8 => (n as f64).to_sql(ty, out),
        Type::BOOL => (n != 0).to_sql(ty, out),
        Type::NUMERIC => Decimal::try_from_i128_with_scale(n, 0)?.to_sql(ty, out),
        _ if is_text(ty) => n.to_string().to_sql(ty, out),
        _ => Err(mismatch(value, ty)),
    }
}

fn encode_float(value: &Value, f: f64, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    match *ty {
        Type::FLOAT4 => (f as f32).to_sql(ty, out),
        Type::FLOAT8 => f.to_sql(ty, out),
        Type::NUMERIC => Decimal::try_from(f)?.to_sql(ty, out),
        _ if is_text(ty) => f.to_string().to_sql(ty, out),
        _ => Err(mismatch(value, ty)),
    }
}

fn encode_text(value: &Value, s: &str, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    match *ty {
        _ if is_text(ty) => s.to_sql(ty, out),
        Type::UUID => uuid::Uuid::parse_str(s.trim())?.to_sql(ty, out),
        Type::JSON | Type::JSONB => serde_json::from_str::<serde_json::Value>(s)?.to_sql(ty, out),
        Type::CHAR | Type::INT2 | Type::INT4 | Type::INT8 | Type::OID => {
            encode_int(value, s.trim().parse::<i128>()?, ty, out)
        }
        Type::FLOAT4 | Type::FLOAT8 => encode_float(value, s.trim().parse::<f64>()?, ty, out),
        Type::NUMERIC => s.trim().parse::<Decimal>()?.to_sql(ty, out),
        Type::BOOL => bool::from_value(value)?.to_sql(ty, out),
        Type::DATE => NaiveDate::from_value(value)?.to_sql(ty, out),
        Type::TIMESTAMP => NaiveDateTime::from_value(value)?.to_sql(ty, out),
        Type::TIMESTAMPTZ => DateTime::<Utc>::from_value(value)?.to_sql(ty, out),
        Type::BYTEA => s.as_bytes().to_sql(ty, out),
        _ => Err(mismatch(value, ty)),
    }
}

fn encode_timestamp(
    value: &Value,
    t: NaiveDateTime,
    ty: &Type,
    out: &mut BytesMut,
) -> Result<IsNull, BoxError> {
    match *ty {
        Type::TIMESTAMP => t.to_sql(ty, out),
        Type::TIMESTAMPTZ => t.and_utc().to_sql(ty, out),
        Type::DATE => t.date().to_sql(ty, out),
        _ if is_text(ty) => t.format(DATETIME_FORMAT).to_string().to_sql(ty, out),
        _ => Err(mismatch(value, ty)),
    }
}

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(b) => match *ty {
                Type::BOOL => b.to_sql(ty, out),
                _ if is_text(ty) => b.to_string().to_sql(ty, out),
                _ => encode_int(self, i128::from(*b), ty, out),
            },
            Value::F32(_) | Value::F64(_) => {
                let f = self.as_f64().unwrap_or_default();
                encode_float(self, f, ty, out)
            }
            Value::String(s) => encode_text(self, s, ty, out),
            Value::Bytes(b) => match *ty {
                Type::BYTEA => b.as_slice().to_sql(ty, out),
                Type::UUID if b.len() == 16 => uuid::Uuid::from_slice(b)?.to_sql(ty, out),
                _ => encode_text(self, std::str::from_utf8(b)?, ty, out),
            },
            Value::Date(d) => match *ty {
                Type::DATE => d.to_sql(ty, out),
                _ if is_text(ty) => d.format(DATE_FORMAT).to_string().to_sql(ty, out),
                _ => encode_timestamp(self, d.and_time(NaiveTime::MIN), ty, out),
            },
            Value::Timestamp(t) => encode_timestamp(self, *t, ty, out),
            other => match other.as_i128() {
                Some(n) => encode_int(self, n, ty, out),
                None => Err(mismatch(self, ty)),
            },
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

fn params(binds: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
    binds.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
}

/// One decoded cell. Accepts every column type.
struct Cell(Value);

impl<'a> FromSql<'a> for Cell {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, BoxError> {
        let value = match *ty {
            Type::BOOL => Value::Bool(bool::from_sql(ty, raw)?),
            Type::CHAR => Value::I8(i8::from_sql(ty, raw)?),
            Type::INT2 => Value::I16(i16::from_sql(ty, raw)?),
            Type::INT4 => Value::I32(i32::from_sql(ty, raw)?),
            Type::INT8 => Value::I64(i64::from_sql(ty, raw)?),
            Type::OID => Value::U32(u32::from_sql(ty, raw)?),
            Type::FLOAT4 => Value::F32(f32::from_sql(ty, raw)?),
            Type::FLOAT8 => Value::F64(f64::from_sql(ty, raw)?),
            Type::NUMERIC => Value::String(Decimal::from_sql(ty, raw)?.to_string()),
            Type::BYTEA => Value::Bytes(raw.to_vec()),
            Type::DATE => Value::Date(NaiveDate::from_sql(ty, raw)?),
            Type::TIME => Value::String(NaiveTime::from_sql(ty, raw)?.to_string()),
            Type::TIMESTAMP => Value::Timestamp(NaiveDateTime::from_sql(ty, raw)?),
            Type::TIMESTAMPTZ => Value::from(DateTime::<Utc>::from_sql(ty, raw)?),
            Type::UUID => Value::from(uuid::Uuid::from_sql(ty, raw)?),
            Type::JSON | Type::JSONB => Value::from(serde_json::Value::from_sql(ty, raw)?),
            _ if is_text(ty) || matches!(ty.kind(), Kind::Enum(_)) => {
                Value::String(std::str::from_utf8(raw)?.to_string())
            }
            _ => Value::Bytes(raw.to_vec()),
        };
        Ok(Cell(value))
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}

fn decode_cell(row: &Row, idx: usize) -> GqbResult<Value> {
    let column = &row.columns()[idx];
    row.try_get::<_, Option<Cell>>(idx)
        .map(|cell| cell.map_or(Value::Null, |c| c.0))
        .map_err(|e| GqbError::decode(column.name(), format!("{} ({})", e, column.type_())))
}

/// Convert driver rows into [`Rows`].
pub fn rows_from_pg(rows: &[Row]) -> GqbResult<Rows> {
    let Some(first) = rows.first() else {
        return Ok(Rows::default());
    };
    let mut out = Rows::new(first.columns().iter().map(|c| c.name()));
    for row in rows {
        let cells = (0..row.len())
            .map(|idx| decode_cell(row, idx))
            .collect::<GqbResult<Vec<_>>>()?;
        out.push_row(cells)?;
    }
    Ok(out)
}

impl Executor for tokio_postgres::Client {
    async fn query(&self, sql: &str, binds: &[Value]) -> GqbResult<Rows> {
        let params = params(binds);
        let rows = tokio_postgres::Client::query(self, sql, &params).await?;
        rows_from_pg(&rows)
    }

    async fn exec(&self, sql: &str, binds: &[Value]) -> GqbResult<ExecResult> {
        let params = params(binds);
        let rows_affected = tokio_postgres::Client::execute(self, sql, &params).await?;
        Ok(ExecResult {
            rows_affected,
            last_insert_id: None,
        })
    }
}

impl Executor for tokio_postgres::Transaction<'_> {
    async fn query(&self, sql: &str, binds: &[Value]) -> GqbResult<Rows> {
        let params = params(binds);
        let rows = tokio_postgres::Transaction::query(self, sql, &params).await?;
        rows_from_pg(&rows)
    }

    async fn exec(&self, sql: &str, binds: &[Value]) -> GqbResult<ExecResult> {
        let params = params(binds);
        let rows_affected = tokio_postgres::Transaction::execute(self, sql, &params).await?;
        Ok(ExecResult {
            rows_affected,
            last_insert_id: None,
        })
    }
}

#[cfg(feature = "pool")]
impl Executor for deadpool_postgres::Client {
    async fn query(&self, sql: &str, binds: &[Value]) -> GqbResult<Rows> {
        // Delegate to the deref target (tokio_postgres::Client).
        let client: &tokio_postgres::Client = self;
        Executor::query(client, sql, binds).await
    }

    async fn exec(&self, sql: &str, binds: &[Value]) -> GqbResult<ExecResult> {
        let client: &tokio_postgres::Client = self;
        Executor::exec(client, sql, binds).await
    }
}

#[cfg(feature = "pool")]
impl Executor for deadpool_postgres::Transaction<'_> {
    async fn query(&self, sql: &str, binds: &[Value]) -> GqbResult<Rows> {
        let tx: &tokio_postgres::Transaction<'_> = self;
        Executor::query(tx, sql, binds).await
    }

    async fn exec(&self, sql: &str, binds: &[Value]) -> GqbResult<ExecResult> {
        let tx: &tokio_postgres::Transaction<'_> = self;
        Executor::exec(tx, sql, binds).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(value: &Value, ty: &Type) -> Result<Vec<u8>, BoxError> {
        let mut buf = BytesMut::new();
        value.to_sql_checked(ty, &mut buf)?;
        Ok(buf.to_vec())
    }

    #[test]
    fn test_int_adapts_to_column_width() {
        assert_eq!(encode(&Value::I32(7), &Type::INT8).unwrap(), 7i64.to_be_bytes());
        assert_eq!(encode(&Value::I64(7), &Type::INT2).unwrap(), 7i16.to_be_bytes());
        assert!(encode(&Value::I64(70_000), &Type::INT2).is_err());
    }

    #[test]
    fn test_null_encodes_as_sql_null() {
        let mut buf = BytesMut::new();
        let is_null = Value::Null.to_sql_checked(&Type::INT4, &mut buf).unwrap();
        assert!(matches!(is_null, IsNull::Yes));
    }

    #[test]
    fn test_text_parses_into_typed_columns() {
        let id = "67e55044-10b1-426f-9247-bb680e5fe0c8";
        let expected = uuid::Uuid::parse_str(id).unwrap();
        assert_eq!(
            encode(&Value::from(id), &Type::UUID).unwrap(),
            expected.as_bytes().to_vec()
        );
        assert_eq!(encode(&Value::from("42"), &Type::INT4).unwrap(), 42i32.to_be_bytes());
        assert!(encode(&Value::from("x"), &Type::INT4).is_err());
    }

    #[test]
    fn test_text_column_accepts_numbers() {
        assert_eq!(encode(&Value::I64(12), &Type::TEXT).unwrap(), b"12".to_vec());
    }

    fn decode(ty: &Type, raw: &[u8]) -> Value {
        <Option<Cell> as FromSql<'_>>::from_sql_nullable(ty, Some(raw))
            .unwrap()
            .map(|c| c.0)
            .unwrap()
    }

    fn wire<T: ToSql>(value: T, ty: &Type) -> Vec<u8> {
        let mut buf = BytesMut::new();
        value.to_sql(ty, &mut buf).unwrap();
        buf.to_vec()
    }

    #[test]
    fn test_cell_accepts_every_type() {
        for ty in [Type::NUMERIC, Type::TIME, Type::INTERVAL, Type::INET, Type::INT4_ARRAY, Type::TEXT] {
            assert!(<Option<Cell> as FromSql<'_>>::accepts(&ty), "{ty}");
        }
    }

    #[test]
    fn test_numeric_and_time_decode_as_text() {
        let price: Decimal = "12.5".parse().unwrap();
        assert_eq!(
            decode(&Type::NUMERIC, &wire(price, &Type::NUMERIC)),
            Value::from("12.5")
        );
        let t = NaiveTime::from_hms_opt(3, 4, 5).unwrap();
        assert_eq!(decode(&Type::TIME, &wire(t, &Type::TIME)), Value::from("03:04:05"));
    }

    #[test]
    fn test_unmapped_types_fall_back_to_raw_bytes() {
        let raw = [0u8, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0];
        assert_eq!(decode(&Type::INTERVAL, &raw), Value::Bytes(raw.to_vec()));
        assert_eq!(decode(&Type::VARCHAR, b"hello"), Value::from("hello"));
    }

    #[test]
    fn test_decoded_cells_keep_their_width() {
        assert_eq!(decode(&Type::INT2, &wire(7i16, &Type::INT2)), Value::I16(7));
        assert_eq!(decode(&Type::INT8, &wire(7i64, &Type::INT8)), Value::I64(7));
        assert_eq!(decode(&Type::BOOL, &wire(true, &Type::BOOL)), Value::Bool(true));
    }

    #[test]
    fn test_numeric_column_accepts_text_and_numbers() {
        let price: Decimal = "12.5".parse().unwrap();
        assert_eq!(encode(&Value::from("12.5"), &Type::NUMERIC).unwrap(), wire(price, &Type::NUMERIC));
        assert_eq!(
            encode(&Value::I64(3), &Type::NUMERIC).unwrap(),
            wire(Decimal::from(3), &Type::NUMERIC)
        );
    }

    #[test]
    fn test_float_into_int_column_is_rejected() {
        assert!(encode(&Value::F64(1.5), &Type::INT4).is_err());
    }
}
