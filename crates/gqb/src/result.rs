//! Result decoding: row accessors and struct mapping.
//!
//! Every returned row is scanned once into a [`Record`], an immutable
//! column-name to [`Value`] map. A record can be read field by field through
//! typed accessors, or projected into a caller's struct through
//! [`FromRecord`] (usually derived with `#[derive(FromRecord)]`).

use crate::error::{GqbError, GqbResult};
use crate::executor::Rows;
use crate::value::{FromValue, Value};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeMap;

/// Map a [`Record`] into a struct.
///
/// Only mapped fields are written; a column the record doesn't have is
/// skipped, leaving the field as it was.
///
/// # Example
///
/// ```ignore
/// use gqb::FromRecord;
///
/// #[derive(Debug, Default, FromRecord)]
/// struct Company {
///     #[db = "id"]
///     id: i64,
///     #[db = "name"]
///     name: String,
///     #[db = "url"]
///     url: Option<String>,
/// }
///
/// let company: Company = builder.get_one("companies").await?.map()?;
/// ```
pub trait FromRecord {
    /// Assign every mapped column present in `record`.
    fn fill_from(&mut self, record: &Record) -> GqbResult<()>;

    /// Build a default value and fill it from `record`.
    fn from_record(record: &Record) -> GqbResult<Self>
    where
        Self: Sized + Default,
    {
        let mut out = Self::default();
        out.fill_from(record)?;
        Ok(out)
    }
}

/// Read-only view of one returned row.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record {
    values: BTreeMap<String, Value>,
}

impl Record {
    pub fn new(values: BTreeMap<String, Value>) -> Self {
        Self { values }
    }

    /// Whether the row has this column.
    pub fn exists(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    /// Whether the column is NULL. A missing column counts as NULL.
    pub fn is_nil(&self, field: &str) -> bool {
        self.values.get(field).is_none_or(Value::is_null)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Read a column as `T`.
    ///
    /// Fails when the column is missing, NULL (unless `T` is an `Option`) or
    /// not coercible to `T`.
    pub fn value<T: FromValue>(&self, field: &str) -> GqbResult<T> {
        let value = self
            .values
            .get(field)
            .ok_or_else(|| GqbError::MissingColumn(field.to_string()))?;
        T::from_value(value).map_err(|e| GqbError::decode(field, e))
    }

    /// Write a column into `dest` if the row has it.
    ///
    /// This is the primitive struct mapping is built on: a missing column
    /// leaves `dest` untouched and is not an error.
    pub fn assign<T: FromValue>(&self, dest: &mut T, field: &str) -> GqbResult<()> {
        if let Some(value) = self.values.get(field) {
            *dest = T::from_value(value).map_err(|e| GqbError::decode(field, e))?;
        }
        Ok(())
    }

    pub fn string(&self, field: &str) -> GqbResult<String> {
        self.value(field)
    }

    pub fn int(&self, field: &str) -> GqbResult<i32> {
        self.value(field)
    }

    pub fn int64(&self, field: &str) -> GqbResult<i64> {
        self.value(field)
    }

    pub fn uint64(&self, field: &str) -> GqbResult<u64> {
        self.value(field)
    }

    pub fn float64(&self, field: &str) -> GqbResult<f64> {
        self.value(field)
    }

    pub fn boolean(&self, field: &str) -> GqbResult<bool> {
        self.value(field)
    }

    pub fn bytes(&self, field: &str) -> GqbResult<Vec<u8>> {
        self.value(field)
    }

    /// Date column, or text in `YYYY-MM-DD` form.
    pub fn date(&self, field: &str) -> GqbResult<NaiveDate> {
        self.value(field)
    }

    /// Timestamp column, or text in `YYYY-MM-DD HH:MM:SS` form.
    pub fn datetime(&self, field: &str) -> GqbResult<NaiveDateTime> {
        self.value(field)
    }

    /// Map this row into a fresh `T`.
    pub fn map<T: FromRecord + Default>(&self) -> GqbResult<T> {
        T::from_record(self)
    }

    /// Map this row into an existing `T`.
    ///
    /// The fill runs on a copy; `dest` is only replaced when every column
    /// decoded, so a failure leaves it as it was.
    pub fn map_to<T: FromRecord + Clone>(&self, dest: &mut T) -> GqbResult<()> {
        let mut staged = dest.clone();
        staged.fill_from(self)?;
        *dest = staged;
        Ok(())
    }

    /// Serialize the row as a JSON object.
    pub fn to_json(&self) -> GqbResult<String> {
        serde_json::to_string(self).map_err(|e| GqbError::Other(e.to_string()))
    }
}

fn must<T>(result: GqbResult<T>) -> T {
    result.unwrap_or_else(|e| panic!("{e}"))
}

/// Panicking accessors.
///
/// Convenience only: each one panics where its fallible counterpart would
/// return an error. Prefer the fallible forms.
impl Record {
    pub fn must_string(&self, field: &str) -> String {
        must(self.string(field))
    }

    pub fn must_int(&self, field: &str) -> i32 {
        must(self.int(field))
    }

    pub fn must_int64(&self, field: &str) -> i64 {
        must(self.int64(field))
    }

    pub fn must_uint64(&self, field: &str) -> u64 {
        must(self.uint64(field))
    }

    pub fn must_float64(&self, field: &str) -> f64 {
        must(self.float64(field))
    }

    pub fn must_boolean(&self, field: &str) -> bool {
        must(self.boolean(field))
    }

    pub fn must_bytes(&self, field: &str) -> Vec<u8> {
        must(self.bytes(field))
    }

    pub fn must_date(&self, field: &str) -> NaiveDate {
        must(self.date(field))
    }

    pub fn must_datetime(&self, field: &str) -> NaiveDateTime {
        must(self.datetime(field))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Returned rows in result-set order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Records(Vec<Record>);

impl Records {
    pub fn new(records: Vec<Record>) -> Self {
        Self(records)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<&Record> {
        self.0.first()
    }

    pub fn get(&self, index: usize) -> Option<&Record> {
        self.0.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.0.iter()
    }

    pub fn into_vec(self) -> Vec<Record> {
        self.0
    }

    /// Map every row into a fresh `T`, in order.
    pub fn map_into<T: FromRecord + Default>(&self) -> GqbResult<Vec<T>> {
        self.0.iter().map(Record::map).collect()
    }

    /// Map every row and append to `dest`.
    ///
    /// On the first failure the error is returned and `dest` is left as it
    /// was.
    pub fn map_to<T: FromRecord + Default>(&self, dest: &mut Vec<T>) -> GqbResult<()> {
        let mapped = self.map_into()?;
        dest.extend(mapped);
        Ok(())
    }

    pub fn to_json(&self) -> GqbResult<String> {
        serde_json::to_string(self).map_err(|e| GqbError::Other(e.to_string()))
    }
}

impl IntoIterator for Records {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Records {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Turn executor rows into records. A repeated column name keeps the last
/// value.
pub fn scan(rows: Rows) -> Records {
    let (columns, rows) = rows.into_parts();
    Records(
        rows.into_iter()
            .map(|cells| Record::new(columns.iter().cloned().zip(cells).collect()))
            .collect(),
    )
}
