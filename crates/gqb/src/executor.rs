//! Executor trait: the capability the builder runs statements against.

use crate::error::{GqbError, GqbResult};
use crate::value::Value;
use std::time::Duration;

/// Rows returned by a query, as column names plus dynamic cell values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rows {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Rows {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row; its width must match the column list.
    pub fn push_row(&mut self, row: Vec<Value>) -> GqbResult<()> {
        if row.len() != self.columns.len() {
            return Err(GqbError::Other(format!(
                "row has {} values but {} columns were declared",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Chaining form of [`Rows::push_row`].
    pub fn with_row(mut self, row: Vec<Value>) -> GqbResult<Self> {
        self.push_row(row)?;
        Ok(self)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub(crate) fn into_parts(self) -> (Vec<String>, Vec<Vec<Value>>) {
        (self.columns, self.rows)
    }
}

/// Outcome of an INSERT / UPDATE / DELETE.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecResult {
    pub rows_affected: u64,
    /// Driver-reported id of the inserted row, when the driver has one.
    pub last_insert_id: Option<i64>,
}

/// Per-call options passed alongside a statement.
///
/// `tag` is forwarded to the executor for observability; `timeout` bounds the
/// executor call. Dropping the returned future cancels the call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecContext {
    pub tag: Option<String>,
    pub timeout: Option<Duration>,
}

impl ExecContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Something that can run parameterized statements.
///
/// Implemented for `tokio_postgres::Client`, `tokio_postgres::Transaction`
/// and (with the `pool` feature) their deadpool wrappers. Passing a
/// transaction anywhere an executor is expected runs the statement inside it.
pub trait Executor: Send + Sync {
    /// Run a query and return every row.
    fn query(
        &self,
        sql: &str,
        binds: &[Value],
    ) -> impl std::future::Future<Output = GqbResult<Rows>> + Send;

    /// Run a query with per-call context.
    ///
    /// The default implementation ignores `ctx` and calls [`Executor::query`].
    fn query_ctx(
        &self,
        ctx: &ExecContext,
        sql: &str,
        binds: &[Value],
    ) -> impl std::future::Future<Output = GqbResult<Rows>> + Send {
        let _ = ctx;
        self.query(sql, binds)
    }

    /// Run a statement that returns no rows.
    fn exec(
        &self,
        sql: &str,
        binds: &[Value],
    ) -> impl std::future::Future<Output = GqbResult<ExecResult>> + Send;

    /// Run a statement with per-call context.
    ///
    /// The default implementation ignores `ctx` and calls [`Executor::exec`].
    fn exec_ctx(
        &self,
        ctx: &ExecContext,
        sql: &str,
        binds: &[Value],
    ) -> impl std::future::Future<Output = GqbResult<ExecResult>> + Send {
        let _ = ctx;
        self.exec(sql, binds)
    }
}

impl<E: Executor> Executor for &E {
    async fn query(&self, sql: &str, binds: &[Value]) -> GqbResult<Rows> {
        (**self).query(sql, binds).await
    }

    async fn query_ctx(&self, ctx: &ExecContext, sql: &str, binds: &[Value]) -> GqbResult<Rows> {
        (**self).query_ctx(ctx, sql, binds).await
    }

    async fn exec(&self, sql: &str, binds: &[Value]) -> GqbResult<ExecResult> {
        (**self).exec(sql, binds).await
    }

    async fn exec_ctx(
        &self,
        ctx: &ExecContext,
        sql: &str,
        binds: &[Value],
    ) -> GqbResult<ExecResult> {
        (**self).exec_ctx(ctx, sql, binds).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_row_checks_width() {
        let mut rows = Rows::new(["id", "name"]);
        assert!(rows.push_row(vec![Value::I64(1), Value::from("a")]).is_ok());
        assert!(rows.push_row(vec![Value::I64(2)]).is_err());
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_exec_context_setters() {
        let ctx = ExecContext::new()
            .tag("users.list")
            .timeout(Duration::from_secs(2));
        assert_eq!(ctx.tag.as_deref(), Some("users.list"));
        assert_eq!(ctx.timeout, Some(Duration::from_secs(2)));
    }
}
