//! Fluent statement builder.
//!
//! A [`Builder`] accumulates select fields, joins, conditions, grouping,
//! ordering and paging through chained `&mut self` calls, then renders and
//! runs one statement per terminal call (`get`, `get_one`, `insert`,
//! `update`, `delete` and their `_ctx` variants).
//!
//! # Reset contract
//!
//! Every terminal call takes the accumulated configuration out of the builder
//! before rendering, so the builder is empty afterwards whether the call
//! succeeded or failed. [`Builder::reset`] clears it explicitly;
//! [`Builder::build`] renders without executing and without clearing.
//!
//! # Example
//!
//! ```ignore
//! use gqb::{Builder, Comparison, Data, SortMode};
//!
//! let mut builder = Builder::new(&client);
//!
//! let rows = builder
//!     .where_("status", "active", Comparison::Equal)
//!     .order_by("created_at", SortMode::Desc)
//!     .limit(10)
//!     .get("users")
//!     .await?;
//!
//! builder
//!     .insert("users", Data::new().set("name", "John").set("age", 30))
//!     .await?;
//! ```

use crate::clause::{
    Join, Order, SelectField, SortMode, TableRef, build_group_by, build_join, build_limit,
    build_offset, build_order_by, build_select_fields, build_where,
};
use crate::condition::{Comparison, ConditionGroup, Field, Operand};
use crate::config::GqbConfig;
use crate::dialect::Dialect;
use crate::error::{GqbError, GqbResult};
use crate::executor::{ExecContext, ExecResult, Executor};
use crate::result::{Record, Records, scan};
use crate::value::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::time::Instant;

/// Statement kind rendered by [`Builder::build`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Select,
    Insert,
    Update,
    Delete,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Select => "SELECT",
            Mode::Insert => "INSERT",
            Mode::Update => "UPDATE",
            Mode::Delete => "DELETE",
        })
    }
}

/// Column values for INSERT / UPDATE.
///
/// Keys are kept sorted, so the same logical data always renders the same
/// SQL and bind order no matter how it was assembled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Data(BTreeMap<String, Value>);

impl Data {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chaining insert.
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.0.insert(field.into(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Field names in rendering order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Data {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Data(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<Value>, const N: usize> From<[(K, V); N]> for Data {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl From<BTreeMap<String, Value>> for Data {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Data(map)
    }
}

/// Rendered SQL text and its bind values, in placeholder order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub binds: Vec<Value>,
}

#[derive(Debug, Clone, Default)]
struct BuilderState {
    selects: Vec<SelectField>,
    joins: Vec<Join>,
    wheres: ConditionGroup,
    group_by: Vec<Field>,
    orders: Vec<Order>,
    limit: u64,
    offset: u64,
}

impl BuilderState {
    fn render(
        &self,
        mode: Mode,
        table: &TableRef,
        data: Option<&Data>,
        dialect: Dialect,
        limit_override: Option<u64>,
    ) -> GqbResult<Statement> {
        table.validate()?;
        let table_sql = table.render(dialect);
        let limit = limit_override.unwrap_or(self.limit);
        let mut binds = Vec::new();

        let sql = match mode {
            Mode::Select => {
                let where_sql = build_where(self.wheres.nodes(), dialect, &mut binds)?;
                format!(
                    "SELECT {} FROM {}{}{}{}{}{}{}",
                    build_select_fields(&self.selects, dialect),
                    table_sql,
                    build_join(&self.joins, table, dialect),
                    where_sql,
                    build_group_by(&self.group_by, dialect),
                    build_order_by(&self.orders, dialect),
                    build_limit(limit),
                    build_offset(self.offset),
                )
            }
            Mode::Insert => {
                let data = require_data(mode, data)?;
                let mut fields = Vec::with_capacity(data.len());
                let mut placeholders = Vec::with_capacity(data.len());
                for (field, value) in data.iter() {
                    fields.push(dialect.quote(field));
                    binds.push(value.clone());
                    placeholders.push(dialect.placeholder(binds.len()));
                }
                format!(
                    "INSERT INTO {} ({}) VALUES ({})",
                    table_sql,
                    fields.join(", "),
                    placeholders.join(", ")
                )
            }
            Mode::Update => {
                let data = require_data(mode, data)?;
                let mut sets = Vec::with_capacity(data.len());
                for (field, value) in data.iter() {
                    binds.push(value.clone());
                    sets.push(format!(
                        "{} = {}",
                        dialect.quote(field),
                        dialect.placeholder(binds.len())
                    ));
                }
                let where_sql = build_where(self.wheres.nodes(), dialect, &mut binds)?;
                format!(
                    "UPDATE {} SET {}{}{}",
                    table_sql,
                    sets.join(", "),
                    where_sql,
                    mutation_limit(mode, limit, dialect)?
                )
            }
            Mode::Delete => {
                let where_sql = build_where(self.wheres.nodes(), dialect, &mut binds)?;
                format!(
                    "DELETE FROM {}{}{}",
                    table_sql,
                    where_sql,
                    mutation_limit(mode, limit, dialect)?
                )
            }
        };

        Ok(Statement { sql, binds })
    }
}

fn require_data(mode: Mode, data: Option<&Data>) -> GqbResult<&Data> {
    let what = mode.to_string().to_lowercase();
    let data = data.ok_or_else(|| GqbError::validation(format!("{what} data must be non-nil")))?;
    if data.is_empty() {
        return Err(GqbError::validation(format!("{what} data must be non-empty")));
    }
    if data.keys().any(|k| k.trim().is_empty()) {
        return Err(GqbError::validation(format!("{what} data contains an empty field name")));
    }
    Ok(data)
}

fn mutation_limit(mode: Mode, limit: u64, dialect: Dialect) -> GqbResult<String> {
    if limit == 0 {
        return Ok(String::new());
    }
    if !dialect.supports_update_limit() {
        return Err(GqbError::validation(format!(
            "LIMIT on {mode} is not supported by the {dialect} dialect"
        )));
    }
    Ok(build_limit(limit))
}

/// Fluent SQL statement builder bound to an executor.
pub struct Builder<E> {
    executor: E,
    config: GqbConfig,
    state: BuilderState,
}

impl<E> Builder<E> {
    /// Create a builder with the default configuration.
    pub fn new(executor: E) -> Self {
        Self::with_config(executor, GqbConfig::default())
    }

    /// Create a builder for a specific dialect.
    pub fn with_dialect(executor: E, dialect: Dialect) -> Self {
        Self::with_config(executor, GqbConfig::default().dialect(dialect))
    }

    pub fn with_config(executor: E, config: GqbConfig) -> Self {
        Self {
            executor,
            config,
            state: BuilderState::default(),
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.config.dialect
    }

    pub fn config(&self) -> &GqbConfig {
        &self.config
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Clear all accumulated configuration.
    pub fn reset(&mut self) -> &mut Self {
        self.state = BuilderState::default();
        self
    }

    /// Add SELECT fields. Without any, `*` is selected.
    pub fn select<I>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<SelectField>,
    {
        self.state
            .selects
            .extend(fields.into_iter().map(Into::into));
        self
    }

    /// Set LIMIT; zero means no limit.
    pub fn limit(&mut self, limit: u64) -> &mut Self {
        self.state.limit = limit;
        self
    }

    /// Set OFFSET; zero means no offset.
    pub fn offset(&mut self, offset: u64) -> &mut Self {
        self.state.offset = offset;
        self
    }

    /// Add `JOIN table ON (<main>.from <comparison> table.to)`.
    pub fn join(
        &mut self,
        table: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
        comparison: Comparison,
    ) -> &mut Self {
        self.state.joins.push(Join {
            table: table.into(),
            from: from.into(),
            to: to.into(),
            comparison,
        });
        self
    }

    pub fn where_(
        &mut self,
        field: impl Into<Field>,
        value: impl Into<Value>,
        comparison: Comparison,
    ) -> &mut Self {
        self.state.wheres.where_(field, value, comparison);
        self
    }

    pub fn or_where(
        &mut self,
        field: impl Into<Field>,
        value: impl Into<Value>,
        comparison: Comparison,
    ) -> &mut Self {
        self.state.wheres.or_where(field, value, comparison);
        self
    }

    pub fn where_op(
        &mut self,
        field: impl Into<Field>,
        comparison: Comparison,
        operand: impl Into<Operand>,
    ) -> &mut Self {
        self.state.wheres.where_op(field, comparison, operand);
        self
    }

    pub fn or_where_op(
        &mut self,
        field: impl Into<Field>,
        comparison: Comparison,
        operand: impl Into<Operand>,
    ) -> &mut Self {
        self.state.wheres.or_where_op(field, comparison, operand);
        self
    }

    pub fn where_in<I>(&mut self, field: impl Into<Field>, values: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.state.wheres.where_in(field, values);
        self
    }

    pub fn or_where_in<I>(&mut self, field: impl Into<Field>, values: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.state.wheres.or_where_in(field, values);
        self
    }

    pub fn where_not_in<I>(&mut self, field: impl Into<Field>, values: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.state.wheres.where_not_in(field, values);
        self
    }

    pub fn or_where_not_in<I>(&mut self, field: impl Into<Field>, values: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.state.wheres.or_where_not_in(field, values);
        self
    }

    pub fn like(&mut self, field: impl Into<Field>, pattern: impl Into<Value>) -> &mut Self {
        self.state.wheres.like(field, pattern);
        self
    }

    pub fn or_like(&mut self, field: impl Into<Field>, pattern: impl Into<Value>) -> &mut Self {
        self.state.wheres.or_like(field, pattern);
        self
    }

    pub fn not_like(&mut self, field: impl Into<Field>, pattern: impl Into<Value>) -> &mut Self {
        self.state.wheres.not_like(field, pattern);
        self
    }

    pub fn or_not_like(&mut self, field: impl Into<Field>, pattern: impl Into<Value>) -> &mut Self {
        self.state.wheres.or_not_like(field, pattern);
        self
    }

    /// Add a raw WHERE fragment with AND. The text is not escaped.
    pub fn where_raw(&mut self, sql: impl Into<String>) -> &mut Self {
        self.state.wheres.where_raw(sql);
        self
    }

    /// Add a raw WHERE fragment with OR. The text is not escaped.
    pub fn or_where_raw(&mut self, sql: impl Into<String>) -> &mut Self {
        self.state.wheres.or_where_raw(sql);
        self
    }

    /// Add a parenthesized condition group joined with AND.
    pub fn where_group(&mut self, f: impl FnOnce(&mut ConditionGroup)) -> &mut Self {
        self.state.wheres.where_group(f);
        self
    }

    /// Add a parenthesized condition group joined with OR.
    pub fn or_where_group(&mut self, f: impl FnOnce(&mut ConditionGroup)) -> &mut Self {
        self.state.wheres.or_where_group(f);
        self
    }

    pub fn group_by<I>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<Field>,
    {
        self.state
            .group_by
            .extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn order_by(&mut self, field: impl Into<Field>, mode: SortMode) -> &mut Self {
        self.state.orders.push(Order {
            field: field.into(),
            mode,
        });
        self
    }

    /// Render a statement from the current configuration without executing
    /// or clearing it.
    pub fn build(
        &self,
        mode: Mode,
        table: impl Into<TableRef>,
        data: Option<&Data>,
    ) -> GqbResult<Statement> {
        self.state
            .render(mode, &table.into(), data, self.config.dialect, None)
    }

    fn take_state(&mut self) -> BuilderState {
        std::mem::take(&mut self.state)
    }
}

impl<E: Executor> Builder<E> {
    async fn observe<T>(
        &self,
        ctx: &ExecContext,
        mode: Mode,
        stmt: &Statement,
        call: impl Future<Output = GqbResult<T>>,
    ) -> GqbResult<T> {
        if self.config.log_sql {
            tracing::debug!(
                target: "gqb.sql",
                mode = %mode,
                dialect = %self.config.dialect,
                tag = ctx.tag.as_deref().unwrap_or(""),
                sql = %stmt.sql,
                binds = stmt.binds.len(),
                "executing statement"
            );
        }

        let start = Instant::now();
        let result = match ctx.timeout.or(self.config.query_timeout) {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| GqbError::Timeout(limit))?,
            None => call.await,
        };

        let elapsed = start.elapsed();
        if let Some(threshold) = self.config.slow_query_threshold {
            if elapsed >= threshold {
                tracing::warn!(
                    target: "gqb.sql",
                    mode = %mode,
                    elapsed_ms = elapsed.as_millis() as u64,
                    sql = %stmt.sql,
                    "slow query"
                );
            }
        }
        result
    }

    /// Run a SELECT and return every row.
    pub async fn get(&mut self, table: impl Into<TableRef>) -> GqbResult<Records> {
        self.get_ctx(&ExecContext::default(), table).await
    }

    pub async fn get_ctx(
        &mut self,
        ctx: &ExecContext,
        table: impl Into<TableRef>,
    ) -> GqbResult<Records> {
        let state = self.take_state();
        let stmt = state.render(Mode::Select, &table.into(), None, self.config.dialect, None)?;
        let call = self.executor.query_ctx(ctx, &stmt.sql, &stmt.binds);
        let rows = self.observe(ctx, Mode::Select, &stmt, call).await?;
        Ok(scan(rows))
    }

    /// Run a SELECT limited to one row and return it.
    ///
    /// Returns [`GqbError::NoRows`] when nothing matches.
    pub async fn get_one(&mut self, table: impl Into<TableRef>) -> GqbResult<Record> {
        self.get_one_ctx(&ExecContext::default(), table).await
    }

    pub async fn get_one_ctx(
        &mut self,
        ctx: &ExecContext,
        table: impl Into<TableRef>,
    ) -> GqbResult<Record> {
        let state = self.take_state();
        let stmt = state.render(
            Mode::Select,
            &table.into(),
            None,
            self.config.dialect,
            Some(1),
        )?;
        let call = self.executor.query_ctx(ctx, &stmt.sql, &stmt.binds);
        let rows = self.observe(ctx, Mode::Select, &stmt, call).await?;
        scan(rows).into_iter().next().ok_or(GqbError::NoRows)
    }

    pub async fn insert(&mut self, table: impl Into<TableRef>, data: Data) -> GqbResult<ExecResult> {
        self.insert_ctx(&ExecContext::default(), table, data).await
    }

    pub async fn insert_ctx(
        &mut self,
        ctx: &ExecContext,
        table: impl Into<TableRef>,
        data: Data,
    ) -> GqbResult<ExecResult> {
        self.exec_mode(ctx, Mode::Insert, table.into(), Some(&data))
            .await
    }

    pub async fn update(&mut self, table: impl Into<TableRef>, data: Data) -> GqbResult<ExecResult> {
        self.update_ctx(&ExecContext::default(), table, data).await
    }

    pub async fn update_ctx(
        &mut self,
        ctx: &ExecContext,
        table: impl Into<TableRef>,
        data: Data,
    ) -> GqbResult<ExecResult> {
        self.exec_mode(ctx, Mode::Update, table.into(), Some(&data))
            .await
    }

    pub async fn delete(&mut self, table: impl Into<TableRef>) -> GqbResult<ExecResult> {
        self.delete_ctx(&ExecContext::default(), table).await
    }

    pub async fn delete_ctx(
        &mut self,
        ctx: &ExecContext,
        table: impl Into<TableRef>,
    ) -> GqbResult<ExecResult> {
        self.exec_mode(ctx, Mode::Delete, table.into(), None).await
    }

    async fn exec_mode(
        &mut self,
        ctx: &ExecContext,
        mode: Mode,
        table: TableRef,
        data: Option<&Data>,
    ) -> GqbResult<ExecResult> {
        let state = self.take_state();
        let stmt = state.render(mode, &table, data, self.config.dialect, None)?;
        let call = self.executor.exec_ctx(ctx, &stmt.sql, &stmt.binds);
        self.observe(ctx, mode, &stmt, call).await
    }
}
