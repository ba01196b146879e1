//! WHERE condition tree.
//!
//! A [`ConditionGroup`] is an ordered list of [`WhereNode`]s: leaf
//! [`Condition`]s, raw fragments and nested groups. Every node carries the
//! [`Combinator`] that joins it to its previous sibling; the first sibling's
//! combinator is never rendered.
//!
//! Rendering appends bind values to a shared list and asks the dialect for the
//! placeholder of each new bind, so placeholders always match positions in the
//! final statement's bind list.

use crate::dialect::Dialect;
use crate::error::{GqbError, GqbResult};
use crate::value::Value;
use std::fmt;

/// How a column is compared against a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterOrEqual,
    LessThan,
    LessOrEqual,
    In,
    NotIn,
    Like,
    NotLike,
}

impl Comparison {
    /// SQL operator text.
    pub fn operator(self) -> &'static str {
        match self {
            Comparison::Equal => "=",
            Comparison::NotEqual => "<>",
            Comparison::GreaterThan => ">",
            Comparison::GreaterOrEqual => ">=",
            Comparison::LessThan => "<",
            Comparison::LessOrEqual => "<=",
            Comparison::In => "IN",
            Comparison::NotIn => "NOT IN",
            Comparison::Like => "LIKE",
            Comparison::NotLike => "NOT LIKE",
        }
    }

    /// Whether the comparison takes a list operand.
    pub fn takes_list(self) -> bool {
        matches!(self, Comparison::In | Comparison::NotIn)
    }
}

/// Joins a node to its previous sibling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Combinator {
    #[default]
    And,
    Or,
}

impl Combinator {
    pub fn keyword(self) -> &'static str {
        match self {
            Combinator::And => "AND",
            Combinator::Or => "OR",
        }
    }
}

/// Trusted SQL text emitted without quoting or escaping.
///
/// Useful for expressions such as `COUNT(*)`. The caller is responsible for
/// its safety.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Raw(pub String);

impl Raw {
    pub fn new(sql: impl Into<String>) -> Self {
        Raw(sql.into())
    }
}

impl fmt::Display for Raw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Left-hand side of a condition or an ORDER BY / GROUP BY entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Field {
    /// Column path, quoted per dialect (`table.column` allowed).
    Column(String),
    /// Emitted verbatim.
    Raw(String),
}

impl Field {
    pub fn render(&self, dialect: Dialect) -> String {
        match self {
            Field::Column(name) => dialect.quote(name),
            Field::Raw(sql) => sql.clone(),
        }
    }

    fn push_rendered(&self, dialect: Dialect, out: &mut String) {
        match self {
            Field::Column(name) => dialect.push_quoted(out, name),
            Field::Raw(sql) => out.push_str(sql),
        }
    }
}

impl From<&str> for Field {
    fn from(name: &str) -> Self {
        Field::Column(name.to_string())
    }
}

impl From<String> for Field {
    fn from(name: String) -> Self {
        Field::Column(name)
    }
}

impl From<Raw> for Field {
    fn from(raw: Raw) -> Self {
        Field::Raw(raw.0)
    }
}

/// Right-hand side of a condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A single bound value.
    Value(Value),
    /// Values bound element-wise, for `IN` / `NOT IN`.
    List(Vec<Value>),
    /// Emitted verbatim (column references, subqueries).
    Raw(String),
}

impl Operand {
    pub fn value(value: impl Into<Value>) -> Self {
        Operand::Value(value.into())
    }

    pub fn list<I>(values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        Operand::List(values.into_iter().map(Into::into).collect())
    }

    pub fn raw(sql: impl Into<String>) -> Self {
        Operand::Raw(sql.into())
    }
}

impl From<Raw> for Operand {
    fn from(raw: Raw) -> Self {
        Operand::Raw(raw.0)
    }
}

fn push_bind(dialect: Dialect, binds: &mut Vec<Value>, value: Value, out: &mut String) {
    binds.push(value);
    out.push_str(&dialect.placeholder(binds.len()));
}

/// A single column/operator/operand comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: Field,
    pub comparison: Comparison,
    pub operand: Operand,
    pub combinator: Combinator,
}

impl Condition {
    pub fn new(
        field: impl Into<Field>,
        comparison: Comparison,
        operand: Operand,
        combinator: Combinator,
    ) -> Self {
        Self {
            field: field.into(),
            comparison,
            operand,
            combinator,
        }
    }

    /// Render this comparison, appending any bind values.
    pub fn build(&self, dialect: Dialect, binds: &mut Vec<Value>) -> GqbResult<String> {
        let mut out = String::new();
        let op = self.comparison.operator();

        match (&self.operand, self.comparison.takes_list()) {
            (Operand::List(values), true) => {
                if values.is_empty() {
                    // Empty IN matches nothing; empty NOT IN matches everything.
                    return Ok(match self.comparison {
                        Comparison::NotIn => "1=1".to_string(),
                        _ => "1=0".to_string(),
                    });
                }
                self.field.push_rendered(dialect, &mut out);
                out.push(' ');
                out.push_str(op);
                out.push_str(" (");
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    push_bind(dialect, binds, value.clone(), &mut out);
                }
                out.push(')');
            }
            (Operand::Raw(sql), true) => {
                self.field.push_rendered(dialect, &mut out);
                out.push(' ');
                out.push_str(op);
                out.push_str(" (");
                out.push_str(sql);
                out.push(')');
            }
            (Operand::Value(_), true) => {
                return Err(GqbError::validation(format!(
                    "{op} comparison on {} requires a list of values",
                    self.field.render(dialect)
                )));
            }
            (Operand::List(_), false) => {
                return Err(GqbError::validation(format!(
                    "{op} comparison on {} requires a single value, got a list",
                    self.field.render(dialect)
                )));
            }
            (Operand::Value(Value::Null), false)
                if matches!(self.comparison, Comparison::Equal | Comparison::NotEqual) =>
            {
                self.field.push_rendered(dialect, &mut out);
                out.push_str(match self.comparison {
                    Comparison::Equal => " IS NULL",
                    _ => " IS NOT NULL",
                });
            }
            (Operand::Value(value), false) => {
                self.field.push_rendered(dialect, &mut out);
                out.push(' ');
                out.push_str(op);
                out.push(' ');
                push_bind(dialect, binds, value.clone(), &mut out);
            }
            (Operand::Raw(sql), false) => {
                self.field.push_rendered(dialect, &mut out);
                out.push(' ');
                out.push_str(op);
                out.push(' ');
                out.push_str(sql);
            }
        }

        Ok(out)
    }
}

/// A node in the condition tree.
#[derive(Debug, Clone, PartialEq)]
pub enum WhereNode {
    Condition(Condition),
    Raw { sql: String, combinator: Combinator },
    Group(ConditionGroup),
}

impl WhereNode {
    /// Combinator joining this node to its previous sibling.
    pub fn combinator(&self) -> Combinator {
        match self {
            WhereNode::Condition(c) => c.combinator,
            WhereNode::Raw { combinator, .. } => *combinator,
            WhereNode::Group(g) => g.combinator,
        }
    }

    /// Render the node's own fragment (no surrounding parentheses).
    pub fn build(&self, dialect: Dialect, binds: &mut Vec<Value>) -> GqbResult<String> {
        match self {
            WhereNode::Condition(c) => c.build(dialect, binds),
            WhereNode::Raw { sql, .. } => Ok(sql.clone()),
            WhereNode::Group(g) => g.build(dialect, binds),
        }
    }
}

/// An ordered, nestable conjunction/disjunction of condition nodes.
///
/// ```ignore
/// builder.where_group(|g| {
///     g.where_("id", 1, Comparison::Equal)
///         .where_("name", "John", Comparison::Equal);
/// });
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConditionGroup {
    nodes: Vec<WhereNode>,
    combinator: Combinator,
}

impl ConditionGroup {
    pub fn new(combinator: Combinator) -> Self {
        Self {
            nodes: Vec::new(),
            combinator,
        }
    }

    pub fn combinator(&self) -> Combinator {
        self.combinator
    }

    pub fn nodes(&self) -> &[WhereNode] {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Append a pre-built node.
    pub fn push(&mut self, node: WhereNode) -> &mut Self {
        self.nodes.push(node);
        self
    }

    /// Render members joined by their combinators.
    ///
    /// Members are not parenthesized, except nested groups which are wrapped
    /// once. Empty members are skipped.
    pub fn build(&self, dialect: Dialect, binds: &mut Vec<Value>) -> GqbResult<String> {
        let mut out = String::new();
        for node in &self.nodes {
            let fragment = node.build(dialect, binds)?;
            if fragment.is_empty() {
                continue;
            }
            if !out.is_empty() {
                out.push(' ');
                out.push_str(node.combinator().keyword());
                out.push(' ');
            }
            if matches!(node, WhereNode::Group(_)) {
                out.push('(');
                out.push_str(&fragment);
                out.push(')');
            } else {
                out.push_str(&fragment);
            }
        }
        Ok(out)
    }

    fn add(
        &mut self,
        field: impl Into<Field>,
        comparison: Comparison,
        operand: Operand,
        combinator: Combinator,
    ) -> &mut Self {
        self.push(WhereNode::Condition(Condition::new(
            field, comparison, operand, combinator,
        )))
    }

    /// Add a condition with AND.
    pub fn where_(
        &mut self,
        field: impl Into<Field>,
        value: impl Into<Value>,
        comparison: Comparison,
    ) -> &mut Self {
        self.add(field, comparison, Operand::value(value), Combinator::And)
    }

    /// Add a condition with OR.
    pub fn or_where(
        &mut self,
        field: impl Into<Field>,
        value: impl Into<Value>,
        comparison: Comparison,
    ) -> &mut Self {
        self.add(field, comparison, Operand::value(value), Combinator::Or)
    }

    /// Add a condition with an explicit operand, joined with AND.
    pub fn where_op(
        &mut self,
        field: impl Into<Field>,
        comparison: Comparison,
        operand: impl Into<Operand>,
    ) -> &mut Self {
        self.add(field, comparison, operand.into(), Combinator::And)
    }

    /// Add a condition with an explicit operand, joined with OR.
    pub fn or_where_op(
        &mut self,
        field: impl Into<Field>,
        comparison: Comparison,
        operand: impl Into<Operand>,
    ) -> &mut Self {
        self.add(field, comparison, operand.into(), Combinator::Or)
    }

    pub fn where_in<I>(&mut self, field: impl Into<Field>, values: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.add(field, Comparison::In, Operand::list(values), Combinator::And)
    }

    pub fn or_where_in<I>(&mut self, field: impl Into<Field>, values: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.add(field, Comparison::In, Operand::list(values), Combinator::Or)
    }

    pub fn where_not_in<I>(&mut self, field: impl Into<Field>, values: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.add(field, Comparison::NotIn, Operand::list(values), Combinator::And)
    }

    pub fn or_where_not_in<I>(&mut self, field: impl Into<Field>, values: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.add(field, Comparison::NotIn, Operand::list(values), Combinator::Or)
    }

    pub fn like(&mut self, field: impl Into<Field>, pattern: impl Into<Value>) -> &mut Self {
        self.add(field, Comparison::Like, Operand::value(pattern), Combinator::And)
    }

    pub fn or_like(&mut self, field: impl Into<Field>, pattern: impl Into<Value>) -> &mut Self {
        self.add(field, Comparison::Like, Operand::value(pattern), Combinator::Or)
    }

    pub fn not_like(&mut self, field: impl Into<Field>, pattern: impl Into<Value>) -> &mut Self {
        self.add(field, Comparison::NotLike, Operand::value(pattern), Combinator::And)
    }

    pub fn or_not_like(&mut self, field: impl Into<Field>, pattern: impl Into<Value>) -> &mut Self {
        self.add(field, Comparison::NotLike, Operand::value(pattern), Combinator::Or)
    }

    /// Add a raw fragment with AND. The text is not escaped.
    pub fn where_raw(&mut self, sql: impl Into<String>) -> &mut Self {
        self.push(WhereNode::Raw {
            sql: sql.into(),
            combinator: Combinator::And,
        })
    }

    /// Add a raw fragment with OR. The text is not escaped.
    pub fn or_where_raw(&mut self, sql: impl Into<String>) -> &mut Self {
        self.push(WhereNode::Raw {
            sql: sql.into(),
            combinator: Combinator::Or,
        })
    }

    /// Add a nested group joined with AND, populated by `f`.
    pub fn where_group(&mut self, f: impl FnOnce(&mut ConditionGroup)) -> &mut Self {
        let mut group = ConditionGroup::new(Combinator::And);
        f(&mut group);
        self.push(WhereNode::Group(group))
    }

    /// Add a nested group joined with OR, populated by `f`.
    pub fn or_where_group(&mut self, f: impl FnOnce(&mut ConditionGroup)) -> &mut Self {
        let mut group = ConditionGroup::new(Combinator::Or);
        f(&mut group);
        self.push(WhereNode::Group(group))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(group: &ConditionGroup, dialect: Dialect) -> (String, Vec<Value>) {
        let mut binds = Vec::new();
        let sql = group.build(dialect, &mut binds).unwrap();
        (sql, binds)
    }

    #[test]
    fn test_simple_eq() {
        let mut g = ConditionGroup::default();
        g.where_("id", 1, Comparison::Equal);
        let (sql, binds) = render(&g, Dialect::MySql);
        assert_eq!(sql, "`id` = ?");
        assert_eq!(binds, vec![Value::I32(1)]);
    }

    #[test]
    fn test_gte_operator() {
        let mut g = ConditionGroup::default();
        g.where_("age", 18, Comparison::GreaterOrEqual)
            .where_("age", 65, Comparison::LessOrEqual);
        let (sql, _) = render(&g, Dialect::MySql);
        assert_eq!(sql, "`age` >= ? AND `age` <= ?");
    }

    #[test]
    fn test_null_renders_is_null_without_bind() {
        let mut g = ConditionGroup::default();
        g.where_("deleted_at", Value::Null, Comparison::Equal)
            .or_where("email", None::<String>, Comparison::NotEqual);
        let (sql, binds) = render(&g, Dialect::MySql);
        assert_eq!(sql, "`deleted_at` IS NULL OR `email` IS NOT NULL");
        assert!(binds.is_empty());
    }

    #[test]
    fn test_in_list_postgres_numbering() {
        let mut g = ConditionGroup::default();
        g.where_("status", "active", Comparison::Equal)
            .where_in("id", [1, 2, 3]);
        let (sql, binds) = render(&g, Dialect::Postgres);
        assert_eq!(sql, "\"status\" = $1 AND \"id\" IN ($2, $3, $4)");
        assert_eq!(binds.len(), 4);
    }

    #[test]
    fn test_not_in_and_empty_lists() {
        let mut g = ConditionGroup::default();
        g.where_not_in("id", [7])
            .where_in("id", Vec::<i64>::new())
            .or_where_not_in("id", Vec::<i64>::new());
        let (sql, binds) = render(&g, Dialect::MySql);
        assert_eq!(sql, "`id` NOT IN (?) AND 1=0 OR 1=1");
        assert_eq!(binds, vec![Value::I32(7)]);
    }

    #[test]
    fn test_in_with_scalar_is_error() {
        let mut g = ConditionGroup::default();
        g.where_op("id", Comparison::In, Operand::value(1));
        let err = g.build(Dialect::MySql, &mut Vec::new()).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_scalar_with_list_is_error() {
        let mut g = ConditionGroup::default();
        g.where_op("id", Comparison::Equal, Operand::list([1, 2]));
        assert!(g.build(Dialect::MySql, &mut Vec::new()).is_err());
    }

    #[test]
    fn test_raw_operand_and_raw_node() {
        let mut g = ConditionGroup::default();
        g.where_op("example.user_id", Comparison::Equal, Raw::new("users.id"))
            .or_where_raw("COUNT(*) > 1");
        let (sql, binds) = render(&g, Dialect::MySql);
        assert_eq!(sql, "`example`.`user_id` = users.id OR COUNT(*) > 1");
        assert!(binds.is_empty());
    }

    #[test]
    fn test_nested_group_is_parenthesized() {
        let mut g = ConditionGroup::default();
        g.where_("a", 1, Comparison::Equal).or_where_group(|inner| {
            inner
                .where_("b", 2, Comparison::Equal)
                .where_("c", 3, Comparison::Equal);
        });
        let (sql, binds) = render(&g, Dialect::Sqlite);
        assert_eq!(sql, "\"a\" = ? OR (\"b\" = ? AND \"c\" = ?)");
        assert_eq!(binds, vec![Value::I32(1), Value::I32(2), Value::I32(3)]);
    }

    #[test]
    fn test_empty_group_skipped() {
        let mut g = ConditionGroup::default();
        g.where_group(|_| {}).or_where("a", 1, Comparison::Equal);
        let (sql, _) = render(&g, Dialect::MySql);
        assert_eq!(sql, "`a` = ?");
    }

    #[test]
    fn test_like_variants() {
        let mut g = ConditionGroup::default();
        g.like("name", "%oh%").or_not_like("name", "J%");
        let (sql, _) = render(&g, Dialect::MySql);
        assert_eq!(sql, "`name` LIKE ? OR `name` NOT LIKE ?");
    }
}
