//! Clause renderers.
//!
//! Each renderer is a pure function of its input and the dialect. Every one
//! returns an empty string when there is nothing to render, and every non-empty
//! fragment except the select list starts with a single space, so fragments
//! concatenate into a statement with no stray whitespace.

use crate::condition::{Comparison, Field, Raw, WhereNode};
use crate::dialect::Dialect;
use crate::error::{GqbError, GqbResult};
use crate::value::Value;

/// An entry of the SELECT list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SelectField {
    Column(String),
    Raw(String),
    /// `quote(from) AS quote(to)`
    Alias { from: String, to: String },
}

/// Select `from` under the name `to`.
pub fn alias(from: impl Into<String>, to: impl Into<String>) -> SelectField {
    SelectField::Alias {
        from: from.into(),
        to: to.into(),
    }
}

impl SelectField {
    /// True when the entry would render no expression.
    pub fn is_empty(&self) -> bool {
        match self {
            SelectField::Column(sql) | SelectField::Raw(sql) => sql.trim().is_empty(),
            SelectField::Alias { from, .. } => from.trim().is_empty(),
        }
    }
}

impl From<&str> for SelectField {
    fn from(name: &str) -> Self {
        SelectField::Column(name.to_string())
    }
}

impl From<String> for SelectField {
    fn from(name: String) -> Self {
        SelectField::Column(name)
    }
}

impl From<Raw> for SelectField {
    fn from(raw: Raw) -> Self {
        SelectField::Raw(raw.0)
    }
}

/// The statement's main table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TableRef {
    Name(String),
    Aliased { name: String, alias: String },
    Raw(String),
}

impl TableRef {
    pub fn aliased(name: impl Into<String>, alias: impl Into<String>) -> Self {
        TableRef::Aliased {
            name: name.into(),
            alias: alias.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            TableRef::Name(name) | TableRef::Raw(name) => name.trim().is_empty(),
            TableRef::Aliased { name, .. } => name.trim().is_empty(),
        }
    }

    /// Reject an empty table name or an empty alias.
    pub fn validate(&self) -> GqbResult<()> {
        if self.is_empty() {
            return Err(GqbError::validation("table not specified or empty"));
        }
        if let TableRef::Aliased { alias, .. } = self {
            if alias.trim().is_empty() {
                return Err(GqbError::validation("table alias must be non-empty"));
            }
        }
        Ok(())
    }

    /// Table text for FROM / INTO / UPDATE positions.
    pub fn render(&self, dialect: Dialect) -> String {
        match self {
            TableRef::Name(name) => dialect.quote(name),
            TableRef::Aliased { name, alias } => {
                format!("{} AS {}", dialect.quote(name), dialect.quote(alias))
            }
            TableRef::Raw(sql) => sql.clone(),
        }
    }

    /// Name used to qualify the base side of a JOIN condition.
    pub fn base_name(&self, dialect: Dialect) -> String {
        match self {
            TableRef::Name(name) => dialect.quote(name),
            TableRef::Aliased { alias, .. } => dialect.quote(alias),
            TableRef::Raw(sql) => sql.clone(),
        }
    }
}

impl From<&str> for TableRef {
    fn from(name: &str) -> Self {
        TableRef::Name(name.to_string())
    }
}

impl From<String> for TableRef {
    fn from(name: String) -> Self {
        TableRef::Name(name)
    }
}

impl From<&String> for TableRef {
    fn from(name: &String) -> Self {
        TableRef::Name(name.clone())
    }
}

impl From<Raw> for TableRef {
    fn from(raw: Raw) -> Self {
        TableRef::Raw(raw.0)
    }
}

/// `JOIN table ON (base.from <op> table.to)`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Join {
    pub table: String,
    pub from: String,
    pub to: String,
    pub comparison: Comparison,
}

/// Sort direction, or the dialect's random ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortMode {
    Asc,
    Desc,
    Random,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Order {
    pub field: Field,
    pub mode: SortMode,
}

/// Render the SELECT list. Empty entries are skipped; nothing left selects `*`.
pub fn build_select_fields(fields: &[SelectField], dialect: Dialect) -> String {
    let list = fields
        .iter()
        .filter(|field| !field.is_empty())
        .map(|field| match field {
            SelectField::Column(name) => dialect.quote(name),
            SelectField::Raw(sql) => sql.clone(),
            SelectField::Alias { from, to } if to.trim().is_empty() => dialect.quote(from),
            SelectField::Alias { from, to } => {
                format!("{} AS {}", dialect.quote(from), dialect.quote(to))
            }
        })
        .collect::<Vec<_>>();
    if list.is_empty() {
        "*".to_string()
    } else {
        list.join(", ")
    }
}

fn qualify(owner: &str, column: &str, dialect: Dialect) -> String {
    if column.contains('.') {
        dialect.quote(column)
    } else {
        format!("{owner}.{}", dialect.quote(column))
    }
}

pub fn build_join(joins: &[Join], base: &TableRef, dialect: Dialect) -> String {
    let base_name = base.base_name(dialect);
    let mut out = String::new();
    for join in joins {
        let table = dialect.quote(&join.table);
        out.push_str(&format!(
            " JOIN {table} ON ({} {} {})",
            qualify(&base_name, &join.from, dialect),
            join.comparison.operator(),
            qualify(&table, &join.to, dialect),
        ));
    }
    out
}

/// Render top-level WHERE nodes.
///
/// Each node is wrapped in one pair of parentheses and joined to the previous
/// node by its own combinator.
pub fn build_where(nodes: &[WhereNode], dialect: Dialect, binds: &mut Vec<Value>) -> GqbResult<String> {
    let mut out = String::new();
    for node in nodes {
        let fragment = node.build(dialect, binds)?;
        if fragment.is_empty() {
            continue;
        }
        if out.is_empty() {
            out.push_str(" WHERE ");
        } else {
            out.push(' ');
            out.push_str(node.combinator().keyword());
            out.push(' ');
        }
        out.push('(');
        out.push_str(&fragment);
        out.push(')');
    }
    Ok(out)
}

pub fn build_group_by(fields: &[Field], dialect: Dialect) -> String {
    if fields.is_empty() {
        return String::new();
    }
    let list = fields
        .iter()
        .map(|f| f.render(dialect))
        .collect::<Vec<_>>()
        .join(", ");
    format!(" GROUP BY {list}")
}

pub fn build_order_by(orders: &[Order], dialect: Dialect) -> String {
    if orders.is_empty() {
        return String::new();
    }
    let list = orders
        .iter()
        .map(|order| match order.mode {
            SortMode::Asc => format!("{} ASC", order.field.render(dialect)),
            SortMode::Desc => format!("{} DESC", order.field.render(dialect)),
            SortMode::Random => dialect.random_order().to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!(" ORDER BY {list}")
}

pub fn build_limit(limit: u64) -> String {
    if limit == 0 {
        String::new()
    } else {
        format!(" LIMIT {limit}")
    }
}

pub fn build_offset(offset: u64) -> String {
    if offset == 0 {
        String::new()
    } else {
        format!(" OFFSET {offset}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::ConditionGroup;

    #[test]
    fn test_select_fields() {
        assert_eq!(build_select_fields(&[], Dialect::MySql), "*");
        let fields = vec![
            SelectField::from("id"),
            SelectField::from(Raw::new("COUNT(*) AS cnt")),
            alias("users.name", "user_name"),
        ];
        assert_eq!(
            build_select_fields(&fields, Dialect::MySql),
            "`id`, COUNT(*) AS cnt, `users`.`name` AS `user_name`"
        );
    }

    #[test]
    fn test_select_fields_skip_empty_entries() {
        let fields = vec![SelectField::from(""), SelectField::from("x"), alias(" ", "y")];
        assert_eq!(build_select_fields(&fields, Dialect::MySql), "`x`");
        assert_eq!(build_select_fields(&[SelectField::from("")], Dialect::MySql), "*");
        assert_eq!(build_select_fields(&[alias("id", "")], Dialect::MySql), "`id`");
    }

    #[test]
    fn test_table_validation() {
        assert!(TableRef::from("example").validate().is_ok());
        assert!(TableRef::aliased("example", "e").validate().is_ok());
        assert!(TableRef::from(" ").validate().unwrap_err().is_validation());
        assert!(TableRef::aliased("example", "").validate().unwrap_err().is_validation());
        assert!(TableRef::aliased("", "e").validate().unwrap_err().is_validation());
    }

    #[test]
    fn test_join() {
        let joins = vec![Join {
            table: "users".into(),
            from: "id".into(),
            to: "id".into(),
            comparison: Comparison::Equal,
        }];
        assert_eq!(
            build_join(&joins, &TableRef::from("example"), Dialect::MySql),
            " JOIN `users` ON (`example`.`id` = `users`.`id`)"
        );
        assert_eq!(
            build_join(&joins, &TableRef::aliased("example", "E"), Dialect::Postgres),
            " JOIN \"users\" ON (\"E\".\"id\" = \"users\".\"id\")"
        );
        assert_eq!(build_join(&[], &TableRef::from("example"), Dialect::MySql), "");
    }

    #[test]
    fn test_where_empty_and_single() {
        let mut binds = Vec::new();
        assert_eq!(build_where(&[], Dialect::MySql, &mut binds).unwrap(), "");

        let mut g = ConditionGroup::default();
        g.where_("id", 1, Comparison::Equal);
        assert_eq!(
            build_where(g.nodes(), Dialect::MySql, &mut binds).unwrap(),
            " WHERE (`id` = ?)"
        );
        assert_eq!(binds.len(), 1);
    }

    #[test]
    fn test_where_top_level_or_group() {
        let mut g = ConditionGroup::default();
        g.where_("a", 1, Comparison::Equal).or_where_group(|inner| {
            inner
                .where_("b", 2, Comparison::Equal)
                .where_("c", 3, Comparison::Equal);
        });
        let mut binds = Vec::new();
        assert_eq!(
            build_where(g.nodes(), Dialect::MySql, &mut binds).unwrap(),
            " WHERE (`a` = ?) OR (`b` = ? AND `c` = ?)"
        );
    }

    #[test]
    fn test_group_order_limit_offset() {
        assert_eq!(build_group_by(&[], Dialect::MySql), "");
        assert_eq!(
            build_group_by(&["a".into(), "b".into()], Dialect::MySql),
            " GROUP BY `a`, `b`"
        );
        let orders = vec![
            Order { field: "created_at".into(), mode: SortMode::Desc },
            Order { field: "id".into(), mode: SortMode::Random },
        ];
        assert_eq!(
            build_order_by(&orders, Dialect::Postgres),
            " ORDER BY \"created_at\" DESC, RANDOM()"
        );
        assert_eq!(build_limit(0), "");
        assert_eq!(build_limit(10), " LIMIT 10");
        assert_eq!(build_offset(0), "");
        assert_eq!(build_offset(5), " OFFSET 5");
    }
}
