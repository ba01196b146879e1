//! SQL dialects: identifier quoting, placeholder syntax and random ordering.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Target SQL engine conventions.
///
/// A dialect is a plain value held by each [`Builder`](crate::Builder); builders
/// running under different dialects never affect each other.
///
/// | dialect    | quoting      | placeholder | random order |
/// |------------|--------------|-------------|--------------|
/// | `MySql`    | `` `col` ``  | `?`         | `RAND()`     |
/// | `Postgres` | `"col"`      | `$1`, `$2`  | `RANDOM()`   |
/// | `Sqlite`   | `"col"`      | `?`         | `RANDOM()`   |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    MySql,
    Postgres,
    Sqlite,
}

impl Dialect {
    /// Resolve a driver name such as `"mysql"` or `"postgres"`.
    ///
    /// Unrecognized names fall back to [`Dialect::default()`] instead of
    /// failing; a warning is logged so the fallback is visible.
    pub fn from_driver(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "mysql" => Dialect::MySql,
            "postgres" | "postgresql" | "pgsql" => Dialect::Postgres,
            "sqlite" | "sqlite3" => Dialect::Sqlite,
            other => {
                let fallback = Dialect::default();
                tracing::warn!(
                    driver = other,
                    fallback = %fallback,
                    "unknown driver name, falling back to default dialect"
                );
                fallback
            }
        }
    }

    /// Canonical lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Dialect::MySql => "mysql",
            Dialect::Postgres => "postgres",
            Dialect::Sqlite => "sqlite",
        }
    }

    fn quote_char(self) -> char {
        match self {
            Dialect::MySql => '`',
            Dialect::Postgres | Dialect::Sqlite => '"',
        }
    }

    /// Quote an identifier, segment by segment on `.`.
    ///
    /// `users.id` becomes `` `users`.`id` `` under MySQL. Already-quoted
    /// segments are not double-quoted, `*` is left bare and an empty string
    /// stays empty.
    pub fn quote(self, ident: &str) -> String {
        let mut out = String::with_capacity(ident.len() + 4);
        self.push_quoted(&mut out, ident);
        out
    }

    /// Append the quoted form of `ident` to `out`.
    pub fn push_quoted(self, out: &mut String, ident: &str) {
        if ident.is_empty() {
            return;
        }
        let q = self.quote_char();
        for (i, segment) in ident.split('.').enumerate() {
            if i > 0 {
                out.push('.');
            }
            if segment == "*" {
                out.push('*');
                continue;
            }
            out.push(q);
            for c in segment.trim_matches(q).chars() {
                if c == q {
                    out.push(q);
                }
                out.push(c);
            }
            out.push(q);
        }
    }

    /// Placeholder token for the bind at 1-based `index` of the final bind list.
    pub fn placeholder(self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${index}"),
            Dialect::MySql | Dialect::Sqlite => "?".to_string(),
        }
    }

    /// Expression used for `ORDER BY` in random mode.
    pub fn random_order(self) -> &'static str {
        match self {
            Dialect::MySql => "RAND()",
            Dialect::Postgres | Dialect::Sqlite => "RANDOM()",
        }
    }

    /// Whether `UPDATE ... LIMIT n` / `DELETE ... LIMIT n` is accepted.
    pub fn supports_update_limit(self) -> bool {
        matches!(self, Dialect::MySql)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_per_dialect() {
        assert_eq!(Dialect::MySql.quote("id"), "`id`");
        assert_eq!(Dialect::Postgres.quote("id"), "\"id\"");
        assert_eq!(Dialect::Sqlite.quote("id"), "\"id\"");
    }

    #[test]
    fn test_quote_splits_on_dot() {
        assert_eq!(Dialect::MySql.quote("users.id"), "`users`.`id`");
        assert_eq!(Dialect::Postgres.quote("public.users.id"), "\"public\".\"users\".\"id\"");
    }

    #[test]
    fn test_quote_empty_is_noop() {
        assert_eq!(Dialect::MySql.quote(""), "");
        assert_eq!(Dialect::Postgres.quote(""), "");
    }

    #[test]
    fn test_quote_trims_existing_and_escapes_embedded() {
        assert_eq!(Dialect::MySql.quote("`id`"), "`id`");
        assert_eq!(Dialect::MySql.quote("we`ird"), "`we``ird`");
        assert_eq!(Dialect::Postgres.quote("\"name\""), "\"name\"");
    }

    #[test]
    fn test_quote_star() {
        assert_eq!(Dialect::MySql.quote("users.*"), "`users`.*");
    }

    #[test]
    fn test_placeholder() {
        assert_eq!(Dialect::MySql.placeholder(3), "?");
        assert_eq!(Dialect::Sqlite.placeholder(1), "?");
        assert_eq!(Dialect::Postgres.placeholder(3), "$3");
    }

    #[test]
    fn test_random_order() {
        assert_eq!(Dialect::MySql.random_order(), "RAND()");
        assert_eq!(Dialect::Postgres.random_order(), "RANDOM()");
        assert_eq!(Dialect::Sqlite.random_order(), "RANDOM()");
    }

    #[test]
    fn test_from_driver() {
        assert_eq!(Dialect::from_driver("mysql"), Dialect::MySql);
        assert_eq!(Dialect::from_driver("PostgreSQL"), Dialect::Postgres);
        assert_eq!(Dialect::from_driver("sqlite3"), Dialect::Sqlite);
        assert_eq!(Dialect::from_driver("oracle"), Dialect::MySql);
    }

    #[test]
    fn test_deserialize_lowercase() {
        let d: Dialect = serde_json::from_str("\"postgres\"").unwrap();
        assert_eq!(d, Dialect::Postgres);
    }
}
