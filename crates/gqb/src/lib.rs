//! # gqb
//!
//! A fluent SQL statement builder with typed result decoding.
//!
//! ## Features
//!
//! - **Parameterized**: values are always bound, never interpolated; the bind
//!   list follows placeholder order exactly
//! - **Dialect-aware**: MySQL, Postgres and SQLite quoting / placeholder
//!   conventions, chosen per builder
//! - **Nested conditions**: AND / OR groups to any depth
//! - **Executor-agnostic**: runs against anything implementing [`Executor`];
//!   tokio-postgres clients, transactions and pooled clients out of the box
//! - **Typed decoding**: rows become [`Record`]s with coercing accessors, or
//!   map into structs via `#[derive(FromRecord)]`
//!
//! ## Example
//!
//! ```ignore
//! use gqb::{Builder, Comparison, Data, Dialect, FromRecord, SortMode};
//!
//! #[derive(Debug, Default, FromRecord)]
//! struct User {
//!     #[db = "id"]
//!     id: i64,
//!     #[db = "name"]
//!     name: String,
//! }
//!
//! let mut builder = Builder::with_dialect(&client, Dialect::Postgres);
//!
//! let users: Vec<User> = builder
//!     .where_("status", "active", Comparison::Equal)
//!     .or_where_group(|g| {
//!         g.where_("role", "admin", Comparison::Equal)
//!             .where_in("team_id", [1, 2, 3]);
//!     })
//!     .order_by("created_at", SortMode::Desc)
//!     .limit(10)
//!     .get("users")
//!     .await?
//!     .map_into()?;
//!
//! builder
//!     .insert("users", Data::new().set("name", "alice").set("status", "active"))
//!     .await?;
//! ```

extern crate self as gqb;

pub mod builder;
pub mod clause;
pub mod condition;
pub mod config;
pub mod dialect;
pub mod error;
pub mod executor;
pub mod pg;
pub mod prelude;
pub mod result;
pub mod value;

pub use builder::{Builder, Data, Mode, Statement};
pub use clause::{Join, Order, SelectField, SortMode, TableRef, alias};
pub use condition::{Combinator, Comparison, Condition, ConditionGroup, Field, Operand, Raw, WhereNode};
pub use config::GqbConfig;
pub use dialect::Dialect;
pub use error::{ConvertError, GqbError, GqbResult};
pub use executor::{ExecContext, ExecResult, Executor, Rows};
pub use result::{FromRecord, Record, Records, scan};
pub use value::{FromValue, Value};

#[cfg(feature = "derive")]
pub use gqb_derive::FromRecord;

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(feature = "pool")]
pub use pool::{create_pool, create_pool_with_config};
