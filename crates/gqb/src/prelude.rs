//! Convenient imports for typical `gqb` usage.
//!
//! ```ignore
//! use gqb::prelude::*;
//! ```

pub use crate::{
    Builder, Comparison, Data, Dialect, ExecContext, Executor, FromRecord, GqbConfig, GqbError,
    GqbResult, Raw, Record, Records, SortMode, TableRef, Value, alias,
};

#[cfg(feature = "pool")]
pub use crate::{create_pool, create_pool_with_config};
