//! Derive macros for gqb
//!
//! Provides `#[derive(FromRecord)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod from_record;

/// Derive `FromRecord` for a struct.
///
/// # Example
///
/// ```ignore
/// use gqb::FromRecord;
///
/// #[derive(Default, FromRecord)]
/// struct User {
///     #[db = "id"]
///     id: i64,
///     #[db = "user_name"]
///     name: String,
///     #[db = "email"]
///     email: Option<String>,
///     // not mapped
///     cached: bool,
/// }
/// ```
///
/// # Attributes
///
/// - `#[db = "column"]` - Map the field from this result column. Fields
///   without it are left untouched.
#[proc_macro_derive(FromRecord, attributes(db))]
pub fn derive_from_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    from_record::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
