//! FromRecord derive macro implementation

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Result};

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let generics = &input.generics;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "FromRecord can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "FromRecord can only be derived for structs",
            ));
        }
    };

    let mut assigns = Vec::new();
    for field in fields {
        let Some(column) = get_column_name(field)? else {
            continue;
        };
        let field_name = &field.ident;
        assigns.push(quote! {
            record.assign(&mut self.#field_name, #column)?;
        });
    }

    Ok(quote! {
        impl #impl_generics gqb::FromRecord for #name #ty_generics #where_clause {
            fn fill_from(&mut self, record: &gqb::Record) -> gqb::GqbResult<()> {
                #(#assigns)*
                Ok(())
            }
        }
    })
}

/// Column named by `#[db = "..."]`, if the field has one.
fn get_column_name(field: &syn::Field) -> Result<Option<String>> {
    let mut column = None;
    for attr in &field.attrs {
        if !attr.path().is_ident("db") {
            continue;
        }
        if column.is_some() {
            return Err(syn::Error::new_spanned(attr, "duplicate #[db] attribute"));
        }
        let meta = attr.meta.require_name_value()?;
        match &meta.value {
            syn::Expr::Lit(syn::ExprLit {
                lit: syn::Lit::Str(lit),
                ..
            }) if !lit.value().is_empty() => column = Some(lit.value()),
            other => {
                return Err(syn::Error::new_spanned(
                    other,
                    "expected #[db = \"column_name\"]",
                ));
            }
        }
    }
    Ok(column)
}
