mod decode_column;
mod decode_table;
mod from_row;

use decode_column::*;
use decode_table::*;
use from_row::from_row;
use proc_macro::TokenStream;
use quote::quote;
use syn::{ItemStruct, parse_macro_input};

/// Implement `borm::Model` for a struct with named fields.
///
/// Public fields become columns in declaration order, the others are left out
/// together with the ones marked `#[borm(skip)]`. The table is named after the
/// struct unless `#[borm(name = "...")]` says otherwise, `#[borm(tag = "...")]`
/// on a field is copied after its type in `CREATE TABLE`.
#[proc_macro_derive(Model, attributes(borm))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let item = parse_macro_input!(input as ItemStruct);
    let table = match decode_table(item) {
        Ok(v) => v,
        Err(e) => return e.to_compile_error().into(),
    };
    let ident = &table.item.ident;
    let table_name = &table.name;
    let column_defs = table.mapped().map(|c| {
        let name = &c.name;
        let ty = &c.ty;
        let tag = &c.tag;
        quote! {
            ::borm::ColumnDef {
                name: #name,
                value: <#ty as ::borm::AsValue>::as_empty_value(),
                tag: #tag,
            }
        }
    });
    let row = table.mapped().map(|c| {
        let field = &c.ident;
        let ty = &c.ty;
        quote!(<#ty as ::borm::AsValue>::as_value(::std::clone::Clone::clone(&self.#field)))
    });
    let from_row = from_row(&table);
    quote! {
        impl ::borm::Model for #ident {
            fn table_name() -> &'static str {
                #table_name
            }
            fn columns() -> &'static [::borm::ColumnDef] {
                static COLUMNS: ::std::sync::LazyLock<::std::vec::Vec<::borm::ColumnDef>> =
                    ::std::sync::LazyLock::new(|| ::std::vec![#(#column_defs),*]);
                &COLUMNS
            }
            fn row(&self) -> ::borm::Row {
                ::std::vec![#(#row),*].into_boxed_slice()
            }
            fn from_row(row: ::borm::RowLabeled) -> ::borm::Result<Self> {
                #from_row
            }
        }
    }
    .into()
}
