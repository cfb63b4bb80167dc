use crate::TableMetadata;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{Ident, ext::IdentExt};

fn holder(ident: &Ident) -> Ident {
    format_ident!("__{}__", ident.unraw())
}

/// Body of `Model::from_row`: fields are matched by label, skipped fields
/// take their default value.
pub(crate) fn from_row(table: &TableMetadata) -> TokenStream {
    let struct_name = &table.item.ident;
    let holders = table.mapped().map(|c| {
        let holder = holder(&c.ident);
        let ty = &c.ty;
        quote!(let mut #holder: ::std::option::Option<#ty> = None;)
    });
    let assignments = table.mapped().map(|c| {
        let holder = holder(&c.ident);
        let ty = &c.ty;
        let name = &c.name;
        quote! {
            #name => #holder = Some(<#ty as ::borm::AsValue>::try_from_value(__v__)?),
        }
    });
    let fields = table.columns.iter().map(|c| {
        let ident = &c.ident;
        if c.skip {
            quote!(#ident: ::std::default::Default::default())
        } else {
            let holder = holder(ident);
            let name = &c.name;
            quote!(#ident: #holder.ok_or_else(|| __make_error__(#name))?)
        }
    });
    quote! {
        let ::borm::RowLabeled {
            labels: __labels__,
            values: __values__,
        } = row;
        #(#holders)*
        for (__n__, __v__) in ::std::iter::zip(__labels__.iter(), __values__.into_vec()) {
            match __n__.as_str() {
                #(#assignments)*
                _ => {}
            }
        }
        let __make_error__ = |name: &str| ::borm::Error::msg(format!(
            "Column `{}` does not exist in the row provided",
            name
        ));
        Ok(#struct_name {
            #(#fields,)*
        })
    }
}
