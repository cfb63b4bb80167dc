use crate::{ColumnMetadata, decode_column};
use syn::{Fields, ItemStruct, LitStr, ext::IdentExt, parse::ParseBuffer, spanned::Spanned};

pub(crate) struct TableMetadata {
    pub(crate) item: ItemStruct,
    pub(crate) name: String,
    /// Every named field in declaration order, mapped or not.
    pub(crate) columns: Vec<ColumnMetadata>,
}

impl TableMetadata {
    pub(crate) fn mapped(&self) -> impl Iterator<Item = &ColumnMetadata> {
        self.columns.iter().filter(|c| !c.skip)
    }
}

pub fn decode_table(item: ItemStruct) -> syn::Result<TableMetadata> {
    let Fields::Named(fields) = &item.fields else {
        return Err(syn::Error::new(
            item.fields.span(),
            "Model can be derived only for structs with named fields",
        ));
    };
    if !item.generics.params.is_empty() {
        return Err(syn::Error::new(
            item.generics.span(),
            "Model cannot be derived for a generic struct",
        ));
    }
    let columns = fields.named.iter().map(decode_column).collect();
    let mut name = item.ident.unraw().to_string();
    for attr in &item.attrs {
        let meta = &attr.meta;
        if meta.path().is_ident("borm") {
            let Ok(list) = meta.require_list() else {
                panic!("Error while parsing `borm`, use it like: `#[borm(attribute = value, ..)]`");
            };
            let _ = list.parse_nested_meta(|arg| {
                if arg.path.is_ident("name") {
                    let Ok(value) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                        panic!("Error while parsing `name`, use it like: `#[borm(name = \"my_table\")]`");
                    };
                    name = value.value();
                } else {
                    panic!(
                        "Unknown attribute `{}` inside borm macro",
                        quote::ToTokens::to_token_stream(&arg.path)
                    );
                }
                Ok(())
            });
        }
    }
    Ok(TableMetadata {
        item,
        name,
        columns,
    })
}
