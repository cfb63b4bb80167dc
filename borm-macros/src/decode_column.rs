use quote::ToTokens;
use syn::{Field, Ident, LitStr, Type, Visibility, ext::IdentExt, parse::ParseBuffer};

pub(crate) struct ColumnMetadata {
    pub(crate) ident: Ident,
    pub(crate) ty: Type,
    pub(crate) name: String,
    pub(crate) tag: String,
    /// Not mapped: private or marked `#[borm(skip)]`.
    pub(crate) skip: bool,
}

pub fn decode_column(field: &Field) -> ColumnMetadata {
    let ident = field
        .ident
        .clone()
        .expect("Field is expected to have a name");
    let mut metadata = ColumnMetadata {
        name: ident.unraw().to_string(),
        ident,
        ty: field.ty.clone(),
        tag: String::new(),
        skip: !matches!(field.vis, Visibility::Public(..)),
    };
    for attr in &field.attrs {
        let meta = &attr.meta;
        if meta.path().is_ident("borm") {
            let Ok(list) = meta.require_list() else {
                panic!("Error while parsing `borm`, use it like: `#[borm(attribute = value, ...)]`");
            };
            let _ = list.parse_nested_meta(|arg| {
                if arg.path.is_ident("tag") {
                    let Ok(v) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                        panic!("Error while parsing `tag`, use it like: `#[borm(tag = \"PRIMARY KEY\")]`");
                    };
                    metadata.tag = v.value();
                } else if arg.path.is_ident("skip") {
                    let Err(..) = arg.value() else {
                        // value() is Err for Meta::Path
                        panic!("Error while parsing `skip`, use it like: `#[borm(skip)]`");
                    };
                    metadata.skip = true;
                } else {
                    panic!(
                        "Unknown attribute `{}` inside borm macro",
                        arg.path.to_token_stream()
                    );
                }
                Ok(())
            });
        }
    }
    metadata
}
