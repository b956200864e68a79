use proc_macro2::TokenStream;
use quote::ToTokens;
use std::fmt::Debug;
use syn::{Field, Ident, LitStr, Type, ext::IdentExt, parse::ParseBuffer};

pub(crate) struct ColumnMetadata {
    pub(crate) ident: Ident,
    pub(crate) ty: Type,
    pub(crate) name: String,
    pub(crate) primary_key: bool,
}

impl Debug for ColumnMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColumnMetadata")
            .field("ident", &self.ident)
            .field("ty", &"..")
            .field("name", &self.name)
            .field("primary_key", &self.primary_key)
            .finish()
    }
}

impl ColumnMetadata {
    pub(crate) fn field_name(&self) -> String {
        self.ident.unraw().to_string()
    }

    pub(crate) fn ty(&self) -> TokenStream {
        self.ty.to_token_stream()
    }
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
        primary_key: false,
    };
    if metadata.name.starts_with('_') {
        metadata.name.remove(0);
    }
    for attr in &field.attrs {
        let meta = &attr.meta;
        if meta.path().is_ident("berth") {
            let Ok(list) = meta.require_list() else {
                panic!(
                    "Error while parsing `berth`, use it like: `#[berth(attribute = value, ...)]`",
                );
            };
            let _ = list.parse_nested_meta(|arg| {
                if arg.path.is_ident("name") {
                    let Ok(v) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                        panic!("Error while parsing `name`, use it like: `#[berth(name = \"my_column\")]`");
                    };
                    metadata.name = v.value();
                } else if arg.path.is_ident("primary_key") {
                    let Err(..) = arg.value() else {
                        // value() is Err for Meta::Path
                        panic!(
                            "Error while parsing `primary_key`, use it like: `#[berth(primary_key)]`"
                        );
                    };
                    metadata.primary_key = true;
                } else {
                    panic!(
                        "Unknown attribute `{}` inside berth macro",
                        arg.path.to_token_stream()
                    );
                }
                Ok(())
            });
        }
    }
    metadata
}
