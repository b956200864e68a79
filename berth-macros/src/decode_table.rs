use crate::decode_column::{ColumnMetadata, decode_column};
use convert_case::{Case, Casing};
use quote::ToTokens;
use syn::{Fields, ItemStruct, LitStr, parse::ParseBuffer};

pub(crate) struct TableMetadata {
    pub(crate) columns: Vec<ColumnMetadata>,
    pub(crate) name: String,
    pub(crate) item: ItemStruct,
}

pub fn decode_table(item: ItemStruct) -> TableMetadata {
    let Fields::Named(..) = item.fields else {
        panic!("Entity `{}` must be a struct with named fields", item.ident);
    };
    if !item.generics.params.is_empty() {
        panic!("Entity `{}` cannot have generic parameters", item.ident);
    }
    let columns: Vec<_> = item.fields.iter().map(decode_column).collect();
    let mut name = item.ident.to_string().to_case(Case::Snake);
    if name.starts_with('_') {
        name.remove(0);
    }
    for attr in &item.attrs {
        let meta = &attr.meta;
        if meta.path().is_ident("berth") {
            let Ok(list) = meta.require_list() else {
                panic!("Error while parsing `berth`, use it like: `#[berth(attribute = value, ..)]`",);
            };
            let _ = list.parse_nested_meta(|arg| {
                if arg.path.is_ident("name") {
                    let Ok(value) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                        panic!(
                            "Error while parsing `name`, use it like: `#[berth(name = \"my_table\")]`"
                        );
                    };
                    name = value.value();
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
    TableMetadata {
        columns,
        name,
        item,
    }
}
