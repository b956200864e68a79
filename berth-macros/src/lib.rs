mod decode_column;
mod decode_table;

use decode_table::decode_table;
use proc_macro::TokenStream;
use quote::quote;
use syn::{ItemStruct, parse_macro_input};

/// Implement `berth::Entity` and `berth::FieldAccess` for a struct with named fields.
///
/// * `#[berth(name = "table")]` on the struct overrides the table name, the snake case of the
///   type name otherwise.
/// * `#[berth(name = "column")]` on a field overrides the column name, the field name otherwise.
/// * `#[berth(primary_key)]` on a field makes it the primary key, the field named `id` otherwise.
#[proc_macro_derive(Entity, attributes(berth))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let table = decode_table(parse_macro_input!(input as ItemStruct));
    let ident = &table.item.ident;
    let entity = ident.to_string();
    let name = &table.name;
    let field_defs = table.columns.iter().enumerate().map(|(position, column)| {
        let field = column.field_name();
        let name = &column.name;
        let ty = column.ty();
        let primary_key = column.primary_key;
        quote! {
            ::berth::FieldDef {
                name: #field,
                column: #name,
                position: #position,
                value: <#ty as ::berth::AsValue>::as_empty_value(),
                nullable: <#ty as ::berth::AsValue>::NULLABLE,
                primary_key: #primary_key,
            }
        }
    });
    let get_arms = table.columns.iter().enumerate().map(|(position, column)| {
        let field = &column.ident;
        quote! {
            #position => Ok(::berth::AsValue::as_value(::std::clone::Clone::clone(&self.#field))),
        }
    });
    let set_arms = table.columns.iter().enumerate().map(|(position, column)| {
        let field = &column.ident;
        let ty = column.ty();
        quote! {
            #position => self.#field = <#ty as ::berth::AsValue>::try_from_value(value)?,
        }
    });
    quote! {
        impl ::berth::FieldAccess for #ident {
            fn get_field(&self, position: usize) -> ::berth::Result<::berth::Value> {
                match position {
                    #(#get_arms)*
                    _ => Err(::berth::Error::msg(format!(
                        "Entity `{}` has no field at position {}",
                        #entity,
                        position,
                    ))),
                }
            }

            fn set_field(&mut self, position: usize, value: ::berth::Value) -> ::berth::Result<()> {
                match position {
                    #(#set_arms)*
                    _ => {
                        return Err(::berth::Error::msg(format!(
                            "Entity `{}` has no field at position {}",
                            #entity,
                            position,
                        )));
                    }
                }
                Ok(())
            }
        }

        impl ::berth::Entity for #ident {
            fn table_def() -> &'static ::berth::TableDef {
                static TABLE_DEF: ::std::sync::LazyLock<::berth::TableDef> =
                    ::std::sync::LazyLock::new(|| ::berth::TableDef {
                        entity: #entity,
                        name: #name,
                        fields: ::std::boxed::Box::new([#(#field_defs),*]),
                    });
                &TABLE_DEF
            }
        }
    }
    .into()
}
