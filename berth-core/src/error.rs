use std::error::Error as StdError;
use thiserror::Error;

/// Malformed entity type, raised while describing it.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error(
        "Entity `{entity}` has no primary key, tag one field with #[berth(primary_key)] or name it `id`"
    )]
    MissingPrimaryKey { entity: &'static str },
    #[error("Entity `{entity}` tags more than one primary key ({fields}), exactly one is required")]
    MultiplePrimaryKeys { entity: &'static str, fields: String },
}

/// A field value could not be converted to or from its SQL representation.
#[derive(Debug, Error)]
#[error("Cannot map field `{field}`: {message}")]
pub struct TypeMappingError {
    pub field: String,
    pub message: String,
}

impl TypeMappingError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Unexpected failure raised by a binding or mapping callback of [`crate::SqlSupport`].
#[derive(Debug, Error)]
#[error("Unexpected failure inside a statement callback")]
pub struct WrappedError(#[source] pub Box<dyn StdError + Send + Sync + 'static>);

impl WrappedError {
    pub fn new(error: crate::Error) -> Self {
        Self(error.into())
    }
}
