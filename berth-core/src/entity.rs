use crate::{AsValue, Connection, EntityDescriptor, Result, Value, describe, mapper};
use std::{collections::HashSet, hash::Hash};

/// Static tags of an entity type, emitted by `#[derive(Entity)]`.
#[derive(Debug)]
pub struct TableDef {
    /// Name of the Rust type.
    pub entity: &'static str,
    /// Name of the table, already resolved from the type name or its override.
    pub name: &'static str,
    /// Fields in declaration order.
    pub fields: Box<[FieldDef]>,
}

#[derive(Debug)]
pub struct FieldDef {
    /// Name of the Rust field.
    pub name: &'static str,
    /// Name of the column, already resolved from the field name or its override.
    pub column: &'static str,
    /// Position used by [`FieldAccess`].
    pub position: usize,
    /// Typed null of the declared type.
    pub value: Value,
    pub nullable: bool,
    /// Tagged with `#[berth(primary_key)]`.
    pub primary_key: bool,
}

/// Positional access to the fields of an entity.
pub trait FieldAccess {
    fn get_field(&self, position: usize) -> Result<Value>;
    fn set_field(&mut self, position: usize, value: Value) -> Result<()>;
}

/// A plain data type mapped to one row of one table.
///
/// `Default` provides the zero-initialized instance the rows are materialized into.
///
/// ```rust,ignore
/// #[derive(Entity, Default, Debug, Clone, PartialEq)]
/// struct Widget {
///     id: Option<i64>,
///     name: String,
///     score: Option<i32>,
/// }
///
/// let widget = Widget { id: None, name: "a".into(), score: None }
///     .insert(&mut connection)?
///     .expect("The store did not return the generated key");
/// let found = Widget::find(&mut connection, widget.id)?;
/// ```
pub trait Entity: FieldAccess + Default + 'static {
    fn table_def() -> &'static TableDef;

    fn descriptor() -> Result<&'static EntityDescriptor> {
        describe::<Self>()
    }

    /// Select the entity having primary key `key`.
    fn find<C: Connection>(connection: &mut C, key: impl AsValue) -> Result<Option<Self>> {
        mapper::select(connection, key)
    }

    /// Select every entity whose primary key is in `keys`.
    fn find_many<C, K>(
        connection: &mut C,
        keys: impl IntoIterator<Item = K>,
    ) -> Result<HashSet<Self>>
    where
        Self: Eq + Hash,
        C: Connection,
        K: AsValue + Eq + Hash,
    {
        mapper::select_many(connection, keys)
    }

    /// Insert the entity, see [`mapper::insert`].
    fn insert<C: Connection>(self, connection: &mut C) -> Result<Option<Self>> {
        mapper::insert(connection, self)
    }

    fn update<C: Connection>(&self, connection: &mut C) -> Result<()> {
        mapper::update(connection, self)
    }

    fn delete_by_key<C: Connection>(connection: &mut C, key: impl AsValue) -> Result<()> {
        mapper::delete::<Self, C>(connection, key)
    }
}
