//! Construction of entities and access to their fields through descriptors.
use crate::{
    Entity, EntityDescriptor, Error, FieldAccess, FieldDescriptor, Result, RowLabeled, Value,
    registry::write_result,
};

/// A new zero-initialized entity.
pub fn construct<E: Entity>() -> E {
    E::default()
}

pub fn read(entity: &dyn FieldAccess, field: &FieldDescriptor) -> Result<Value> {
    entity.get_field(field.position)
}

pub fn write(entity: &mut dyn FieldAccess, field: &FieldDescriptor, value: Value) -> Result<()> {
    entity.set_field(field.position, value)
}

fn field_named<'d>(descriptor: &'d EntityDescriptor, name: &str) -> Result<&'d FieldDescriptor> {
    descriptor.field(name).ok_or_else(|| {
        Error::msg(format!(
            "Entity `{}` has no field named `{name}`",
            descriptor.entity
        ))
    })
}

pub fn read_by_name(
    entity: &dyn FieldAccess,
    descriptor: &EntityDescriptor,
    name: &str,
) -> Result<Value> {
    read(entity, field_named(descriptor, name)?)
}

pub fn write_by_name(
    entity: &mut dyn FieldAccess,
    descriptor: &EntityDescriptor,
    name: &str,
    value: Value,
) -> Result<()> {
    write(entity, field_named(descriptor, name)?, value)
}

/// Build an entity out of a row, the primary key first and then every column, by column name.
pub fn materialize<E: Entity>(descriptor: &EntityDescriptor, row: &RowLabeled) -> Result<E> {
    let mut entity = construct::<E>();
    for field in descriptor.fields() {
        write_result(row, field, &mut entity, None)?;
    }
    Ok(entity)
}

/// Build an entity out of a row, usable as a mapping callback.
///
/// ```rust,ignore
/// let widgets = support
///     .sql("SELECT id, name, score FROM widget WHERE score > ?")
///     .bind(|s| s.bind_value(1, 10))
///     .map_row(from_row::<Widget>)
///     .query_list(&mut connection)?;
/// ```
pub fn from_row<E: Entity>(row: &RowLabeled) -> Result<E> {
    materialize(E::descriptor()?, row)
}
