//! The five canonical operations over an [`Entity`].
//!
//! Every operation describes the entity, writes its template with the driver's [`SqlWriter`],
//! binds through the [`registry`](crate::registry) and executes on the connection. The
//! statement and its rows are dropped before the function returns, also on error.
use crate::{
    AsValue, Connection, Driver, Entity, EntityDescriptor, FieldAccess, FieldDescriptor, Result,
    RowLabeled, SqlTemplate, SqlWriter, Statement, materializer,
    registry::{bind_key, bind_key_set, copy_field, extract_key, set_parameter},
};
use std::{collections::HashSet, hash::Hash};

fn write_template<C: Connection>(
    connection: &C,
    write: impl FnOnce(&<C::Driver as Driver>::SqlWriter) -> SqlTemplate,
) -> SqlTemplate {
    let template = write(&connection.driver().sql_writer());
    log::debug!("{}", template);
    template
}

/// Whether the primary key of `entity` holds a value the store must receive.
///
/// A nullable key is provided when not null. A non-nullable primitive key is never provided,
/// zero cannot be told apart from absent. Any other non-nullable key is always provided.
pub fn key_provided(entity: &dyn FieldAccess, key: &FieldDescriptor) -> Result<bool> {
    if key.nullable {
        Ok(!entity.get_field(key.position)?.is_null())
    } else {
        Ok(!key.value.is_primitive())
    }
}

/// Select the entity having primary key `key`, `None` when there is no such row.
pub fn select<E, C>(connection: &mut C, key: impl AsValue) -> Result<Option<E>>
where
    E: Entity,
    C: Connection,
{
    let descriptor = E::descriptor()?;
    let template = write_template(connection, |w| w.select_by_key(descriptor));
    let mut statement = connection.prepare(&template.sql, false)?;
    bind_key(&mut statement, &descriptor.primary_key, key.as_value(), 1)?;
    let mut rows = statement.query()?;
    let Some(row) = rows.next().transpose()? else {
        return Ok(None);
    };
    Ok(Some(materializer::materialize(descriptor, &row)?))
}

/// Select every entity whose primary key is in `keys`.
///
/// The keys are deduplicated and bound as a single list parameter, the store must support the
/// key set filter of its [`SqlWriter`].
pub fn select_many<E, C, K>(
    connection: &mut C,
    keys: impl IntoIterator<Item = K>,
) -> Result<HashSet<E>>
where
    E: Entity + Eq + Hash,
    C: Connection,
    K: AsValue + Eq + Hash,
{
    let keys = keys.into_iter().collect::<HashSet<_>>();
    if keys.is_empty() {
        return Ok(HashSet::new());
    }
    let descriptor = E::descriptor()?;
    let template = write_template(connection, |w| w.bulk_select_by_keys(descriptor));
    let mut statement = connection.prepare(&template.sql, false)?;
    let mut result = HashSet::with_capacity(keys.len());
    bind_key_set(
        &mut statement,
        &descriptor.primary_key,
        keys.into_iter().map(AsValue::as_value).collect(),
        1,
    )?;
    for row in statement.query()? {
        result.insert(materializer::materialize(descriptor, &row?)?);
    }
    Ok(result)
}

/// Insert `entity`.
///
/// When the primary key is provided the same entity is returned, with no further read.
/// Otherwise the store generates the key: the returned entity carries it, together with the
/// other fields copied from `entity`. `None` means the store did not report a generated key,
/// the row may still have been inserted.
pub fn insert<E, C>(connection: &mut C, entity: E) -> Result<Option<E>>
where
    E: Entity,
    C: Connection,
{
    let descriptor = E::descriptor()?;
    let key = &descriptor.primary_key;
    let provided = key_provided(&entity, key)?;
    let template = write_template(connection, |w| w.insert(descriptor, provided));
    let mut statement = connection.prepare(&template.sql, template.generated_key)?;
    bind_fields(
        &mut statement,
        provided.then_some(key).into_iter().chain(descriptor.columns.iter()),
        &entity,
    )?;
    statement.execute()?;
    if provided {
        return Ok(Some(entity));
    }
    let mut keys = statement.generated_keys()?;
    let Some(row) = keys.next().transpose()? else {
        log::warn!(
            "The store did not return the key generated while inserting into `{}`",
            descriptor.table
        );
        return Ok(None);
    };
    Ok(Some(with_generated_key(descriptor, &row, &entity)?))
}

/// Update every column of `entity`, selected by its primary key.
pub fn update<E, C>(connection: &mut C, entity: &E) -> Result<()>
where
    E: Entity,
    C: Connection,
{
    let descriptor = E::descriptor()?;
    let template = write_template(connection, |w| w.update(descriptor));
    let mut statement = connection.prepare(&template.sql, false)?;
    bind_fields(
        &mut statement,
        descriptor
            .columns
            .iter()
            .chain([&descriptor.primary_key]),
        entity,
    )?;
    statement.execute()?;
    Ok(())
}

/// Delete the entity having primary key `key`.
pub fn delete<E, C>(connection: &mut C, key: impl AsValue) -> Result<()>
where
    E: Entity,
    C: Connection,
{
    let descriptor = E::descriptor()?;
    let template = write_template(connection, |w| w.delete_by_key(descriptor));
    let mut statement = connection.prepare(&template.sql, false)?;
    bind_key(&mut statement, &descriptor.primary_key, key.as_value(), 1)?;
    statement.execute()?;
    Ok(())
}

fn bind_fields<'a>(
    statement: &mut dyn Statement,
    fields: impl IntoIterator<Item = &'a FieldDescriptor>,
    entity: &dyn FieldAccess,
) -> Result<()> {
    for (i, field) in fields.into_iter().enumerate() {
        set_parameter(statement, field, entity, i + 1)?;
    }
    Ok(())
}

fn with_generated_key<E: Entity>(
    descriptor: &EntityDescriptor,
    row: &RowLabeled,
    origin: &E,
) -> Result<E> {
    let mut result = materializer::construct::<E>();
    extract_key(row, &descriptor.primary_key, &mut result)?;
    for column in descriptor.columns.iter() {
        copy_field(column, &mut result, origin)?;
    }
    Ok(result)
}
