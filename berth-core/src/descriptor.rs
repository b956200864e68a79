use crate::{Entity, FieldDef, Result, SchemaError, TableDef, TypeMapper, Value, type_mapper};
use std::{
    any::TypeId,
    collections::HashMap,
    iter,
    sync::{LazyLock, PoisonError, RwLock},
};

/// Field metadata used for SQL generation and marshalling.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub column: &'static str,
    pub position: usize,
    /// Typed null of the declared type, selects the registry entry.
    pub value: Value,
    pub nullable: bool,
    /// Registry entry resolved when the descriptor is built, `None` uses the generic fallback.
    pub mapper: Option<&'static TypeMapper>,
}

impl From<&FieldDef> for FieldDescriptor {
    fn from(value: &FieldDef) -> Self {
        Self {
            name: value.name,
            column: value.column,
            position: value.position,
            value: value.value.clone(),
            nullable: value.nullable,
            mapper: type_mapper(&value.value),
        }
    }
}

/// Schema metadata of an entity type.
#[derive(Debug)]
pub struct EntityDescriptor {
    pub entity: &'static str,
    pub table: &'static str,
    pub primary_key: FieldDescriptor,
    /// Non-key fields, in declaration order.
    pub columns: Box<[FieldDescriptor]>,
    by_name: HashMap<&'static str, usize>,
}

impl EntityDescriptor {
    pub fn build(def: &TableDef) -> std::result::Result<Self, SchemaError> {
        let tagged = def
            .fields
            .iter()
            .filter(|f| f.primary_key)
            .collect::<Vec<_>>();
        let key = match tagged.as_slice() {
            [key] => *key,
            [] => def
                .fields
                .iter()
                .find(|f| f.name == "id")
                .ok_or(SchemaError::MissingPrimaryKey { entity: def.entity })?,
            keys => {
                return Err(SchemaError::MultiplePrimaryKeys {
                    entity: def.entity,
                    fields: keys.iter().map(|f| f.name).collect::<Vec<_>>().join(", "),
                });
            }
        };
        let columns = def
            .fields
            .iter()
            .filter(|f| f.name != key.name)
            .map(FieldDescriptor::from)
            .collect::<Box<[_]>>();
        let by_name = columns
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name, i + 1))
            .chain(iter::once((key.name, 0)))
            .collect();
        Ok(Self {
            entity: def.entity,
            table: def.name,
            primary_key: key.into(),
            columns,
            by_name,
        })
    }

    /// Primary key first, then the columns.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        iter::once(&self.primary_key).chain(self.columns.iter())
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.by_name.get(name).map(|&i| match i {
            0 => &self.primary_key,
            i => &self.columns[i - 1],
        })
    }

    pub fn column_name(&self, field: &str) -> Option<&'static str> {
        self.field(field).map(|f| f.column)
    }
}

static DESCRIPTORS: LazyLock<RwLock<HashMap<TypeId, &'static EntityDescriptor>>> =
    LazyLock::new(Default::default);

/// Describe the entity type `E`.
///
/// The descriptor is computed on first use and lives for the rest of the process. Concurrent
/// first uses may compute it more than once, the first one stored is returned to everybody.
pub fn describe<E: Entity>() -> Result<&'static EntityDescriptor> {
    let id = TypeId::of::<E>();
    let cached = DESCRIPTORS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&id)
        .copied();
    if let Some(descriptor) = cached {
        return Ok(descriptor);
    }
    let descriptor = EntityDescriptor::build(E::table_def()).map_err(|e| crate::log_error!(e))?;
    log::debug!(
        "Described entity `{}` as table `{}` with primary key `{}`",
        descriptor.entity,
        descriptor.table,
        descriptor.primary_key.column,
    );
    let mut descriptors = DESCRIPTORS.write().unwrap_or_else(PoisonError::into_inner);
    Ok(*descriptors
        .entry(id)
        .or_insert_with(|| &*Box::leak(Box::new(descriptor))))
}
