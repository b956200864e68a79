//! Static dispatch table from a declared field type to its marshalling functions.
//!
//! Each [`TypeMapper`] is monomorphized from the generic functions in `typed` for one Rust
//! type. Field descriptors resolve their entry once, when they are built. The free functions of
//! this module dispatch through the entry, or fall back to moving the raw [`Value`] when the
//! declared type has none.
use crate::{
    AsValue, Error, FieldAccess, FieldDescriptor, Result, RowLabeled, Statement,
    TypeMappingError, Value,
};
use rust_decimal::Decimal;
use std::fmt;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};
use uuid::Uuid;

/// A type with a registry entry.
pub trait MappedType: AsValue + Sized {
    /// Written into a non-nullable field that reads SQL null, `None` makes it an error.
    fn absent() -> Option<Self>;
}

macro_rules! impl_mapped_type {
    ($($source:ty => $absent:expr),+ $(,)?) => {
        $(
            impl MappedType for $source {
                fn absent() -> Option<Self> {
                    $absent
                }
            }
        )+
    };
}

impl_mapped_type!(
    bool => Some(false),
    i8 => Some(0),
    i16 => Some(0),
    i32 => Some(0),
    i64 => Some(0),
    u8 => Some(0),
    u16 => Some(0),
    u32 => Some(0),
    u64 => Some(0),
    f32 => Some(0.0),
    f64 => Some(0.0),
    Decimal => Some(Decimal::ZERO),
    String => Some(String::new()),
    Box<[u8]> => Some(Box::default()),
    Uuid => Some(Uuid::nil()),
    Date => None,
    Time => None,
    PrimitiveDateTime => None,
    OffsetDateTime => None,
);

pub type Coerce = fn(Value) -> Result<Value>;
pub type NullableSetter = fn(&mut dyn Statement, usize, Value) -> Result<()>;
pub type ParameterSetter =
    fn(&mut dyn Statement, &FieldDescriptor, &dyn FieldAccess, usize) -> Result<()>;
pub type ResultWriter =
    fn(&RowLabeled, &FieldDescriptor, &mut dyn FieldAccess, Option<usize>) -> Result<()>;
pub type FieldCopier = fn(&FieldDescriptor, &mut dyn FieldAccess, &dyn FieldAccess) -> Result<()>;
pub type KeyExtractor = fn(&RowLabeled, &FieldDescriptor, &mut dyn FieldAccess) -> Result<()>;

/// Marshalling functions of one declared type.
pub struct TypeMapper {
    pub name: &'static str,
    /// Convert a value of any kind into this type, a null becomes this type's typed null.
    pub coerce: Coerce,
    /// Bind a value at an index, a null is bound as this type's typed null.
    pub set_nullable: NullableSetter,
    /// Bind a field of an entity at an index.
    pub set_parameter: ParameterSetter,
    /// Write a column of a row into a field, by position when given or else by column name.
    pub write_result: ResultWriter,
    /// Copy a field from the second entity into the first.
    pub copy_field: FieldCopier,
    /// Write the first column of a generated keys row into a field.
    pub extract_key: KeyExtractor,
}

impl TypeMapper {
    const fn of<T: MappedType>(name: &'static str) -> Self {
        Self {
            name,
            coerce: typed::coerce::<T>,
            set_nullable: typed::set_nullable::<T>,
            set_parameter: typed::set_parameter::<T>,
            write_result: typed::write_result::<T>,
            copy_field: typed::copy_field::<T>,
            extract_key: typed::extract_key::<T>,
        }
    }
}

impl fmt::Debug for TypeMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeMapper")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

static BOOLEAN: TypeMapper = TypeMapper::of::<bool>("bool");
static INT8: TypeMapper = TypeMapper::of::<i8>("i8");
static INT16: TypeMapper = TypeMapper::of::<i16>("i16");
static INT32: TypeMapper = TypeMapper::of::<i32>("i32");
static INT64: TypeMapper = TypeMapper::of::<i64>("i64");
static UINT8: TypeMapper = TypeMapper::of::<u8>("u8");
static UINT16: TypeMapper = TypeMapper::of::<u16>("u16");
static UINT32: TypeMapper = TypeMapper::of::<u32>("u32");
static UINT64: TypeMapper = TypeMapper::of::<u64>("u64");
static FLOAT32: TypeMapper = TypeMapper::of::<f32>("f32");
static FLOAT64: TypeMapper = TypeMapper::of::<f64>("f64");
static DECIMAL: TypeMapper = TypeMapper::of::<Decimal>("Decimal");
static VARCHAR: TypeMapper = TypeMapper::of::<String>("String");
static BLOB: TypeMapper = TypeMapper::of::<Box<[u8]>>("Box<[u8]>");
static DATE: TypeMapper = TypeMapper::of::<Date>("Date");
static TIME: TypeMapper = TypeMapper::of::<Time>("Time");
static TIMESTAMP: TypeMapper = TypeMapper::of::<PrimitiveDateTime>("PrimitiveDateTime");
static TIMESTAMPTZ: TypeMapper = TypeMapper::of::<OffsetDateTime>("OffsetDateTime");
static UUID: TypeMapper = TypeMapper::of::<Uuid>("Uuid");

/// Registry entry of the SQL kind of `value`.
///
/// Lists and the untyped null have none.
pub fn type_mapper(value: &Value) -> Option<&'static TypeMapper> {
    Some(match value {
        Value::Boolean(..) => &BOOLEAN,
        Value::Int8(..) => &INT8,
        Value::Int16(..) => &INT16,
        Value::Int32(..) => &INT32,
        Value::Int64(..) => &INT64,
        Value::UInt8(..) => &UINT8,
        Value::UInt16(..) => &UINT16,
        Value::UInt32(..) => &UINT32,
        Value::UInt64(..) => &UINT64,
        Value::Float32(..) => &FLOAT32,
        Value::Float64(..) => &FLOAT64,
        Value::Decimal(..) => &DECIMAL,
        Value::Varchar(..) => &VARCHAR,
        Value::Blob(..) => &BLOB,
        Value::Date(..) => &DATE,
        Value::Time(..) => &TIME,
        Value::Timestamp(..) => &TIMESTAMP,
        Value::TimestampWithTimezone(..) => &TIMESTAMPTZ,
        Value::Uuid(..) => &UUID,
        Value::Null | Value::List(..) => return None,
    })
}

fn mapping_error(field: &str, error: Error) -> Error {
    Error::new(TypeMappingError::new(field, format!("{error:#}")))
}

fn read_column<'r>(
    row: &'r RowLabeled,
    field: &FieldDescriptor,
    index: Option<usize>,
) -> Result<&'r Value> {
    match index {
        Some(index) => row.get(index),
        None => row.get_column(field.column).ok_or_else(|| {
            Error::msg(format!(
                "Column `{}` of field `{}` is not present in the row",
                field.column, field.name
            ))
        }),
    }
}

mod typed {
    use super::{MappedType, mapping_error, read_column};
    use crate::{AsValue, Error, FieldAccess, FieldDescriptor, Result, RowLabeled, Statement, Value};
    use std::any;

    pub(super) fn coerce<T: MappedType>(value: Value) -> Result<Value> {
        if value.is_null() {
            return Ok(T::as_empty_value());
        }
        Ok(T::try_from_value(value)?.as_value())
    }

    pub(super) fn set_nullable<T: MappedType>(
        statement: &mut dyn Statement,
        index: usize,
        value: Value,
    ) -> Result<()> {
        let value =
            coerce::<T>(value).map_err(|e| mapping_error(&format!("parameter {index}"), e))?;
        statement.bind(index, value)
    }

    pub(super) fn set_parameter<T: MappedType>(
        statement: &mut dyn Statement,
        field: &FieldDescriptor,
        entity: &dyn FieldAccess,
        index: usize,
    ) -> Result<()> {
        let value = entity.get_field(field.position)?;
        let value = coerce::<T>(value).map_err(|e| mapping_error(field.name, e))?;
        statement.bind(index, value)
    }

    pub(super) fn write_result<T: MappedType>(
        row: &RowLabeled,
        field: &FieldDescriptor,
        entity: &mut dyn FieldAccess,
        index: Option<usize>,
    ) -> Result<()> {
        let value = read_column(row, field, index)?.clone();
        let value = if value.is_null() && !field.nullable {
            T::absent().map(AsValue::as_value).ok_or_else(|| {
                mapping_error(
                    field.name,
                    Error::msg(format!(
                        "column `{}` is NULL and {} has no absent value",
                        field.column,
                        any::type_name::<T>(),
                    )),
                )
            })?
        } else {
            coerce::<T>(value).map_err(|e| mapping_error(field.name, e))?
        };
        entity.set_field(field.position, value)
    }

    pub(super) fn copy_field<T: MappedType>(
        field: &FieldDescriptor,
        target: &mut dyn FieldAccess,
        origin: &dyn FieldAccess,
    ) -> Result<()> {
        let value = coerce::<T>(origin.get_field(field.position)?)
            .map_err(|e| mapping_error(field.name, e))?;
        target.set_field(field.position, value)
    }

    pub(super) fn extract_key<T: MappedType>(
        row: &RowLabeled,
        field: &FieldDescriptor,
        entity: &mut dyn FieldAccess,
    ) -> Result<()> {
        write_result::<T>(row, field, entity, Some(1))
    }
}

/// Bind the field of `entity` at `index`.
pub fn set_parameter(
    statement: &mut dyn Statement,
    field: &FieldDescriptor,
    entity: &dyn FieldAccess,
    index: usize,
) -> Result<()> {
    match field.mapper {
        Some(mapper) => (mapper.set_parameter)(statement, field, entity, index),
        None => {
            let value = entity.get_field(field.position)?;
            statement.bind(index, if value.is_null() { Value::Null } else { value })
        }
    }
}

/// Write a column of `row` into the field of `entity`, by position when `index` is given or
/// else by column name.
pub fn write_result(
    row: &RowLabeled,
    field: &FieldDescriptor,
    entity: &mut dyn FieldAccess,
    index: Option<usize>,
) -> Result<()> {
    match field.mapper {
        Some(mapper) => (mapper.write_result)(row, field, entity, index),
        None => {
            let value = read_column(row, field, index)?.clone();
            entity
                .set_field(field.position, value)
                .map_err(|e| mapping_error(field.name, e))
        }
    }
}

/// Copy the field from `origin` into `target`.
pub fn copy_field(
    field: &FieldDescriptor,
    target: &mut dyn FieldAccess,
    origin: &dyn FieldAccess,
) -> Result<()> {
    match field.mapper {
        Some(mapper) => (mapper.copy_field)(field, target, origin),
        None => target.set_field(field.position, origin.get_field(field.position)?),
    }
}

/// Write the generated key from the first column of `row` into the field of `entity`.
pub fn extract_key(
    row: &RowLabeled,
    field: &FieldDescriptor,
    entity: &mut dyn FieldAccess,
) -> Result<()> {
    match field.mapper {
        Some(mapper) => (mapper.extract_key)(row, field, entity),
        None => write_result(row, field, entity, Some(1)),
    }
}

/// Bind a key value, converted to the declared type of the key field.
pub fn bind_key(
    statement: &mut dyn Statement,
    key: &FieldDescriptor,
    value: Value,
    index: usize,
) -> Result<()> {
    match key.mapper {
        Some(mapper) => (mapper.set_nullable)(statement, index, value),
        None => statement.bind(index, value),
    }
}

/// Bind a set of key values as one list parameter whose element type is the type of the key.
pub fn bind_key_set(
    statement: &mut dyn Statement,
    key: &FieldDescriptor,
    values: Vec<Value>,
    index: usize,
) -> Result<()> {
    let values = match key.mapper {
        Some(mapper) => values
            .into_iter()
            .map(mapper.coerce)
            .collect::<Result<Vec<_>>>()
            .map_err(|e| mapping_error(key.name, e))?,
        None => values,
    };
    statement.bind(index, Value::List(Some(values), Box::new(key.value.as_null())))
}
