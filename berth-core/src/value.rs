use crate::{Error, Result, type_mapper};
use rust_decimal::Decimal;
use std::{fmt, mem};
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};
use uuid::Uuid;

/// A SQL value.
///
/// Every scalar variant carries an `Option` so that a null still knows which SQL kind it
/// belongs to. `Value::Null` is the untyped null used when the kind is unknown.
#[derive(Default, Debug, Clone)]
pub enum Value {
    #[default]
    Null,
    Boolean(Option<bool>),
    Int8(Option<i8>),
    Int16(Option<i16>),
    Int32(Option<i32>),
    Int64(Option<i64>),
    UInt8(Option<u8>),
    UInt16(Option<u16>),
    UInt32(Option<u32>),
    UInt64(Option<u64>),
    Float32(Option<f32>),
    Float64(Option<f64>),
    Decimal(Option<Decimal>),
    Varchar(Option<String>),
    Blob(Option<Box<[u8]>>),
    Date(Option<Date>),
    Time(Option<Time>),
    Timestamp(Option<PrimitiveDateTime>),
    TimestampWithTimezone(Option<OffsetDateTime>),
    Uuid(Option<Uuid>),
    List(Option<Vec<Value>>, /* type: */ Box<Value>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Boolean(l), Self::Boolean(r)) => l == r,
            (Self::Int8(l), Self::Int8(r)) => l == r,
            (Self::Int16(l), Self::Int16(r)) => l == r,
            (Self::Int32(l), Self::Int32(r)) => l == r,
            (Self::Int64(l), Self::Int64(r)) => l == r,
            (Self::UInt8(l), Self::UInt8(r)) => l == r,
            (Self::UInt16(l), Self::UInt16(r)) => l == r,
            (Self::UInt32(l), Self::UInt32(r)) => l == r,
            (Self::UInt64(l), Self::UInt64(r)) => l == r,
            (Self::Float32(l), Self::Float32(r)) => l == r,
            (Self::Float64(l), Self::Float64(r)) => l == r,
            (Self::Decimal(l), Self::Decimal(r)) => l == r,
            (Self::Varchar(l), Self::Varchar(r)) => l == r,
            (Self::Blob(l), Self::Blob(r)) => l == r,
            (Self::Date(l), Self::Date(r)) => l == r,
            (Self::Time(l), Self::Time(r)) => l == r,
            (Self::Timestamp(l), Self::Timestamp(r)) => l == r,
            (Self::TimestampWithTimezone(l), Self::TimestampWithTimezone(r)) => l == r,
            (Self::Uuid(l), Self::Uuid(r)) => l == r,
            (Self::List(l, ..), Self::List(r, ..)) => l == r && self.same_type(other),
            _ => mem::discriminant(self) == mem::discriminant(other),
        }
    }
}

impl Value {
    pub fn same_type(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::List(.., l), Self::List(.., r)) => l.same_type(r),
            _ => mem::discriminant(self) == mem::discriminant(other),
        }
    }

    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Boolean(v) => v.is_none(),
            Value::Int8(v) => v.is_none(),
            Value::Int16(v) => v.is_none(),
            Value::Int32(v) => v.is_none(),
            Value::Int64(v) => v.is_none(),
            Value::UInt8(v) => v.is_none(),
            Value::UInt16(v) => v.is_none(),
            Value::UInt32(v) => v.is_none(),
            Value::UInt64(v) => v.is_none(),
            Value::Float32(v) => v.is_none(),
            Value::Float64(v) => v.is_none(),
            Value::Decimal(v) => v.is_none(),
            Value::Varchar(v) => v.is_none(),
            Value::Blob(v) => v.is_none(),
            Value::Date(v) => v.is_none(),
            Value::Time(v) => v.is_none(),
            Value::Timestamp(v) => v.is_none(),
            Value::TimestampWithTimezone(v) => v.is_none(),
            Value::Uuid(v) => v.is_none(),
            Value::List(v, ..) => v.is_none(),
        }
    }

    /// Machine primitives: the kinds that have no natural "no value" representation.
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            Value::Boolean(..)
                | Value::Int8(..)
                | Value::Int16(..)
                | Value::Int32(..)
                | Value::Int64(..)
                | Value::UInt8(..)
                | Value::UInt16(..)
                | Value::UInt32(..)
                | Value::UInt64(..)
                | Value::Float32(..)
                | Value::Float64(..)
        )
    }

    /// The null of the same SQL kind.
    pub fn as_null(&self) -> Value {
        match self {
            Value::Null => Value::Null,
            Value::Boolean(..) => Value::Boolean(None),
            Value::Int8(..) => Value::Int8(None),
            Value::Int16(..) => Value::Int16(None),
            Value::Int32(..) => Value::Int32(None),
            Value::Int64(..) => Value::Int64(None),
            Value::UInt8(..) => Value::UInt8(None),
            Value::UInt16(..) => Value::UInt16(None),
            Value::UInt32(..) => Value::UInt32(None),
            Value::UInt64(..) => Value::UInt64(None),
            Value::Float32(..) => Value::Float32(None),
            Value::Float64(..) => Value::Float64(None),
            Value::Decimal(..) => Value::Decimal(None),
            Value::Varchar(..) => Value::Varchar(None),
            Value::Blob(..) => Value::Blob(None),
            Value::Date(..) => Value::Date(None),
            Value::Time(..) => Value::Time(None),
            Value::Timestamp(..) => Value::Timestamp(None),
            Value::TimestampWithTimezone(..) => Value::TimestampWithTimezone(None),
            Value::Uuid(..) => Value::Uuid(None),
            Value::List(_, ty) => Value::List(None, ty.clone()),
        }
    }

    /// Converts this value into the SQL kind of `target`.
    ///
    /// Lists are converted element by element. An untyped null target keeps the value as it is.
    pub fn try_as(self, target: &Value) -> Result<Value> {
        if let Some(mapper) = type_mapper(target) {
            return (mapper.coerce)(self);
        }
        match (self, target) {
            (Value::List(Some(values), _), Value::List(_, ty)) => Ok(Value::List(
                Some(
                    values
                        .into_iter()
                        .map(|v| v.try_as(ty))
                        .collect::<Result<_>>()?,
                ),
                ty.clone(),
            )),
            (value, Value::List(_, ty)) if value.is_null() => Ok(Value::List(None, ty.clone())),
            (value, Value::Null) => Ok(value),
            (value, target) => Err(Error::msg(format!(
                "Cannot convert {value} into the type of {target}"
            ))),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        macro_rules! write_option {
            ($name:literal, $v:expr) => {
                match $v {
                    Some(v) => write!(f, "{}({})", $name, v),
                    None => write!(f, "{}(NULL)", $name),
                }
            };
        }
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Boolean(v) => write_option!("Boolean", v),
            Value::Int8(v) => write_option!("Int8", v),
            Value::Int16(v) => write_option!("Int16", v),
            Value::Int32(v) => write_option!("Int32", v),
            Value::Int64(v) => write_option!("Int64", v),
            Value::UInt8(v) => write_option!("UInt8", v),
            Value::UInt16(v) => write_option!("UInt16", v),
            Value::UInt32(v) => write_option!("UInt32", v),
            Value::UInt64(v) => write_option!("UInt64", v),
            Value::Float32(v) => write_option!("Float32", v),
            Value::Float64(v) => write_option!("Float64", v),
            Value::Decimal(v) => write_option!("Decimal", v),
            Value::Varchar(v) => write_option!("Varchar", v.as_ref().map(|v| format!("{v:?}"))),
            Value::Blob(v) => write_option!("Blob", v.as_ref().map(|v| format!("{} bytes", v.len()))),
            Value::Date(v) => write_option!("Date", v),
            Value::Time(v) => write_option!("Time", v),
            Value::Timestamp(v) => write_option!("Timestamp", v),
            Value::TimestampWithTimezone(v) => write_option!("TimestampWithTimezone", v),
            Value::Uuid(v) => write_option!("Uuid", v),
            Value::List(v, ty) => match v {
                Some(v) => write!(f, "List<{}>({} values)", ty.as_null(), v.len()),
                None => write!(f, "List<{}>(NULL)", ty.as_null()),
            },
        }
    }
}
