use crate::{Error, Result, Value, truncate_long};
use rust_decimal::{
    Decimal,
    prelude::{FromPrimitive, ToPrimitive},
};
use std::{any, str::FromStr};
use time::{
    Date, OffsetDateTime, PrimitiveDateTime, Time, format_description::BorrowedFormatItem,
    macros::format_description,
};
use uuid::Uuid;

/// Textual format of dates, for stores without a native date type.
pub const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
/// Textual format of times of day.
pub const TIME_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[hour]:[minute]:[second][optional [.[subsecond]]]");
/// Textual format of timestamps without time zone.
pub const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] = format_description!(
    "[year]-[month]-[day] [hour]:[minute]:[second][optional [.[subsecond]]]"
);
/// Textual format of timestamps with time zone.
pub const TIMESTAMPTZ_FORMAT: &[BorrowedFormatItem<'static>] = format_description!(
    "[year]-[month]-[day] [hour]:[minute]:[second][optional [.[subsecond]]][offset_hour sign:mandatory]:[offset_minute]"
);

/// Conversion between a Rust type and the dynamically typed [`Value`].
///
/// Every field of an entity must implement it. The derive reads the declared SQL kind from
/// [`AsValue::as_empty_value`] and the nullability from [`AsValue::NULLABLE`].
///
/// # Conversions
/// - The canonical variant is always accepted (`Value::Int32` for `i32`).
/// - Integers accept every integer width, the value is range checked.
/// - Text is parsed when the store has no native representation for the type.
/// - A null is rejected, only `Option<T>` accepts it.
///
/// ```rust
/// use berth_core::{AsValue, Value};
/// let v = 42i32.as_value();
/// assert!(matches!(v, Value::Int32(Some(42))));
/// let n: i64 = AsValue::try_from_value(v).unwrap();
/// assert_eq!(n, 42);
/// ```
pub trait AsValue {
    /// `true` when the type can represent the absence of a value.
    const NULLABLE: bool = false;
    /// Typed null of this type.
    fn as_empty_value() -> Value;
    fn as_value(self) -> Value;
    fn try_from_value(value: Value) -> Result<Self>
    where
        Self: Sized;
}

impl<T: AsValue> From<T> for Value {
    fn from(value: T) -> Self {
        value.as_value()
    }
}

impl From<&'static str> for Value {
    fn from(value: &'static str) -> Self {
        Value::Varchar(Some(value.into()))
    }
}

fn conversion_error<T>(value: &Value) -> Error {
    Error::msg(format!(
        "Cannot convert {value} to {}",
        any::type_name::<T>()
    ))
}

fn parse_error<T>(input: &str, error: impl std::fmt::Display) -> Error {
    Error::msg(format!(
        "Cannot parse `{}` as {}: {error}",
        truncate_long!(input),
        any::type_name::<T>()
    ))
}

macro_rules! impl_as_value_integer {
    ($source:ty, $destination:path) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $destination(None)
            }
            fn as_value(self) -> Value {
                $destination(Some(self))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                let converted = match &value {
                    Value::Int8(Some(v)) => <$source>::try_from(*v).ok(),
                    Value::Int16(Some(v)) => <$source>::try_from(*v).ok(),
                    Value::Int32(Some(v)) => <$source>::try_from(*v).ok(),
                    Value::Int64(Some(v)) => <$source>::try_from(*v).ok(),
                    Value::UInt8(Some(v)) => <$source>::try_from(*v).ok(),
                    Value::UInt16(Some(v)) => <$source>::try_from(*v).ok(),
                    Value::UInt32(Some(v)) => <$source>::try_from(*v).ok(),
                    Value::UInt64(Some(v)) => <$source>::try_from(*v).ok(),
                    Value::Boolean(Some(v)) => Some(*v as $source),
                    Value::Decimal(Some(v)) if v.fract().is_zero() => {
                        v.to_i128().and_then(|v| <$source>::try_from(v).ok())
                    }
                    Value::Varchar(Some(v)) => Some(
                        v.trim()
                            .parse::<$source>()
                            .map_err(|e| parse_error::<$source>(v, e))?,
                    ),
                    _ => return Err(conversion_error::<$source>(&value)),
                };
                converted.ok_or_else(|| {
                    Error::msg(format!(
                        "Value {value} is out of range for {}",
                        any::type_name::<$source>()
                    ))
                })
            }
        }
    };
}

impl_as_value_integer!(i8, Value::Int8);
impl_as_value_integer!(i16, Value::Int16);
impl_as_value_integer!(i32, Value::Int32);
impl_as_value_integer!(i64, Value::Int64);
impl_as_value_integer!(u8, Value::UInt8);
impl_as_value_integer!(u16, Value::UInt16);
impl_as_value_integer!(u32, Value::UInt32);
impl_as_value_integer!(u64, Value::UInt64);

macro_rules! impl_as_value_float {
    ($source:ty, $destination:path, $from_decimal:ident) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $destination(None)
            }
            fn as_value(self) -> Value {
                $destination(Some(self))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                match value {
                    Value::Float32(Some(v)) => Ok(v as _),
                    Value::Float64(Some(v)) => Ok(v as _),
                    Value::Int8(Some(v)) => Ok(v as _),
                    Value::Int16(Some(v)) => Ok(v as _),
                    Value::Int32(Some(v)) => Ok(v as _),
                    Value::Int64(Some(v)) => Ok(v as _),
                    Value::UInt8(Some(v)) => Ok(v as _),
                    Value::UInt16(Some(v)) => Ok(v as _),
                    Value::UInt32(Some(v)) => Ok(v as _),
                    Value::UInt64(Some(v)) => Ok(v as _),
                    Value::Decimal(Some(v)) => v
                        .$from_decimal()
                        .ok_or_else(|| conversion_error::<Self>(&Value::Decimal(Some(v)))),
                    Value::Varchar(Some(v)) => v
                        .trim()
                        .parse::<$source>()
                        .map_err(|e| parse_error::<$source>(&v, e)),
                    value => Err(conversion_error::<Self>(&value)),
                }
            }
        }
    };
}

impl_as_value_float!(f32, Value::Float32, to_f32);
impl_as_value_float!(f64, Value::Float64, to_f64);

impl AsValue for bool {
    fn as_empty_value() -> Value {
        Value::Boolean(None)
    }
    fn as_value(self) -> Value {
        Value::Boolean(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Boolean(Some(v)) => Ok(v),
            Value::Int8(Some(v)) => Ok(v != 0),
            Value::Int16(Some(v)) => Ok(v != 0),
            Value::Int32(Some(v)) => Ok(v != 0),
            Value::Int64(Some(v)) => Ok(v != 0),
            Value::UInt8(Some(v)) => Ok(v != 0),
            Value::UInt16(Some(v)) => Ok(v != 0),
            Value::UInt32(Some(v)) => Ok(v != 0),
            Value::UInt64(Some(v)) => Ok(v != 0),
            Value::Varchar(Some(v)) => match v.trim().to_ascii_lowercase().as_str() {
                "true" | "t" | "1" => Ok(true),
                "false" | "f" | "0" => Ok(false),
                _ => Err(parse_error::<bool>(&v, "expected true or false")),
            },
            value => Err(conversion_error::<Self>(&value)),
        }
    }
}

impl AsValue for Decimal {
    fn as_empty_value() -> Value {
        Value::Decimal(None)
    }
    fn as_value(self) -> Value {
        Value::Decimal(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        let converted = match &value {
            Value::Decimal(Some(v)) => Some(*v),
            Value::Int8(Some(v)) => Some(Decimal::from(*v)),
            Value::Int16(Some(v)) => Some(Decimal::from(*v)),
            Value::Int32(Some(v)) => Some(Decimal::from(*v)),
            Value::Int64(Some(v)) => Some(Decimal::from(*v)),
            Value::UInt8(Some(v)) => Some(Decimal::from(*v)),
            Value::UInt16(Some(v)) => Some(Decimal::from(*v)),
            Value::UInt32(Some(v)) => Some(Decimal::from(*v)),
            Value::UInt64(Some(v)) => Some(Decimal::from(*v)),
            Value::Float32(Some(v)) => Decimal::from_f32(*v),
            Value::Float64(Some(v)) => Decimal::from_f64(*v),
            Value::Varchar(Some(v)) => Some(
                Decimal::from_str(v.trim()).map_err(|e| parse_error::<Decimal>(v, e))?,
            ),
            _ => return Err(conversion_error::<Self>(&value)),
        };
        converted.ok_or_else(|| conversion_error::<Self>(&value))
    }
}

impl AsValue for String {
    fn as_empty_value() -> Value {
        Value::Varchar(None)
    }
    fn as_value(self) -> Value {
        Value::Varchar(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Varchar(Some(v)) => Ok(v),
            Value::Uuid(Some(v)) => Ok(v.to_string()),
            value => Err(conversion_error::<Self>(&value)),
        }
    }
}

impl AsValue for Box<[u8]> {
    fn as_empty_value() -> Value {
        Value::Blob(None)
    }
    fn as_value(self) -> Value {
        Value::Blob(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Blob(Some(v)) => Ok(v),
            Value::Varchar(Some(v)) => Ok(v.into_bytes().into_boxed_slice()),
            value => Err(conversion_error::<Self>(&value)),
        }
    }
}

impl AsValue for Uuid {
    fn as_empty_value() -> Value {
        Value::Uuid(None)
    }
    fn as_value(self) -> Value {
        Value::Uuid(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Uuid(Some(v)) => Ok(v),
            Value::Varchar(Some(v)) => {
                Uuid::parse_str(v.trim()).map_err(|e| parse_error::<Uuid>(&v, e))
            }
            Value::Blob(Some(v)) => Uuid::from_slice(&v).map_err(Error::new),
            value => Err(conversion_error::<Self>(&value)),
        }
    }
}

macro_rules! impl_as_value_temporal {
    ($source:ty, $destination:path, $format:expr) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $destination(None)
            }
            fn as_value(self) -> Value {
                $destination(Some(self))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                match value {
                    $destination(Some(v)) => Ok(v),
                    Value::Varchar(Some(v)) => {
                        <$source>::parse(v.trim(), $format).map_err(|e| parse_error::<$source>(&v, e))
                    }
                    value => Err(conversion_error::<Self>(&value)),
                }
            }
        }
    };
}

impl_as_value_temporal!(Date, Value::Date, DATE_FORMAT);
impl_as_value_temporal!(Time, Value::Time, TIME_FORMAT);
impl_as_value_temporal!(PrimitiveDateTime, Value::Timestamp, TIMESTAMP_FORMAT);
impl_as_value_temporal!(OffsetDateTime, Value::TimestampWithTimezone, TIMESTAMPTZ_FORMAT);

impl<T: AsValue> AsValue for Option<T> {
    const NULLABLE: bool = true;
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        match self {
            Some(v) => v.as_value(),
            None => T::as_empty_value(),
        }
    }
    fn try_from_value(value: Value) -> Result<Self> {
        if value.is_null() {
            return Ok(None);
        }
        Ok(Some(T::try_from_value(value)?))
    }
}

impl<T: AsValue> AsValue for Vec<T> {
    fn as_empty_value() -> Value {
        Value::List(None, Box::new(T::as_empty_value()))
    }
    fn as_value(self) -> Value {
        Value::List(
            Some(self.into_iter().map(AsValue::as_value).collect()),
            Box::new(T::as_empty_value()),
        )
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::List(Some(v), ..) => v.into_iter().map(T::try_from_value).collect(),
            value => Err(conversion_error::<Self>(&value)),
        }
    }
}
