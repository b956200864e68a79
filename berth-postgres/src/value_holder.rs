use berth_core::{Error, Row, Value};
use bytes::BytesMut;
use postgres_types::{FromSql, IsNull, ToSql, Type, to_sql_checked};
use rust_decimal::Decimal;
use std::error::Error as StdError;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};
use uuid::Uuid;

type BoxError = Box<dyn StdError + Sync + Send>;

/// Bridge between [`Value`] and the wire types of the `postgres` client.
#[derive(Debug)]
pub(crate) struct ValueHolder(pub(crate) Value);

impl<'a> FromSql<'a> for ValueHolder {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, BoxError> {
        Self::from_sql_nullable(ty, Some(raw))
    }

    fn from_sql_null(ty: &Type) -> Result<Self, BoxError> {
        Self::from_sql_nullable(ty, None)
    }

    /// Decodes into the kind [`postgres_type_to_value`] assigns to `ty`.
    fn from_sql_nullable(ty: &Type, raw: Option<&'a [u8]>) -> Result<Self, BoxError> {
        let target = postgres_type_to_value(ty);
        let Some(raw) = raw else {
            return Ok(ValueHolder(target));
        };
        let value = match target {
            Value::Boolean(..) => Value::Boolean(Some(bool::from_sql(ty, raw)?)),
            Value::Int8(..) => Value::Int8(Some(i8::from_sql(ty, raw)?)),
            Value::Int16(..) => Value::Int16(Some(i16::from_sql(ty, raw)?)),
            Value::Int32(..) => Value::Int32(Some(i32::from_sql(ty, raw)?)),
            Value::Int64(..) => Value::Int64(Some(i64::from_sql(ty, raw)?)),
            Value::UInt32(..) => Value::UInt32(Some(u32::from_sql(ty, raw)?)),
            Value::Float32(..) => Value::Float32(Some(f32::from_sql(ty, raw)?)),
            Value::Float64(..) => Value::Float64(Some(f64::from_sql(ty, raw)?)),
            Value::Decimal(..) => Value::Decimal(Some(Decimal::from_sql(ty, raw)?)),
            Value::Varchar(..) => Value::Varchar(Some(String::from_sql(ty, raw)?)),
            Value::Blob(..) => Value::Blob(Some(Vec::<u8>::from_sql(ty, raw)?.into())),
            Value::Date(..) => Value::Date(Some(Date::from_sql(ty, raw)?)),
            Value::Time(..) => Value::Time(Some(Time::from_sql(ty, raw)?)),
            Value::Timestamp(..) => Value::Timestamp(Some(PrimitiveDateTime::from_sql(ty, raw)?)),
            Value::TimestampWithTimezone(..) => {
                Value::TimestampWithTimezone(Some(OffsetDateTime::from_sql(ty, raw)?))
            }
            Value::Uuid(..) => Value::Uuid(Some(Uuid::from_sql(ty, raw)?)),
            Value::List(_, element) => Value::List(
                Some(
                    Vec::<ValueHolder>::from_sql(ty, raw)?
                        .into_iter()
                        .map(|v| v.0)
                        .collect(),
                ),
                element,
            ),
            _ => {
                return Err(format!(
                    "Cannot decode postgres type `{}`, value: `{}`",
                    ty,
                    String::from_utf8_lossy(raw)
                )
                .into());
            }
        };
        Ok(ValueHolder(value))
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}

impl ToSql for ValueHolder {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError>
    where
        Self: Sized,
    {
        match &self.0 {
            Value::Boolean(Some(v)) => v.to_sql(ty, out),
            Value::Int8(Some(v)) => v.to_sql(ty, out),
            Value::Int16(Some(v)) => v.to_sql(ty, out),
            Value::Int32(Some(v)) => v.to_sql(ty, out),
            Value::Int64(Some(v)) => v.to_sql(ty, out),
            // Postgres has no unsigned integers, widen to the next signed type
            Value::UInt8(Some(v)) => i16::from(*v).to_sql(ty, out),
            Value::UInt16(Some(v)) => i32::from(*v).to_sql(ty, out),
            Value::UInt32(Some(v)) => v.to_sql(ty, out),
            Value::UInt64(Some(v)) => Decimal::from(*v).to_sql(ty, out),
            Value::Float32(Some(v)) => v.to_sql(ty, out),
            Value::Float64(Some(v)) => v.to_sql(ty, out),
            Value::Decimal(Some(v)) => v.to_sql(ty, out),
            Value::Varchar(Some(v)) => v.to_sql(ty, out),
            Value::Blob(Some(v)) => v.as_ref().to_sql(ty, out),
            Value::Date(Some(v)) => v.to_sql(ty, out),
            Value::Time(Some(v)) => v.to_sql(ty, out),
            Value::Timestamp(Some(v)) => v.to_sql(ty, out),
            Value::TimestampWithTimezone(Some(v)) => v.to_sql(ty, out),
            Value::Uuid(Some(v)) => v.to_sql(ty, out),
            Value::List(Some(v), ..) => v
                .iter()
                .cloned()
                .map(ValueHolder)
                .collect::<Vec<_>>()
                .to_sql(ty, out),
            _ => Ok(IsNull::Yes),
        }
    }

    fn accepts(_ty: &Type) -> bool
    where
        Self: Sized,
    {
        true
    }

    to_sql_checked!();
}

/// Typed null of a postgres type, parameters are converted to it before binding and results
/// are decoded into it. Unsupported types map to [`Value::Null`].
pub(crate) fn postgres_type_to_value(ty: &Type) -> Value {
    match *ty {
        Type::BOOL => Value::Boolean(None),
        Type::CHAR => Value::Int8(None),
        Type::INT2 => Value::Int16(None),
        Type::INT4 => Value::Int32(None),
        Type::INT8 => Value::Int64(None),
        Type::FLOAT4 => Value::Float32(None),
        Type::FLOAT8 => Value::Float64(None),
        Type::NUMERIC => Value::Decimal(None),
        Type::OID => Value::UInt32(None),
        Type::VARCHAR | Type::TEXT | Type::NAME | Type::BPCHAR | Type::JSON | Type::XML => {
            Value::Varchar(None)
        }
        Type::BYTEA => Value::Blob(None),
        Type::DATE => Value::Date(None),
        Type::TIME => Value::Time(None),
        Type::TIMESTAMP => Value::Timestamp(None),
        Type::TIMESTAMPTZ => Value::TimestampWithTimezone(None),
        Type::UUID => Value::Uuid(None),
        _ => match ty.kind() {
            postgres_types::Kind::Array(element) => {
                match postgres_type_to_value(element) {
                    Value::Null => Value::Null,
                    element => Value::List(None, Box::new(element)),
                }
            }
            _ => Value::Null,
        },
    }
}

pub(crate) fn row_to_values(row: &postgres::Row) -> berth_core::Result<Row> {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, column)| {
            row.try_get::<_, ValueHolder>(i).map(|v| v.0).map_err(|e| {
                Error::new(e).context(format!(
                    "Could not decode column {} `{}` of type {}",
                    i,
                    column.name(),
                    column.type_()
                ))
            })
        })
        .collect()
}
